use crate::submission::SubmissionState;

/// Label of the submit button when it can be pressed.
pub const SUBMIT_LABEL: &str = "Get Answer";
/// Label of the submit button while a submission is in flight.
pub const PENDING_LABEL: &str = "Processing...";

/// What the result panel should show for a submission state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultView {
    /// No panel.
    Hidden,
    /// Loading indicator; any previous result is hidden.
    Loading,
    Answer { quick: String, detailed: String },
    /// Error-styled text in place of the explanation.
    Error { quick: String, detailed: String },
}

impl ResultView {
    pub fn from_state(state: &SubmissionState) -> Self {
        match state {
            SubmissionState::Idle => ResultView::Hidden,
            SubmissionState::Pending => ResultView::Loading,
            SubmissionState::Succeeded(answer) => ResultView::Answer {
                quick: answer.quick_answer().to_string(),
                detailed: answer.detailed_explanation().to_string(),
            },
            SubmissionState::Failed(_, message) => ResultView::Error {
                quick: "Error".into(),
                detailed: format!("An error occurred: {message}"),
            },
        }
    }

    pub fn panel_visible(&self) -> bool {
        matches!(self, ResultView::Answer { .. } | ResultView::Error { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ResultView::Error { .. })
    }
}

/// Submit button posture: (label, sensitive).
pub fn submit_button(state: &SubmissionState) -> (&'static str, bool) {
    if state.is_pending() {
        (PENDING_LABEL, false)
    } else {
        (SUBMIT_LABEL, true)
    }
}
