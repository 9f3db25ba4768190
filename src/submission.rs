use crate::answer::{self, AnswerPayload};
use crate::error::ErrorKind;
use crate::gemini::{InferenceService, ServiceError};
use crate::input::InputAggregator;
use crate::request::{self, GenerateRequest};

/// Where the current question stands.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    Pending,
    Succeeded(AnswerPayload),
    Failed(ErrorKind, String),
}

impl SubmissionState {
    pub fn is_pending(&self) -> bool {
        matches!(self, SubmissionState::Pending)
    }
}

/// Why a submit was refused before anything was sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("Please type a question or upload/capture an image.")]
    EmptyInput,

    #[error("A question is already being answered")]
    InFlight,
}

/// Sole owner of [`SubmissionState`]. One submission at a time.
///
/// The two halves, [`begin`](Self::begin) and [`resolve`](Self::resolve), are
/// plain state transitions; whoever drives the controller performs the network
/// call in between. [`submit`](Self::submit) runs both around an
/// [`InferenceService`].
#[derive(Debug, Default)]
pub struct SubmissionController {
    state: SubmissionState,
}

impl SubmissionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    /// Validate the input and move to `Pending`, returning the request to send.
    ///
    /// Refused without any state change while a submission is pending or when
    /// there is nothing to ask. A finished submission counts as idle.
    pub fn begin(
        &mut self,
        subject: &str,
        input: &InputAggregator,
    ) -> Result<GenerateRequest, SubmitError> {
        if self.state.is_pending() {
            log::info!("Ignoring submit while a submission is pending");
            return Err(SubmitError::InFlight);
        }
        if !input.has_content() {
            return Err(SubmitError::EmptyInput);
        }

        let request = request::build(subject, &input.snapshot());
        log::info!(
            "Submitting {} question (image: {})",
            subject,
            input.image().is_some()
        );
        self.state = SubmissionState::Pending;
        Ok(request)
    }

    /// Record the service outcome and drop the attached image.
    ///
    /// The terminal state stays visible until the next `begin`.
    pub fn resolve(
        &mut self,
        outcome: Result<String, ServiceError>,
        input: &mut InputAggregator,
    ) -> &SubmissionState {
        if !self.state.is_pending() {
            log::warn!("Dropping service result with no submission pending");
            return &self.state;
        }

        self.state = match outcome {
            Ok(raw) => SubmissionState::Succeeded(answer::parse(&raw)),
            Err(e) => {
                log::error!("Submission failed ({}): {e}", e.kind());
                SubmissionState::Failed(e.kind(), e.to_string())
            }
        };
        input.clear_image();
        &self.state
    }

    /// Send the current question through `service` and wait for the result.
    pub async fn submit<S: InferenceService>(
        &mut self,
        service: &S,
        subject: &str,
        input: &mut InputAggregator,
    ) -> Result<&SubmissionState, SubmitError> {
        let request = self.begin(subject, input)?;
        let outcome = service.generate(&request).await;
        Ok(self.resolve(outcome, input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::ImageSource;
    use std::collections::VecDeque;
    use std::future::Future;
    use std::sync::Mutex;

    /// Replays scripted outcomes and remembers what it was sent.
    #[derive(Default)]
    struct ScriptedService {
        outcomes: Mutex<VecDeque<Result<String, ServiceError>>>,
        sent: Mutex<Vec<GenerateRequest>>,
    }

    impl ScriptedService {
        fn replying(outcomes: Vec<Result<String, ServiceError>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                sent: Mutex::default(),
            }
        }

        fn sent(&self) -> Vec<GenerateRequest> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl InferenceService for ScriptedService {
        fn generate(
            &self,
            request: &GenerateRequest,
        ) -> impl Future<Output = Result<String, ServiceError>> + Send {
            self.sent.lock().unwrap().push(request.clone());
            let outcome = self
                .outcomes
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected generate call");
            async move { outcome }
        }
    }

    fn input_with(text: &str, image: bool) -> InputAggregator {
        let mut input = InputAggregator::new();
        input.set_text(text);
        if image {
            input.set_image(ImageSource::Capture, vec![0xffu8, 0xd8, 0xff], "image/jpeg");
        }
        input
    }

    #[tokio::test]
    async fn empty_input_sends_nothing() {
        let service = ScriptedService::default();
        let mut controller = SubmissionController::new();
        let mut input = input_with("   ", false);

        let err = controller
            .submit(&service, "General", &mut input)
            .await
            .unwrap_err();

        assert_eq!(err, SubmitError::EmptyInput);
        assert_eq!(controller.state(), &SubmissionState::Idle);
        assert!(service.sent().is_empty());
    }

    #[tokio::test]
    async fn successful_answer_is_parsed() {
        let service = ScriptedService::replying(vec![Ok(
            "Paris|||ANSWER_SEPARATOR|||Paris is the capital of France because it is the seat of the national government.".into(),
        )]);
        let mut controller = SubmissionController::new();
        let mut input = input_with("What is the capital of France?", false);

        let state = controller
            .submit(&service, "General", &mut input)
            .await
            .unwrap()
            .clone();

        let SubmissionState::Succeeded(answer) = state else {
            panic!("expected success, got {state:?}");
        };
        assert_eq!(answer.quick_answer(), "Paris");
        assert_eq!(
            answer.detailed_explanation(),
            "Paris is the capital of France because it is the seat of the national government."
        );

        let sent = service.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0]
            .prompt()
            .unwrap()
            .contains("What is the capital of France?"));
        assert_eq!(sent[0].inline_images().count(), 0);
    }

    #[tokio::test]
    async fn rejection_becomes_failed_state() {
        let service = ScriptedService::replying(vec![Err(ServiceError::Rejected {
            status: 429,
            message: "rate limited".into(),
        })]);
        let mut controller = SubmissionController::new();
        let mut input = input_with("q", false);

        controller.submit(&service, "General", &mut input).await.unwrap();
        assert_eq!(
            controller.state(),
            &SubmissionState::Failed(ErrorKind::ServiceRejected, "rate limited".into())
        );
    }

    #[tokio::test]
    async fn each_failure_maps_to_its_kind() {
        let service = ScriptedService::replying(vec![
            Err(ServiceError::Network("connection refused".into())),
            Err(ServiceError::EmptyResponse),
        ]);
        let mut controller = SubmissionController::new();
        let mut input = input_with("q", false);

        controller.submit(&service, "General", &mut input).await.unwrap();
        assert_eq!(
            controller.state(),
            &SubmissionState::Failed(ErrorKind::Network, "connection refused".into())
        );

        controller.submit(&service, "General", &mut input).await.unwrap();
        assert!(matches!(
            controller.state(),
            SubmissionState::Failed(ErrorKind::EmptyResponse, _)
        ));
    }

    #[tokio::test]
    async fn image_is_cleared_after_any_outcome() {
        let service = ScriptedService::replying(vec![
            Err(ServiceError::Network("offline".into())),
            Ok("4|||ANSWER_SEPARATOR|||2 + 2 = 4".into()),
        ]);
        let mut controller = SubmissionController::new();
        let mut input = input_with("What does the board say?", true);

        controller.submit(&service, "Mathematics", &mut input).await.unwrap();
        assert!(input.image().is_none());
        assert_eq!(input.text(), "What does the board say?");

        controller.submit(&service, "Mathematics", &mut input).await.unwrap();
        let sent = service.sent();
        assert_eq!(sent[0].inline_images().count(), 1);
        assert_eq!(sent[1].inline_images().count(), 0);
    }

    #[test]
    fn submit_while_pending_is_refused() {
        let mut controller = SubmissionController::new();
        let mut input = input_with("first", true);

        let first = controller.begin("Physics", &input).unwrap();
        assert_eq!(first.inline_images().count(), 1);
        assert_eq!(controller.state(), &SubmissionState::Pending);

        input.set_text("second");
        assert_eq!(
            controller.begin("Physics", &input),
            Err(SubmitError::InFlight)
        );
        assert_eq!(controller.state(), &SubmissionState::Pending);
        assert!(input.image().is_some());

        controller.resolve(Ok("a|||ANSWER_SEPARATOR|||b".into()), &mut input);
        assert!(matches!(controller.state(), SubmissionState::Succeeded(_)));
    }

    #[test]
    fn stray_result_is_ignored() {
        let mut controller = SubmissionController::new();
        let mut input = input_with("q", true);

        controller.resolve(Ok("x".into()), &mut input);
        assert_eq!(controller.state(), &SubmissionState::Idle);
        assert!(input.image().is_some());
    }

    #[test]
    fn terminal_state_is_kept_until_next_submit() {
        let mut controller = SubmissionController::new();
        let mut input = input_with("q", false);

        controller.begin("General", &input).unwrap();
        controller.resolve(Err(ServiceError::EmptyResponse), &mut input);
        assert!(matches!(controller.state(), SubmissionState::Failed(..)));

        // empty input is refused without touching the shown result
        input.set_text("");
        assert_eq!(controller.begin("General", &input), Err(SubmitError::EmptyInput));
        assert!(matches!(controller.state(), SubmissionState::Failed(..)));

        input.set_text("again");
        controller.begin("General", &input).unwrap();
        assert_eq!(controller.state(), &SubmissionState::Pending);
    }
}
