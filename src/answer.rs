/// Marks the boundary between the short answer and the explanation in the
/// model's reply. Collisions with ordinary answer text are not guarded against.
pub const ANSWER_SEPARATOR: &str = "|||ANSWER_SEPARATOR|||";

/// Quick answer shown when the reply does not contain the separator.
pub const FALLBACK_QUICK_ANSWER: &str = "See full response below";

/// A parsed answer: the one-liner and the step-by-step explanation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnswerPayload {
    quick_answer: String,
    detailed_explanation: String,
}

impl AnswerPayload {
    pub fn quick_answer(&self) -> &str {
        &self.quick_answer
    }

    pub fn detailed_explanation(&self) -> &str {
        &self.detailed_explanation
    }
}

/// Split a raw model reply into quick and detailed parts.
///
/// Only the first separator counts; any later occurrence is kept verbatim in
/// the explanation. A reply without a separator is not an error: the whole
/// text becomes the explanation under a fixed quick answer.
pub fn parse(raw: &str) -> AnswerPayload {
    if raw.is_empty() {
        return AnswerPayload::default();
    }

    match raw.split_once(ANSWER_SEPARATOR) {
        Some((quick, detailed)) => AnswerPayload {
            quick_answer: quick.trim().to_string(),
            detailed_explanation: detailed.trim().to_string(),
        },
        None => {
            log::info!("Reply has no answer separator, showing it in full");
            AnswerPayload {
                quick_answer: FALLBACK_QUICK_ANSWER.to_string(),
                detailed_explanation: raw.trim().to_string(),
            }
        }
    }
}
