use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;

use crate::answer::ANSWER_SEPARATOR;
use crate::input::Question;

/// Name the model answers under.
pub const PERSONA: &str = "BTech BrainBox";

/// Outbound `generateContent` body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InlineData {
    pub mime_type: String,
    /// Base64 (standard alphabet, padded).
    pub data: String,
}

impl GenerateRequest {
    /// All parts of the single content entry.
    pub fn parts(&self) -> &[Part] {
        self.contents
            .first()
            .map(|c| c.parts.as_slice())
            .unwrap_or_default()
    }

    pub fn prompt(&self) -> Option<&str> {
        self.parts().iter().find_map(|part| match part {
            Part::Text { text } => Some(text.as_str()),
            Part::InlineData { .. } => None,
        })
    }

    pub fn inline_images(&self) -> impl Iterator<Item = &InlineData> {
        self.parts().iter().filter_map(|part| match part {
            Part::InlineData { inline_data } => Some(inline_data),
            Part::Text { .. } => None,
        })
    }
}

/// Instruction template sent as the text part.
fn prompt(subject: &str, question_text: &str) -> String {
    format!(
        r#"IMPORTANT: You must follow this response format strictly.
You are "{PERSONA}", an expert AI assistant specializing in {subject}.
The user has asked the following question: "{question_text}".
First, provide only the final, concise answer.
- If it is an MCQ, your answer should be just the correct option and its value (e.g., "B) 75").
- If it is a calculation, give only the final number (e.g., "4").
- If it is conceptual, give a one-sentence answer.
After this short answer, you MUST insert a special separator: '{ANSWER_SEPARATOR}'.
After the separator, provide a detailed, step-by-step explanation. Do not use complex LaTeX."#
    )
}

/// Assemble the request for `question` asked about `subject`.
///
/// Pure: the same inputs always give the same request.
pub fn build(subject: &str, question: &Question) -> GenerateRequest {
    let mut parts = vec![Part::Text {
        text: prompt(subject, question.text.trim()),
    }];

    if let Some(image) = &question.image {
        parts.push(Part::InlineData {
            inline_data: InlineData {
                mime_type: image.mime_type().to_string(),
                data: STANDARD.encode(image.bytes()),
            },
        });
    }

    GenerateRequest {
        contents: vec![Content { parts }],
    }
}
