//! Ask a question by text, uploaded image or camera snapshot and get a short
//! answer plus a step-by-step explanation from Gemini.
//!
//! The GTK shell lives in the binary; everything here is toolkit-free:
//!
//! - [`camera`]: camera session lifecycle and JPEG capture
//! - [`input`]: question text and the single image attachment
//! - [`request`]: the outbound `generateContent` payload
//! - [`gemini`]: the HTTP client and its error mapping
//! - [`answer`]: splitting a reply into quick and detailed parts
//! - [`submission`]: the one-at-a-time submission state machine
//! - [`view`]: what the result panel shows for each state

pub mod answer;
pub mod camera;
pub mod config;
pub mod error;
pub mod gemini;
pub mod input;
pub mod request;
pub mod submission;
pub mod view;

pub use answer::AnswerPayload;
pub use config::Config;
pub use error::ErrorKind;
pub use input::{ImageAttachment, ImageSource, InputAggregator, Question};
pub use submission::{SubmissionController, SubmissionState, SubmitError};
