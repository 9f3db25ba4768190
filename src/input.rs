use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::ErrorKind;

/// Where an attached image came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    Upload,
    Capture,
}

/// Image data attached to a question. Never mutated; a new image replaces the
/// old one wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    bytes: Arc<[u8]>,
    mime_type: String,
    source: ImageSource,
}

impl ImageAttachment {
    pub fn new(source: ImageSource, bytes: impl Into<Arc<[u8]>>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: mime_type.into(),
            source,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn source(&self) -> ImageSource {
        self.source
    }
}

/// An immutable view of what the user is asking.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Question {
    pub text: String,
    pub image: Option<ImageAttachment>,
}

/// Current question text plus at most one image, whatever its source.
#[derive(Debug, Default)]
pub struct InputAggregator {
    text: String,
    image: Option<ImageAttachment>,
}

impl InputAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn set_image(&mut self, source: ImageSource, bytes: impl Into<Arc<[u8]>>, mime_type: impl Into<String>) {
        self.attach(ImageAttachment::new(source, bytes, mime_type));
    }

    /// Replace the current image, if any.
    pub fn attach(&mut self, attachment: ImageAttachment) {
        if let Some(old) = &self.image {
            log::debug!("Replacing {:?} image with {:?} image", old.source(), attachment.source());
        }
        self.image = Some(attachment);
    }

    pub fn clear_image(&mut self) {
        self.image = None;
    }

    pub fn clear_all(&mut self) {
        self.text.clear();
        self.image = None;
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn image(&self) -> Option<&ImageAttachment> {
        self.image.as_ref()
    }

    pub fn has_content(&self) -> bool {
        !self.text.trim().is_empty() || self.image.is_some()
    }

    pub fn snapshot(&self) -> Question {
        Question {
            text: self.text.clone(),
            image: self.image.clone(),
        }
    }
}

/// A user-selected file could not be turned into an attachment.
#[derive(Debug, thiserror::Error)]
#[error("Error reading file {}: {source}", path.display())]
pub struct UploadError {
    path: PathBuf,
    #[source]
    source: std::io::Error,
}

impl UploadError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::FileReadError
    }
}

/// Mime type for an uploaded file, judged by its extension.
pub fn guess_mime_type(path: &Path) -> &'static str {
    image::ImageFormat::from_path(path)
        .map(|format| format.to_mime_type())
        .unwrap_or("image/jpeg")
}

/// Read a user-selected file fully into an upload attachment.
pub async fn read_upload(path: impl AsRef<Path>) -> Result<ImageAttachment, UploadError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await.map_err(|source| UploadError {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("Read {} bytes from {}", bytes.len(), path.display());
    Ok(ImageAttachment::new(ImageSource::Upload, bytes, guess_mime_type(path)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_text_is_not_content() {
        let mut input = InputAggregator::new();
        assert!(!input.has_content());
        input.set_text("  \n\t ");
        assert!(!input.has_content());
        input.set_text(" why? ");
        assert!(input.has_content());
    }

    #[test]
    fn image_alone_is_content() {
        let mut input = InputAggregator::new();
        input.set_image(ImageSource::Capture, vec![0xffu8, 0xd8], "image/jpeg");
        assert!(input.has_content());
    }

    #[test]
    fn setting_an_image_replaces_the_previous_one() {
        let mut input = InputAggregator::new();
        input.set_image(ImageSource::Upload, vec![1u8, 2, 3], "image/png");
        input.set_image(ImageSource::Capture, vec![9u8], "image/jpeg");

        let image = input.image().expect("image attached");
        assert_eq!(image.source(), ImageSource::Capture);
        assert_eq!(image.bytes(), &[9]);
        assert_eq!(image.mime_type(), "image/jpeg");
    }

    #[test]
    fn snapshot_does_not_mutate() {
        let mut input = InputAggregator::new();
        input.set_text("What is 2 + 2?");
        input.set_image(ImageSource::Upload, vec![7u8], "image/png");

        let question = input.snapshot();
        assert_eq!(question.text, "What is 2 + 2?");
        assert!(question.image.is_some());

        input.clear_image();
        assert!(question.image.is_some());
        assert_eq!(input.text(), "What is 2 + 2?");
        assert!(input.image().is_none());
    }

    #[test]
    fn clear_all_drops_text_and_image() {
        let mut input = InputAggregator::new();
        input.set_text("q");
        input.set_image(ImageSource::Upload, vec![7u8], "image/png");
        input.clear_all();
        assert!(!input.has_content());
        assert_eq!(input.snapshot(), Question::default());
    }

    #[test]
    fn mime_type_follows_extension() {
        assert_eq!(guess_mime_type(Path::new("board.png")), "image/png");
        assert_eq!(guess_mime_type(Path::new("board.JPG")), "image/jpeg");
        assert_eq!(guess_mime_type(Path::new("board.webp")), "image/webp");
        assert_eq!(guess_mime_type(Path::new("notes")), "image/jpeg");
    }
}
