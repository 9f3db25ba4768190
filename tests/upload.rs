use std::io::Write;

use brainbox::input::{read_upload, ImageSource};
use brainbox::{ErrorKind, InputAggregator};

#[tokio::test]
async fn reads_png_upload_with_its_mime_type() {
    let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
    file.write_all(&[0x89, b'P', b'N', b'G']).unwrap();

    let attachment = read_upload(file.path()).await.unwrap();
    assert_eq!(attachment.bytes(), &[0x89, b'P', b'N', b'G']);
    assert_eq!(attachment.mime_type(), "image/png");
    assert_eq!(attachment.source(), ImageSource::Upload);
}

#[tokio::test]
async fn unknown_extension_defaults_to_jpeg() {
    let mut file = tempfile::Builder::new().suffix(".img").tempfile().unwrap();
    file.write_all(&[0xff, 0xd8, 0xff]).unwrap();

    let attachment = read_upload(file.path()).await.unwrap();
    assert_eq!(attachment.mime_type(), "image/jpeg");
}

#[tokio::test]
async fn missing_file_is_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gone.jpg");

    let err = read_upload(&path).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FileReadError);
    assert!(err.to_string().contains("gone.jpg"));
}

#[tokio::test]
async fn upload_replaces_captured_image() {
    let mut input = InputAggregator::new();
    input.set_image(ImageSource::Capture, vec![1u8], "image/jpeg");

    let mut file = tempfile::Builder::new().suffix(".webp").tempfile().unwrap();
    file.write_all(b"RIFF").unwrap();
    input.attach(read_upload(file.path()).await.unwrap());

    let image = input.image().unwrap();
    assert_eq!(image.source(), ImageSource::Upload);
    assert_eq!(image.mime_type(), "image/webp");
    assert_eq!(image.bytes(), b"RIFF");
}
