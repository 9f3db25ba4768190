//! Camera access with a strict open/close lifecycle.
//!
//! A [`CameraSession`] owns at most one [`VideoStream`]. Every flow that calls
//! [`CameraSession::open`] must end in [`CameraSession::close`], including the
//! failure and cancel paths; dropping the session closes it as well.

#[cfg(feature = "opencv")]
mod cv;

use std::io::Cursor;

use futures_util::future::{self, AbortHandle, AbortRegistration, Abortable, BoxFuture};
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;

#[cfg(feature = "opencv")]
pub use self::cv::OpencvCamera;

/// JPEG quality used for captured frames.
const JPEG_QUALITY: u8 = 90;

/// Mime type of every captured frame.
pub const CAPTURE_MIME_TYPE: &str = "image/jpeg";

/// Which way the requested camera faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    User,
    #[default]
    Environment,
}

/// What to ask the platform for when opening a camera.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraConstraints {
    pub facing: Facing,
    pub device_index: i32,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl Default for CameraConstraints {
    fn default() -> Self {
        Self {
            facing: Facing::Environment,
            device_index: 0,
            width: Some(1280),
            height: Some(720),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CameraError {
    #[error("Camera access was denied: {0}")]
    PermissionDenied(String),

    #[error("No usable camera: {0}")]
    DeviceUnavailable(String),

    #[error("Camera is already open")]
    Busy,

    #[error("Camera is not active")]
    NotActive,

    #[error("Camera open was cancelled")]
    Cancelled,

    #[error("Failed to read camera frame: {0}")]
    Frame(String),

    #[error("Failed to encode JPEG: {0}")]
    Encode(#[from] image::ImageError),
}

impl CameraError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CameraError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            CameraError::NotActive => ErrorKind::NotActive,
            CameraError::Cancelled => ErrorKind::Cancelled,
            CameraError::DeviceUnavailable(_)
            | CameraError::Busy
            | CameraError::Frame(_)
            | CameraError::Encode(_) => ErrorKind::DeviceUnavailable,
        }
    }
}

/// A failed acquisition. `partial` holds whatever the device managed to open
/// before failing; the session stops it.
pub struct AcquireError {
    pub error: CameraError,
    pub partial: Option<Box<dyn VideoStream>>,
}

impl From<CameraError> for AcquireError {
    fn from(error: CameraError) -> Self {
        Self {
            error,
            partial: None,
        }
    }
}

/// An open video stream made of one or more hardware tracks.
///
/// Implementations must release their tracks on drop.
pub trait VideoStream: Send {
    /// Current frame as packed RGB.
    fn read_frame(&mut self) -> Result<RgbImage, CameraError>;

    /// Number of tracks still holding hardware.
    fn live_tracks(&self) -> usize;

    /// Stop every track. Calling it again does nothing.
    fn stop(&mut self);
}

/// A source of video streams.
pub trait CameraDevice {
    /// Ask the platform for a stream. Resolves once access is granted or denied.
    fn acquire(
        &self,
        constraints: &CameraConstraints,
    ) -> BoxFuture<'static, Result<Box<dyn VideoStream>, AcquireError>>;
}

/// Device used when the crate is built without a camera backend.
pub struct UnavailableCamera;

impl CameraDevice for UnavailableCamera {
    fn acquire(
        &self,
        _constraints: &CameraConstraints,
    ) -> BoxFuture<'static, Result<Box<dyn VideoStream>, AcquireError>> {
        Box::pin(future::ready(Err(CameraError::DeviceUnavailable(
            "this build has no camera backend".into(),
        )
        .into())))
    }
}

/// The platform camera for this build.
pub fn default_device() -> Box<dyn CameraDevice> {
    #[cfg(feature = "opencv")]
    {
        Box::new(OpencvCamera)
    }
    #[cfg(not(feature = "opencv"))]
    {
        Box::new(UnavailableCamera)
    }
}

/// Interrupts a pending [`CameraSession::open`].
#[derive(Clone)]
pub struct CancelHandle(AbortHandle);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.abort();
    }
}

/// Lifecycle owner of one camera stream.
pub struct CameraSession {
    device: Box<dyn CameraDevice>,
    stream: Option<Box<dyn VideoStream>>,
    registration: Option<AbortRegistration>,
}

impl CameraSession {
    pub fn new(device: Box<dyn CameraDevice>) -> Self {
        Self {
            device,
            stream: None,
            registration: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.stream.is_some()
    }

    /// Tracks currently holding hardware.
    pub fn live_tracks(&self) -> usize {
        self.stream.as_ref().map_or(0, |s| s.live_tracks())
    }

    /// Handle that cancels the next (or current) `open()`.
    pub fn cancel_handle(&mut self) -> CancelHandle {
        let (handle, registration) = AbortHandle::new_pair();
        self.registration = Some(registration);
        CancelHandle(handle)
    }

    /// Acquire a stream. On any failure the session stays inactive and
    /// anything partially acquired is stopped before returning.
    pub async fn open(&mut self, constraints: &CameraConstraints) -> Result<(), CameraError> {
        if self.is_active() {
            return Err(CameraError::Busy);
        }

        let registration = match self.registration.take() {
            Some(registration) => registration,
            None => AbortHandle::new_pair().1,
        };

        log::info!(
            "Opening camera {} ({:?} facing)",
            constraints.device_index,
            constraints.facing
        );

        match Abortable::new(self.device.acquire(constraints), registration).await {
            Ok(Ok(stream)) => {
                log::info!("Camera open with {} track(s)", stream.live_tracks());
                self.stream = Some(stream);
                Ok(())
            }
            Ok(Err(AcquireError { error, partial })) => {
                if let Some(mut stream) = partial {
                    log::warn!("Releasing partially opened camera stream");
                    stream.stop();
                }
                log::error!("Camera open failed: {error}");
                Err(error)
            }
            Err(future::Aborted) => {
                log::info!("Camera open cancelled");
                Err(CameraError::Cancelled)
            }
        }
    }

    /// Current frame, for previews.
    pub fn frame(&mut self) -> Result<RgbImage, CameraError> {
        self.stream
            .as_mut()
            .ok_or(CameraError::NotActive)?
            .read_frame()
    }

    /// Grab the current frame as JPEG bytes.
    pub fn capture(&mut self) -> Result<Vec<u8>, CameraError> {
        let frame = self.frame()?;
        let jpeg = encode_jpeg(&frame)?;
        log::info!(
            "Captured {}x{} frame ({} bytes)",
            frame.width(),
            frame.height(),
            jpeg.len()
        );
        Ok(jpeg)
    }

    /// Capture, then close whether or not the capture worked.
    pub fn capture_and_close(&mut self) -> Result<Vec<u8>, CameraError> {
        let result = self.capture();
        self.close();
        result
    }

    /// Release every track. Safe to call on an inactive session.
    pub fn close(&mut self) {
        self.registration = None;
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            log::info!("Camera closed");
        }
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Encode an RGB frame as JPEG.
pub fn encode_jpeg(frame: &RgbImage) -> Result<Vec<u8>, CameraError> {
    let mut out = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY).encode_image(frame)?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use image::Rgb;

    struct FakeStream {
        open_tracks: Arc<AtomicUsize>,
        tracks: usize,
    }

    impl FakeStream {
        fn start(open_tracks: &Arc<AtomicUsize>, tracks: usize) -> Self {
            open_tracks.fetch_add(tracks, Ordering::SeqCst);
            Self {
                open_tracks: open_tracks.clone(),
                tracks,
            }
        }
    }

    impl VideoStream for FakeStream {
        fn read_frame(&mut self) -> Result<RgbImage, CameraError> {
            if self.tracks == 0 {
                return Err(CameraError::NotActive);
            }
            Ok(RgbImage::from_pixel(8, 6, Rgb([200, 30, 30])))
        }

        fn live_tracks(&self) -> usize {
            self.tracks
        }

        fn stop(&mut self) {
            self.open_tracks.fetch_sub(self.tracks, Ordering::SeqCst);
            self.tracks = 0;
        }
    }

    impl Drop for FakeStream {
        fn drop(&mut self) {
            self.stop();
        }
    }

    #[derive(Clone, Copy)]
    enum Behavior {
        Grant,
        Deny,
        FailAfterPartialOpen,
        HangAfterPartialOpen,
    }

    struct FakeCamera {
        open_tracks: Arc<AtomicUsize>,
        behavior: Behavior,
    }

    impl CameraDevice for FakeCamera {
        fn acquire(
            &self,
            _constraints: &CameraConstraints,
        ) -> BoxFuture<'static, Result<Box<dyn VideoStream>, AcquireError>> {
            let open_tracks = self.open_tracks.clone();
            match self.behavior {
                Behavior::Grant => Box::pin(future::ready(Ok(
                    Box::new(FakeStream::start(&open_tracks, 2)) as Box<dyn VideoStream>
                ))),
                Behavior::Deny => Box::pin(future::ready(Err(
                    CameraError::PermissionDenied("user said no".into()).into(),
                ))),
                Behavior::FailAfterPartialOpen => Box::pin(future::ready(Err(AcquireError {
                    error: CameraError::DeviceUnavailable("no frames".into()),
                    partial: Some(Box::new(FakeStream::start(&open_tracks, 1))),
                }))),
                Behavior::HangAfterPartialOpen => Box::pin(async move {
                    let stream = FakeStream::start(&open_tracks, 1);
                    future::pending::<()>().await;
                    Ok(Box::new(stream) as Box<dyn VideoStream>)
                }),
            }
        }
    }

    fn session(behavior: Behavior) -> (CameraSession, Arc<AtomicUsize>) {
        let open_tracks = Arc::new(AtomicUsize::new(0));
        let device = FakeCamera {
            open_tracks: open_tracks.clone(),
            behavior,
        };
        (CameraSession::new(Box::new(device)), open_tracks)
    }

    #[tokio::test]
    async fn capture_then_close_releases_everything() {
        let (mut session, open_tracks) = session(Behavior::Grant);
        session.open(&CameraConstraints::default()).await.unwrap();
        assert!(session.is_active());
        assert_eq!(open_tracks.load(Ordering::SeqCst), 2);

        let jpeg = session.capture().unwrap();
        assert_eq!(&jpeg[..2], &[0xff, 0xd8]);
        assert!(session.is_active());

        session.close();
        assert!(!session.is_active());
        assert_eq!(session.live_tracks(), 0);
        assert_eq!(open_tracks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn capture_and_close_always_closes() {
        let (mut session, open_tracks) = session(Behavior::Grant);
        session.open(&CameraConstraints::default()).await.unwrap();
        let jpeg = session.capture_and_close().unwrap();
        assert!(!jpeg.is_empty());
        assert!(!session.is_active());
        assert_eq!(open_tracks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let (mut session, open_tracks) = session(Behavior::Grant);
        session.close();
        session.open(&CameraConstraints::default()).await.unwrap();
        session.close();
        session.close();
        assert!(!session.is_active());
        assert_eq!(open_tracks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn capture_requires_active_session() {
        let (mut session, _) = session(Behavior::Grant);
        let err = session.capture().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotActive);
    }

    #[tokio::test]
    async fn denied_open_leaves_session_inactive() {
        let (mut session, open_tracks) = session(Behavior::Deny);
        let err = session.open(&CameraConstraints::default()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
        assert!(!session.is_active());
        assert_eq!(open_tracks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn partial_open_failure_is_released() {
        let (mut session, open_tracks) = session(Behavior::FailAfterPartialOpen);
        let err = session.open(&CameraConstraints::default()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DeviceUnavailable);
        assert!(!session.is_active());
        assert_eq!(open_tracks.load(Ordering::SeqCst), 0);

        session.close();
        assert_eq!(open_tracks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cancel_interrupts_pending_open() {
        let (mut session, open_tracks) = session(Behavior::HangAfterPartialOpen);
        let cancel = session.cancel_handle();
        let tracks = open_tracks.clone();
        let constraints = CameraConstraints::default();

        let (result, ()) = tokio::join!(session.open(&constraints), async move {
            tokio::task::yield_now().await;
            assert_eq!(tracks.load(Ordering::SeqCst), 1);
            cancel.cancel();
        });

        assert_eq!(result.unwrap_err().kind(), ErrorKind::Cancelled);
        assert!(!session.is_active());
        assert_eq!(open_tracks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn second_open_while_active_is_refused() {
        let (mut session, open_tracks) = session(Behavior::Grant);
        session.open(&CameraConstraints::default()).await.unwrap();
        let err = session.open(&CameraConstraints::default()).await.unwrap_err();
        assert!(matches!(err, CameraError::Busy));
        assert_eq!(open_tracks.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn dropping_session_closes_it() {
        let (mut session, open_tracks) = session(Behavior::Grant);
        session.open(&CameraConstraints::default()).await.unwrap();
        drop(session);
        assert_eq!(open_tracks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unavailable_backend_reports_device_unavailable() {
        let mut session = CameraSession::new(Box::new(UnavailableCamera));
        let err = session.open(&CameraConstraints::default()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DeviceUnavailable);
        assert!(!session.is_active());
    }
}
