use futures_util::future::BoxFuture;
use image::RgbImage;
use opencv::core::Mat;
use opencv::imgproc;
use opencv::prelude::*;
use opencv::videoio::{self, VideoCapture};

use super::{AcquireError, CameraConstraints, CameraDevice, CameraError, VideoStream};

/// V4L2 / AVFoundation / MSMF camera through OpenCV's `videoio`.
pub struct OpencvCamera;

impl CameraDevice for OpencvCamera {
    fn acquire(
        &self,
        constraints: &CameraConstraints,
    ) -> BoxFuture<'static, Result<Box<dyn VideoStream>, AcquireError>> {
        let constraints = constraints.clone();
        let (tx, rx) = async_channel::bounded(1);

        // Opening a device can block for seconds; keep it off the main loop.
        // If the receiver is gone (open cancelled) the stream is dropped here.
        let spawned = std::thread::Builder::new()
            .name("camera-open".into())
            .spawn(move || {
                let _ = tx.send_blocking(open_capture(&constraints));
            });

        Box::pin(async move {
            spawned.map_err(|e| {
                CameraError::DeviceUnavailable(format!("Failed to spawn camera thread: {e}"))
            })?;
            rx.recv().await.map_err(|_| {
                CameraError::DeviceUnavailable("Camera thread exited without a result".into())
            })?
        })
    }
}

fn open_capture(constraints: &CameraConstraints) -> Result<Box<dyn VideoStream>, AcquireError> {
    let index = constraints.device_index;
    check_device_access(index)?;

    // Laptop and USB cameras have no facing; the index picks the device.
    log::debug!("Facing {:?} is advisory for device {index}", constraints.facing);

    let capture = VideoCapture::new(index, videoio::CAP_ANY)
        .map_err(|e| CameraError::DeviceUnavailable(e.to_string()))?;
    if !capture.is_opened().unwrap_or(false) {
        return Err(CameraError::DeviceUnavailable(format!("Camera {index} could not be opened")).into());
    }

    let mut stream = OpencvStream {
        capture,
        live: true,
    };
    if let Some(width) = constraints.width {
        let _ = stream.capture.set(videoio::CAP_PROP_FRAME_WIDTH, f64::from(width));
    }
    if let Some(height) = constraints.height {
        let _ = stream.capture.set(videoio::CAP_PROP_FRAME_HEIGHT, f64::from(height));
    }

    // The device is open from here on; a failed probe is a partial acquisition.
    if let Err(error) = stream.read_frame() {
        return Err(AcquireError {
            error: CameraError::DeviceUnavailable(error.to_string()),
            partial: Some(Box::new(stream)),
        });
    }

    Ok(Box::new(stream))
}

#[cfg(target_os = "linux")]
fn check_device_access(index: i32) -> Result<(), CameraError> {
    let path = format!("/dev/video{index}");
    match std::fs::File::open(&path) {
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => Err(
            CameraError::PermissionDenied(format!("{path}: is the user in the 'video' group?")),
        ),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(CameraError::DeviceUnavailable(format!("{path} does not exist")))
        }
        _ => Ok(()),
    }
}

#[cfg(not(target_os = "linux"))]
fn check_device_access(_index: i32) -> Result<(), CameraError> {
    Ok(())
}

struct OpencvStream {
    capture: VideoCapture,
    live: bool,
}

impl VideoStream for OpencvStream {
    fn read_frame(&mut self) -> Result<RgbImage, CameraError> {
        if !self.live {
            return Err(CameraError::NotActive);
        }

        let mut frame = Mat::default();
        let grabbed = self
            .capture
            .read(&mut frame)
            .map_err(|e| CameraError::Frame(e.to_string()))?;
        if !grabbed || frame.empty() {
            return Err(CameraError::Frame("camera returned an empty frame".into()));
        }

        let mut rgb = Mat::default();
        imgproc::cvt_color(&frame, &mut rgb, imgproc::COLOR_BGR2RGB, 0)
            .map_err(|e| CameraError::Frame(e.to_string()))?;

        let width = rgb.cols() as u32;
        let height = rgb.rows() as u32;
        let data = rgb
            .data_bytes()
            .map_err(|e| CameraError::Frame(e.to_string()))?
            .to_vec();

        RgbImage::from_raw(width, height, data)
            .ok_or_else(|| CameraError::Frame(format!("unexpected buffer size for {width}x{height}")))
    }

    fn live_tracks(&self) -> usize {
        usize::from(self.live)
    }

    fn stop(&mut self) {
        if self.live {
            if let Err(e) = self.capture.release() {
                log::warn!("Failed to release camera: {e}");
            }
            self.live = false;
        }
    }
}

impl Drop for OpencvStream {
    fn drop(&mut self) {
        self.stop();
    }
}
