use std::path::PathBuf;

use gtk4::glib;

use brainbox::camera::{self, CameraSession, CancelHandle};
use brainbox::gemini::ServiceError;
use brainbox::input::{ImageAttachment, UploadError};
use brainbox::{Config, InputAggregator, SubmissionController};

use crate::ui::camera_dialog::CameraDialogWidgets;
use crate::ui::dashboard::DashboardWidgets;

/// Events delivered to the GTK main thread, from widgets and background tasks.
#[derive(Debug)]
pub enum BackendEvent {
    SubjectSelected(String),
    ThemeToggled(bool),
    SubmitClicked,
    SubmissionComplete(Result<String, ServiceError>),
    UploadChosen(PathBuf),
    /// File name and read outcome.
    UploadRead(String, Result<ImageAttachment, UploadError>),
    CameraRequested,
    PreviewTick,
    SnapClicked,
    CameraDismissed,
}

/// Central application state. Lives on the GTK main thread inside Rc<RefCell<>>.
pub struct AppState {
    pub config: Config,
    pub subject: String,
    pub input: InputAggregator,
    pub submission: SubmissionController,
    pub tokio_rt: tokio::runtime::Runtime,
    pub backend_sender: async_channel::Sender<BackendEvent>,
    pub in_flight: Option<tokio::task::JoinHandle<()>>,

    // Camera state. `camera` is None while an open() is in progress.
    pub camera: Option<CameraSession>,
    pub camera_cancel: Option<CancelHandle>,
    pub camera_wanted: bool,
    pub preview_source: Option<glib::SourceId>,

    // UI handles
    pub dashboard: Option<DashboardWidgets>,
    pub camera_dialog: Option<CameraDialogWidgets>,
}

impl AppState {
    pub fn new(sender: async_channel::Sender<BackendEvent>) -> Self {
        let config = Config::load();
        let tokio_rt = tokio::runtime::Runtime::new()
            .expect("Failed to create tokio runtime");

        Self {
            subject: config.default_subject.clone(),
            config,
            input: InputAggregator::new(),
            submission: SubmissionController::new(),
            tokio_rt,
            backend_sender: sender,
            in_flight: None,
            camera: Some(CameraSession::new(camera::default_device())),
            camera_cancel: None,
            camera_wanted: false,
            preview_source: None,
            dashboard: None,
            camera_dialog: None,
        }
    }

    /// Persist config changes, logging instead of failing.
    pub fn save_config(&self) {
        if let Err(e) = self.config.save() {
            log::warn!("Failed to save config: {e}");
        }
    }

    pub fn show_toast(&self, message: &str) {
        if let Some(ref dash) = self.dashboard {
            dash.show_toast(message);
        }
    }
}
