use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use brainbox::gemini::{GeminiClient, InferenceService};
use brainbox::request::GenerateRequest;

use super::state::{AppState, BackendEvent};

/// Send a built request to Gemini on the tokio runtime.
/// The outcome comes back as `BackendEvent::SubmissionComplete`.
pub fn dispatch_submission(state: &Rc<RefCell<AppState>>, request: GenerateRequest) {
    let mut s = state.borrow_mut();
    let sender = s.backend_sender.clone();

    let client = match GeminiClient::new(&s.config) {
        Ok(client) => client,
        Err(e) => {
            let _ = sender.try_send(BackendEvent::SubmissionComplete(Err(e)));
            return;
        }
    };

    let handle = s.tokio_rt.spawn(async move {
        let outcome = client.generate(&request).await;
        let _ = sender.send(BackendEvent::SubmissionComplete(outcome)).await;
    });
    s.in_flight = Some(handle);
}

/// Read a user-selected file on the tokio runtime.
pub fn dispatch_upload_read(state: &Rc<RefCell<AppState>>, path: PathBuf) {
    let s = state.borrow();
    let sender = s.backend_sender.clone();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    s.tokio_rt.spawn(async move {
        let result = brainbox::input::read_upload(&path).await;
        let _ = sender.send(BackendEvent::UploadRead(name, result)).await;
    });
}

/// Abort the in-flight request, if any. Used on shutdown.
pub fn cancel_submission(state: &Rc<RefCell<AppState>>) {
    if let Some(handle) = state.borrow_mut().in_flight.take() {
        log::info!("Cancelling in-flight submission");
        handle.abort();
    }
}
