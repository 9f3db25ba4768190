use std::cell::RefCell;
use std::rc::Rc;

use gtk4::glib;
use gtk4::prelude::*;

use brainbox::camera::{CameraError, CAPTURE_MIME_TYPE};
use brainbox::ImageSource;

use super::state::{AppState, BackendEvent};
use crate::ui::camera_dialog::{set_camera_phase, show_frame, CameraPhase};

/// Preview refresh interval (~15fps).
const PREVIEW_INTERVAL_MS: u64 = 66;

/// Open the camera dialog and start acquiring the device.
pub fn open_camera(state: &Rc<RefCell<AppState>>) {
    let (mut session, constraints) = {
        let mut s = state.borrow_mut();
        let Some(session) = s.camera.take() else {
            log::info!("Camera open already in progress");
            return;
        };
        if session.is_active() {
            s.camera = Some(session);
            return;
        }
        (session, s.config.camera_constraints())
    };

    {
        let mut s = state.borrow_mut();
        s.camera_cancel = Some(session.cancel_handle());
        s.camera_wanted = true;
        if let Some(ref dialog) = s.camera_dialog {
            set_camera_phase(dialog, &CameraPhase::Starting);
            dialog.window.set_visible(true);
        }
    }

    let state_clone = state.clone();
    glib::spawn_future_local(async move {
        let result = session.open(&constraints).await;

        let wanted = {
            let mut s = state_clone.borrow_mut();
            s.camera_cancel = None;
            s.camera_wanted
        };

        match result {
            Ok(()) if wanted => {
                state_clone.borrow_mut().camera = Some(session);
                start_preview(&state_clone);
                if let Some(ref dialog) = state_clone.borrow().camera_dialog {
                    set_camera_phase(dialog, &CameraPhase::Live);
                }
            }
            Ok(()) => {
                // Dialog was dismissed after the device had already opened.
                session.close();
                state_clone.borrow_mut().camera = Some(session);
            }
            Err(e) => {
                session.close();
                let mut s = state_clone.borrow_mut();
                s.camera = Some(session);
                s.camera_wanted = false;
                if let Some(ref dialog) = s.camera_dialog {
                    dialog.window.set_visible(false);
                }
                if !matches!(e, CameraError::Cancelled) {
                    s.show_toast(&format!(
                        "Could not access the camera ({}). {e}",
                        e.kind()
                    ));
                }
            }
        }
    });
}

fn start_preview(state: &Rc<RefCell<AppState>>) {
    let sender = state.borrow().backend_sender.clone();
    let source = glib::timeout_add_local(
        std::time::Duration::from_millis(PREVIEW_INTERVAL_MS),
        move || {
            let _ = sender.try_send(BackendEvent::PreviewTick);
            glib::ControlFlow::Continue
        },
    );
    state.borrow_mut().preview_source = Some(source);
}

fn stop_preview(state: &Rc<RefCell<AppState>>) {
    if let Some(source) = state.borrow_mut().preview_source.take() {
        source.remove();
    }
}

/// Push the current frame into the dialog.
pub fn refresh_preview(state: &Rc<RefCell<AppState>>) {
    let mut guard = state.borrow_mut();
    let s = &mut *guard;
    let Some(session) = s.camera.as_mut().filter(|c| c.is_active()) else {
        return;
    };
    match session.frame() {
        Ok(frame) => {
            if let Some(ref dialog) = s.camera_dialog {
                show_frame(dialog, frame);
            }
        }
        Err(e) => log::warn!("Preview frame failed: {e}"),
    }
}

/// Take the snapshot, attach it, and close the camera.
pub fn snap_photo(state: &Rc<RefCell<AppState>>) {
    stop_preview(state);

    let result = {
        let mut s = state.borrow_mut();
        s.camera_wanted = false;
        match s.camera.as_mut() {
            Some(session) if session.is_active() => session.capture_and_close(),
            _ => Err(CameraError::NotActive),
        }
    };

    let mut s = state.borrow_mut();
    match result {
        Ok(jpeg) => {
            s.input.set_image(ImageSource::Capture, jpeg, CAPTURE_MIME_TYPE);
            if let Some(ref dash) = s.dashboard {
                dash.set_image_status("Image captured successfully!", false);
            }
        }
        Err(e) => {
            log::error!("Capture failed: {e}");
            if let Some(ref dash) = s.dashboard {
                dash.set_image_status("Could not capture an image.", true);
            }
        }
    }
    if let Some(ref dialog) = s.camera_dialog {
        dialog.window.set_visible(false);
    }
}

/// Close the camera on cancel: interrupt a pending open or release the
/// open stream.
pub fn dismiss_camera(state: &Rc<RefCell<AppState>>) {
    stop_preview(state);

    let mut s = state.borrow_mut();
    s.camera_wanted = false;
    if let Some(cancel) = s.camera_cancel.take() {
        cancel.cancel();
    }
    if let Some(session) = s.camera.as_mut() {
        session.close();
    }
    if let Some(ref dialog) = s.camera_dialog {
        dialog.window.set_visible(false);
    }
}
