use std::cell::RefCell;
use std::rc::Rc;

use brainbox::config::Theme;
use brainbox::SubmitError;

use super::camera::{dismiss_camera, open_camera, refresh_preview, snap_photo};
use super::pipeline::{dispatch_submission, dispatch_upload_read};
use super::state::{AppState, BackendEvent};
use crate::ui::dashboard::apply_theme;

/// Handle a backend event. This is the core state machine.
pub fn handle_backend_event(state: &Rc<RefCell<AppState>>, event: BackendEvent) {
    match event {
        BackendEvent::SubjectSelected(subject) => {
            log::info!("Subject: {subject}");
            state.borrow_mut().subject = subject;
        }
        BackendEvent::ThemeToggled(dark) => {
            let mut s = state.borrow_mut();
            s.config.theme = if dark { Theme::Dark } else { Theme::Light };
            apply_theme(s.config.theme);
            s.save_config();
        }
        BackendEvent::SubmitClicked => on_submit(state),
        BackendEvent::SubmissionComplete(outcome) => {
            let mut guard = state.borrow_mut();
            let s = &mut *guard;
            s.in_flight = None;
            let resolved = s.submission.resolve(outcome, &mut s.input);
            log::info!("Submission resolved: {}", describe(resolved));
            if let Some(ref dash) = s.dashboard {
                dash.render_submission(resolved);
                dash.set_image_status("", false);
            }
        }
        BackendEvent::UploadChosen(path) => {
            if let Some(ref dash) = state.borrow().dashboard {
                dash.set_image_status("Reading file...", false);
            }
            dispatch_upload_read(state, path);
        }
        BackendEvent::UploadRead(name, result) => {
            let mut s = state.borrow_mut();
            match result {
                Ok(attachment) => {
                    s.input.attach(attachment);
                    if let Some(ref dash) = s.dashboard {
                        dash.set_image_status(&format!("{name} uploaded!"), false);
                    }
                }
                Err(e) => {
                    log::error!("Upload failed ({}): {e}", e.kind());
                    s.input.clear_image();
                    if let Some(ref dash) = s.dashboard {
                        dash.set_image_status("Error reading file.", true);
                    }
                }
            }
        }
        BackendEvent::CameraRequested => open_camera(state),
        BackendEvent::PreviewTick => refresh_preview(state),
        BackendEvent::SnapClicked => snap_photo(state),
        BackendEvent::CameraDismissed => dismiss_camera(state),
    }
}

fn on_submit(state: &Rc<RefCell<AppState>>) {
    let begun = {
        let mut guard = state.borrow_mut();
        let s = &mut *guard;
        if let Some(ref dash) = s.dashboard {
            s.input.set_text(dash.question_text());
        }
        match s.submission.begin(&s.subject, &s.input) {
            Ok(request) => {
                if let Some(ref dash) = s.dashboard {
                    dash.render_submission(s.submission.state());
                }
                Some(request)
            }
            Err(SubmitError::EmptyInput) => {
                s.show_toast(&SubmitError::EmptyInput.to_string());
                None
            }
            Err(SubmitError::InFlight) => None,
        }
    };

    if let Some(request) = begun {
        dispatch_submission(state, request);
    }
}

fn describe(state: &brainbox::SubmissionState) -> String {
    match state {
        brainbox::SubmissionState::Succeeded(answer) => {
            format!("answered \"{}\"", answer.quick_answer())
        }
        brainbox::SubmissionState::Failed(kind, _) => format!("failed ({kind})"),
        other => format!("{other:?}"),
    }
}
