mod app;
mod ui;

use std::cell::RefCell;
use std::rc::Rc;

use gtk4::prelude::*;
use libadwaita::prelude::*;

use app::{AppState, BackendEvent};

fn main() {
    env_logger::init();
    log::info!("BrainBox starting");

    let application = libadwaita::Application::builder()
        .application_id("io.github.brainbox.BrainBox")
        .build();

    application.connect_activate(on_activate);
    application.run();
}

fn on_activate(app: &libadwaita::Application) {
    // Widgets and background tasks → main loop
    let (backend_tx, backend_rx) = async_channel::unbounded::<BackendEvent>();

    let state = Rc::new(RefCell::new(AppState::new(backend_tx.clone())));

    ui::dashboard::apply_theme(state.borrow().config.theme);

    // Build UI
    let dashboard = ui::dashboard::build_dashboard(app, &state.borrow().config, backend_tx.clone());
    let camera_dialog = ui::camera_dialog::build_camera_dialog(&dashboard.window, backend_tx);

    // Wire up API key changes
    {
        let state_clone = state.clone();
        dashboard
            .api_key_row
            .connect_changed(move |row: &libadwaita::PasswordEntryRow| {
                let key = row.text().trim().to_string();
                let mut s = state_clone.borrow_mut();
                if key == s.config.gemini_api_key {
                    return;
                }
                s.config.gemini_api_key = key;
                s.config.api_key_from_env = false;
                s.save_config();
            });
    }

    // Release the camera and abort any request when the window goes away
    {
        let state_clone = state.clone();
        dashboard.window.connect_close_request(move |_| {
            app::dismiss_camera(&state_clone);
            app::cancel_submission(&state_clone);
            gtk4::glib::Propagation::Proceed
        });
    }

    // Store UI handles in state
    {
        let mut s = state.borrow_mut();
        s.dashboard = Some(dashboard);
        s.camera_dialog = Some(camera_dialog);
    }

    if let Some(ref dash) = state.borrow().dashboard {
        dash.window.present();
    }

    // Attach backend event handler
    {
        let state_clone = state.clone();
        gtk4::glib::spawn_future_local(async move {
            while let Ok(event) = backend_rx.recv().await {
                app::handle_backend_event(&state_clone, event);
            }
        });
    }
}
