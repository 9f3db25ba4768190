use gtk4::prelude::*;
use gtk4::{gdk, glib};
use image::RgbImage;

use crate::app::BackendEvent;

/// Camera dialog phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraPhase {
    Starting,
    Live,
}

/// Handles returned from building the camera dialog.
pub struct CameraDialogWidgets {
    pub window: gtk4::Window,
    pub picture: gtk4::Picture,
    pub status_label: gtk4::Label,
    pub snap_button: gtk4::Button,
}

/// Update dialog widgets to reflect the camera phase.
pub fn set_camera_phase(dialog: &CameraDialogWidgets, phase: &CameraPhase) {
    match phase {
        CameraPhase::Starting => {
            dialog.picture.set_paintable(None::<&gdk::Paintable>);
            dialog.status_label.set_text("Starting camera\u{2026}");
            dialog.status_label.set_visible(true);
            dialog.snap_button.set_sensitive(false);
        }
        CameraPhase::Live => {
            dialog.status_label.set_visible(false);
            dialog.snap_button.set_sensitive(true);
        }
    }
}

/// Show a preview frame.
pub fn show_frame(dialog: &CameraDialogWidgets, frame: RgbImage) {
    let (width, height) = frame.dimensions();
    let bytes = glib::Bytes::from_owned(frame.into_raw());
    let texture = gdk::MemoryTexture::new(
        width as i32,
        height as i32,
        gdk::MemoryFormat::R8g8b8,
        &bytes,
        width as usize * 3,
    );
    dialog.picture.set_paintable(Some(&texture));
}

/// Build the modal camera dialog. Snap and close are reported as events;
/// closing the window by any means counts as a dismissal.
pub fn build_camera_dialog(
    parent: &libadwaita::ApplicationWindow,
    backend_sender: async_channel::Sender<BackendEvent>,
) -> CameraDialogWidgets {
    let window = gtk4::Window::builder()
        .title("Capture Image")
        .transient_for(parent)
        .modal(true)
        .default_width(640)
        .default_height(520)
        .build();

    let vbox = gtk4::Box::new(gtk4::Orientation::Vertical, 12);
    vbox.set_margin_start(12);
    vbox.set_margin_end(12);
    vbox.set_margin_top(12);
    vbox.set_margin_bottom(12);

    let overlay = gtk4::Overlay::new();
    let picture = gtk4::Picture::new();
    picture.set_content_fit(gtk4::ContentFit::Contain);
    picture.set_vexpand(true);
    picture.set_hexpand(true);
    overlay.set_child(Some(&picture));

    let status_label = gtk4::Label::new(None);
    status_label.add_css_class("title-4");
    status_label.set_halign(gtk4::Align::Center);
    status_label.set_valign(gtk4::Align::Center);
    overlay.add_overlay(&status_label);
    vbox.append(&overlay);

    let button_row = gtk4::Box::new(gtk4::Orientation::Horizontal, 12);
    button_row.set_halign(gtk4::Align::Center);

    let close_button = gtk4::Button::with_label("Cancel");
    close_button.add_css_class("pill");
    let snap_button = gtk4::Button::with_label("Snap Photo");
    snap_button.add_css_class("pill");
    snap_button.add_css_class("suggested-action");
    snap_button.set_sensitive(false);

    button_row.append(&close_button);
    button_row.append(&snap_button);
    vbox.append(&button_row);
    window.set_child(Some(&vbox));

    {
        let sender = backend_sender.clone();
        snap_button.connect_clicked(move |_| {
            let _ = sender.try_send(BackendEvent::SnapClicked);
        });
    }
    {
        let sender = backend_sender.clone();
        close_button.connect_clicked(move |_| {
            let _ = sender.try_send(BackendEvent::CameraDismissed);
        });
    }

    let sender_for_close = backend_sender;
    window.connect_close_request(move |w| {
        let _ = sender_for_close.try_send(BackendEvent::CameraDismissed);
        w.set_visible(false);
        glib::Propagation::Stop
    });

    CameraDialogWidgets {
        window,
        picture,
        status_label,
        snap_button,
    }
}
