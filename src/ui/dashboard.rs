use gtk4::prelude::*;
use libadwaita::prelude::*;

use brainbox::config::{Config, Theme};
use brainbox::view::{self, ResultView};
use brainbox::SubmissionState;

use crate::app::BackendEvent;

/// Subject cards, in display order.
pub const SUBJECTS: &[&str] = &[
    "General",
    "Mathematics",
    "Physics",
    "Chemistry",
    "Computer Science",
    "Electronics",
    "Mechanical Engineering",
    "Electrical Engineering",
];

/// Handles returned from building the dashboard window.
pub struct DashboardWidgets {
    pub window: libadwaita::ApplicationWindow,
    pub toast_overlay: libadwaita::ToastOverlay,
    pub question_view: gtk4::TextView,
    pub image_status_label: gtk4::Label,
    pub submit_button: gtk4::Button,
    pub submit_spinner: gtk4::Spinner,
    pub submit_label: gtk4::Label,
    pub result_box: gtk4::Box,
    pub quick_label: gtk4::Label,
    pub detailed_label: gtk4::Label,
    pub api_key_row: libadwaita::PasswordEntryRow,
}

impl DashboardWidgets {
    pub fn question_text(&self) -> String {
        let buffer = self.question_view.buffer();
        buffer
            .text(&buffer.start_iter(), &buffer.end_iter(), false)
            .to_string()
    }

    pub fn set_image_status(&self, text: &str, is_error: bool) {
        self.image_status_label.set_text(text);
        if is_error {
            self.image_status_label.add_css_class("error");
        } else {
            self.image_status_label.remove_css_class("error");
        }
    }

    pub fn show_toast(&self, message: &str) {
        let toast = libadwaita::Toast::new(message);
        toast.set_timeout(3);
        self.toast_overlay.add_toast(toast);
    }

    /// Render the submit button and result panel for a submission state.
    pub fn render_submission(&self, state: &SubmissionState) {
        let (label, sensitive) = view::submit_button(state);
        self.submit_label.set_text(label);
        self.submit_button.set_sensitive(sensitive);
        self.submit_spinner.set_visible(!sensitive);
        self.submit_spinner.set_spinning(!sensitive);

        let result = ResultView::from_state(state);
        match &result {
            ResultView::Hidden | ResultView::Loading => {
                self.quick_label.set_text("");
                self.detailed_label.set_text("");
            }
            ResultView::Answer { quick, detailed } | ResultView::Error { quick, detailed } => {
                self.quick_label.set_text(quick);
                self.detailed_label.set_text(detailed);
            }
        }
        if result.is_error() {
            self.detailed_label.add_css_class("error");
        } else {
            self.detailed_label.remove_css_class("error");
        }
        self.result_box.set_visible(result.panel_visible());
    }
}

/// Apply a theme preference to the whole application.
pub fn apply_theme(theme: Theme) {
    let scheme = match theme {
        Theme::System => libadwaita::ColorScheme::Default,
        Theme::Light => libadwaita::ColorScheme::ForceLight,
        Theme::Dark => libadwaita::ColorScheme::ForceDark,
    };
    libadwaita::StyleManager::default().set_color_scheme(scheme);
}

/// Build the main window.
pub fn build_dashboard(
    app: &libadwaita::Application,
    config: &Config,
    sender: async_channel::Sender<BackendEvent>,
) -> DashboardWidgets {
    let window = libadwaita::ApplicationWindow::builder()
        .application(app)
        .title("BTech BrainBox")
        .default_width(560)
        .default_height(720)
        .build();

    let toolbar_view = libadwaita::ToolbarView::new();
    let header = libadwaita::HeaderBar::new();

    // Dark mode switch
    let theme_box = gtk4::Box::new(gtk4::Orientation::Horizontal, 6);
    let theme_icon = gtk4::Image::from_icon_name("weather-clear-night-symbolic");
    let theme_switch = gtk4::Switch::builder()
        .valign(gtk4::Align::Center)
        .tooltip_text("Dark mode")
        .build();
    theme_switch.set_active(match config.theme {
        Theme::Dark => true,
        Theme::Light => false,
        Theme::System => libadwaita::StyleManager::default().is_dark(),
    });
    {
        let sender = sender.clone();
        theme_switch.connect_active_notify(move |switch| {
            let _ = sender.try_send(BackendEvent::ThemeToggled(switch.is_active()));
        });
    }
    theme_box.append(&theme_icon);
    theme_box.append(&theme_switch);
    header.pack_end(&theme_box);

    toolbar_view.add_top_bar(&header);

    let content = gtk4::Box::new(gtk4::Orientation::Vertical, 12);
    content.set_margin_start(16);
    content.set_margin_end(16);
    content.set_margin_top(12);
    content.set_margin_bottom(12);

    // --- Subject group ---
    let subject_group = libadwaita::PreferencesGroup::new();
    subject_group.set_title("Subject");

    let subject_box = gtk4::FlowBox::builder()
        .selection_mode(gtk4::SelectionMode::None)
        .max_children_per_line(4)
        .column_spacing(6)
        .row_spacing(6)
        .homogeneous(true)
        .build();

    let mut first_button: Option<gtk4::ToggleButton> = None;
    for &subject in SUBJECTS {
        let button = gtk4::ToggleButton::with_label(subject);
        match first_button {
            Some(ref first) => button.set_group(Some(first)),
            None => first_button = Some(button.clone()),
        }
        button.set_active(subject == config.default_subject);

        let sender = sender.clone();
        button.connect_toggled(move |b| {
            if b.is_active() {
                let _ = sender.try_send(BackendEvent::SubjectSelected(subject.to_string()));
            }
        });
        subject_box.insert(&button, -1);
    }
    subject_group.add(&subject_box);
    content.append(&subject_group);

    // --- Question group ---
    let question_group = libadwaita::PreferencesGroup::new();
    question_group.set_title("Your Question");

    let question_view = gtk4::TextView::builder()
        .wrap_mode(gtk4::WrapMode::WordChar)
        .top_margin(8)
        .bottom_margin(8)
        .left_margin(8)
        .right_margin(8)
        .build();
    let question_scroll = gtk4::ScrolledWindow::builder()
        .hscrollbar_policy(gtk4::PolicyType::Never)
        .min_content_height(110)
        .child(&question_view)
        .build();
    question_scroll.add_css_class("card");
    question_group.add(&question_scroll);

    let image_row = gtk4::Box::new(gtk4::Orientation::Horizontal, 8);
    image_row.set_margin_top(8);

    let upload_button = gtk4::Button::builder()
        .icon_name("document-open-symbolic")
        .tooltip_text("Upload an image")
        .build();
    let capture_button = gtk4::Button::builder()
        .icon_name("camera-photo-symbolic")
        .tooltip_text("Capture with camera")
        .build();
    let image_status_label = gtk4::Label::new(None);
    image_status_label.add_css_class("dim-label");
    image_status_label.set_hexpand(true);
    image_status_label.set_xalign(0.0);
    image_status_label.set_ellipsize(gtk4::pango::EllipsizeMode::Middle);

    image_row.append(&upload_button);
    image_row.append(&capture_button);
    image_row.append(&image_status_label);
    question_group.add(&image_row);
    content.append(&question_group);

    {
        let sender = sender.clone();
        let parent = window.clone();
        upload_button.connect_clicked(move |_| {
            choose_image_file(&parent, sender.clone());
        });
    }
    {
        let sender = sender.clone();
        capture_button.connect_clicked(move |_| {
            let _ = sender.try_send(BackendEvent::CameraRequested);
        });
    }

    // --- Submit button ---
    let submit_spinner = gtk4::Spinner::new();
    submit_spinner.set_visible(false);
    let submit_label = gtk4::Label::new(Some(view::SUBMIT_LABEL));
    let submit_content = gtk4::Box::new(gtk4::Orientation::Horizontal, 8);
    submit_content.set_halign(gtk4::Align::Center);
    submit_content.append(&submit_spinner);
    submit_content.append(&submit_label);

    let submit_button = gtk4::Button::builder().child(&submit_content).build();
    submit_button.add_css_class("suggested-action");
    submit_button.add_css_class("pill");
    {
        let sender = sender.clone();
        submit_button.connect_clicked(move |_| {
            let _ = sender.try_send(BackendEvent::SubmitClicked);
        });
    }
    content.append(&submit_button);

    // --- Result panel ---
    let result_box = gtk4::Box::new(gtk4::Orientation::Vertical, 6);
    result_box.add_css_class("card");
    result_box.set_visible(false);

    let quick_heading = gtk4::Label::new(Some("Quick Answer"));
    quick_heading.add_css_class("heading");
    quick_heading.set_xalign(0.0);
    let quick_label = result_label();
    quick_label.add_css_class("title-3");

    let detailed_heading = gtk4::Label::new(Some("Detailed Solution"));
    detailed_heading.add_css_class("heading");
    detailed_heading.set_xalign(0.0);
    detailed_heading.set_margin_top(8);
    let detailed_label = result_label();

    for widget in [&quick_heading, &quick_label, &detailed_heading, &detailed_label] {
        widget.set_margin_start(12);
        widget.set_margin_end(12);
    }
    quick_heading.set_margin_top(12);
    detailed_label.set_margin_bottom(12);

    result_box.append(&quick_heading);
    result_box.append(&quick_label);
    result_box.append(&detailed_heading);
    result_box.append(&detailed_label);
    content.append(&result_box);

    // --- API Key group ---
    let api_group = libadwaita::PreferencesGroup::new();
    api_group.set_title("Gemini API");
    if config.api_key_from_env {
        api_group.set_description(Some("Using the key from GEMINI_API_KEY"));
    }

    let api_key_row = libadwaita::PasswordEntryRow::builder()
        .title("API Key")
        .text(config.gemini_api_key.as_str())
        .build();
    api_group.add(&api_key_row);
    content.append(&api_group);

    // Assemble
    let scrolled = gtk4::ScrolledWindow::builder()
        .hscrollbar_policy(gtk4::PolicyType::Never)
        .child(&content)
        .build();
    toolbar_view.set_content(Some(&scrolled));

    let toast_overlay = libadwaita::ToastOverlay::new();
    toast_overlay.set_child(Some(&toolbar_view));
    window.set_content(Some(&toast_overlay));

    DashboardWidgets {
        window,
        toast_overlay,
        question_view,
        image_status_label,
        submit_button,
        submit_spinner,
        submit_label,
        result_box,
        quick_label,
        detailed_label,
        api_key_row,
    }
}

fn result_label() -> gtk4::Label {
    let label = gtk4::Label::new(None);
    label.set_wrap(true);
    label.set_xalign(0.0);
    label.set_selectable(true);
    label
}

/// Ask for an image file and report the pick as `UploadChosen`.
fn choose_image_file(
    parent: &libadwaita::ApplicationWindow,
    sender: async_channel::Sender<BackendEvent>,
) {
    let filter = gtk4::FileFilter::new();
    filter.set_name(Some("Images"));
    filter.add_mime_type("image/*");
    let filters = gtk4::gio::ListStore::new::<gtk4::FileFilter>();
    filters.append(&filter);

    let dialog = gtk4::FileDialog::builder()
        .title("Choose an image")
        .modal(true)
        .filters(&filters)
        .build();

    dialog.open(
        Some(parent),
        None::<&gtk4::gio::Cancellable>,
        move |result| match result {
            Ok(file) => match file.path() {
                Some(path) => {
                    let _ = sender.try_send(BackendEvent::UploadChosen(path));
                }
                None => log::warn!("Selected file has no local path"),
            },
            Err(e) => log::debug!("File dialog dismissed: {e}"),
        },
    );
}
