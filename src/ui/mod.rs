pub mod camera_dialog;
pub mod dashboard;
