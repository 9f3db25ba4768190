mod camera;
mod event_handler;
mod pipeline;
mod state;

pub use camera::dismiss_camera;
pub use event_handler::handle_backend_event;
pub use pipeline::cancel_submission;
pub use state::{AppState, BackendEvent};
