use std::fmt;

/// Every way a question can fail to turn into an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Nothing to send: no text and no image.
    EmptyInput,
    PermissionDenied,
    DeviceUnavailable,
    /// Capture requested while no camera stream is open.
    NotActive,
    /// A pending camera open was interrupted by close().
    Cancelled,
    FileReadError,
    Network,
    ServiceRejected,
    EmptyResponse,
    /// No Gemini API key in the config or the environment.
    MissingApiKey,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::EmptyInput => "empty input",
            ErrorKind::PermissionDenied => "permission denied",
            ErrorKind::DeviceUnavailable => "device unavailable",
            ErrorKind::NotActive => "camera not active",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::FileReadError => "file read error",
            ErrorKind::Network => "network error",
            ErrorKind::ServiceRejected => "service rejected",
            ErrorKind::EmptyResponse => "empty response",
            ErrorKind::MissingApiKey => "missing API key",
        };
        f.write_str(name)
    }
}
