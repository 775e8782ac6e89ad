/// Result alias that carries the custom [`ShowcaseError`] type.
pub type Result<T> = std::result::Result<T, ShowcaseError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum ShowcaseError {
    /// Free-form error used by collaborators that only have a readable
    /// message to report (for example a scene observer signalling that the
    /// renderer could not apply a snapshot).
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Wrapper around settings (de)serialization errors.
    #[error("{0}")]
    Serialization(#[from] serde_json::Error),
}

impl ShowcaseError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}

impl From<&str> for ShowcaseError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for ShowcaseError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
