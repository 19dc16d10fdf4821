use thiserror::Error;

/// Rejected operator input. Nothing is scheduled when one of these is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Search term is required")]
    EmptySearchTerm,

    #[error("Distance threshold must be a positive number, got {0}")]
    NonPositiveThreshold(f64),

    #[error("Interval must be a positive number of minutes, got {0}")]
    NonPositiveInterval(i64),

    #[error("Interval must be at most {max} minutes, got {value}")]
    IntervalTooLong { value: i64, max: i64 },

    #[error("{field} must be a number, got '{value}'")]
    NotANumber { field: &'static str, value: String },
}

/// The target page did not honour its contract, or the browser failed.
/// Aborts the current cycle only.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InteractionError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Element not found: {selector} (waited {timeout_secs}s)")]
    ElementNotFound { selector: String, timeout_secs: u64 },

    #[error("Element is not interactable: {selector}")]
    NotInteractable { selector: String },

    #[error("Script on {selector} failed: {message}")]
    Script { selector: String, message: String },

    #[error("No result rows matched {selector} within {timeout_secs}s")]
    NoRows { selector: String, timeout_secs: u64 },

    #[error("Failed to read page content: {0}")]
    Content(String),

    #[error("Background task failed: {0}")]
    Task(String),
}

/// Email could not be delivered. Always logged and swallowed by the notifier.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NotificationError {
    #[error("Email credentials are missing. Set EMAIL_USER and EMAIL_PASSWORD")]
    MissingCredentials,

    #[error("Invalid email address '{address}': {message}")]
    InvalidAddress { address: String, message: String },

    #[error("Failed to build message: {0}")]
    Build(String),

    #[error("SMTP transport error: {0}")]
    Transport(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Interaction error: {0}")]
    Interaction(#[from] InteractionError),

    #[error("Notification error: {0}")]
    Notification(#[from] NotificationError),
}

pub type Result<T> = std::result::Result<T, AppError>;
