pub mod error;

pub use error::{AppError, InteractionError, NotificationError, ValidationError};
