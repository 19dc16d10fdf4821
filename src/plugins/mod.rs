pub mod traits;
pub mod notifiers;

pub use notifiers::EmailNotifier;
pub use traits::{NotificationEvent, NotificationResult, NotifierPlugin};
