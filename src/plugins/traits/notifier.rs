use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::utils::error::NotificationError;

/// One outgoing message. Built for the triggering row and consumed right away.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub subject: String,
    pub body: String,
}

impl NotificationEvent {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationResult {
    pub success: bool,
    pub message_id: Option<String>,
    pub error: Option<String>,
}

impl NotificationResult {
    pub fn sent(message_id: impl Into<String>) -> Self {
        Self {
            success: true,
            message_id: Some(message_id.into()),
            error: None,
        }
    }

    pub fn failed(error: &NotificationError) -> Self {
        Self {
            success: false,
            message_id: None,
            error: Some(error.to_string()),
        }
    }
}

/// Delivery capability handed to the evaluator.
///
/// Implementations never fail the caller: delivery problems are logged and
/// reported through [`NotificationResult::success`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotifierPlugin: Send + Sync {
    async fn notify(&self, event: &NotificationEvent) -> NotificationResult;
}
