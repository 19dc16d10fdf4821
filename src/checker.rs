use async_trait::async_trait;
use std::sync::Arc;
use tokio::time::Instant;

use crate::config::AppConfig;
use crate::evaluator::{CycleOutcome, Evaluator};
use crate::models::CheckConfig;
use crate::plugins::notifiers::EmailNotifier;
use crate::plugins::traits::NotifierPlugin;
use crate::session::{ChromeSessionFactory, PageSession, SessionFactory};
use crate::utils::error::InteractionError;

/// One complete poll-interact-evaluate-notify pass.
#[async_trait]
pub trait CycleRunner: Send + Sync {
    async fn run_cycle(&self, config: &CheckConfig) -> Result<CycleOutcome, InteractionError>;
}

pub struct SiteChecker {
    sessions: Arc<dyn SessionFactory>,
    evaluator: Evaluator,
    notifier: Arc<dyn NotifierPlugin>,
}

impl SiteChecker {
    pub fn new(
        sessions: Arc<dyn SessionFactory>,
        evaluator: Evaluator,
        notifier: Arc<dyn NotifierPlugin>,
    ) -> Self {
        Self {
            sessions,
            evaluator,
            notifier,
        }
    }

    /// Headless Chrome against the configured target, email for notifications.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            Arc::new(ChromeSessionFactory::new(config.browser.clone(), &config.target)),
            Evaluator::new(config.target.clone(), config.notifications.subject.clone()),
            Arc::new(EmailNotifier::new(config.notifications.smtp.clone())),
        )
    }
}

#[async_trait]
impl CycleRunner for SiteChecker {
    async fn run_cycle(&self, config: &CheckConfig) -> Result<CycleOutcome, InteractionError> {
        let start_time = Instant::now();

        let session = self.sessions.open().await.inspect_err(|e| {
            tracing::error!("Error checking website: {}", e);
        })?;

        let result = self
            .evaluator
            .run(
                session.as_ref(),
                self.notifier.as_ref(),
                config.search_term(),
                config.distance_threshold(),
            )
            .await;

        release(session).await;

        match &result {
            Ok(outcome) => tracing::info!(
                "Check for '{}' finished in {}ms: {} rows, match: {}",
                config.search_term(),
                start_time.elapsed().as_millis(),
                outcome.rows_found,
                outcome
                    .matched
                    .as_ref()
                    .map(|m| format!("{} at {}", m.label, m.distance))
                    .unwrap_or_else(|| "none".to_string())
            ),
            Err(e) => tracing::error!("Error interacting with the page: {}", e),
        }

        result
    }
}

/// Close the tab and reap the browser process on the blocking pool. Runs
/// whatever the cycle's outcome.
async fn release(session: Box<dyn PageSession>) {
    if let Err(e) = tokio::task::spawn_blocking(move || drop(session)).await {
        tracing::warn!("Browser teardown task failed: {}", e);
    }
}

/// Run a single cycle and log instead of propagating; used by one-shot mode.
pub async fn check_once(runner: &dyn CycleRunner, config: &CheckConfig) -> Option<CycleOutcome> {
    match runner.run_cycle(config).await {
        Ok(outcome) => Some(outcome),
        Err(e) => {
            tracing::error!("Error checking website: {}", e);
            None
        }
    }
}
