use serde::{Deserialize, Serialize};

use crate::config::TargetConfig;
use crate::models::ResultRow;
use crate::plugins::traits::{NotificationEvent, NotificationResult, NotifierPlugin};
use crate::session::PageSession;
use crate::utils::error::InteractionError;

/// The first row whose distance was at or below the threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedRow {
    pub index: usize,
    pub label: String,
    pub distance: f64,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowScan {
    pub scanned: usize,
    pub skipped: usize,
    pub matched: Option<MatchedRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleOutcome {
    pub rows_found: usize,
    pub rows_scanned: usize,
    pub rows_skipped: usize,
    pub matched: Option<MatchedRow>,
    pub notification: Option<NotificationResult>,
}

impl CycleOutcome {
    pub fn notified(&self) -> bool {
        self.notification.as_ref().is_some_and(|n| n.success)
    }
}

/// Walk rows in order and stop at the first distance `<= threshold`.
/// Short rows and unparsable distances are logged and skipped.
pub fn find_first_match(rows: &[ResultRow], column: usize, threshold: f64) -> RowScan {
    let mut scan = RowScan::default();

    for (index, row) in rows.iter().enumerate() {
        scan.scanned += 1;

        let Some(raw) = row.cell(column) else {
            tracing::warn!("Row does not have enough columns: {}", row.text());
            scan.skipped += 1;
            continue;
        };

        let raw = raw.trim();
        let distance = match raw.parse::<f64>() {
            Ok(distance) => distance,
            Err(_) => {
                tracing::warn!("Invalid distance value: {}", raw);
                scan.skipped += 1;
                continue;
            }
        };

        if distance <= threshold {
            scan.matched = Some(MatchedRow {
                index,
                label: row.label().to_string(),
                distance,
                text: row.text(),
            });
            break;
        }
    }

    scan
}

pub struct Evaluator {
    target: TargetConfig,
    subject: String,
}

impl Evaluator {
    pub fn new(target: TargetConfig, subject: impl Into<String>) -> Self {
        Self {
            target,
            subject: subject.into(),
        }
    }

    pub fn notification_for(&self, search_term: &str, matched: &MatchedRow) -> NotificationEvent {
        NotificationEvent::new(
            self.subject.clone(),
            format!(
                "The condition '{}' was found with distance {} in the data table.",
                search_term, matched.distance
            ),
        )
    }

    /// One interaction pass against an already loaded page. Notifies at most once.
    pub async fn run(
        &self,
        session: &dyn PageSession,
        notifier: &dyn NotifierPlugin,
        search_term: &str,
        threshold: f64,
    ) -> Result<CycleOutcome, InteractionError> {
        let target = &self.target;
        let timeout = target.wait_timeout();

        session
            .wait_for_interactable(&target.input_selector, timeout)
            .await?;
        session.set_value(&target.input_selector, search_term).await?;

        session
            .wait_for_interactable(&target.refresh_selector, timeout)
            .await?;
        session.click(&target.refresh_selector).await?;

        let rows = session
            .wait_for_rows(&target.row_selector, &target.cell_selector, timeout)
            .await?;
        if rows.is_empty() {
            return Err(InteractionError::NoRows {
                selector: target.row_selector.clone(),
                timeout_secs: target.wait_timeout_secs,
            });
        }
        tracing::info!("Found {} rows.", rows.len());

        let scan = find_first_match(&rows, target.distance_column, threshold);

        let notification = match &scan.matched {
            Some(matched) => {
                tracing::info!(
                    "Condition met: Distance {} <= {} in system: {}",
                    matched.distance,
                    threshold,
                    matched.label
                );
                let event = self.notification_for(search_term, matched);
                Some(notifier.notify(&event).await)
            }
            None => {
                tracing::debug!("No row at or below {} for '{}'", threshold, search_term);
                None
            }
        };

        Ok(CycleOutcome {
            rows_found: rows.len(),
            rows_scanned: scan.scanned,
            rows_skipped: scan.skipped,
            matched: scan.matched,
            notification,
        })
    }
}
