use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::CheckDefaults;
use crate::utils::error::ValidationError;

/// One week.
pub const MAX_INTERVAL_MINUTES: i64 = 7 * 24 * 60;

/// A validated watch configuration. Only constructed through [`CheckConfig::new`]
/// or [`CheckRequest::validate`], so every instance satisfies the invariants.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckConfig {
    search_term: String,
    distance_threshold: f64,
    interval_minutes: u64,
}

impl CheckConfig {
    pub fn new(
        search_term: impl Into<String>,
        distance_threshold: f64,
        interval_minutes: i64,
    ) -> Result<Self, ValidationError> {
        let search_term = search_term.into().trim().to_string();
        if search_term.is_empty() {
            return Err(ValidationError::EmptySearchTerm);
        }

        // NaN fails the comparison and is rejected with the rest
        if !(distance_threshold > 0.0) || !distance_threshold.is_finite() {
            return Err(ValidationError::NonPositiveThreshold(distance_threshold));
        }

        if interval_minutes <= 0 {
            return Err(ValidationError::NonPositiveInterval(interval_minutes));
        }
        if interval_minutes > MAX_INTERVAL_MINUTES {
            return Err(ValidationError::IntervalTooLong {
                value: interval_minutes,
                max: MAX_INTERVAL_MINUTES,
            });
        }

        Ok(Self {
            search_term,
            distance_threshold,
            interval_minutes: interval_minutes as u64,
        })
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn distance_threshold(&self) -> f64 {
        self.distance_threshold
    }

    pub fn interval_minutes(&self) -> u64 {
        self.interval_minutes
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes * 60)
    }
}

/// Raw operator input, exactly as typed into the form or passed on the
/// command line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckRequest {
    pub search_term: String,
    pub distance_threshold: String,
    pub interval_minutes: String,
}

impl CheckRequest {
    pub fn new(
        search_term: impl Into<String>,
        distance_threshold: impl Into<String>,
        interval_minutes: impl Into<String>,
    ) -> Self {
        Self {
            search_term: search_term.into(),
            distance_threshold: distance_threshold.into(),
            interval_minutes: interval_minutes.into(),
        }
    }

    pub fn validate(&self) -> Result<CheckConfig, ValidationError> {
        if self.search_term.trim().is_empty() {
            return Err(ValidationError::EmptySearchTerm);
        }

        let threshold = self.distance_threshold.trim();
        let threshold: f64 = threshold.parse().map_err(|_| ValidationError::NotANumber {
            field: "Distance threshold",
            value: threshold.to_string(),
        })?;

        let interval = self.interval_minutes.trim();
        let interval: i64 = interval.parse().map_err(|_| ValidationError::NotANumber {
            field: "Interval",
            value: interval.to_string(),
        })?;

        CheckConfig::new(self.search_term.as_str(), threshold, interval)
    }
}

impl From<&CheckDefaults> for CheckRequest {
    fn from(defaults: &CheckDefaults) -> Self {
        Self::new(
            defaults.search_term.clone(),
            defaults.distance_threshold.to_string(),
            defaults.interval_minutes.to_string(),
        )
    }
}

impl From<&CheckConfig> for CheckRequest {
    fn from(config: &CheckConfig) -> Self {
        Self::new(
            config.search_term.clone(),
            config.distance_threshold.to_string(),
            config.interval_minutes.to_string(),
        )
    }
}
