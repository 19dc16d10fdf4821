use config::{Config, ConfigError, Environment, File, FileFormat};
use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::models::CheckRequest;

const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub target: TargetConfig,
    pub browser: BrowserConfig,
    pub check: CheckDefaults,
    pub scheduler: SchedulerConfig,
    pub notifications: NotificationsConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

/// The HTML contract of the watched page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    pub url: String,
    pub input_selector: String,
    pub refresh_selector: String,
    pub row_selector: String,
    pub cell_selector: String,
    pub distance_column: usize,
    pub wait_timeout_secs: u64,
}

impl TargetConfig {
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    pub headless: bool,
    pub sandbox: bool,
    pub window_width: u32,
    pub window_height: u32,
    pub chrome_path: Option<String>,
    pub user_agent: Option<String>,
}

/// Values used when the operator does not supply them (one-shot mode and
/// the initial contents of the web form).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckDefaults {
    pub search_term: String,
    pub distance_threshold: f64,
    pub interval_minutes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub poll_slice_ms: u64,
    pub run_on_start: bool,
}

impl SchedulerConfig {
    pub fn poll_slice(&self) -> Duration {
        Duration::from_millis(self.poll_slice_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    pub subject: String,
    pub smtp: SmtpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub use_tls: bool,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub filter: String,
    pub directory: Option<String>,
    pub file_prefix: String,
}

impl AppConfig {
    /// Layered load: embedded defaults, `config/{RUN_MODE}`, `config/local`,
    /// an optional explicit file, then `SCOUT__*` environment variables.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let mut builder = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(File::with_name("config/local").required(false));

        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path));
        }

        let s = builder
            .add_source(
                Environment::with_prefix("SCOUT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: AppConfig = s.try_deserialize()?;

        if config.browser.chrome_path.is_none() {
            config.browser.chrome_path = env::var("CHROME_PATH").ok();
        }

        config.validate()?;
        Ok(config)
    }

    /// Only the embedded defaults, no files or environment.
    pub fn defaults() -> Result<Self, ConfigError> {
        let config: AppConfig = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if Url::parse(&self.target.url).is_err() {
            return Err(ConfigError::Message(format!(
                "Invalid target URL: {}",
                self.target.url
            )));
        }

        for (name, selector) in [
            ("input_selector", &self.target.input_selector),
            ("refresh_selector", &self.target.refresh_selector),
            ("row_selector", &self.target.row_selector),
            ("cell_selector", &self.target.cell_selector),
        ] {
            if selector.trim().is_empty() || Selector::parse(selector).is_err() {
                return Err(ConfigError::Message(format!(
                    "Invalid CSS selector in target.{}: '{}'",
                    name, selector
                )));
            }
        }

        if self.target.wait_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "Target wait_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.scheduler.poll_slice_ms == 0 {
            return Err(ConfigError::Message(
                "Scheduler poll_slice_ms must be greater than 0".into(),
            ));
        }

        if self.notifications.smtp.host.trim().is_empty() {
            return Err(ConfigError::Message("SMTP host is required".into()));
        }

        if self.notifications.smtp.port == 0 {
            return Err(ConfigError::Message("SMTP port must be greater than 0".into()));
        }

        if self.server.port == 0 {
            return Err(ConfigError::Message("Server port must be greater than 0".into()));
        }

        CheckRequest::from(&self.check)
            .validate()
            .map_err(|e| ConfigError::Message(format!("Invalid check defaults: {}", e)))?;

        Ok(())
    }
}
