pub mod checker;
pub mod config;
pub mod evaluator;
pub mod logging;
pub mod models;
pub mod plugins;
pub mod scheduler;
pub mod session;
pub mod utils;
pub mod web;

// Re-export commonly used types
pub use checker::{check_once, CycleRunner, SiteChecker};
pub use config::AppConfig;
pub use evaluator::{CycleOutcome, Evaluator};
pub use models::{CheckConfig, CheckRequest, ResultRow};
pub use scheduler::{CheckScheduler, JobInfo, SchedulerState, SchedulerStatus};
pub use utils::error::AppError;

pub type Result<T> = std::result::Result<T, AppError>;
