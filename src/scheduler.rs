use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use uuid::Uuid;

use crate::checker::CycleRunner;
use crate::config::SchedulerConfig;
use crate::models::{CheckConfig, CheckRequest};
use crate::utils::error::ValidationError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerState {
    Idle,
    Running,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobInfo {
    pub id: Uuid,
    pub search_term: String,
    pub distance_threshold: f64,
    pub interval_minutes: u64,
    pub created_at: DateTime<Utc>,
    pub last_run: Option<DateTime<Utc>>,
    pub run_count: u64,
    pub success_count: u64,
    pub error_count: u64,
    pub notifications_sent: u64,
    pub last_error: Option<String>,
}

impl JobInfo {
    fn new(config: &CheckConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            search_term: config.search_term().to_string(),
            distance_threshold: config.distance_threshold(),
            interval_minutes: config.interval_minutes(),
            created_at: Utc::now(),
            last_run: None,
            run_count: 0,
            success_count: 0,
            error_count: 0,
            notifications_sent: 0,
            last_error: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerStatus {
    pub state: SchedulerState,
    pub job: Option<JobInfo>,
    pub uptime_seconds: u64,
}

struct ActiveSchedule {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
    job: Arc<RwLock<JobInfo>>,
}

/// Runs one check job on a fixed interval from a background task.
///
/// At most one job exists at a time; starting again replaces it. Cycles never
/// overlap, even across a replacement, because every timer shares `cycle_lock`.
pub struct CheckScheduler {
    runner: Arc<dyn CycleRunner>,
    config: SchedulerConfig,
    active: Mutex<Option<ActiveSchedule>>,
    cycle_lock: Arc<Mutex<()>>,
    start_time: DateTime<Utc>,
}

impl CheckScheduler {
    pub fn new(runner: Arc<dyn CycleRunner>, config: SchedulerConfig) -> Self {
        Self {
            runner,
            config,
            active: Mutex::new(None),
            cycle_lock: Arc::new(Mutex::new(())),
            start_time: Utc::now(),
        }
    }

    /// Validate operator input and (re)schedule. Invalid input leaves any
    /// existing schedule untouched.
    pub async fn start(&self, request: &CheckRequest) -> Result<JobInfo, ValidationError> {
        let config = request.validate()?;
        Ok(self.start_config(config).await)
    }

    pub async fn start_config(&self, config: CheckConfig) -> JobInfo {
        let mut active = self.active.lock().await;

        if let Some(previous) = active.take() {
            previous.stop.store(true, Ordering::SeqCst);
            tracing::info!("Replacing scheduled job {}", previous.job.read().await.id);
        }

        let job_info = JobInfo::new(&config);
        let job = Arc::new(RwLock::new(job_info.clone()));
        let stop = Arc::new(AtomicBool::new(false));

        let handle = tokio::spawn(Self::run_timer(
            Arc::clone(&self.runner),
            Arc::clone(&job),
            Arc::clone(&stop),
            Arc::clone(&self.cycle_lock),
            config,
            self.config.clone(),
        ));

        *active = Some(ActiveSchedule { stop, handle, job });

        tracing::info!(
            "Scheduled check for '{}' (threshold {}) every {} minute(s)",
            job_info.search_term,
            job_info.distance_threshold,
            job_info.interval_minutes
        );
        job_info
    }

    /// Signal the timer to exit after its current slice. Returns whether a
    /// job was scheduled; calling it on an idle scheduler does nothing.
    pub async fn stop(&self) -> bool {
        let mut active = self.active.lock().await;
        match active.take() {
            Some(schedule) => {
                schedule.stop.store(true, Ordering::SeqCst);
                tracing::info!("Stopped scheduled job {}", schedule.job.read().await.id);
                true
            }
            None => {
                tracing::debug!("Stop requested with no scheduled job");
                false
            }
        }
    }

    /// Stop and wait for the timer task, including any in-flight cycle.
    pub async fn shutdown(&self) {
        let schedule = self.active.lock().await.take();
        if let Some(schedule) = schedule {
            schedule.stop.store(true, Ordering::SeqCst);
            if let Err(e) = schedule.handle.await {
                tracing::warn!("Timer task ended abnormally: {}", e);
            }
        }
        tracing::info!("Check scheduler shutdown");
    }

    pub async fn is_running(&self) -> bool {
        let active = self.active.lock().await;
        active.as_ref().is_some_and(|s| !s.handle.is_finished())
    }

    pub async fn get_job_info(&self) -> Option<JobInfo> {
        let active = self.active.lock().await;
        match active.as_ref() {
            Some(schedule) => Some(schedule.job.read().await.clone()),
            None => None,
        }
    }

    pub async fn status(&self) -> SchedulerStatus {
        let state = if self.is_running().await {
            SchedulerState::Running
        } else {
            SchedulerState::Idle
        };
        let uptime = Utc::now().signed_duration_since(self.start_time);

        SchedulerStatus {
            state,
            job: self.get_job_info().await,
            uptime_seconds: uptime.num_seconds().max(0) as u64,
        }
    }

    async fn run_timer(
        runner: Arc<dyn CycleRunner>,
        job: Arc<RwLock<JobInfo>>,
        stop: Arc<AtomicBool>,
        cycle_lock: Arc<Mutex<()>>,
        config: CheckConfig,
        scheduler: SchedulerConfig,
    ) {
        let interval = config.interval();
        let slice = scheduler.poll_slice();
        let mut last_fire = if scheduler.run_on_start {
            None
        } else {
            Some(Instant::now())
        };

        loop {
            tokio::time::sleep(slice).await;
            if stop.load(Ordering::SeqCst) {
                break;
            }

            let due = last_fire.is_none_or(|fired| fired.elapsed() >= interval);
            if !due {
                continue;
            }
            last_fire = Some(Instant::now());

            let _cycle = cycle_lock.lock().await;
            // may have been stopped while a replaced timer held the lock
            if stop.load(Ordering::SeqCst) {
                break;
            }
            Self::execute_cycle(runner.as_ref(), &job, &config).await;
        }

        tracing::debug!("Timer for job {} exited", job.read().await.id);
    }

    async fn execute_cycle(runner: &dyn CycleRunner, job: &RwLock<JobInfo>, config: &CheckConfig) {
        let start_time = Instant::now();
        tracing::debug!("Starting scheduled check for '{}'", config.search_term());

        let result = runner.run_cycle(config).await;

        let mut job = job.write().await;
        job.last_run = Some(Utc::now());
        job.run_count += 1;

        match result {
            Ok(outcome) => {
                job.success_count += 1;
                job.last_error = None;
                if outcome.notified() {
                    job.notifications_sent += 1;
                }
            }
            Err(e) => {
                // the cycle is abandoned; the next firing proceeds as usual
                tracing::error!("Scheduled check for '{}' failed: {}", config.search_term(), e);
                job.error_count += 1;
                job.last_error = Some(e.to_string());
            }
        }

        tracing::debug!(
            "Scheduled check {} took {}ms",
            job.run_count,
            start_time.elapsed().as_millis()
        );
    }
}
