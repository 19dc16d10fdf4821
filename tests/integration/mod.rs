// Integration tests for Scout Watcher
// The browser and the mail relay are replaced by in-process stubs

pub mod check_cycle_tests;
pub mod web_interface_tests;

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::ThreadId;
use std::time::Duration;

use scout_watcher::{
    evaluator::Evaluator,
    models::ResultRow,
    plugins::{NotificationEvent, NotificationResult, NotifierPlugin},
    scheduler::CheckScheduler,
    session::{PageSession, SessionFactory},
    utils::InteractionError,
    web::AppState,
    AppConfig, SiteChecker,
};

/// Embedded defaults with a fast scheduler that fires immediately.
pub fn get_test_config() -> AppConfig {
    let mut config = AppConfig::defaults().expect("embedded defaults are valid");
    config.scheduler.poll_slice_ms = 10;
    config.scheduler.run_on_start = true;
    config
}

pub fn table(rows: &[&[&str]]) -> Vec<ResultRow> {
    rows.iter().map(|r| r.iter().copied().collect()).collect()
}

/// Hands out pages serving a fixed table and counts opened/closed sessions.
#[derive(Default)]
pub struct StubSessionFactory {
    pub rows: Vec<ResultRow>,
    pub fail_open: bool,
    pub opened: AtomicUsize,
    pub closed: Arc<AtomicUsize>,
    pub closed_on: Arc<Mutex<Vec<ThreadId>>>,
}

impl StubSessionFactory {
    pub fn with_rows(rows: Vec<ResultRow>) -> Self {
        Self {
            rows,
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_open: true,
            ..Default::default()
        }
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    /// Threads that dropped a page, in order.
    pub fn closed_on(&self) -> Vec<ThreadId> {
        self.closed_on.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionFactory for StubSessionFactory {
    async fn open(&self) -> Result<Box<dyn PageSession>, InteractionError> {
        if self.fail_open {
            return Err(InteractionError::Launch("no browser in tests".to_string()));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StubPage {
            rows: self.rows.clone(),
            closed: Arc::clone(&self.closed),
            closed_on: Arc::clone(&self.closed_on),
        }))
    }
}

pub struct StubPage {
    rows: Vec<ResultRow>,
    closed: Arc<AtomicUsize>,
    closed_on: Arc<Mutex<Vec<ThreadId>>>,
}

impl Drop for StubPage {
    fn drop(&mut self) {
        self.closed_on
            .lock()
            .unwrap()
            .push(std::thread::current().id());
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl PageSession for StubPage {
    async fn wait_for_interactable(
        &self,
        _selector: &str,
        _timeout: Duration,
    ) -> Result<(), InteractionError> {
        Ok(())
    }

    async fn set_value(&self, _selector: &str, _value: &str) -> Result<(), InteractionError> {
        Ok(())
    }

    async fn click(&self, _selector: &str) -> Result<(), InteractionError> {
        Ok(())
    }

    async fn wait_for_rows(
        &self,
        _row_selector: &str,
        _cell_selector: &str,
        _timeout: Duration,
    ) -> Result<Vec<ResultRow>, InteractionError> {
        Ok(self.rows.clone())
    }
}

/// Records every event and always reports success.
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<NotificationEvent>>,
}

impl RecordingNotifier {
    pub fn events(&self) -> Vec<NotificationEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotifierPlugin for RecordingNotifier {
    async fn notify(&self, event: &NotificationEvent) -> NotificationResult {
        self.events.lock().unwrap().push(event.clone());
        NotificationResult::sent(format!("test-{}", self.events.lock().unwrap().len()))
    }
}

pub fn create_test_checker(
    config: &AppConfig,
    sessions: Arc<StubSessionFactory>,
    notifier: Arc<RecordingNotifier>,
) -> SiteChecker {
    SiteChecker::new(
        sessions,
        Evaluator::new(config.target.clone(), config.notifications.subject.clone()),
        notifier,
    )
}

pub struct TestApp {
    pub state: AppState,
    pub sessions: Arc<StubSessionFactory>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn create_test_app_state(rows: Vec<ResultRow>) -> TestApp {
    let config = get_test_config();
    let sessions = Arc::new(StubSessionFactory::with_rows(rows));
    let notifier = Arc::new(RecordingNotifier::default());
    let checker = create_test_checker(&config, Arc::clone(&sessions), Arc::clone(&notifier));

    let scheduler = Arc::new(CheckScheduler::new(
        Arc::new(checker),
        config.scheduler.clone(),
    ));

    TestApp {
        state: AppState {
            scheduler,
            config: Arc::new(config),
        },
        sessions,
        notifier,
    }
}

/// Poll `condition` every 10ms for up to two seconds.
pub async fn wait_until<F: Fn() -> bool>(condition: F) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
