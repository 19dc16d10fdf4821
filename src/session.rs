use async_trait::async_trait;
use headless_chrome::{Browser, Element, LaunchOptions, Tab};
use scraper::{Html, Selector};
use serde_json::json;
use std::ffi::OsStr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::{BrowserConfig, TargetConfig};
use crate::models::ResultRow;
use crate::utils::error::InteractionError;

const INTERACTABLE_POLL: Duration = Duration::from_millis(250);

const IS_INTERACTABLE_JS: &str = r#"function() {
    const style = window.getComputedStyle(this);
    const rect = this.getBoundingClientRect();
    return !this.disabled
        && style.display !== 'none'
        && style.visibility !== 'hidden'
        && rect.width > 0
        && rect.height > 0;
}"#;

const SET_VALUE_JS: &str = "function(value) { this.value = value; }";

/// A loaded page, scoped to one check cycle.
#[async_trait]
pub trait PageSession: Send + Sync {
    /// Wait until `selector` is present, visible and enabled.
    async fn wait_for_interactable(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), InteractionError>;

    /// Assign the element's `value` directly, without key events.
    async fn set_value(&self, selector: &str, value: &str) -> Result<(), InteractionError>;

    async fn click(&self, selector: &str) -> Result<(), InteractionError>;

    /// Wait for at least one row, then read every row's cells in document order.
    async fn wait_for_rows(
        &self,
        row_selector: &str,
        cell_selector: &str,
        timeout: Duration,
    ) -> Result<Vec<ResultRow>, InteractionError>;
}

#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn PageSession>, InteractionError>;
}

/// Opens one headless Chrome instance per session.
pub struct ChromeSessionFactory {
    browser: BrowserConfig,
    url: String,
}

impl ChromeSessionFactory {
    pub fn new(browser: BrowserConfig, target: &TargetConfig) -> Self {
        Self {
            browser,
            url: target.url.clone(),
        }
    }
}

#[async_trait]
impl SessionFactory for ChromeSessionFactory {
    async fn open(&self) -> Result<Box<dyn PageSession>, InteractionError> {
        let browser = self.browser.clone();
        let url = self.url.clone();

        let session = tokio::task::spawn_blocking(move || ChromeSession::launch(&browser, &url))
            .await
            .map_err(|e| InteractionError::Task(e.to_string()))??;

        Ok(Box::new(session))
    }
}

/// A browser process plus the tab showing the target page. Closed on drop.
pub struct ChromeSession {
    tab: Arc<Tab>,
    _browser: Browser,
}

impl ChromeSession {
    /// Sandboxing follows `browser.sandbox` only.
    pub fn launch_options(
        config: &BrowserConfig,
    ) -> Result<LaunchOptions<'static>, InteractionError> {
        let mut launch_options = LaunchOptions::default_builder()
            .headless(config.headless)
            .sandbox(config.sandbox)
            .window_size(Some((config.window_width, config.window_height)))
            .args(vec![
                OsStr::new("--disable-gpu"),
                OsStr::new("--disable-dev-shm-usage"),
            ])
            .build()
            .map_err(|e| InteractionError::Launch(e.to_string()))?;

        if let Some(chrome_path) = &config.chrome_path {
            launch_options.path = Some(PathBuf::from(chrome_path));
        }

        Ok(launch_options)
    }

    pub fn launch(config: &BrowserConfig, url: &str) -> Result<Self, InteractionError> {
        let launch_options = Self::launch_options(config)?;

        let browser =
            Browser::new(launch_options).map_err(|e| InteractionError::Launch(e.to_string()))?;

        let tab = browser
            .new_tab()
            .map_err(|e| InteractionError::Launch(format!("Failed to create tab: {}", e)))?;

        if let Some(user_agent) = &config.user_agent {
            tab.set_user_agent(user_agent, None, None)
                .map_err(|e| InteractionError::Launch(format!("Failed to set user agent: {}", e)))?;
        }

        tracing::info!("Loading website: {}", url);
        tab.navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(|e| InteractionError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            tab,
            _browser: browser,
        })
    }

    async fn with_tab<T, F>(&self, f: F) -> Result<T, InteractionError>
    where
        F: FnOnce(&Tab) -> Result<T, InteractionError> + Send + 'static,
        T: Send + 'static,
    {
        let tab = Arc::clone(&self.tab);
        tokio::task::spawn_blocking(move || f(&tab))
            .await
            .map_err(|e| InteractionError::Task(e.to_string()))?
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        // the browser process exits when `_browser` drops right after
        if let Err(e) = self.tab.close(true) {
            tracing::debug!("Failed to close tab: {}", e);
        }
    }
}

fn find<'a>(tab: &'a Tab, selector: &str) -> Result<Element<'a>, InteractionError> {
    tab.find_element(selector)
        .map_err(|_| InteractionError::ElementNotFound {
            selector: selector.to_string(),
            timeout_secs: 0,
        })
}

fn is_interactable(element: &Element<'_>, selector: &str) -> Result<bool, InteractionError> {
    let result = element
        .call_js_fn(IS_INTERACTABLE_JS, vec![], false)
        .map_err(|e| InteractionError::Script {
            selector: selector.to_string(),
            message: e.to_string(),
        })?;

    Ok(result.value.and_then(|v| v.as_bool()).unwrap_or(false))
}

#[async_trait]
impl PageSession for ChromeSession {
    async fn wait_for_interactable(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), InteractionError> {
        let selector = selector.to_string();
        self.with_tab(move |tab| {
            let deadline = Instant::now() + timeout;
            loop {
                let remaining = deadline.saturating_duration_since(Instant::now());
                let element = tab
                    .wait_for_element_with_custom_timeout(&selector, remaining.max(INTERACTABLE_POLL))
                    .map_err(|_| InteractionError::ElementNotFound {
                        selector: selector.clone(),
                        timeout_secs: timeout.as_secs(),
                    })?;

                if is_interactable(&element, &selector)? {
                    return Ok(());
                }
                if Instant::now() >= deadline {
                    return Err(InteractionError::NotInteractable { selector });
                }
                std::thread::sleep(INTERACTABLE_POLL);
            }
        })
        .await
    }

    async fn set_value(&self, selector: &str, value: &str) -> Result<(), InteractionError> {
        let selector = selector.to_string();
        let value = value.to_string();
        self.with_tab(move |tab| {
            let element = find(tab, &selector)?;
            element
                .call_js_fn(SET_VALUE_JS, vec![json!(value)], false)
                .map_err(|e| InteractionError::Script {
                    selector: selector.clone(),
                    message: e.to_string(),
                })?;
            Ok(())
        })
        .await
    }

    async fn click(&self, selector: &str) -> Result<(), InteractionError> {
        let selector = selector.to_string();
        self.with_tab(move |tab| {
            let element = find(tab, &selector)?;
            element.click().map_err(|e| InteractionError::Script {
                selector: selector.clone(),
                message: e.to_string(),
            })?;
            Ok(())
        })
        .await
    }

    async fn wait_for_rows(
        &self,
        row_selector: &str,
        cell_selector: &str,
        timeout: Duration,
    ) -> Result<Vec<ResultRow>, InteractionError> {
        let row_selector = row_selector.to_string();
        let cell_selector = cell_selector.to_string();
        self.with_tab(move |tab| {
            tab.wait_for_element_with_custom_timeout(&row_selector, timeout)
                .map_err(|_| InteractionError::NoRows {
                    selector: row_selector.clone(),
                    timeout_secs: timeout.as_secs(),
                })?;

            let html = tab
                .get_content()
                .map_err(|e| InteractionError::Content(e.to_string()))?;

            parse_rows(&html, &row_selector, &cell_selector)
        })
        .await
    }
}

/// Extract the text of every `cell_selector` inside every `row_selector`.
pub fn parse_rows(
    html: &str,
    row_selector: &str,
    cell_selector: &str,
) -> Result<Vec<ResultRow>, InteractionError> {
    let document = Html::parse_document(html);
    let rows = parse_selector(row_selector)?;
    let cells = parse_selector(cell_selector)?;

    Ok(document
        .select(&rows)
        .map(|row| {
            row.select(&cells)
                .map(|cell| cell.text().collect::<Vec<_>>().join(" ").trim().to_string())
                .collect()
        })
        .collect())
}

fn parse_selector(selector: &str) -> Result<Selector, InteractionError> {
    Selector::parse(selector).map_err(|e| {
        InteractionError::Content(format!("Invalid CSS selector '{}': {:?}", selector, e))
    })
}
