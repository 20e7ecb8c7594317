//! Isolated browser session for one acquisition call
//!
//! Sessions are never pooled or reused: each acquisition launches a fresh
//! headless browser with a fixed viewport and user agent, and tears it down
//! on every exit path.

use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};

use mandi_config::ScraperSettings;

use crate::error::{classify_cdp, ScrapeError};

pub struct BrowserSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    page: chromiumoxide::Page,
    wait_timeout: Duration,
    poll_interval: Duration,
}

impl BrowserSession {
    /// Launch a fresh isolated session.
    pub async fn launch(settings: &ScraperSettings) -> Result<Self, ScrapeError> {
        let mut builder = BrowserConfig::builder()
            .window_size(settings.window_width, settings.window_height)
            .no_sandbox()
            .args(vec![
                "--disable-dev-shm-usage".to_string(),
                "--disable-gpu".to_string(),
                "--disable-extensions".to_string(),
                format!("--user-agent={}", settings.user_agent),
            ]);
        if !settings.headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(ScrapeError::Session)?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|err| ScrapeError::Session(format!("browser launch failed: {err}")))?;

        // The handler stream must be polled for the whole session lifetime.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(err) => {
                let _ = browser.close().await;
                let _ = browser.wait().await;
                handler_task.abort();
                return Err(ScrapeError::Session(format!("page open failed: {err}")));
            }
        };

        Ok(Self {
            browser,
            handler_task,
            page,
            wait_timeout: Duration::from_secs(settings.wait_timeout_secs),
            poll_interval: Duration::from_millis(
                mandi_config::constants::scrape::POLL_INTERVAL_MS,
            ),
        })
    }

    pub async fn goto(&self, url: &str) -> Result<(), ScrapeError> {
        timeout(self.wait_timeout, self.page.goto(url))
            .await
            .map_err(|_| ScrapeError::Timeout(format!("navigation to {url}")))?
            .map_err(classify_cdp)?;
        Ok(())
    }

    pub async fn refresh(&self) -> Result<(), ScrapeError> {
        timeout(self.wait_timeout, self.page.reload())
            .await
            .map_err(|_| ScrapeError::Timeout("page reload".to_string()))?
            .map_err(classify_cdp)?;
        Ok(())
    }

    /// Poll until the document reports full readiness, then give dynamic
    /// content a settle buffer. Not a fixed sleep: the poll exits as soon
    /// as the page is ready.
    pub async fn wait_for_ready(&self, settle: Duration) -> Result<(), ScrapeError> {
        let deadline = Instant::now() + self.wait_timeout;
        loop {
            if self
                .eval_bool("document.readyState === 'complete'")
                .await
                .unwrap_or(false)
            {
                break;
            }
            if Instant::now() >= deadline {
                return Err(ScrapeError::Timeout("page readiness".to_string()));
            }
            sleep(self.poll_interval).await;
        }
        sleep(settle).await;
        Ok(())
    }

    /// Evaluate a script and return its JSON value (`null` when the script
    /// produces none).
    pub async fn evaluate(&self, expression: &str) -> Result<serde_json::Value, ScrapeError> {
        let result = timeout(self.wait_timeout, self.page.evaluate(expression))
            .await
            .map_err(|_| ScrapeError::Timeout("script evaluation".to_string()))?
            .map_err(classify_cdp)?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    pub async fn eval_bool(&self, expression: &str) -> Result<bool, ScrapeError> {
        Ok(self.evaluate(expression).await?.as_bool().unwrap_or(false))
    }

    /// Current page HTML.
    pub async fn content(&self) -> Result<String, ScrapeError> {
        timeout(self.wait_timeout, self.page.content())
            .await
            .map_err(|_| ScrapeError::Timeout("page content".to_string()))?
            .map_err(classify_cdp)
    }

    pub fn wait_timeout(&self) -> Duration {
        self.wait_timeout
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Tear the session down. Infallible so it can run on every exit path,
    /// including after faults and cancellation.
    pub async fn close(mut self) {
        if let Err(err) = self.browser.close().await {
            tracing::debug!(%err, "Browser close reported an error");
        }
        if let Err(err) = self.browser.wait().await {
            tracing::debug!(%err, "Browser wait reported an error");
        }
        self.handler_task.abort();
    }
}
