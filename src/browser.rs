use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CrBrowser, BrowserConfig as CrBrowserConfig};
use chromiumoxide::handler::viewport::Viewport;
use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::config::{BrowserBuilder, BrowserConfig};
use crate::error::{BrowserError, Result};
use crate::page::Page;
use crate::session::{FormSession, Launcher};

/// Chrome flags that improve performance without affecting functionality.
const PERF_ARGS: &[&str] = &[
    "disable-gpu",
    "disable-extensions",
    "disable-dev-shm-usage",
    "metrics-recording-only",
    "mute-audio",
    "no-first-run",
    "no-default-browser-check",
    "disable-client-side-phishing-detection",
    "disable-background-networking",
    "disable-sync",
    "disable-translate",
];

/// A launched headless Chromium, owned by a single order submission.
///
/// Dropping it without calling [`HeadlessBrowser::close`] still kills the
/// child process.
pub struct HeadlessBrowser {
    browser: CrBrowser,
    default_timeout: std::time::Duration,
    handler_task: tokio::task::JoinHandle<()>,
}

impl HeadlessBrowser {
    /// Create a new BrowserBuilder for configuring and launching a browser.
    pub fn builder() -> BrowserBuilder {
        BrowserBuilder::new()
    }

    /// Launch a browser instance with the given configuration.
    pub async fn launch(config: BrowserConfig) -> Result<Self> {
        let mut builder = CrBrowserConfig::builder();

        if config.headless {
            builder = builder.new_headless_mode().no_sandbox();
        } else {
            builder = builder.with_head().no_sandbox();
        }

        // chromiumoxide adds the `--` prefix itself
        for arg in PERF_ARGS {
            builder = builder.arg(*arg);
        }

        if let Some(ref path) = config.chrome_path {
            builder = builder.chrome_executable(path);
        }

        builder = builder
            .request_timeout(config.default_timeout)
            .viewport(Viewport {
                width: config.viewport_width,
                height: config.viewport_height,
                device_scale_factor: None,
                emulating_mobile: false,
                is_landscape: false,
                has_touch: false,
            });

        let cr_config = builder.build().map_err(BrowserError::Launch)?;

        info!(headless = config.headless, "launching browser");
        let (browser, mut handler) = CrBrowser::launch(cr_config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    debug!("CDP handler event loop ended");
                    break;
                }
            }
        });

        Ok(Self {
            browser,
            default_timeout: config.default_timeout,
            handler_task,
        })
    }

    /// Open a new page (tab) and navigate it to `url`, returning once the
    /// DOM content has loaded.
    pub async fn new_page(&self, url: &str) -> Result<Page> {
        let cr_page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::Navigation(e.to_string()))?;

        let page = Page::new(cr_page, self.default_timeout);
        page.goto(url).await?;
        Ok(page)
    }

    /// Close the browser and wait for the process to exit.
    pub async fn close(mut self) -> Result<()> {
        info!("closing browser");
        let closed = self.browser.close().await;
        if let Err(e) = self.browser.wait().await {
            warn!(error = %e, "browser process did not exit cleanly");
        }
        self.handler_task.abort();
        closed?;
        Ok(())
    }
}

#[async_trait]
impl Launcher for BrowserConfig {
    type Session = HeadlessBrowser;

    async fn launch(&self) -> Result<HeadlessBrowser> {
        HeadlessBrowser::launch(self.clone()).await
    }
}

#[async_trait]
impl FormSession for HeadlessBrowser {
    type Page = Page;

    async fn open(&self, url: &str) -> Result<Page> {
        self.new_page(url).await
    }

    async fn close(self) -> Result<()> {
        HeadlessBrowser::close(self).await
    }
}
