//! Per-request browser lifecycle
//!
//! Each capture request owns exactly one Chromium process for its lifetime.
//! [`SessionManager::with_page`] is the only place that process is acquired,
//! and it is released on every exit path (success, navigation failure, or
//! an error thrown by the capture body) before the call returns.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig as CdpBrowserConfig};
use chromiumoxide::handler::viewport::Viewport as CdpViewport;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::config::ServiceConfig;
use crate::error::{CaptureError, Result};
use crate::options::EffectiveOptions;

/// Readiness script: resolves once the document has loaded and a short
/// network-quiet window has passed.
const READY_SCRIPT: &str = r#"
    new Promise(resolve => {
        if (document.readyState === 'complete') {
            setTimeout(() => resolve(true), 500);
        } else {
            window.addEventListener('load', () => {
                setTimeout(() => resolve(true), 500);
            });
        }
    })
"#;

/// Bound on how long teardown waits for the CDP event handler to drain.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Launches, prepares, and tears down one browser process per request.
pub struct SessionManager {
    config: Arc<ServiceConfig>,
}

impl SessionManager {
    /// Create a session manager over the immutable service configuration.
    pub fn new(config: Arc<ServiceConfig>) -> Self {
        Self { config }
    }

    /// Acquire a browser, navigate, and run `body` against the loaded page.
    ///
    /// The sequence is: launch with the resolved viewport, open a page,
    /// navigate with the request deadline, wait for readiness, apply the
    /// fixed post-load delay, then invoke `body`. Whatever happens, the
    /// browser process is terminated before this returns.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn with_page<F, Fut, T>(
        &self,
        url: &Url,
        opts: &EffectiveOptions,
        body: F,
    ) -> Result<T>
    where
        F: FnOnce(Page) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let (browser, handler_task) = self.launch(opts).await?;
        let result = Self::run(&browser, url, opts, body).await;
        Self::shutdown(browser, handler_task).await;
        result
    }

    async fn launch(&self, opts: &EffectiveOptions) -> Result<(Browser, JoinHandle<()>)> {
        info!(
            width = opts.viewport.width,
            height = opts.viewport.height,
            "launching browser"
        );

        let mut builder = CdpBrowserConfig::builder().viewport(CdpViewport {
            width: opts.viewport.width,
            height: opts.viewport.height,
            device_scale_factor: None,
            emulating_mobile: false,
            is_landscape: true,
            has_touch: false,
        });

        if !self.config.headless {
            builder = builder.with_head();
        }
        if !self.config.sandbox {
            builder = builder.arg("--no-sandbox");
        }
        if let Some(ref path) = self.config.chrome_path {
            builder = builder.chrome_executable(path);
        }
        for arg in &self.config.extra_args {
            builder = builder.arg(arg);
        }

        let cdp_config = builder
            .build()
            .map_err(|e| CaptureError::internal(format!("browser config error: {e}")))?;

        let (browser, mut handler) = Browser::launch(cdp_config)
            .await
            .map_err(|e| CaptureError::internal(format!("browser launch failed: {e}")))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
            debug!("browser handler finished");
        });

        Ok((browser, handler_task))
    }

    async fn run<F, Fut, T>(
        browser: &Browser,
        url: &Url,
        opts: &EffectiveOptions,
        body: F,
    ) -> Result<T>
    where
        F: FnOnce(Page) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| CaptureError::internal(format!("page creation failed: {e}")))?;

        Self::navigate(&page, url, opts).await?;
        Self::wait_for_ready(&page, opts.timeout_ms).await?;

        if opts.delay_ms > 0 {
            debug!(delay_ms = opts.delay_ms, "applying post-load delay");
            tokio::time::sleep(Duration::from_millis(opts.delay_ms)).await;
        }

        body(page).await
    }

    /// Navigate within the request deadline. The classification is
    /// structural: an elapsed deadline is a timeout, an error from the goto
    /// call itself is a network failure.
    async fn navigate(page: &Page, url: &Url, opts: &EffectiveOptions) -> Result<()> {
        let deadline = Duration::from_millis(opts.timeout_ms);
        match tokio::time::timeout(deadline, page.goto(url.as_str())).await {
            Err(_) => Err(CaptureError::RequestTimeout {
                ms: opts.timeout_ms,
            }),
            Ok(Err(e)) => Err(CaptureError::NetworkError {
                message: e.to_string(),
            }),
            Ok(Ok(_)) => {
                debug!("navigation complete");
                Ok(())
            }
        }
    }

    async fn wait_for_ready(page: &Page, timeout_ms: u64) -> Result<()> {
        let deadline = Duration::from_millis(timeout_ms);
        tokio::time::timeout(deadline, page.evaluate(READY_SCRIPT))
            .await
            .map_err(|_| CaptureError::RequestTimeout { ms: timeout_ms })?
            .map_err(|e| CaptureError::internal(format!("readiness wait failed: {e}")))?;
        Ok(())
    }

    /// Terminate the browser process. Failures here are logged and never
    /// mask the capture result.
    async fn shutdown(mut browser: Browser, mut handler_task: JoinHandle<()>) {
        if let Err(e) = browser.close().await {
            warn!("browser close failed: {e}");
        }
        if tokio::time::timeout(SHUTDOWN_GRACE, &mut handler_task)
            .await
            .is_err()
        {
            handler_task.abort();
            warn!("browser handler did not finish within shutdown grace period");
        }
        debug!("browser session released");
    }
}
