//! Capture strategies
//!
//! Exactly one strategy runs per request, chosen by precedence: full-page
//! flag, then selector list, then single selector. The multi-selector
//! strategy is the only place with local recovery: a failing selector is
//! recorded and the rest of the batch still runs, in input order.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, Viewport as ClipViewport,
};
use chromiumoxide::error::CdpError;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Element, Page};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use url::Url;

use crate::config::ServiceConfig;
use crate::error::{CaptureError, Result};
use crate::identity::{artifact_name, ArtifactScope};
use crate::options::{resolve, CaptureMode, CaptureRequest, EffectiveOptions, ImageFormat};

use super::SessionManager;

/// Poll interval while waiting for a selector to appear.
const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A persisted screenshot file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    /// Generated unique file name, extension included
    pub file_name: String,
    /// Absolute or output-dir-relative path of the persisted file
    pub path: PathBuf,
    /// Size of the file in bytes
    pub bytes: u64,
}

/// Outcome for one selector inside a multi-selector batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectorCapture {
    /// The selector this entry describes
    pub selector: String,
    /// Whether the capture for this selector succeeded
    pub success: bool,
    /// The persisted artifact, on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<Artifact>,
    /// The failure message, on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The result of one capture request, discriminated by strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CaptureOutcome {
    /// One element, cropped to its bounding box
    #[serde(rename_all = "camelCase")]
    SingleSelector {
        /// The persisted screenshot
        artifact: Artifact,
    },
    /// The entire scrollable page
    #[serde(rename_all = "camelCase")]
    FullPage {
        /// The persisted screenshot
        artifact: Artifact,
    },
    /// Independent per-selector captures, in input order
    #[serde(rename_all = "camelCase")]
    MultipleSelectors {
        /// Number of selectors in the request
        total_selectors: usize,
        /// How many captured successfully
        success_count: usize,
        /// How many failed
        failure_count: usize,
        /// Per-selector outcomes, ordered as the input
        results: Vec<SelectorCapture>,
    },
}

impl CaptureOutcome {
    /// The single artifact behind this outcome, when there is exactly one.
    pub fn artifact(&self) -> Option<&Artifact> {
        match self {
            CaptureOutcome::SingleSelector { artifact } => Some(artifact),
            CaptureOutcome::FullPage { artifact } => Some(artifact),
            CaptureOutcome::MultipleSelectors { .. } => None,
        }
    }
}

/// Element bounding box in page coordinates, as reported by the DOM.
#[derive(Debug, Deserialize)]
struct ElementRect {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

/// The capture entry point consumed by the HTTP boundary.
pub struct CaptureEngine {
    config: Arc<ServiceConfig>,
    sessions: SessionManager,
}

impl CaptureEngine {
    /// Build an engine over the immutable service configuration.
    pub fn new(config: Arc<ServiceConfig>) -> Self {
        let sessions = SessionManager::new(Arc::clone(&config));
        Self { config, sessions }
    }

    /// The service configuration this engine was built with.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Run one capture request end to end.
    ///
    /// Option resolution happens first, so an out-of-bounds viewport fails
    /// here without a browser ever being launched. The browser acquired for
    /// the request is released on every exit path.
    #[instrument(skip_all, fields(url = %request.url))]
    pub async fn capture(&self, request: &CaptureRequest) -> Result<CaptureOutcome> {
        let url = Url::parse(&request.url)
            .map_err(|e| CaptureError::internal(format!("invalid target URL: {e}")))?;
        let opts = resolve(&self.config.defaults, request)?;
        let mode = request.mode().ok_or_else(|| {
            CaptureError::internal("request names neither a selector nor fullPage")
        })?;

        let url = &url;
        let opts = &opts;
        self.sessions
            .with_page(url, opts, |page| async move {
                match mode {
                    CaptureMode::FullPage => {
                        let artifact = self.capture_full_page(&page, url, opts).await?;
                        Ok(CaptureOutcome::FullPage { artifact })
                    }
                    CaptureMode::Single(selector) => {
                        let artifact = self
                            .capture_element(&page, url, &selector, None, opts)
                            .await?;
                        Ok(CaptureOutcome::SingleSelector { artifact })
                    }
                    CaptureMode::Multi(selectors) => {
                        self.capture_many(&page, url, &selectors, opts).await
                    }
                }
            })
            .await
    }

    /// Capture the whole scrollable document.
    async fn capture_full_page(
        &self,
        page: &Page,
        url: &Url,
        opts: &EffectiveOptions,
    ) -> Result<Artifact> {
        info!("capturing full page");

        let mut builder = ScreenshotParams::builder()
            .format(cdp_format(opts.format))
            .from_surface(true)
            .full_page(true);
        if opts.format == ImageFormat::Jpeg {
            builder = builder.quality(opts.quality as i64);
        }

        let data = page
            .screenshot(builder.build())
            .await
            .map_err(|e| CaptureError::internal(format!("screenshot failed: {e}")))?;

        self.persist(url, ArtifactScope::FullPage, opts.format, &data)
            .await
    }

    /// Capture one element, cropped to its bounding box.
    async fn capture_element(
        &self,
        page: &Page,
        url: &Url,
        selector: &str,
        index: Option<usize>,
        opts: &EffectiveOptions,
    ) -> Result<Artifact> {
        info!(selector, "capturing element");

        let element = self.locate(page, selector, opts).await?;
        if let Err(e) = element.scroll_into_view().await {
            debug!(selector, "scroll into view failed: {e}");
        }

        let rect = Self::element_rect(page, selector).await?;
        if rect.width < 1.0 || rect.height < 1.0 {
            return Err(CaptureError::internal(format!(
                "element for selector {selector} has an empty bounding box"
            )));
        }

        let mut builder = ScreenshotParams::builder()
            .format(cdp_format(opts.format))
            .from_surface(true)
            .capture_beyond_viewport(true)
            .clip(ClipViewport {
                x: rect.x,
                y: rect.y,
                width: rect.width,
                height: rect.height,
                scale: 1.0,
            });
        if opts.format == ImageFormat::Jpeg {
            builder = builder.quality(opts.quality as i64);
        }

        let data = page
            .screenshot(builder.build())
            .await
            .map_err(|e| CaptureError::internal(format!("screenshot failed: {e}")))?;

        let scope = ArtifactScope::Selector { selector, index };
        self.persist(url, scope, opts.format, &data).await
    }

    /// Capture each selector independently, preserving input order. A
    /// per-selector failure is recorded and does not abort the batch.
    async fn capture_many(
        &self,
        page: &Page,
        url: &Url,
        selectors: &[String],
        opts: &EffectiveOptions,
    ) -> Result<CaptureOutcome> {
        info!(count = selectors.len(), "capturing selector batch");

        let mut results = Vec::with_capacity(selectors.len());
        let mut success_count = 0;

        for (index, selector) in selectors.iter().enumerate() {
            match self
                .capture_element(page, url, selector, Some(index), opts)
                .await
            {
                Ok(artifact) => {
                    success_count += 1;
                    results.push(SelectorCapture {
                        selector: selector.clone(),
                        success: true,
                        artifact: Some(artifact),
                        error: None,
                    });
                }
                Err(e) => {
                    debug!(selector, "batch entry failed: {e}");
                    results.push(SelectorCapture {
                        selector: selector.clone(),
                        success: false,
                        artifact: None,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        Ok(CaptureOutcome::MultipleSelectors {
            total_selectors: selectors.len(),
            success_count,
            failure_count: selectors.len() - success_count,
            results,
        })
    }

    /// Find the element, waiting for it to appear when the request asks for
    /// that. Expiry of the wait raises `ElementNotFound`, never a generic
    /// timeout. Only a lookup miss counts as not-found; a CDP transport
    /// failure surfaces as `Internal`.
    async fn locate(
        &self,
        page: &Page,
        selector: &str,
        opts: &EffectiveOptions,
    ) -> Result<Element> {
        if !opts.wait_for_selector {
            return page
                .find_element(selector)
                .await
                .map_err(|e| lookup_error(selector, e));
        }

        let deadline = Instant::now() + Duration::from_millis(opts.timeout_ms);
        loop {
            match page.find_element(selector).await {
                Ok(element) => return Ok(element),
                Err(CdpError::NotFound) => {}
                Err(e) => return Err(lookup_error(selector, e)),
            }
            if Instant::now() >= deadline {
                return Err(CaptureError::ElementNotFound {
                    selector: selector.to_string(),
                });
            }
            tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;
        }
    }

    /// Bounding box of the first match, in absolute page coordinates.
    async fn element_rect(page: &Page, selector: &str) -> Result<ElementRect> {
        let script = format!(
            r#"
                (() => {{
                    const el = document.querySelector('{}');
                    if (!el) return null;
                    const r = el.getBoundingClientRect();
                    return {{
                        x: r.x + window.scrollX,
                        y: r.y + window.scrollY,
                        width: r.width,
                        height: r.height
                    }};
                }})()
            "#,
            selector.replace('\\', "\\\\").replace('\'', "\\'")
        );

        let rect: Option<ElementRect> = page
            .evaluate(script.as_str())
            .await
            .map_err(|e| CaptureError::internal(format!("bounding box query failed: {e}")))?
            .into_value()
            .map_err(|e| CaptureError::internal(format!("bounding box decode failed: {e}")))?;

        rect.ok_or_else(|| CaptureError::ElementNotFound {
            selector: selector.to_string(),
        })
    }

    /// Write the image under a generated identity and return its metadata.
    async fn persist(
        &self,
        url: &Url,
        scope: ArtifactScope<'_>,
        format: ImageFormat,
        data: &[u8],
    ) -> Result<Artifact> {
        let file_name = artifact_name(url, scope, format);
        let path = self.config.output_dir.join(&file_name);
        tokio::fs::write(&path, data).await?;
        debug!(file_name, bytes = data.len(), "artifact persisted");

        Ok(Artifact {
            file_name,
            path,
            bytes: data.len() as u64,
        })
    }
}

fn cdp_format(format: ImageFormat) -> CaptureScreenshotFormat {
    match format {
        ImageFormat::Png => CaptureScreenshotFormat::Png,
        ImageFormat::Jpeg => CaptureScreenshotFormat::Jpeg,
    }
}

/// A missing node is `ElementNotFound`; anything else (transport, session
/// crash) is an internal failure.
fn lookup_error(selector: &str, err: CdpError) -> CaptureError {
    match err {
        CdpError::NotFound => CaptureError::ElementNotFound {
            selector: selector.to_string(),
        },
        other => CaptureError::internal(format!("element lookup failed: {other}")),
    }
}
