//! Service configuration
//!
//! All configuration is assembled once at startup (CLI flags plus
//! environment fallbacks) into an immutable [`ServiceConfig`] that the rest
//! of the service receives behind an `Arc`. Nothing reads the environment
//! after startup.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::options::{ImageFormat, Viewport};

/// Immutable process-wide configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Directory screenshots are written to (created at startup)
    pub output_dir: PathBuf,
    /// Path to a Chrome/Chromium executable (None = auto-detect)
    pub chrome_path: Option<String>,
    /// Run the browser headless (default: true)
    pub headless: bool,
    /// Enable the Chromium sandbox (default: true)
    pub sandbox: bool,
    /// Additional Chromium launch arguments
    pub extra_args: Vec<String>,
    /// Defaults merged under every capture request
    pub defaults: CaptureDefaults,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./screenshots"),
            chrome_path: None,
            headless: true,
            sandbox: true,
            extra_args: Vec::new(),
            defaults: CaptureDefaults::default(),
        }
    }
}

impl ServiceConfig {
    /// Create a new config builder
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::default()
    }
}

/// Per-request option defaults, applied by the option resolver wherever the
/// request leaves a field unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureDefaults {
    /// Output image format (default: png)
    pub format: ImageFormat,
    /// JPEG quality 1-100 (default: 90; ignored for png)
    pub quality: u8,
    /// Render viewport (default: 1920x1080)
    pub viewport: Viewport,
    /// Navigation timeout in milliseconds (default: 30000)
    pub timeout_ms: u64,
    /// Fixed post-load delay in milliseconds (default: 0)
    pub delay_ms: u64,
    /// Wait for the selector to appear before capturing (default: true)
    pub wait_for_selector: bool,
}

impl Default for CaptureDefaults {
    fn default() -> Self {
        Self {
            format: ImageFormat::Png,
            quality: 90,
            viewport: Viewport {
                width: 1920,
                height: 1080,
            },
            timeout_ms: 30_000,
            delay_ms: 0,
            wait_for_selector: true,
        }
    }
}

/// Builder for [`ServiceConfig`]
#[derive(Default)]
pub struct ServiceConfigBuilder {
    config: ServiceConfig,
}

impl ServiceConfigBuilder {
    /// Set the screenshot output directory
    pub fn output_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    /// Set the Chrome/Chromium executable path
    pub fn chrome_path<S: Into<String>>(mut self, path: S) -> Self {
        self.config.chrome_path = Some(path.into());
        self
    }

    /// Enable/disable headless mode
    pub fn headless(mut self, headless: bool) -> Self {
        self.config.headless = headless;
        self
    }

    /// Enable/disable the Chromium sandbox
    pub fn sandbox(mut self, sandbox: bool) -> Self {
        self.config.sandbox = sandbox;
        self
    }

    /// Add an extra Chromium launch argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.config.extra_args.push(arg.into());
        self
    }

    /// Set the default navigation timeout
    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.config.defaults.timeout_ms = ms;
        self
    }

    /// Set the default JPEG quality
    pub fn quality(mut self, quality: u8) -> Self {
        self.config.defaults.quality = quality;
        self
    }

    /// Set the default viewport
    pub fn viewport(mut self, width: u32, height: u32) -> Self {
        self.config.defaults.viewport = Viewport { width, height };
        self
    }

    /// Build the config
    pub fn build(self) -> ServiceConfig {
        self.config
    }
}
