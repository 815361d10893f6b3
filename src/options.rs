//! Capture request model and option resolution
//!
//! [`CaptureRequest`] is the wire shape accepted by the boundary;
//! [`resolve`] merges it over the configured [`CaptureDefaults`] into a
//! fully-populated [`EffectiveOptions`]. Resolution is a pure transform: it
//! touches no browser resource, and an out-of-bounds custom viewport fails
//! the whole request here, before anything is launched.

use serde::{Deserialize, Serialize};

use crate::config::CaptureDefaults;
use crate::error::{CaptureError, Result};

/// Output image format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG (lossless, quality setting ignored)
    #[default]
    Png,
    /// JPEG (quality setting 1-100 applies)
    Jpeg,
}

impl ImageFormat {
    /// File extension for the format
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
        }
    }

    /// MIME type for the format
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
        }
    }
}

/// Named device viewports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePreset {
    /// 1920x1080
    Desktop,
    /// 1366x768
    Laptop,
    /// 768x1024
    Tablet,
    /// 375x667
    Mobile,
    /// 2560x1440
    Wide,
}

impl DevicePreset {
    /// The viewport this preset names
    pub fn viewport(&self) -> Viewport {
        let (width, height) = match self {
            DevicePreset::Desktop => (1920, 1080),
            DevicePreset::Laptop => (1366, 768),
            DevicePreset::Tablet => (768, 1024),
            DevicePreset::Mobile => (375, 667),
            DevicePreset::Wide => (2560, 1440),
        };
        Viewport { width, height }
    }
}

/// Render viewport in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Viewport {
    /// Minimum accepted width
    pub const MIN_WIDTH: u32 = 100;
    /// Maximum accepted width
    pub const MAX_WIDTH: u32 = 3840;
    /// Minimum accepted height
    pub const MIN_HEIGHT: u32 = 100;
    /// Maximum accepted height
    pub const MAX_HEIGHT: u32 = 2160;

    /// Check the dimensions against the supported bounds.
    pub fn validate(&self) -> Result<()> {
        let width_ok = (Self::MIN_WIDTH..=Self::MAX_WIDTH).contains(&self.width);
        let height_ok = (Self::MIN_HEIGHT..=Self::MAX_HEIGHT).contains(&self.height);
        if width_ok && height_ok {
            Ok(())
        } else {
            Err(CaptureError::InvalidViewport {
                width: self.width,
                height: self.height,
            })
        }
    }
}

/// A single selector or an ordered list of selectors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SelectorSpec {
    /// One CSS selector
    One(String),
    /// An ordered list of CSS selectors, captured independently
    Many(Vec<String>),
}

/// The wire shape of a capture request.
///
/// Exactly one of `selector` / `full_page` drives the capture; when
/// `full_page` is set any selector value is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CaptureRequest {
    /// Absolute http(s) URL to render
    pub url: String,
    /// CSS selector(s) to capture
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<SelectorSpec>,
    /// Capture the entire scrollable page instead of an element
    #[serde(default)]
    pub full_page: bool,
    /// Output format override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<ImageFormat>,
    /// JPEG quality override (1-100)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<u8>,
    /// Named device viewport
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<DevicePreset>,
    /// Custom viewport width (overrides the device/default width)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewport_width: Option<u32>,
    /// Custom viewport height (overrides the device/default height)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewport_height: Option<u32>,
    /// Post-load delay in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<u64>,
    /// Navigation timeout in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    /// Wait for the selector to appear before capturing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_for_selector: Option<bool>,
    /// Return the image inline as base64 and delete the backing file
    #[serde(default)]
    pub inline: bool,
}

/// Which capture strategy a request selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureMode {
    /// Capture the entire scrollable page
    FullPage,
    /// Capture each selector independently, in order
    Multi(Vec<String>),
    /// Capture the first element matching one selector
    Single(String),
}

impl CaptureRequest {
    /// Strategy precedence: full-page flag, then selector list, then single
    /// selector. `None` means the request names neither and is rejected at
    /// the boundary.
    pub fn mode(&self) -> Option<CaptureMode> {
        if self.full_page {
            return Some(CaptureMode::FullPage);
        }
        match &self.selector {
            Some(SelectorSpec::Many(list)) => Some(CaptureMode::Multi(list.clone())),
            Some(SelectorSpec::One(sel)) => Some(CaptureMode::Single(sel.clone())),
            None => None,
        }
    }
}

/// Fully-resolved per-request options; every field has a concrete value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveOptions {
    /// Output image format
    pub format: ImageFormat,
    /// JPEG quality (1-100)
    pub quality: u8,
    /// Validated render viewport
    pub viewport: Viewport,
    /// Navigation timeout in milliseconds
    pub timeout_ms: u64,
    /// Fixed post-load delay in milliseconds
    pub delay_ms: u64,
    /// Wait for the selector before capturing
    pub wait_for_selector: bool,
}

/// Merge a request over the configured defaults.
///
/// Top-level fields override individually. The viewport merges
/// field-by-field: a named device replaces the default viewport first, then
/// explicit width/height each override their own axis, so supplying only
/// `viewportWidth` keeps the device (or default) height. The merged
/// viewport is validated; violation fails the request before any browser
/// resource is acquired.
pub fn resolve(defaults: &CaptureDefaults, request: &CaptureRequest) -> Result<EffectiveOptions> {
    let mut viewport = request
        .device
        .map(|d| d.viewport())
        .unwrap_or(defaults.viewport);
    if let Some(width) = request.viewport_width {
        viewport.width = width;
    }
    if let Some(height) = request.viewport_height {
        viewport.height = height;
    }
    viewport.validate()?;

    let quality = request.quality.unwrap_or(defaults.quality).clamp(1, 100);

    Ok(EffectiveOptions {
        format: request.format.unwrap_or(defaults.format),
        quality,
        viewport,
        timeout_ms: request.timeout.unwrap_or(defaults.timeout_ms),
        delay_ms: request.delay.unwrap_or(defaults.delay_ms),
        wait_for_selector: request
            .wait_for_selector
            .unwrap_or(defaults.wait_for_selector),
    })
}
