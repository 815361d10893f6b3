//! clipshot - element screenshot HTTP service
//!
//! Renders a page in headless Chromium (via the Chrome DevTools Protocol)
//! and exports a screenshot of the element(s) matched by a CSS selector, or
//! of the entire scrollable page.
//!
//! # Architecture
//!
//! ```text
//! HTTP Request ──▶ handlers (axum) ──▶ Option Resolver
//!                                            │
//!                                            ▼
//!                                     CaptureEngine ──▶ SessionManager
//!                                            │          (one browser per
//!                                            ▼           request, always
//!                                     one strategy:      released)
//!                                     single / multi / full-page
//!                                            │
//!                                            ▼
//!                                     output dir + identity
//! ```
//!
//! Each request owns exactly one browser process; the multi-selector
//! strategy is the only place with partial-failure semantics (a failing
//! selector is recorded, the batch continues in order). All failures are
//! typed in [`error::CaptureError`] - no message sniffing anywhere.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use clipshot::browser::CaptureEngine;
//! use clipshot::config::ServiceConfig;
//! use clipshot::options::{CaptureRequest, SelectorSpec};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Arc::new(ServiceConfig::default());
//!     let engine = CaptureEngine::new(config);
//!
//!     let request = CaptureRequest {
//!         url: "https://example.com".to_string(),
//!         selector: Some(SelectorSpec::One("h1".to_string())),
//!         ..Default::default()
//!     };
//!     let outcome = engine.capture(&request).await?;
//!     println!("captured: {:?}", outcome);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod browser;
pub mod config;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod options;

// Re-exports for convenience
pub use browser::{CaptureEngine, CaptureOutcome};
pub use config::ServiceConfig;
pub use error::{CaptureError, Result};
pub use options::{CaptureRequest, EffectiveOptions};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
