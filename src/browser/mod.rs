//! Browser session lifecycle and capture strategies

mod capture;
mod session;

pub use capture::{Artifact, CaptureEngine, CaptureOutcome, SelectorCapture};
pub use session::SessionManager;
