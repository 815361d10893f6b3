//! Artifact identity generation
//!
//! Produces the unique, filesystem-safe file names screenshots are persisted
//! under. A name fingerprints the target (URL host + selector or full-page
//! mode + batch index) and appends a millisecond timestamp plus a short
//! random suffix, so rapid repeated or concurrent requests never collide.
//! Names are not stable cache keys; uniqueness is the only guarantee.

use chrono::Utc;
use rand::distr::{Alphanumeric, SampleString};
use url::Url;

use crate::options::ImageFormat;

/// Longest slug kept from any single name component.
const MAX_COMPONENT_LEN: usize = 40;

/// Length of the random anti-collision suffix.
const SUFFIX_LEN: usize = 6;

/// What an artifact depicts, for naming purposes.
#[derive(Debug, Clone, Copy)]
pub enum ArtifactScope<'a> {
    /// The whole scrollable page
    FullPage,
    /// One element; `index` is set when part of a multi-selector batch
    Selector {
        /// The CSS selector that was captured
        selector: &'a str,
        /// Position in the selector batch, if any
        index: Option<usize>,
    },
}

/// Generate a unique artifact file name, extension included.
pub fn artifact_name(url: &Url, scope: ArtifactScope<'_>, format: ImageFormat) -> String {
    let host = slug(url.host_str().unwrap_or("page"));
    let scope_part = match scope {
        ArtifactScope::FullPage => "fullpage".to_string(),
        ArtifactScope::Selector {
            selector,
            index: None,
        } => slug(selector),
        ArtifactScope::Selector {
            selector,
            index: Some(i),
        } => format!("{}-{}", slug(selector), i),
    };
    let timestamp = Utc::now().format("%Y%m%dT%H%M%S%3f");
    let suffix = Alphanumeric
        .sample_string(&mut rand::rng(), SUFFIX_LEN)
        .to_lowercase();

    format!(
        "{host}_{scope_part}_{timestamp}_{suffix}.{}",
        format.extension()
    )
}

/// Reduce an arbitrary component to lowercase `[a-z0-9-]`, truncated.
fn slug(input: &str) -> String {
    let mut out = String::with_capacity(input.len().min(MAX_COMPONENT_LEN));
    let mut last_dash = false;
    for ch in input.chars() {
        if out.len() >= MAX_COMPONENT_LEN {
            break;
        }
        if ch.is_ascii_alphanumeric() {
            out.extend(ch.to_lowercase());
            last_dash = false;
        } else if !last_dash && !out.is_empty() {
            out.push('-');
            last_dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    if out.is_empty() {
        out.push_str("sel");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example() -> Url {
        Url::parse("https://example.com/some/path").unwrap()
    }

    #[test]
    fn test_name_ends_with_extension() {
        let name = artifact_name(&example(), ArtifactScope::FullPage, ImageFormat::Png);
        assert!(name.ends_with(".png"));

        let name = artifact_name(&example(), ArtifactScope::FullPage, ImageFormat::Jpeg);
        assert!(name.ends_with(".jpg"));
    }

    #[test]
    fn test_name_is_filesystem_safe() {
        let scope = ArtifactScope::Selector {
            selector: "div.header > a[href*='?x=1']",
            index: None,
        };
        let name = artifact_name(&example(), scope, ImageFormat::Png);
        assert!(name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.'));
    }

    #[test]
    fn test_name_includes_host_and_mode() {
        let name = artifact_name(&example(), ArtifactScope::FullPage, ImageFormat::Png);
        assert!(name.starts_with("example-com_fullpage_"));
    }

    #[test]
    fn test_batch_index_encoded() {
        let scope = ArtifactScope::Selector {
            selector: "h1",
            index: Some(3),
        };
        let name = artifact_name(&example(), scope, ImageFormat::Png);
        assert!(name.contains("_h1-3_"));
    }

    #[test]
    fn test_repeated_names_are_unique() {
        let scope = ArtifactScope::Selector {
            selector: "h1",
            index: None,
        };
        let a = artifact_name(&example(), scope, ImageFormat::Png);
        let b = artifact_name(&example(), scope, ImageFormat::Png);
        assert_ne!(a, b);
    }

    #[test]
    fn test_slug_truncates_long_selectors() {
        let long = "a".repeat(500);
        let scope = ArtifactScope::Selector {
            selector: &long,
            index: None,
        };
        let name = artifact_name(&example(), scope, ImageFormat::Png);
        assert!(name.len() < 120);
    }

    #[test]
    fn test_slug_of_symbols_only() {
        assert_eq!(slug("###"), "sel");
        assert_eq!(slug("#main .item"), "main-item");
    }
}
