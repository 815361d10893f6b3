//! Property tests for option resolution and identity generation

use clipshot::config::CaptureDefaults;
use clipshot::error::CaptureError;
use clipshot::identity::{artifact_name, ArtifactScope};
use clipshot::options::{resolve, CaptureRequest, ImageFormat, Viewport};
use proptest::prelude::*;
use url::Url;

proptest! {
    /// Resolution never panics, whatever the numeric inputs are.
    #[test]
    fn resolve_is_total(
        width in proptest::option::of(0u32..10_000),
        height in proptest::option::of(0u32..10_000),
        quality in proptest::option::of(0u8..=255),
        delay in proptest::option::of(0u64..120_000),
        timeout in proptest::option::of(0u64..120_000),
    ) {
        let request = CaptureRequest {
            url: "https://example.com".to_string(),
            viewport_width: width,
            viewport_height: height,
            quality,
            delay,
            timeout,
            ..Default::default()
        };
        let _ = resolve(&CaptureDefaults::default(), &request);
    }

    /// The resolver accepts a custom viewport exactly when both merged
    /// dimensions sit inside the documented bounds.
    #[test]
    fn viewport_bounds_decide_acceptance(
        width in 0u32..10_000,
        height in 0u32..10_000,
    ) {
        let request = CaptureRequest {
            url: "https://example.com".to_string(),
            viewport_width: Some(width),
            viewport_height: Some(height),
            ..Default::default()
        };
        let in_bounds = (Viewport::MIN_WIDTH..=Viewport::MAX_WIDTH).contains(&width)
            && (Viewport::MIN_HEIGHT..=Viewport::MAX_HEIGHT).contains(&height);

        match resolve(&CaptureDefaults::default(), &request) {
            Ok(opts) => {
                prop_assert!(in_bounds);
                prop_assert_eq!(opts.viewport, Viewport { width, height });
            }
            Err(CaptureError::InvalidViewport { .. }) => prop_assert!(!in_bounds),
            Err(other) => prop_assert!(false, "unexpected error: {}", other),
        }
    }

    /// Resolved quality always lands in 1..=100.
    #[test]
    fn quality_is_always_clamped(quality in proptest::option::of(0u8..=255)) {
        let request = CaptureRequest {
            url: "https://example.com".to_string(),
            quality,
            ..Default::default()
        };
        let opts = resolve(&CaptureDefaults::default(), &request).unwrap();
        prop_assert!((1..=100).contains(&opts.quality));
    }

    /// Generated identities stay filesystem-safe for arbitrary selectors.
    #[test]
    fn identities_are_filesystem_safe(selector in ".{0,200}") {
        let url = Url::parse("https://example.com").unwrap();
        let name = artifact_name(
            &url,
            ArtifactScope::Selector { selector: &selector, index: None },
            ImageFormat::Png,
        );
        let all_safe = name.chars().all(|c| {
            c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.'
        });
        prop_assert!(all_safe);
        prop_assert!(name.ends_with(".png"));
        prop_assert!(name.len() < 150);
    }
}
