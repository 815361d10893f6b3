//! Option resolver integration tests
//!
//! Exercises the public request model: defaults, merge order, viewport
//! bounds, and strategy precedence.

use clipshot::config::CaptureDefaults;
use clipshot::error::CaptureError;
use clipshot::options::{
    resolve, CaptureMode, CaptureRequest, DevicePreset, ImageFormat, SelectorSpec, Viewport,
};
use pretty_assertions::assert_eq;

fn request(url: &str) -> CaptureRequest {
    CaptureRequest {
        url: url.to_string(),
        ..Default::default()
    }
}

#[test]
fn resolver_fills_every_field_from_defaults() {
    let opts = resolve(&CaptureDefaults::default(), &request("https://example.com")).unwrap();

    assert_eq!(opts.format, ImageFormat::Png);
    assert_eq!(opts.quality, 90);
    assert_eq!(
        opts.viewport,
        Viewport {
            width: 1920,
            height: 1080
        }
    );
    assert_eq!(opts.timeout_ms, 30_000);
    assert_eq!(opts.delay_ms, 0);
    assert!(opts.wait_for_selector);
}

#[test]
fn resolver_overrides_top_level_fields_individually() {
    let req = CaptureRequest {
        format: Some(ImageFormat::Jpeg),
        quality: Some(60),
        timeout: Some(10_000),
        delay: Some(250),
        wait_for_selector: Some(false),
        ..request("https://example.com")
    };
    let opts = resolve(&CaptureDefaults::default(), &req).unwrap();

    assert_eq!(opts.format, ImageFormat::Jpeg);
    assert_eq!(opts.quality, 60);
    assert_eq!(opts.timeout_ms, 10_000);
    assert_eq!(opts.delay_ms, 250);
    assert!(!opts.wait_for_selector);
    // Untouched fields keep defaults.
    assert_eq!(opts.viewport.width, 1920);
}

#[test]
fn viewport_merges_field_by_field() {
    // Width only: default height preserved.
    let req = CaptureRequest {
        viewport_width: Some(640),
        ..request("https://example.com")
    };
    let opts = resolve(&CaptureDefaults::default(), &req).unwrap();
    assert_eq!(opts.viewport.width, 640);
    assert_eq!(opts.viewport.height, 1080);

    // Device preset replaces both, then height override wins on its axis.
    let req = CaptureRequest {
        device: Some(DevicePreset::Tablet),
        viewport_height: Some(900),
        ..request("https://example.com")
    };
    let opts = resolve(&CaptureDefaults::default(), &req).unwrap();
    assert_eq!(opts.viewport.width, 768);
    assert_eq!(opts.viewport.height, 900);
}

#[test]
fn out_of_bounds_viewport_is_rejected() {
    for (width, height) in [
        (Some(50), None),
        (Some(5000), None),
        (None, Some(99)),
        (None, Some(2161)),
    ] {
        let req = CaptureRequest {
            viewport_width: width,
            viewport_height: height,
            ..request("https://example.com")
        };
        let err = resolve(&CaptureDefaults::default(), &req).unwrap_err();
        assert!(
            matches!(err, CaptureError::InvalidViewport { .. }),
            "expected InvalidViewport for {width:?}x{height:?}, got {err}"
        );
    }
}

#[test]
fn boundary_viewport_values_are_accepted() {
    for (width, height) in [(100, 100), (3840, 2160), (100, 2160), (3840, 100)] {
        let req = CaptureRequest {
            viewport_width: Some(width),
            viewport_height: Some(height),
            ..request("https://example.com")
        };
        let opts = resolve(&CaptureDefaults::default(), &req).unwrap();
        assert_eq!(opts.viewport, Viewport { width, height });
    }
}

#[test]
fn full_page_flag_takes_precedence_over_selectors() {
    let req = CaptureRequest {
        full_page: true,
        selector: Some(SelectorSpec::Many(vec!["h1".into(), "p".into()])),
        ..request("https://example.com")
    };
    assert_eq!(req.mode(), Some(CaptureMode::FullPage));
}

#[test]
fn selector_list_maps_to_multi_mode_in_order() {
    let req = CaptureRequest {
        selector: Some(SelectorSpec::Many(vec![
            "header".into(),
            "#main".into(),
            "footer".into(),
        ])),
        ..request("https://example.com")
    };
    match req.mode() {
        Some(CaptureMode::Multi(list)) => {
            assert_eq!(list, vec!["header", "#main", "footer"]);
        }
        other => panic!("expected Multi mode, got {other:?}"),
    }
}

#[test]
fn wire_shape_round_trips() {
    let json = r##"{
        "url": "https://example.com",
        "selector": ["h1", "#nope"],
        "format": "jpeg",
        "quality": 80,
        "device": "mobile",
        "viewportWidth": 400,
        "delay": 500,
        "timeout": 15000,
        "waitForSelector": true,
        "inline": true
    }"##;
    let req: CaptureRequest = serde_json::from_str(json).unwrap();
    assert_eq!(req.device, Some(DevicePreset::Mobile));
    assert!(req.inline);

    let opts = resolve(&CaptureDefaults::default(), &req).unwrap();
    assert_eq!(opts.format, ImageFormat::Jpeg);
    assert_eq!(opts.quality, 80);
    assert_eq!(opts.viewport.width, 400);
    assert_eq!(opts.viewport.height, 667);
}

#[test]
fn unknown_fields_are_rejected() {
    let json = r#"{"url": "https://example.com", "fullPage": true, "bogus": 1}"#;
    assert!(serde_json::from_str::<CaptureRequest>(json).is_err());
}
