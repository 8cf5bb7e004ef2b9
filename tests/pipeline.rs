use serde_json::json;
use test_log::test;

use heightlines::GridError;
use heightlines::config::Settings;

#[test]
fn clean_input_is_not_salvaged() {
    let input = json!({
        "width": 3,
        "height": 2,
        "data": [[0.0, 1.0, 2.0], [0.0, 1.0, 2.0]]
    });
    let (report, timings) = heightlines::contour(&input, &Settings::default()).unwrap();
    assert!(!report.salvaged);
    assert_eq!((report.width, report.height), (3, 2));
    assert_eq!(report.heights, vec![vec![0.0, 1.0, 2.0]; 2]);
    assert_eq!(timings.last().map(|t| t.name), Some("TOTAL"));
    // two cells, each with a line per corner pair and per band
    assert!(report.line_count() >= 4);
}

#[test]
fn damaged_input_is_salvaged() {
    let input = json!({
        "width": 3,
        "height": 2,
        "data": [[0.0, 1.0, 2.0], [0.0, "1"]]
    });
    let (report, _) = heightlines::contour(&input, &Settings::default()).unwrap();
    assert!(report.salvaged);
    assert_eq!(report.heights, vec![vec![0.0, 1.0], vec![0.0, 0.0]]);
}

#[test]
fn garbage_becomes_the_default_grid() {
    let (report, _) = heightlines::contour(&json!("not a grid"), &Settings::default()).unwrap();
    assert!(report.salvaged);
    assert_eq!(report.heights, vec![vec![0.0; 2]; 2]);
    assert!(report.cells.is_empty());
}

#[test]
fn invalid_step_is_rejected() {
    let settings = Settings {
        step: f64::NAN,
        ..Settings::default()
    };
    let input = json!({ "width": 2, "height": 2, "data": [[0.0, 1.0], [0.0, 1.0]] });
    assert!(matches!(
        heightlines::contour(&input, &settings),
        Err(GridError::InvalidArgument(_))
    ));
}

#[test]
fn tiny_step_over_an_ordinary_range_is_rejected() {
    let settings = Settings {
        step: 1e-12,
        ..Settings::default()
    };
    let input = json!({ "width": 2, "height": 2, "data": [[0.0, 10.0], [0.0, 10.0]] });
    assert!(matches!(
        heightlines::contour(&input, &settings),
        Err(GridError::InvalidArgument(_))
    ));
}

#[test]
fn report_serializes_to_the_documented_shape() {
    let input = json!({ "width": 2, "height": 2, "data": [[0.0, 2.0], [0.0, 2.0]] });
    let settings = Settings {
        step: 1.0,
        ..Settings::default()
    };
    let (report, _) = heightlines::contour(&input, &settings).unwrap();
    let v = serde_json::to_value(&report).unwrap();
    for key in ["width", "height", "step", "salvaged", "heights", "diagonals", "edges", "cells"] {
        assert!(v.get(key).is_some(), "missing {key}");
    }
    assert_eq!(v["diagonals"], json!([["top_left_bottom_right"]]));
    assert_eq!(v["edges"][0]["stops"], json!([0.5]));
}
