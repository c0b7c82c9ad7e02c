use std::path::PathBuf;

use dslmngr_xdsl::serializer::{self, MAX_SEQUENCE};
use dslmngr_xdsl::{open_backend, BackendError, BackendOptions, StatsInterval};
use serde_json::{json, Value};

fn state_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("dslmngr-xdsl-it-{tag}-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn driver_document_serializes_to_wire_tokens() {
    let dir = state_dir("wire");
    let state_file = dir.join("state.json");
    let bitloading: Vec<u64> = (0..30).collect();
    let document = json!({
        "lines": [{
            "status": 1,
            "link_status": 2,
            "firmware_version": "5.8.1",
            "current_profile": 1 << 3,
            "allowed_profiles": 1 | (1 << 6),
            "upbokler_pb": bitloading,
            "noise_margin": {"us": 61, "ds": -3}
        }, {
            "status": 99
        }],
        "channels": [{"curr_rate": {"us": 1000, "ds": 20000}, "inpreport": true}],
        "line_intervals": [{"total": {"errored_secs": 7}}]
    });
    std::fs::write(&state_file, document.to_string()).unwrap();

    let backend = open_backend("file-vr9", &BackendOptions { state_file }).unwrap();
    assert_eq!(backend.line_count().unwrap(), 2);

    let line = serializer::line_status(&backend.get_line_info(0).unwrap());
    assert_eq!(line.keys().next().map(String::as_str), Some("status"));
    assert_eq!(line["status"], "up");
    assert_eq!(line["link_status"], "initializing");
    assert_eq!(line["current_profile"], "8d");
    assert_eq!(line["allowed_profiles"], json!(["8a", "17a"]));
    assert_eq!(line["noise_margin"], json!({"us": 61, "ds": -3}));
    assert_eq!(line["upbokler_pb"].as_array().unwrap().len(), MAX_SEQUENCE);
    assert_eq!(line["xtur_vendor"], "");

    let second = serializer::line_status(&backend.get_line_info(1).unwrap());
    assert_eq!(second["status"], "unknown");
    assert_eq!(second["standards_supported"], Value::Array(Vec::new()));

    let channel = serializer::channel_status(&backend.get_channel_info(0).unwrap());
    assert_eq!(channel["curr_rate"]["ds"], 20000);
    assert_eq!(channel["inpreport"], true);

    let total = backend
        .get_line_stats_interval(0, StatsInterval::Total)
        .unwrap();
    assert_eq!(serializer::line_interval(&total)["errored_secs"], 7);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn unknown_technology_is_refused() {
    let err = open_backend("broadcom", &BackendOptions::default())
        .err()
        .unwrap();
    assert!(matches!(err, BackendError::UnknownType(name) if name == "broadcom"));
}
