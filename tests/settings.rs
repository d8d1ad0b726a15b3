use std::time::Duration;

use serde_json::{json, Map, Value};
use streamplot::persistence::update_json_file;
use streamplot::{AppConfig, Settings, SettingsError};

#[test]
fn missing_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::load(&dir.path().join("settings.json")).unwrap();
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.sampling_interval(), Duration::from_millis(10));
    assert_eq!(settings.max_points, 100);
    assert_eq!(settings.timeouts().connect, Duration::from_secs(1));
}

#[test]
fn reads_hyphenated_keys_and_numeric_text_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(
        &path,
        r#"{
            "ip-address": "192.168.4.1",
            "port": 5000,
            "baud-rate": "115200",
            "filter-type": "band",
            "filter-cutoff": "0.2, 40.0",
            "max-points": 250,
            "sampling-interval": 0.05
        }"#,
    )
    .unwrap();

    let settings = Settings::load(&path).unwrap();
    assert_eq!(settings.ip_address, "192.168.4.1");
    assert_eq!(settings.port, "5000");
    assert_eq!(settings.baud_rate, "115200");
    assert_eq!(settings.filter_type, "band");
    assert_eq!(settings.max_points, 250);
    assert_eq!(settings.sampling_interval(), Duration::from_millis(50));
    assert_eq!(settings.read_chunk_size, 1024);

    let config = AppConfig::from_settings(&settings, &path);
    assert_eq!(config.max_points, 250);
    assert_eq!(config.connect_defaults.port, "5000");
    assert_eq!(config.settings_path, path);
}

#[test]
fn non_positive_interval_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, r#"{"sampling-interval": 0}"#).unwrap();
    assert!(matches!(
        Settings::load(&path),
        Err(SettingsError::Invalid(_))
    ));
}

#[test]
fn broken_json_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(matches!(Settings::load(&path), Err(SettingsError::Json(_))));
}

#[test]
fn update_merges_and_keeps_unknown_keys() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, r#"{"fs": 500, "port": "1"}"#).unwrap();

    let mut new_settings = Map::new();
    new_settings.insert("port".into(), json!("4242"));
    new_settings.insert("ip-address".into(), json!("10.0.0.1"));
    update_json_file(&path, new_settings).unwrap();

    let on_disk: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(on_disk["fs"], json!(500));
    assert_eq!(on_disk["port"], json!("4242"));
    assert_eq!(on_disk["ip-address"], json!("10.0.0.1"));
}

#[test]
fn update_creates_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fresh.json");
    let mut new_settings = Map::new();
    new_settings.insert("baud-rate".into(), json!("9600"));
    update_json_file(&path, new_settings).unwrap();
    let settings = Settings::load(&path).unwrap();
    assert_eq!(settings.baud_rate, "9600");
}

#[test]
fn save_then_load_keeps_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, r#"{"custom": true}"#).unwrap();

    let settings = Settings {
        ip_address: "127.0.0.1".into(),
        port: "6000".into(),
        max_points: 42,
        ..Settings::default()
    };
    settings.save(&path).unwrap();

    assert_eq!(Settings::load(&path).unwrap(), settings);
    let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["custom"], json!(true));
    assert_eq!(raw["max-points"], json!(42));
}
