use std::{fs, time::Duration};

use cdsyncmon::config::MonitorConfig;
use tempfile::tempdir;

#[test]
fn set_key_round_trips_through_load() {
    let temp = tempdir().expect("create tempdir");
    let config_path = temp.path().join("config.env");
    fs::write(
        &config_path,
        "# cdsync settings\nLOCK_FILE=/tmp/roundtrip.lock\nPOLL_INTERVAL=2\n",
    )
    .expect("write config");

    MonitorConfig::set_key(&config_path, "POLL_INTERVAL", "9").expect("set key");
    MonitorConfig::set_key(&config_path, "NOTIFY_LEVEL", "off").expect("append key");

    let config = MonitorConfig::load(&config_path).expect("reload config");
    assert_eq!(config.poll_interval, Duration::from_secs(9));
    assert_eq!(config.lock_file, std::path::PathBuf::from("/tmp/roundtrip.lock"));
    assert_eq!(config.notify_level, cdsyncmon::notify::NotifyLevel::Off);

    // Unrelated content survives byte-for-byte.
    let content = fs::read_to_string(&config_path).expect("read config");
    assert!(content.starts_with("# cdsync settings\n"));
    assert!(content.contains("LOCK_FILE=/tmp/roundtrip.lock\n"));
}

#[test]
fn corrupt_lines_do_not_prevent_loading() {
    let temp = tempdir().expect("create tempdir");
    let config_path = temp.path().join("config.env");
    fs::write(
        &config_path,
        "garbage without equals\nPOLL_INTERVAL=notanumber\nLOCK_FILE=/tmp/ok.lock\n",
    )
    .expect("write config");

    let config = MonitorConfig::load(&config_path).expect("load config");
    assert_eq!(config.lock_file, std::path::PathBuf::from("/tmp/ok.lock"));
    // The unparseable interval falls back to the default.
    assert_eq!(config.poll_interval, cdsyncmon::config::DEFAULT_POLL_INTERVAL);
}

#[test]
fn empty_lock_file_value_falls_back_to_default() {
    let temp = tempdir().expect("create tempdir");
    let config_path = temp.path().join("config.env");
    fs::write(&config_path, "LOCK_FILE=\n").expect("write config");

    let config = MonitorConfig::load(&config_path).expect("load config");
    assert_eq!(
        config.lock_file,
        std::path::PathBuf::from(cdsyncmon::config::DEFAULT_LOCK_FILE)
    );
}
