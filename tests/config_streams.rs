//! Environment-driven configuration. Env-mutating tests are serialized.

use std::env;
use std::fs;

use cdlt_news::config::{load_stream_overrides_from, AppConfig};

#[serial_test::serial]
#[test]
fn env_paths_override_defaults() {
    env::set_var("CDLT_DATA_DIR", "/tmp/cdlt-test-data");
    env::set_var("CDLT_FONT_PATH", "/tmp/fonts/Inter-Bold.ttf");
    env::remove_var("CDLT_STREAMS_PATH");

    let cfg = AppConfig::from_env();
    assert_eq!(cfg.data_dir, std::path::PathBuf::from("/tmp/cdlt-test-data"));
    assert_eq!(
        cfg.font_path.as_deref(),
        Some(std::path::Path::new("/tmp/fonts/Inter-Bold.ttf"))
    );

    env::remove_var("CDLT_DATA_DIR");
    env::remove_var("CDLT_FONT_PATH");
}

#[serial_test::serial]
#[test]
fn streams_toml_overrides_capacity_and_interval() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("streams.toml");
    fs::write(
        &path,
        r#"
            poll_period_ms = 120000

            [articles]
            capacity = 150
            refresh_interval_ms = 60000

            [stories]
            prompt = "MOMENTOS CDLT (edición reducida): 6 micro-noticias. JSON: [{id, category, title, concept, timestamp, image}]"
        "#,
    )
    .unwrap();
    env::set_var("CDLT_STREAMS_PATH", path.display().to_string());
    env::remove_var("CDLT_DATA_DIR");
    env::remove_var("CDLT_FONT_PATH");

    let cfg = AppConfig::from_env();
    assert_eq!(cfg.articles.capacity, 150);
    assert_eq!(cfg.articles.refresh_interval_ms, 60_000);
    assert_eq!(cfg.poll_period_ms, 120_000);
    assert!(cfg.stories.prompt.contains("edición reducida"));
    // Untouched values keep their defaults.
    assert_eq!(cfg.stories.capacity, 40);

    env::remove_var("CDLT_STREAMS_PATH");
}

#[serial_test::serial]
#[test]
fn broken_overrides_file_falls_back_to_defaults() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("streams.toml");
    fs::write(&path, "this is not toml [").unwrap();
    env::set_var("CDLT_STREAMS_PATH", path.display().to_string());

    assert!(load_stream_overrides_from(&path).is_err());
    let cfg = AppConfig::from_env();
    assert_eq!(cfg.articles.capacity, 100);

    env::remove_var("CDLT_STREAMS_PATH");
}
