use std::io::Write;

use uc_model::config::Config;

#[test]
fn missing_file_yields_defaults() {
    let path = std::env::temp_dir().join("uc-model-test-missing.conf");
    let _ = std::fs::remove_file(&path);
    let cfg = Config::load(&path).expect("missing config file is not an error");
    assert_eq!(cfg.retry_poll_count, 10);
    assert_eq!(cfg.module_timeout_seconds, 14_400);
}

#[test]
fn invalid_retry_poll_count_is_rejected() {
    let path = std::env::temp_dir().join("uc-model-test-invalid.conf");
    let mut f = std::fs::File::create(&path).unwrap();
    writeln!(f, "retry_poll_count = 0").unwrap();
    let err = Config::load(&path).unwrap_err();
    assert!(matches!(err, uc_model::config::ConfigError::InvalidValue { field: "retry_poll_count", .. }));
    let _ = std::fs::remove_file(&path);
}

#[test]
fn env_proxy_override_wins_over_file() {
    let path = std::env::temp_dir().join("uc-model-test-proxy.conf");
    let mut f = std::fs::File::create(&path).unwrap();
    writeln!(f, "http_proxy = \"http://file-proxy.example\"").unwrap();
    std::env::set_var("HTTP_PROXY", "http://env-proxy.example");
    let cfg = Config::load(&path).expect("config loads");
    assert_eq!(cfg.http_proxy.as_deref(), Some("http://env-proxy.example"));
    std::env::remove_var("HTTP_PROXY");
    let _ = std::fs::remove_file(&path);
}
