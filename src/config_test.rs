use super::*;

fn args(service_url: Option<&str>, capacity: Option<&str>, timeout: Option<&str>) -> ConfigArgs {
    ConfigArgs {
        service_url: service_url.map(str::to_owned),
        history_capacity: capacity.map(str::to_owned),
        connect_timeout_secs: timeout.map(str::to_owned),
    }
}

#[test]
fn unset_values_use_defaults() {
    let config = Config::from_args(&ConfigArgs::default()).expect("config");
    assert_eq!(config.service_url, "http://localhost:37842");
    assert_eq!(config.history_capacity, 1000);
    assert_eq!(config.connect_timeout, Duration::from_secs(5));
}

#[test]
fn explicit_values_are_parsed() {
    let config = Config::from_args(&args(Some("http://127.0.0.1:9000/"), Some("50"), Some("2"))).expect("config");
    assert_eq!(config.service_url, "http://127.0.0.1:9000");
    assert_eq!(config.history_capacity, 50);
    assert_eq!(config.connect_timeout, Duration::from_secs(2));
}

#[test]
fn invalid_capacity_names_the_variable() {
    let err = Config::from_args(&args(None, Some("lots"), None)).expect_err("invalid");
    assert_eq!(err, ConfigError::InvalidNumber { var: HISTORY_CAPACITY_VAR, value: "lots".to_owned() });
    assert!(err.to_string().starts_with("ABSMOVE_HISTORY_CAPACITY"));
}

#[test]
fn zero_is_rejected() {
    let err = Config::from_args(&args(None, Some("0"), None)).expect_err("zero capacity");
    assert!(matches!(err, ConfigError::InvalidNumber { var: HISTORY_CAPACITY_VAR, .. }));
    let err = Config::from_args(&args(None, None, Some("0"))).expect_err("zero timeout");
    assert!(matches!(err, ConfigError::InvalidNumber { var: CONNECT_TIMEOUT_VAR, .. }));
}

#[test]
fn non_http_url_is_rejected() {
    let err = Config::from_args(&args(Some("ftp://example.com"), None, None)).expect_err("scheme");
    assert!(matches!(err, ConfigError::InvalidUrl { var: SERVICE_URL_VAR, .. }));
    let err = Config::from_args(&args(Some("not a url"), None, None)).expect_err("garbage");
    assert!(matches!(err, ConfigError::InvalidUrl { .. }));
}

#[test]
fn engine_config_carries_capacity() {
    let config = Config { history_capacity: 7, ..Config::default() };
    let engine = config.engine_config();
    assert_eq!(engine.history_capacity, 7);
    assert!(engine.edit_mode);
}
