//! Coverage for config parsing, env overrides, and option building.

use platform_event_stream::config::StreamConfig;
use platform_event_stream::{AuthenticationParams, ConnectionMode, Environment};

const FULL_TOML: &str = r#"
event_name = "Order_Event__e"

[connection]
client_id = "3MVG9-client"
client_secret = "s3cret"
redirect_uri = "http://localhost:3000/oauth/_callback"
environment = "sandbox"
api_version = "v58.0"
mode = "multi"
timeout_ms = 30000

[authentication]
username = "integration@example.com"
password = "hunter2"
security_token = "tok"

[logging]
level = "debug"
json_dir = "/var/log/pes"
"#;

fn parse(toml_str: &str) -> StreamConfig {
    match StreamConfig::from_toml(toml_str) {
        Ok(config) => config,
        Err(err) => panic!("config should parse: {err}"),
    }
}

#[test]
fn parse_full_config() {
    let config = parse(FULL_TOML);

    assert_eq!(config.event_name.as_deref(), Some("Order_Event__e"));
    assert_eq!(config.connection.client_id, "3MVG9-client");
    assert_eq!(config.connection.environment, Environment::Sandbox);
    assert_eq!(config.connection.api_version.as_deref(), Some("v58.0"));
    assert_eq!(config.connection.mode, Some(ConnectionMode::Multi));
    assert_eq!(
        config.connection.extra.get("timeout_ms"),
        Some(&serde_json::json!(30000))
    );
    assert!(matches!(
        config.authentication,
        Some(AuthenticationParams::Password { .. })
    ));
    assert_eq!(config.logging.level, "debug");
    assert!(config.logging.json_dir.is_some());
}

#[test]
fn empty_config_uses_defaults() {
    let config = parse("");
    assert!(config.event_name.is_none());
    assert!(config.authentication.is_none());
    assert_eq!(config.connection.environment, Environment::Production);
    assert_eq!(config.logging.level, "info");
    assert!(config.logging.json_dir.is_none());
}

#[test]
fn invalid_toml_returns_error() {
    assert!(StreamConfig::from_toml("event_name = [").is_err());
}

#[test]
fn env_overrides_file_values() {
    let mut config = parse(FULL_TOML);
    config.apply_overrides(|key| match key {
        "PES_EVENT_NAME" => Some("Invoice_Event__e".to_string()),
        "PES_ENVIRONMENT" => Some("production".to_string()),
        "PES_PASSWORD" => Some("from-env".to_string()),
        "PES_LOG_LEVEL" => Some("warn".to_string()),
        _ => None,
    });

    assert_eq!(config.event_name.as_deref(), Some("Invoice_Event__e"));
    assert_eq!(config.connection.environment, Environment::Production);
    assert_eq!(config.logging.level, "warn");
    match config.authentication {
        Some(AuthenticationParams::Password {
            username,
            password,
            security_token,
        }) => {
            assert_eq!(username, "integration@example.com");
            assert_eq!(password, "from-env");
            assert_eq!(security_token.as_deref(), Some("tok"));
        }
        other => panic!("expected password grant, got {other:?}"),
    }
}

#[test]
fn env_creates_password_credentials() {
    let mut config = StreamConfig::default();
    config.apply_overrides(|key| match key {
        "PES_USERNAME" => Some("ops@example.com".to_string()),
        "PES_PASSWORD" => Some("pw".to_string()),
        _ => None,
    });
    assert_eq!(
        config.authentication,
        Some(AuthenticationParams::Password {
            username: "ops@example.com".to_string(),
            password: "pw".to_string(),
            security_token: None,
        })
    );
}

#[test]
fn invalid_environment_override_is_ignored() {
    let mut config = parse(FULL_TOML);
    config.apply_overrides(|key| match key {
        "PES_ENVIRONMENT" => Some("staging".to_string()),
        _ => None,
    });
    assert_eq!(config.connection.environment, Environment::Sandbox);
}

#[test]
fn validate_reports_missing_settings() {
    assert!(parse(FULL_TOML).validate().is_ok());

    let mut no_event = parse(FULL_TOML);
    no_event.event_name = None;
    assert!(no_event.validate().is_err());

    let mut blank_event = parse(FULL_TOML);
    blank_event.event_name = Some("   ".to_string());
    assert!(blank_event.validate().is_err());

    let mut no_auth = parse(FULL_TOML);
    no_auth.authentication = None;
    assert!(no_auth.validate().is_err());
}

#[test]
fn into_options_carries_config_through() {
    let options = match parse(FULL_TOML).into_options(None) {
        Ok(options) => options,
        Err(err) => panic!("options should build: {err}"),
    };
    assert_eq!(options.event_name, "Order_Event__e");
    assert_eq!(options.connection.client_id, "3MVG9-client");
    // The adapter pins the mode, not the config layer.
    assert_eq!(options.connection.mode, Some(ConnectionMode::Multi));
    assert!(options.logger.is_none());
}

#[test]
fn load_from_reads_file_and_rejects_missing() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let path = dir.path().join("event-stream.toml");
    std::fs::write(&path, FULL_TOML).expect("should write config");

    let loaded = StreamConfig::load_from(&path);
    assert!(loaded.is_ok());

    let missing = StreamConfig::load_from(&dir.path().join("absent.toml"));
    assert!(missing.is_err());
}
