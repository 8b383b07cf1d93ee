use std::collections::HashMap;
use std::io::Write;

use dolt_middleware::prelude::*;

#[test]
fn validate_checks_host_then_user_then_port() {
    let mut config = DoltConfig::default();
    assert!(matches!(config.validate(), Err(DoltMiddlewareError::NoHostDefined)));

    config.host = "127.0.0.1".into();
    assert!(matches!(config.validate(), Err(DoltMiddlewareError::NoUserDefined)));

    config.user = "root".into();
    assert!(matches!(config.validate(), Err(DoltMiddlewareError::NoPortDefined)));

    config.port = 3306;
    assert!(config.validate().is_ok());
}

#[test]
fn dsn_override_skips_field_validation() {
    let config = DoltConfig {
        dsn: Some("root:@tcp(db:3306)/shop".into()),
        ..DoltConfig::default()
    };
    assert!(config.validate().is_ok());
    assert_eq!(config.connection_string(), "root:@tcp(db:3306)/shop");
}

#[test]
fn connection_string_shapes() {
    let plain = DoltConfig::builder("localhost", "root", 3306).finish();
    assert_eq!(plain.connection_string(), "root:@localhost:3306/");

    let full = DoltConfig::builder("db.internal", "app", 3307)
        .password("s3cret")
        .database("shop")
        .parse_time(true)
        .tls(true)
        .finish();
    assert_eq!(
        full.connection_string(),
        "app:s3cret@db.internal:3307/shop?parseTime=true&tls=true"
    );
    assert!(!full.redacted_connection_string().contains("s3cret"));
}

#[test]
fn env_lookup_reads_dolt_variables() {
    let vars: HashMap<&str, &str> = [
        ("DOLT_HOST", "dolt"),
        ("DOLT_USER", "root"),
        ("DOLT_PORT", "3306"),
        ("DOLT_DATABASE", "shop"),
        ("DOLT_MULTI_STATEMENT", "true"),
        ("DOLT_BRANCH", "main"),
    ]
    .into_iter()
    .collect();
    let config = DoltConfig::from_lookup(|k| vars.get(k).map(|v| (*v).to_string())).unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.database(), Some("shop"));
    assert_eq!(config.pinned_branch(), Some("main"));
    assert_eq!(
        config.connection_string(),
        "root:@dolt:3306/shop?multiStatements=true"
    );

    let bad = DoltConfig::from_lookup(|k| (k == "DOLT_PORT").then(|| "not-a-port".to_string()));
    assert!(matches!(bad, Err(DoltMiddlewareError::ConfigError(_))));
}

#[test]
fn json_file_round_trip_omits_password() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"host":"localhost","user":"root","password":"pw","port":3306,"database_name":"shop","parse_time":true}}"#
    )
    .unwrap();

    let config = DoltConfig::from_json_file(file.path()).unwrap();
    assert_eq!(config.password, "pw");
    assert!(config.parse_time);
    assert_eq!(config.pool_max_size, 10);
    assert_eq!(
        config.connection_string(),
        "root:pw@localhost:3306/shop?parseTime=true"
    );

    let serialized = serde_json::to_string(&config).unwrap();
    assert!(!serialized.contains("pw\""));
}

#[test]
fn unreadable_json_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = DoltConfig::from_json_file(dir.path().join("missing.json")).unwrap_err();
    assert!(err.is_config_error());
}
