use super::*;

#[test]
fn empty_config_uses_build_defaults() {
    let config = SluiceConfig::from_toml_str("").unwrap();

    assert_eq!(config.datasource, None);
    assert_eq!(config.build.descriptor, PathBuf::from("sluice.json"));
    assert_eq!(config.build.output, "sluice.rs");
}

#[test]
fn datasource_and_build_sections_parse() {
    let config = SluiceConfig::from_toml_str(
        r#"
        [datasource]
        url = "app.db"
        username = "app"
        modifier = "journal_mode=WAL"

        [build]
        descriptor = "schema/app.json"
        output = "app_dao.rs"
        "#,
    )
    .unwrap();

    let datasource = config.datasource.unwrap();
    assert_eq!(datasource.url, "app.db");
    assert_eq!(datasource.username.as_deref(), Some("app"));
    assert_eq!(datasource.password, None);
    assert_eq!(datasource.modifier.as_deref(), Some("journal_mode=WAL"));
    assert_eq!(config.build.descriptor, PathBuf::from("schema/app.json"));
    assert_eq!(config.build.output, "app_dao.rs");
}

#[test]
fn unknown_keys_are_rejected() {
    let err = SluiceConfig::from_toml_str("[datasource]\nurl = \"x\"\nport = 1\n").unwrap_err();

    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn missing_file_is_an_io_error() {
    let err = SluiceConfig::from_path("/definitely/not/here/sluice.toml").unwrap_err();

    assert!(matches!(err, ConfigError::Io { .. }));
}
