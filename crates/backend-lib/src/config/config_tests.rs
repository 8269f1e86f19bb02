// crates/backend-lib/src/config/config_tests.rs
use super::*;
use figment::Jail;

#[test]
fn test_defaults_are_valid() {
    let settings = Settings::default();
    assert!(settings.validate().is_ok());
    assert_eq!(settings.bind_addr.to_string(), "127.0.0.1:3000");
    assert_eq!(settings.registry.ttl(), Some(Duration::from_secs(86_400)));
    assert_eq!(settings.provider.timeout(), Duration::from_secs(10));
}

#[test]
fn test_settings_validation() {
    let mut invalid = Settings::default();
    invalid.log_level = "loud".to_string();
    assert!(invalid.validate().is_err());

    let mut invalid = Settings::default();
    invalid.provider.timeout_ms = 0;
    assert!(invalid.validate().is_err());

    let mut invalid = Settings::default();
    invalid.provider.max_items = 0;
    assert!(invalid.validate().is_err());

    let mut invalid = Settings::default();
    invalid.registry.sweep_interval_secs = 0;
    assert!(invalid.validate().is_err());

    let mut invalid = Settings::default();
    invalid.registry.ttl_secs = Some(0);
    assert!(invalid.validate().is_err());

    let mut no_ttl = Settings::default();
    no_ttl.registry.ttl_secs = None;
    assert!(no_ttl.validate().is_ok());
}

#[test]
fn test_file_and_env_layering() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "watchparty.toml",
            r#"
                data_dir = "/var/lib/watchparty"
                log_level = "debug"

                [provider]
                api_key = "from-file"
                timeout_ms = 2500
            "#,
        )?;
        jail.set_env("WATCHPARTY_PROVIDER__API_KEY", "from-env");
        jail.set_env("WATCHPARTY_REGISTRY__SWEEP_INTERVAL_SECS", "5");

        let settings = Settings::load().expect("settings load");
        assert_eq!(settings.data_dir, PathBuf::from("/var/lib/watchparty"));
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.provider.api_key.as_deref(), Some("from-env"));
        assert_eq!(settings.provider.timeout_ms, 2500);
        assert_eq!(settings.registry.sweep_interval_secs, 5);
        // untouched keys keep their defaults
        assert_eq!(settings.provider.max_items, 500);
        Ok(())
    });
}

#[test]
fn test_missing_file_uses_defaults() {
    Jail::expect_with(|jail| {
        let settings = Settings::load_from(jail.directory().join("absent.toml")).expect("load");
        assert_eq!(settings.log_level, "info");
        Ok(())
    });
}

#[test]
fn test_invalid_file_is_rejected() {
    Jail::expect_with(|jail| {
        jail.create_file("watchparty.toml", r#"log_level = "shouting""#)?;
        assert!(Settings::load().is_err());
        Ok(())
    });
}
