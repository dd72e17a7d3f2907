use std::io::Write;
use std::time::Duration;

use anyhow::Result as AnyResult;
use clipsight::config::{DEFAULT_API_BASE, DEFAULT_MODEL};
use clipsight::{ClipsightError, PipelineConfig, SelectionPolicy};

#[test]
fn defaults_match_remote_behaviour() {
    let config = PipelineConfig::default();
    assert_eq!(config.api_base, DEFAULT_API_BASE);
    assert_eq!(config.model, DEFAULT_MODEL);
    assert_eq!(config.temperature, 0.5);
    assert_eq!(config.selection_policy, SelectionPolicy::FirstOnly);

    let poll = config.poll_config();
    assert_eq!(poll.interval, Duration::from_secs(5));
    assert_eq!(poll.max_attempts, None);
    assert!(config.validate().is_ok());
}

#[test]
fn loads_partial_json_file() -> AnyResult<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    write!(
        file,
        r#"{{
            "api_key": "${{CLIPSIGHT_CONFIG_TEST_KEY}}",
            "model": "gemini-1.5-pro",
            "poll": {{ "interval_ms": 250, "max_attempts": 12, "max_duration_secs": 60 }},
            "selection_policy": "all"
        }}"#
    )?;

    let config = PipelineConfig::load(file.path())?;
    assert_eq!(config.model, "gemini-1.5-pro");
    assert_eq!(config.selection_policy, SelectionPolicy::All);
    assert_eq!(config.upload_base, PipelineConfig::default().upload_base);

    let poll = config.poll_config();
    assert_eq!(poll.interval, Duration::from_millis(250));
    assert_eq!(poll.max_attempts, Some(12));
    assert_eq!(poll.max_duration, Some(Duration::from_secs(60)));

    std::env::set_var("CLIPSIGHT_CONFIG_TEST_KEY", "AIzaSyFromEnvironment");
    assert_eq!(config.resolve_api_key()?, "AIzaSyFromEnvironment");
    std::env::remove_var("CLIPSIGHT_CONFIG_TEST_KEY");
    Ok(())
}

#[test]
fn invalid_values_are_rejected() {
    let config = PipelineConfig {
        temperature: 3.0,
        ..PipelineConfig::default()
    };
    assert!(matches!(config.validate(), Err(ClipsightError::Config(_))));

    let mut config = PipelineConfig::default();
    config.poll.max_attempts = Some(0);
    assert!(config.validate().is_err());

    assert!(matches!(
        PipelineConfig::from_json_str("{ not json"),
        Err(ClipsightError::Config(_))
    ));
}

#[test]
fn environment_overrides_model() -> AnyResult<()> {
    std::env::set_var("CLIPSIGHT_MODEL", "gemini-2.0-pro-exp");
    let config = PipelineConfig::from_env();
    std::env::remove_var("CLIPSIGHT_MODEL");

    assert_eq!(config?.model, "gemini-2.0-pro-exp");
    Ok(())
}
