// Tests for configuration defaults, deserialization, and backend resolution.

use lpcm_record::{Backend, RecordConfig, RecordError};

#[test]
fn test_defaults_match_the_documented_table() {
    let config = RecordConfig::default();

    assert!(config.backend.is_none());
    assert!(config.recorder.is_none());
    assert_eq!(config.sample_rate, 16000);
    assert_eq!(config.channels, 1);
    assert!(!config.compress);
    assert_eq!(config.threshold, 0.5);
    assert!(config.threshold_start.is_none());
    assert!(config.threshold_end.is_none());
    assert_eq!(config.silence, "1.0");
    assert!(!config.end_on_silence);
    assert_eq!(config.audio_type, "wav");
    assert!(config.device.is_none());
}

#[test]
fn test_default_backend_is_sox() {
    let backend = RecordConfig::default().resolved_backend().unwrap();
    assert_eq!(backend, Backend::Sox);
}

#[test]
fn test_legacy_recorder_alias_resolves_when_backend_is_unset() {
    let config = RecordConfig {
        recorder: Some("arecord".to_string()),
        ..RecordConfig::default()
    };

    assert_eq!(config.resolved_backend().unwrap(), Backend::Arecord);
}

#[test]
fn test_backend_takes_precedence_over_the_alias() {
    let config = RecordConfig {
        backend: Some("rec".to_string()),
        recorder: Some("arecord".to_string()),
        ..RecordConfig::default()
    };

    assert_eq!(config.resolved_backend().unwrap(), Backend::Rec);
}

#[test]
fn test_unknown_backend_name_is_a_configuration_error() {
    let config = RecordConfig {
        backend: Some("ffmpeg".to_string()),
        ..RecordConfig::default()
    };

    let err = config.resolved_backend().unwrap_err();
    assert!(matches!(err, RecordError::UnknownBackend(ref name) if name == "ffmpeg"));
    assert!(err.to_string().contains("ffmpeg"));
}

#[test]
fn test_partial_json_deserializes_with_defaults_applied() {
    let config: RecordConfig =
        serde_json::from_str(r#"{"sample_rate": 44100, "device": "hw:1,0"}"#).unwrap();

    assert_eq!(config.sample_rate, 44100);
    assert_eq!(config.device.as_deref(), Some("hw:1,0"));
    assert_eq!(config.channels, 1);
    assert_eq!(config.audio_type, "wav");
    assert_eq!(config.resolved_backend().unwrap(), Backend::Sox);
}

#[test]
fn test_config_round_trips_through_json() {
    let config = RecordConfig {
        backend: Some("rec".to_string()),
        end_on_silence: true,
        threshold_start: Some("2%".to_string()),
        ..RecordConfig::default()
    };

    let json = serde_json::to_string(&config).unwrap();
    let back: RecordConfig = serde_json::from_str(&json).unwrap();

    assert_eq!(back.backend.as_deref(), Some("rec"));
    assert!(back.end_on_silence);
    assert_eq!(back.threshold_start.as_deref(), Some("2%"));
}
