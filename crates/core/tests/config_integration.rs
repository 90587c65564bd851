//! recast.toml 통합 설정 테스트
//!
//! - recast.toml.example 파싱 테스트
//! - 부분 설정 로딩 테스트
//! - 환경변수 우선순위 테스트
//! - 파일 로딩 에러 테스트

use std::io::Write;

use recast_core::config::RecastConfig;
use recast_core::error::{ConfigError, RecastError};

const EXAMPLE: &str = include_str!("../../../recast.toml.example");

// =============================================================================
// recast.toml.example 파싱 테스트
// =============================================================================

#[test]
fn example_config_parses_successfully() {
    let config = RecastConfig::parse(EXAMPLE).expect("example config should parse");
    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.general.log_format, "text");
    assert!(config.general.log_file.is_none());
    assert!(config.docker.socket.is_none());
}

#[test]
fn example_config_passes_validation() {
    let config = RecastConfig::parse(EXAMPLE).expect("should parse");
    config
        .validate()
        .expect("example config should pass validation");
}

#[test]
fn example_config_matches_code_defaults() {
    let example = RecastConfig::parse(EXAMPLE).expect("should parse");
    let defaults = RecastConfig::default();

    assert_eq!(example.general.lock_file, defaults.general.lock_file);
    assert_eq!(example.general.backup_dir, defaults.general.backup_dir);
    assert_eq!(
        example.docker.api_timeout_secs,
        defaults.docker.api_timeout_secs
    );
    assert_eq!(example.run.dry_run, defaults.run.dry_run);
    assert_eq!(example.run.prune_images, defaults.run.prune_images);
    assert_eq!(example.run.compose_only, defaults.run.compose_only);
    assert_eq!(example.run.standalone_only, defaults.run.standalone_only);
    assert_eq!(
        example.run.stop_timeout_secs,
        defaults.run.stop_timeout_secs
    );
    assert_eq!(
        example.run.pull_all_platforms,
        defaults.run.pull_all_platforms
    );
    assert_eq!(
        example.run.command_timeout_secs,
        defaults.run.command_timeout_secs
    );
    assert!(example.filters.containers().is_unrestricted());
    assert!(example.filters.projects().is_unrestricted());
}

// =============================================================================
// 부분 설정 테스트
// =============================================================================

#[test]
fn partial_config_run_only() {
    let config = RecastConfig::parse(
        r#"
[run]
compose_only = true
stop_timeout_secs = 90
"#,
    )
    .expect("should parse");

    assert!(config.run.compose_only);
    assert_eq!(config.run.stop_timeout_secs, 90);
    assert_eq!(config.general.log_level, "info");
    config.validate().expect("should validate");
}

#[test]
fn partial_config_filters_mix_string_and_array() {
    let config = RecastConfig::parse(
        r#"
[filters]
only_containers = "web;api worker"
exclude_projects = ["legacy", "staging,tmp"]
"#,
    )
    .expect("should parse");

    let containers = config.filters.containers();
    assert!(containers.includes("worker"));
    assert!(!containers.includes("db"));

    let projects = config.filters.projects();
    assert!(!projects.includes("tmp"));
    assert!(projects.includes("shop"));
}

#[test]
fn unknown_type_is_parse_error() {
    let err = RecastConfig::parse("[run]\nstop_timeout_secs = \"soon\"").unwrap_err();
    assert!(matches!(
        err,
        RecastError::Config(ConfigError::ParseFailed { .. })
    ));
}

// =============================================================================
// 환경변수 우선순위 테스트
// =============================================================================

#[test]
#[serial_test::serial]
fn env_override_takes_precedence_over_toml() {
    let original = std::env::var("RECAST_RUN_STOP_TIMEOUT_SECS").ok();
    // SAFETY: serial 테스트로 실행되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("RECAST_RUN_STOP_TIMEOUT_SECS", "5");
    }

    let mut config = RecastConfig::parse("[run]\nstop_timeout_secs = 60").expect("should parse");
    config.apply_env_overrides();

    // SAFETY: serial 테스트로 실행되어 환경변수 조작이 안전합니다.
    unsafe {
        match original {
            Some(val) => std::env::set_var("RECAST_RUN_STOP_TIMEOUT_SECS", val),
            None => std::env::remove_var("RECAST_RUN_STOP_TIMEOUT_SECS"),
        }
    }

    assert_eq!(config.run.stop_timeout_secs, 5);
}

#[test]
#[serial_test::serial]
fn env_override_invalid_number_keeps_toml_value() {
    let original = std::env::var("RECAST_RUN_STOP_TIMEOUT_SECS").ok();
    // SAFETY: serial 테스트로 실행되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("RECAST_RUN_STOP_TIMEOUT_SECS", "forever");
    }

    let mut config = RecastConfig::parse("[run]\nstop_timeout_secs = 60").expect("should parse");
    config.apply_env_overrides();

    // SAFETY: serial 테스트로 실행되어 환경변수 조작이 안전합니다.
    unsafe {
        match original {
            Some(val) => std::env::set_var("RECAST_RUN_STOP_TIMEOUT_SECS", val),
            None => std::env::remove_var("RECAST_RUN_STOP_TIMEOUT_SECS"),
        }
    }

    assert_eq!(config.run.stop_timeout_secs, 60);
}

#[tokio::test]
#[serial_test::serial]
async fn load_applies_env_then_validates() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "[run]\ncompose_only = true").expect("write");

    // SAFETY: serial 테스트로 실행되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("RECAST_RUN_STANDALONE_ONLY", "true");
    }
    let result = RecastConfig::load(file.path()).await;
    // SAFETY: serial 테스트로 실행되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::remove_var("RECAST_RUN_STANDALONE_ONLY");
    }

    let err = result.expect_err("conflicting flags must be rejected");
    assert!(matches!(
        err,
        RecastError::Config(ConfigError::Conflict { .. })
    ));
}

// =============================================================================
// 파일 로딩 테스트
// =============================================================================

#[tokio::test]
#[serial_test::serial]
async fn load_reads_file_from_disk() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "[general]\nbackup_dir = \"/tmp/recast-backups\"").expect("write");

    let config = RecastConfig::load(file.path()).await.expect("should load");
    assert_eq!(
        config.general.backup_dir,
        std::path::PathBuf::from("/tmp/recast-backups")
    );
}

#[tokio::test]
async fn load_missing_file_is_not_found() {
    let dir = tempfile::tempdir().expect("temp dir");
    let err = RecastConfig::load(dir.path().join("absent.toml"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RecastError::Config(ConfigError::FileNotFound { .. })
    ));
}
