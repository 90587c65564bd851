//! Integration test for `recast run` when another run holds the lock.
//!
//! Kept in its own test binary: `execute` installs the global tracing
//! subscriber, which can only happen once per process.

use recast_cli::cli::OutputFormat;
use recast_cli::commands::run::execute;
use recast_cli::lock::RunLock;
use recast_cli::output::OutputWriter;
use recast_core::config::RecastConfig;

#[tokio::test]
async fn test_run_exits_cleanly_while_another_run_holds_the_lock() {
    // Given: the lock is held and the daemon socket does not exist
    let dir = tempfile::tempdir().expect("should create temp dir");
    let lock_path = dir.path().join("run/recast.lock");
    let _held = RunLock::acquire(&lock_path)
        .expect("acquire should not fail")
        .expect("lock should be free");

    let mut config = RecastConfig::default();
    config.general.lock_file = lock_path.clone();
    config.general.backup_dir = dir.path().join("backups");
    config.general.log_level = "warn".to_owned();
    config.docker.socket = Some(dir.path().join("missing.sock").display().to_string());

    // When
    let result = execute(config, &OutputWriter::new(OutputFormat::Json)).await;

    // Then: no daemon contact, so the unreachable socket never surfaces
    assert!(result.is_ok(), "contended run should exit 0: {result:?}");
    assert!(
        !dir.path().join("backups").exists(),
        "nothing may be written by a contended run"
    );
    let pid = std::fs::read_to_string(&lock_path).expect("should read lock file");
    assert_eq!(pid.trim(), std::process::id().to_string());
}
