//! Host-wide run lock.
//!
//! An advisory exclusive `flock` on `general.lock_file` keeps a second recast
//! process from running at the same time. The kernel drops the lock when the
//! process exits, so a crashed run never leaves a stale lock behind.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::debug;

use recast_core::error::LockError;

/// Held run lock. Released on drop.
#[derive(Debug)]
pub struct RunLock {
    file: File,
    path: PathBuf,
}

impl RunLock {
    /// Try to take the lock without blocking.
    ///
    /// Returns `Ok(None)` when another process holds it.
    ///
    /// # Security
    ///
    /// - Creates the parent directory with restrictive permissions (0o700)
    /// - Refuses to lock anything that is not a regular file
    ///
    /// # Errors
    ///
    /// Returns `LockError` if the lock file cannot be created or opened.
    pub fn acquire(path: &Path) -> Result<Option<Self>, LockError> {
        let open_error = |e: std::io::Error| LockError::Open {
            path: path.display().to_string(),
            reason: e.to_string(),
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            create_private_dir(parent).map_err(open_error)?;
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(open_error)?;

        if !file.metadata().map_err(open_error)?.is_file() {
            return Err(LockError::NotRegularFile {
                path: path.display().to_string(),
            });
        }

        match FileExt::try_lock_exclusive(&file) {
            Ok(()) => {}
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                debug!(path = %path.display(), "lock held by another process");
                return Ok(None);
            }
            Err(e) => return Err(open_error(e)),
        }

        // PID is informational only
        let pid = file
            .set_len(0)
            .and_then(|()| writeln!(file, "{}", std::process::id()));
        if let Err(e) = pid {
            debug!(path = %path.display(), error = %e, "failed to record pid in run lock");
        }
        debug!(path = %path.display(), "run lock acquired");

        Ok(Some(Self {
            file,
            path: path.to_path_buf(),
        }))
    }

    /// Lock file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            debug!(path = %self.path.display(), error = %e, "failed to release run lock");
        }
    }
}

fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        let mut builder = std::fs::DirBuilder::new();
        builder.mode(0o700).recursive(true);
        builder.create(dir)
    }
    #[cfg(not(unix))]
    {
        std::fs::create_dir_all(dir)
    }
}
