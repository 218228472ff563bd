//! Build folder lock
//!
//! Two runs extracting into the same work directory would trample each other,
//! so a run holds an exclusive lock next to `work/` for its whole duration.
//! The lock file is never deleted: unlinking it would let a waiting process
//! lock the orphaned inode while another locks a fresh file.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Lock file name inside `<croot>/<build_id>`. Hidden so it never counts as
/// an extracted directory.
pub const LOCK_FILE_NAME: &str = ".extra-sources.lock";

/// Take the exclusive lock for a build folder.
/// Returns a guard that releases the lock when dropped.
pub fn acquire_build_lock(build_dir: &Path) -> Result<BuildLock> {
    let lock_path = build_dir.join(LOCK_FILE_NAME);

    let lock_file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&lock_path)
        .with_context(|| format!("Failed to create lock file: {}", lock_path.display()))?;

    if lock_file.try_lock_exclusive().is_err() {
        return Err(anyhow::anyhow!(
            "extra sources for '{}' are already being fetched by another process \
             (lock held on '{}')",
            build_dir.display(),
            lock_path.display()
        ));
    }

    Ok(BuildLock {
        _file: lock_file,
        path: lock_path,
    })
}

/// RAII guard for the build lock - the lock is released when the file is closed on drop
#[derive(Debug)]
pub struct BuildLock {
    _file: File,
    path: PathBuf,
}

impl BuildLock {
    pub fn path(&self) -> &Path {
        &self.path
    }
}
