//! Scratch file allocation for operators that spill to disk.

use common::DbResult;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Allocator handing out unique scratch file paths under one directory.
///
/// Injected into operators that need spill files (the hash join), so two
/// trees sharing one allocator never collide on names. Uniqueness comes
/// from an internal counter; no global state is involved.
#[derive(Debug)]
pub struct ScratchSpace {
    dir: PathBuf,
    counter: AtomicU64,
}

impl ScratchSpace {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            counter: AtomicU64::new(0),
        }
    }

    /// Reserve a fresh scratch path. The file itself is created by whoever
    /// uses the path; the returned token deletes it when dropped.
    pub fn alloc(&self, tag: &str) -> DbResult<ScratchFile> {
        std::fs::create_dir_all(&self.dir)?;
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        Ok(ScratchFile {
            path: self.dir.join(format!("{tag}-{n}.scratch")),
        })
    }
}

/// Ownership token for one scratch file.
///
/// Whoever holds the token owns the file; dropping (or explicitly
/// releasing) the token removes the file from disk.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file now. Equivalent to dropping the token.
    pub fn release(self) {}
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        // The file may never have been created; nothing to do then.
        let _ = std::fs::remove_file(&self.path);
    }
}
