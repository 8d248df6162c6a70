// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process per-path locks serializing mailbox read-modify-write.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Registry of one mutex per mailbox file path.
///
/// The lock only coordinates tasks inside this process. Workers in other
/// processes rely on the temp+rename convention instead: their writes race
/// with our reads as whole-file swaps, never partial content.
#[derive(Clone, Default)]
pub struct PathLocks {
    inner: Arc<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>>,
}

impl PathLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch (or create) the lock for a path.
    pub fn for_path(&self, path: &Path) -> Arc<Mutex<()>> {
        let mut map = self.inner.lock();
        Arc::clone(
            map.entry(path.to_path_buf())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
