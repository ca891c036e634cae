//! Lock record I/O.
//!
//! The caller persists the lock next to the manifest; output is
//! deterministic so repeated runs over unchanged inputs produce
//! byte-identical files.

use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::core::lock::{LockFile, LockSet};
use crate::util::fs;

/// Load the lock record, returning an empty set if the file does not exist.
pub fn load_lockfile(path: &Path) -> Result<LockSet> {
    if !path.exists() {
        return Ok(LockSet::new());
    }

    let raw = fs::read_to_string(path)?;
    let file: LockFile = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse lock file: {}", path.display()))?;

    if !file.is_compatible() {
        bail!(
            "lock file version {} is not supported: {}",
            file.version,
            path.display()
        );
    }

    Ok(file.dependencies)
}

/// Save the lock record.
pub fn save_lockfile(path: &Path, locks: &LockSet) -> Result<()> {
    let file = LockFile::new(locks.clone());
    let mut out =
        serde_json::to_string_pretty(&file).context("failed to serialize lock file")?;
    out.push('\n');
    fs::write_string(path, &out)
}
