//! `stevedore update` command

use std::path::Path;

use anyhow::{bail, Result};

use crate::cli::UpdateArgs;
use stevedore::core::lock::{LockSet, LOCK_FILE};
use stevedore::core::manifest::{Manifest, MANIFEST_FILE};
use stevedore::ops::{ensure, save_lockfile};

pub fn execute(_args: UpdateArgs, vendor_dir: &Path) -> Result<()> {
    let manifest_path = Path::new(MANIFEST_FILE);
    if !manifest_path.exists() {
        bail!("`{}` not found; run `stevedore init` first", MANIFEST_FILE);
    }

    let manifest = Manifest::load(manifest_path)?;

    // An empty lock forces every symbolic revision to re-resolve.
    let locks = ensure(&manifest, &std::env::current_dir()?, vendor_dir, &LockSet::new())?;

    save_lockfile(Path::new(LOCK_FILE), &locks)?;

    eprintln!("     Updated {} package(s)", locks.len());
    Ok(())
}
