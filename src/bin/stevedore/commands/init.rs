//! `stevedore init` command

use std::path::Path;

use anyhow::{bail, Result};

use crate::cli::InitArgs;
use stevedore::core::manifest::{Manifest, MANIFEST_FILE};

pub fn execute(_args: InitArgs) -> Result<()> {
    let path = Path::new(MANIFEST_FILE);
    if path.exists() {
        bail!("`{}` already exists", MANIFEST_FILE);
    }

    Manifest::new().save(path)?;

    eprintln!("     Created {}", MANIFEST_FILE);
    Ok(())
}
