//! Content hashing for vendored package directories.

use std::fs::File;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use base64::prelude::{Engine as _, BASE64_STANDARD};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

/// Compute the digest of a directory: SHA-256 over the concatenated contents
/// of its regular files, walked in sorted order, base64-encoded.
///
/// Directories and symlinks contribute nothing. Identical nested content can
/// appear both with and without a subdirectory representation, and symlinks
/// between the two must not leak one package's bytes into another's digest.
/// Metadata is excluded so permission noise does not break verification.
pub fn hash_dir(dir: &Path) -> Result<String> {
    let mut hasher = Sha256::new();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.with_context(|| format!("failed to walk: {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let mut file = File::open(entry.path())
            .with_context(|| format!("failed to open file for hashing: {}", entry.path().display()))?;
        io::copy(&mut file, &mut hasher)
            .with_context(|| format!("failed to hash: {}", entry.path().display()))?;
    }

    Ok(BASE64_STANDARD.encode(hasher.finalize()))
}
