//! Deterministic materialization of downloaded packages into the vendor
//! tree.
//!
//! The linker restores the determinism the parallel downloader gave up: a
//! single-threaded depth-first walk of the manifest graph in declared
//! order. The first version seen for a name wins both the lock entry and
//! the vendor link; later references to the same name are skipped.

use std::collections::{HashMap, HashSet};
use std::path::{Component, Path};

use anyhow::{Context, Result};

use crate::core::dependency::Dependency;
use crate::core::lock::LockSet;
use crate::ops::download::{Downloaded, PackageRef};
use crate::ops::error::EnsureError;
use crate::util::fs;

/// Walk the graph from `direct`, recording lock entries and creating vendor
/// symlinks.
///
/// Consumes entries from `downloaded` as it goes; a missing entry is a
/// graph inconsistency, and a recorded fetch failure is raised on the first
/// dependency that needs it.
pub fn link_downloaded(
    direct: &[Dependency],
    vendor_dir: &Path,
    downloaded: &mut HashMap<PackageRef, Downloaded>,
    locks: &mut LockSet,
    seen: &mut HashSet<String>,
) -> Result<()> {
    for dep in direct {
        let name = dep.name();
        if !seen.insert(name.clone()) {
            continue;
        }

        let key = PackageRef::of(dep);
        let result = downloaded
            .remove(&key)
            .ok_or_else(|| EnsureError::GraphInconsistency {
                name: name.clone(),
                version: dep.version.clone(),
            })?;

        let (lock, staging, manifest) = match result {
            Downloaded::Complete {
                lock,
                staging,
                manifest,
            } => (lock, staging, manifest),
            Downloaded::Failed(err) => {
                return Err(err.context(format!(
                    "package {}@{} is required but failed to download",
                    name, dep.version
                )));
            }
        };

        let vendor_name = lock.name();
        locks.set(lock);

        if escapes_vendor(&vendor_name) {
            tracing::warn!(
                "not vendoring `{vendor_name}`: its path leaves the vendor directory"
            );
        } else {
            let dest = vendor_dir.join(&vendor_name);
            fs::remove_path_if_exists(&dest)?;
            if let Some(parent) = dest.parent() {
                fs::ensure_dir(parent)?;
            }
            let target = staging.link_target(&vendor_name);
            fs::symlink(&target, &dest)
                .with_context(|| format!("failed to link {}", dest.display()))?;
        }

        if let Some(manifest) = manifest {
            link_downloaded(&manifest.dependencies, vendor_dir, downloaded, locks, seen)?;
        }
    }

    Ok(())
}

/// A vendor entry must stay inside the vendor directory: absolute names and
/// names with parent components would land elsewhere.
fn escapes_vendor(name: &str) -> bool {
    let path = Path::new(name);
    path.is_absolute()
        || path
            .components()
            .any(|c| matches!(c, Component::ParentDir))
}
