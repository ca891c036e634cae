//! The ensure pipeline: download, link, prune, alias.
//!
//! `ensure` receives the direct dependencies, the vendor directory, and the
//! previously persisted lock. It makes sure every direct and nested
//! dependency is present in the vendor tree at the correct version, removes
//! everything that no longer belongs, and returns the new lock for the
//! caller to persist.

use std::collections::HashSet;
use std::fs as stdfs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::core::lock::LockSet;
use crate::core::manifest::Manifest;
use crate::ops::download::{ParallelDownloader, CACHE_DIR};
use crate::ops::link::link_downloaded;
use crate::sources::InstallContext;
use crate::util::fs;

/// Run the full pipeline with a fresh install context.
///
/// `root_dir` is the directory of the manifest declaring `direct`; local
/// sources resolve relative to it.
pub fn ensure(
    direct: &Manifest,
    root_dir: &Path,
    vendor_dir: &Path,
    old_locks: &LockSet,
) -> Result<LockSet> {
    ensure_with(direct, root_dir, vendor_dir, old_locks, &InstallContext::new())
}

/// Run the full pipeline with a caller-supplied install context, so
/// embedders can cancel in-flight source fetches from another thread.
///
/// A dependency already in the lock takes precedence over the manifest's
/// symbolic version, and is skipped entirely when its staged content still
/// matches the locked checksum. The pipeline waits for all in-flight
/// downloads even when one fails; the first error required by the manifest
/// graph is returned.
pub fn ensure_with(
    direct: &Manifest,
    root_dir: &Path,
    vendor_dir: &Path,
    old_locks: &LockSet,
    ctx: &InstallContext,
) -> Result<LockSet> {
    fs::ensure_dir(vendor_dir)?;
    let vendor_dir = vendor_dir
        .canonicalize()
        .with_context(|| format!("failed to resolve vendor directory: {}", vendor_dir.display()))?;
    let root_dir = root_dir
        .canonicalize()
        .with_context(|| format!("failed to resolve project root: {}", root_dir.display()))?;

    let mut downloaded = ParallelDownloader::ensure(
        &direct.dependencies,
        &vendor_dir,
        &root_dir,
        old_locks,
        ctx,
    );

    // The lock is rebuilt from scratch by the walk, so names the manifest
    // graph no longer reaches drop out of the returned record.
    let mut locks = LockSet::new();
    link_downloaded(
        &direct.dependencies,
        &vendor_dir,
        &mut downloaded,
        &mut locks,
        &mut HashSet::new(),
    )?;

    clean_legacy_names(&mut locks);

    prune_unknown_dirs(&vendor_dir, &locks)?;

    // Drop every symlink that is not a canonical vendor entry; wanted
    // aliases are recreated below.
    clean_symlinks(&vendor_dir, &locks)?;
    if direct.legacy_imports {
        link_legacy(&vendor_dir, &locks)?;
    }

    Ok(locks)
}

/// Clear each legacy-name override that matches the source-derived default,
/// keeping the persisted lock minimal.
fn clean_legacy_names(locks: &mut LockSet) {
    for dep in locks.entries_mut() {
        let default = dep.source.default_legacy_name();
        if dep.legacy_name_compat.as_deref() == Some(default.as_str()) {
            dep.legacy_name_compat = None;
        }
    }
}

/// Remove directories under the vendor root that no lock entry accounts
/// for. The `.cache` staging area is never part of the published tree.
fn prune_unknown_dirs(vendor_dir: &Path, locks: &LockSet) -> Result<()> {
    let cache_root = vendor_dir.join(CACHE_DIR);

    let mut dirs: Vec<PathBuf> = Vec::new();
    for entry in WalkDir::new(vendor_dir)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| e.path() != cache_root)
    {
        let entry = entry.context("failed to walk vendor directory")?;
        if entry.file_type().is_dir() {
            dirs.push(entry.into_path());
        }
    }

    for dir in dirs {
        let rel = dir
            .strip_prefix(vendor_dir)
            .context("walked path outside vendor directory")?;
        if !known(locks, rel) {
            tracing::info!("clean {}", dir.display());
            fs::remove_dir_all_if_exists(&dir)?;
        }
    }

    Ok(())
}

/// A vendored path is known if it is a parent of some lock entry or lies
/// beneath one. Both directions matter: the first keeps enclosing
/// directories of known packages, the second spares children of a known
/// name.
fn known(locks: &LockSet, rel: &Path) -> bool {
    locks.iter().any(|dep| {
        let name = PathBuf::from(dep.name());
        rel.starts_with(&name) || name.starts_with(rel)
    })
}

/// Remove every symlink under the vendor root that is not a canonical
/// vendor entry for some lock name.
fn clean_symlinks(vendor_dir: &Path, locks: &LockSet) -> Result<()> {
    let keep: HashSet<PathBuf> = locks.iter().map(|d| vendor_dir.join(d.name())).collect();
    let cache_root = vendor_dir.join(CACHE_DIR);

    for entry in WalkDir::new(vendor_dir)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| e.path() != cache_root)
    {
        let entry = entry.context("failed to walk vendor directory")?;
        if entry.path_is_symlink() && !keep.contains(entry.path()) {
            tracing::debug!("removing stale symlink {}", entry.path().display());
            stdfs::remove_file(entry.path())
                .with_context(|| format!("failed to remove {}", entry.path().display()))?;
        }
    }

    Ok(())
}

/// Create short-name aliases for non-local lock entries.
///
/// A taken name is warned about and left alone - the canonical path keeps
/// working either way.
fn link_legacy(vendor_dir: &Path, locks: &LockSet) -> Result<()> {
    for dep in locks.iter() {
        if dep.is_local() {
            continue;
        }

        let name = dep.name();
        let alias = vendor_dir.join(dep.legacy_name());

        match stdfs::symlink_metadata(&alias) {
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                fs::symlink(Path::new(&name), &alias)
                    .with_context(|| format!("failed to alias {}", alias.display()))?;
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to stat {}", alias.display()));
            }
            Ok(meta) if meta.file_type().is_symlink() => {
                let taken_by = stdfs::read_link(&alias)
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|_| "?".to_string());
                tracing::warn!(
                    "cannot alias `{}` as `{}`: the name is already used by `{}`; \
                     the full path still works",
                    name,
                    dep.legacy_name(),
                    taken_by
                );
            }
            Ok(_) => {
                tracing::warn!(
                    "cannot alias `{}` as `{}`: a file or directory with that name \
                     already exists; the full path still works",
                    name,
                    dep.legacy_name()
                );
            }
        }
    }

    Ok(())
}
