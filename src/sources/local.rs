//! Local driver - dependencies on directories in the local filesystem.
//!
//! Local packages are never copied or hashed. The driver resolves the
//! declared directory relative to the manifest that referenced it and
//! records the result so the linker can point a vendor symlink straight at
//! the live directory.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use crate::core::dependency::LocalSource;
use crate::sources::driver::{Driver, InstallContext};
use crate::util::fs::normalize_path;

/// Driver for local filesystem sources.
pub struct LocalDriver {
    /// Resolved directory of the package
    directory: PathBuf,

    /// Name-forming path: relative to the project root when the directory
    /// sits inside it, absolute otherwise
    logical: PathBuf,
}

impl LocalDriver {
    /// Resolve a local source against the referencing manifest's directory.
    ///
    /// Nested local dependencies must resolve relative to the manifest that
    /// declared them, not the project root or the process working
    /// directory.
    pub fn new(source: &LocalSource, parent_dir: &Path, root_dir: &Path) -> Self {
        let raw = if source.directory.is_absolute() {
            source.directory.clone()
        } else {
            parent_dir.join(&source.directory)
        };
        let directory = normalize_path(&raw);
        let root = normalize_path(root_dir);

        let logical = match pathdiff::diff_paths(&directory, &root) {
            Some(rel) if !rel.as_os_str().is_empty() && !rel.starts_with("..") => rel,
            _ => directory.clone(),
        };

        LocalDriver { directory, logical }
    }

    /// The resolved directory the vendor symlink should target.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// The path that forms the package's canonical name.
    pub fn logical_path(&self) -> &Path {
        &self.logical
    }
}

impl Driver for LocalDriver {
    fn name(&self) -> &str {
        "local"
    }

    fn install(
        &self,
        ctx: &InstallContext,
        pkg_name: &str,
        _target_dir: &Path,
        _requested: &str,
    ) -> Result<String> {
        ctx.ensure_active()?;

        if !self.directory.is_dir() {
            bail!(
                "local dependency `{}` not found at {}",
                pkg_name,
                self.directory.display()
            );
        }

        // Nothing is staged; local packages have no resolved version.
        Ok(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn source(directory: &str) -> LocalSource {
        LocalSource {
            directory: directory.into(),
        }
    }

    #[test]
    fn test_resolves_relative_to_parent_manifest() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("x/y")).unwrap();
        fs::create_dir_all(root.join("x/z")).unwrap();

        let driver = LocalDriver::new(&source("../z"), &root.join("x/y"), root);

        assert_eq!(driver.directory(), normalize_path(&root.join("x/z")));
        assert_eq!(driver.logical_path(), Path::new("x/z"));
    }

    #[test]
    fn test_directory_outside_root_keeps_absolute_name() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("proj");
        fs::create_dir_all(&root).unwrap();
        fs::create_dir_all(tmp.path().join("elsewhere")).unwrap();

        let driver = LocalDriver::new(&source("../elsewhere"), &root, &root);

        assert!(driver.logical_path().is_absolute());
    }

    #[test]
    fn test_install_requires_existing_directory() {
        let tmp = TempDir::new().unwrap();
        let driver = LocalDriver::new(&source("missing"), tmp.path(), tmp.path());

        let err = driver
            .install(&InstallContext::new(), "missing", tmp.path(), "")
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_install_reports_empty_version() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("lib")).unwrap();

        let driver = LocalDriver::new(&source("lib"), tmp.path(), tmp.path());
        let resolved = driver
            .install(&InstallContext::new(), "lib", tmp.path(), "")
            .unwrap();
        assert!(resolved.is_empty());
    }
}
