//! Manifest parsing and schema.
//!
//! The manifest (`stevedore.json`) declares a module tree's direct
//! dependencies in order, plus the legacy-imports flag that controls
//! short-name alias creation in the vendor tree.

use std::fs;
use std::io;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::dependency::Dependency;

/// File name of the manifest inside a package directory.
pub const MANIFEST_FILE: &str = "stevedore.json";

/// Current manifest/lock document format version.
pub const FORMAT_VERSION: u32 = 1;

/// A parsed manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// Document format version
    #[serde(default = "default_format_version")]
    pub version: u32,

    /// Direct dependencies, in declaration order
    #[serde(default)]
    pub dependencies: Vec<Dependency>,

    /// Create short-name aliases for backward-compatible import paths
    #[serde(default, rename = "legacyImports")]
    pub legacy_imports: bool,
}

fn default_format_version() -> u32 {
    FORMAT_VERSION
}

impl Default for Manifest {
    fn default() -> Self {
        Manifest {
            version: FORMAT_VERSION,
            dependencies: Vec::new(),
            legacy_imports: false,
        }
    }
}

impl Manifest {
    /// Create an empty manifest.
    pub fn new() -> Self {
        Manifest::default()
    }

    /// Load a manifest from the given path.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest: {}", path.display()))?;
        Self::parse(&raw, path)
    }

    /// Load a manifest, returning `None` if the file does not exist.
    ///
    /// Parse failures and other I/O errors are still reported.
    pub fn load_if_exists(path: &Path) -> Result<Option<Self>> {
        match fs::read_to_string(path) {
            Ok(raw) => Ok(Some(Self::parse(&raw, path)?)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => {
                Err(err).with_context(|| format!("failed to read manifest: {}", path.display()))
            }
        }
    }

    fn parse(raw: &str, path: &Path) -> Result<Self> {
        let manifest: Manifest = serde_json::from_str(raw)
            .with_context(|| format!("failed to parse manifest: {}", path.display()))?;
        if manifest.version != FORMAT_VERSION {
            bail!(
                "manifest version {} is not supported (expected {}): {}",
                manifest.version,
                FORMAT_VERSION,
                path.display()
            );
        }
        Ok(manifest)
    }

    /// Write the manifest to the given path, deterministically formatted.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut out = serde_json::to_string_pretty(self)
            .context("failed to serialize manifest")?;
        out.push('\n');
        crate::util::fs::write_string(path, &out)
    }

    /// Look up a direct dependency by canonical name.
    pub fn dependency(&self, name: &str) -> Option<&Dependency> {
        self.dependencies.iter().find(|d| d.name() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dependency::{GitSource, Source};
    use tempfile::TempDir;

    #[test]
    fn test_parse_minimal_manifest() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(MANIFEST_FILE);
        fs::write(&path, r#"{"version": 1}"#).unwrap();

        let manifest = Manifest::load(&path).unwrap();
        assert!(manifest.dependencies.is_empty());
        assert!(!manifest.legacy_imports);
    }

    #[test]
    fn test_parse_manifest_with_dependency() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(MANIFEST_FILE);
        fs::write(
            &path,
            r#"{
  "version": 1,
  "dependencies": [
    {
      "source": {"git": {"remote": "https://github.com/org/modules", "subdir": "lib"}},
      "version": "main"
    }
  ],
  "legacyImports": true
}"#,
        )
        .unwrap();

        let manifest = Manifest::load(&path).unwrap();
        assert_eq!(manifest.dependencies.len(), 1);
        assert_eq!(manifest.dependencies[0].name(), "github.com/org/modules/lib");
        assert!(manifest.legacy_imports);
    }

    #[test]
    fn test_load_if_exists_missing_file() {
        let tmp = TempDir::new().unwrap();
        let loaded = Manifest::load_if_exists(&tmp.path().join(MANIFEST_FILE)).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_load_if_exists_reports_parse_errors() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(MANIFEST_FILE);
        fs::write(&path, "not json").unwrap();

        assert!(Manifest::load_if_exists(&path).is_err());
    }

    #[test]
    fn test_unsupported_version_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(MANIFEST_FILE);
        fs::write(&path, r#"{"version": 9}"#).unwrap();

        let err = Manifest::load(&path).unwrap_err();
        assert!(err.to_string().contains("not supported"));
    }

    #[test]
    fn test_save_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(MANIFEST_FILE);

        let mut manifest = Manifest::new();
        manifest.dependencies.push(Dependency::new(
            Source::Git(GitSource {
                remote: "https://github.com/org/modules".to_string(),
                subdir: String::new(),
            }),
            "main",
        ));
        manifest.save(&path).unwrap();

        let back = Manifest::load(&path).unwrap();
        assert_eq!(back.dependencies, manifest.dependencies);
    }
}
