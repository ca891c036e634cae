//! Dependency specification.
//!
//! A Dependency names a package by its source (a git repository or a local
//! directory) and pins a requested version and, once resolved, a content
//! digest. Canonical names are derived from the source and are
//! slash-normalized so they double as vendor-tree paths.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use url::Url;

/// A single dependency, as written in a manifest or recorded in the lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Where the package comes from
    pub source: Source,

    /// Requested revision (branch, tag, or commit); empty for local sources.
    /// After resolution this holds the immutable identifier returned by the
    /// source driver.
    #[serde(default)]
    pub version: String,

    /// Base64-encoded SHA-256 digest of the staged content; empty for local
    /// sources and for dependencies that have not been resolved yet
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sum: String,

    /// Suppress recursion into the package's own manifest
    #[serde(default, skip_serializing_if = "is_false")]
    pub single: bool,

    /// User override for the legacy short-name alias
    #[serde(default, rename = "name", skip_serializing_if = "Option::is_none")]
    pub legacy_name_compat: Option<String>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl Dependency {
    /// Create a new dependency.
    pub fn new(source: Source, version: impl Into<String>) -> Self {
        Dependency {
            source,
            version: version.into(),
            sum: String::new(),
            single: false,
            legacy_name_compat: None,
        }
    }

    /// Set the single flag.
    pub fn single(mut self, single: bool) -> Self {
        self.single = single;
        self
    }

    /// Canonical slash-normalized package name.
    pub fn name(&self) -> String {
        self.source.name()
    }

    /// Short name used for compatibility aliases: the user override if set,
    /// the source-derived default otherwise.
    pub fn legacy_name(&self) -> String {
        match &self.legacy_name_compat {
            Some(name) => name.clone(),
            None => self.source.default_legacy_name(),
        }
    }

    /// Check if this is a local-path dependency.
    pub fn is_local(&self) -> bool {
        matches!(self.source, Source::Local(_))
    }
}

/// Package origin. Exactly one variant applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// A git repository, optionally narrowed to a subdirectory
    Git(GitSource),

    /// A directory on the local filesystem, relative to the manifest that
    /// declared it
    Local(LocalSource),
}

impl Source {
    /// Canonical slash-normalized name for the package this source provides.
    pub fn name(&self) -> String {
        match self {
            Source::Git(git) => git.name(),
            Source::Local(local) => local.name(),
        }
    }

    /// Default short alias: the last component of the canonical name.
    pub fn default_legacy_name(&self) -> String {
        let name = self.name();
        match name.rsplit('/').next() {
            Some(last) => last.to_string(),
            None => name,
        }
    }
}

/// A remote git source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitSource {
    /// Repository URL
    pub remote: String,

    /// Subdirectory within the repository holding the package
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub subdir: String,
}

impl GitSource {
    /// Derive the canonical name: host and repository path with any `.git`
    /// suffix removed, joined with the subdirectory.
    pub fn name(&self) -> String {
        let repo = match Url::parse(&self.remote) {
            Ok(url) => {
                let host = url.host_str().unwrap_or("");
                let path = url.path().trim_matches('/');
                let path = path.strip_suffix(".git").unwrap_or(path);
                let path = path.trim_end_matches('/');
                if host.is_empty() {
                    path.to_string()
                } else if path.is_empty() {
                    host.to_string()
                } else {
                    format!("{host}/{path}")
                }
            }
            Err(_) => {
                // scp-style remotes: git@host:user/repo.git
                let raw = self.remote.trim_end_matches(".git");
                let raw = raw.strip_prefix("git@").unwrap_or(raw);
                raw.replacen(':', "/", 1).trim_matches('/').to_string()
            }
        };

        match self.subdir.trim_matches('/') {
            "" => repo,
            sub => format!("{repo}/{sub}"),
        }
    }
}

/// A local filesystem source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalSource {
    /// Directory of the package, relative to the declaring manifest
    pub directory: PathBuf,
}

impl LocalSource {
    /// Slash-normalized directory path.
    pub fn name(&self) -> String {
        self.directory.to_string_lossy().replace('\\', "/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn git_dep(remote: &str, subdir: &str, version: &str) -> Dependency {
        Dependency::new(
            Source::Git(GitSource {
                remote: remote.to_string(),
                subdir: subdir.to_string(),
            }),
            version,
        )
    }

    #[test]
    fn test_git_name_from_https_remote() {
        let dep = git_dep("https://github.com/org/modules.git", "", "main");
        assert_eq!(dep.name(), "github.com/org/modules");
    }

    #[test]
    fn test_git_name_includes_subdir() {
        let dep = git_dep("https://github.com/org/modules", "lib/grid", "main");
        assert_eq!(dep.name(), "github.com/org/modules/lib/grid");
        assert_eq!(dep.legacy_name(), "grid");
    }

    #[test]
    fn test_git_name_from_scp_style_remote() {
        let dep = git_dep("git@github.com:org/modules.git", "", "main");
        assert_eq!(dep.name(), "github.com/org/modules");
    }

    #[test]
    fn test_git_name_trailing_slash() {
        let dep = git_dep("https://example.com/a/b/", "", "main");
        assert_eq!(dep.name(), "example.com/a/b");
    }

    #[test]
    fn test_local_name_is_directory() {
        let dep = Dependency::new(
            Source::Local(LocalSource {
                directory: PathBuf::from("lib/util"),
            }),
            "",
        );
        assert_eq!(dep.name(), "lib/util");
        assert_eq!(dep.legacy_name(), "util");
    }

    #[test]
    fn test_legacy_name_override() {
        let mut dep = git_dep("https://github.com/org/modules", "", "main");
        dep.legacy_name_compat = Some("mods".to_string());
        assert_eq!(dep.legacy_name(), "mods");
    }

    #[test]
    fn test_serde_roundtrip_git() {
        let mut dep = git_dep("https://github.com/org/modules", "lib", "v1.2");
        dep.sum = "abc=".to_string();
        dep.single = true;

        let json = serde_json::to_string(&dep).unwrap();
        assert!(json.contains("\"git\""));
        assert!(json.contains("\"single\":true"));

        let back: Dependency = serde_json::from_str(&json).unwrap();
        assert_eq!(back, dep);
    }

    #[test]
    fn test_serde_omits_empty_fields() {
        let dep = git_dep("https://github.com/org/modules", "", "main");
        let json = serde_json::to_string(&dep).unwrap();
        assert!(!json.contains("sum"));
        assert!(!json.contains("single"));
        assert!(!json.contains("subdir"));
        assert!(!json.contains("\"name\""));
    }

    #[test]
    fn test_serde_local_source() {
        let json = r#"{"source":{"local":{"directory":"lib/util"}},"version":""}"#;
        let dep: Dependency = serde_json::from_str(json).unwrap();
        assert!(dep.is_local());
        assert_eq!(dep.name(), "lib/util");
    }
}
