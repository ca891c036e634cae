//! Git driver - packages fetched from git repositories.

use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use git2::{ObjectType, Repository, ResetType};

use crate::core::dependency::GitSource;
use crate::sources::driver::{Driver, InstallContext};
use crate::util::fs::ensure_dir;

/// Driver for remote git sources.
pub struct GitDriver {
    /// Remote repository URL
    remote: String,

    /// Subdirectory within the repository to extract
    subdir: String,
}

impl GitDriver {
    /// Create a driver for a git source.
    pub fn new(source: &GitSource) -> Self {
        GitDriver {
            remote: source.remote.clone(),
            subdir: source.subdir.trim_matches('/').to_string(),
        }
    }

    /// Resolve a possibly symbolic revision to a commit and check it out.
    ///
    /// Branches exist as remote-tracking refs after a clone, so a bare
    /// branch name is retried as `origin/<name>`.
    fn checkout(&self, repo: &Repository, requested: &str) -> Result<String> {
        let commit = if requested.is_empty() {
            repo.head()
                .and_then(|head| head.peel(ObjectType::Commit))
                .with_context(|| format!("failed to resolve HEAD of {}", self.remote))?
        } else {
            repo.revparse_single(requested)
                .and_then(|obj| obj.peel(ObjectType::Commit))
                .or_else(|_| {
                    repo.revparse_single(&format!("origin/{requested}"))
                        .and_then(|obj| obj.peel(ObjectType::Commit))
                })
                .map_err(|_| anyhow!("unknown revision `{}` in {}", requested, self.remote))?
        };

        repo.reset(&commit, ResetType::Hard, None)
            .with_context(|| format!("failed to check out `{requested}`"))?;

        Ok(commit.id().to_string())
    }
}

impl Driver for GitDriver {
    fn name(&self) -> &str {
        "git"
    }

    fn install(
        &self,
        ctx: &InstallContext,
        pkg_name: &str,
        target_dir: &Path,
        requested: &str,
    ) -> Result<String> {
        ctx.ensure_active()?;
        tracing::info!("fetching {} from {}", pkg_name, self.remote);

        let scratch = tempfile::tempdir().context("failed to create scratch checkout")?;
        let repo = Repository::clone(&self.remote, scratch.path())
            .with_context(|| format!("failed to clone {}", self.remote))?;

        let resolved = self.checkout(&repo, requested)?;
        ctx.ensure_active()?;

        let content_root = if self.subdir.is_empty() {
            scratch.path().to_path_buf()
        } else {
            scratch.path().join(&self.subdir)
        };
        if !content_root.is_dir() {
            bail!(
                "subdirectory `{}` not found in {} at `{}`",
                self.subdir,
                self.remote,
                requested
            );
        }

        let dest = target_dir.join(pkg_name);
        ensure_dir(&dest)?;
        copy_checkout(&content_root, &dest)?;

        Ok(resolved)
    }
}

/// Copy checkout content into the staging directory.
///
/// The `.git` directory is left behind; symlinks are dropped to match the
/// content hasher, which never reads them.
fn copy_checkout(src: &Path, dst: &Path) -> Result<()> {
    for entry in
        fs::read_dir(src).with_context(|| format!("failed to read directory: {}", src.display()))?
    {
        let entry = entry?;
        let ty = entry.file_type()?;
        let name = entry.file_name();
        if name == ".git" {
            continue;
        }

        let to = dst.join(&name);
        if ty.is_dir() {
            fs::create_dir_all(&to)
                .with_context(|| format!("failed to create directory: {}", to.display()))?;
            copy_checkout(&entry.path(), &to)?;
        } else if ty.is_file() {
            fs::copy(entry.path(), &to).with_context(|| {
                format!(
                    "failed to copy {} to {}",
                    entry.path().display(),
                    to.display()
                )
            })?;
        }
    }
    Ok(())
}
