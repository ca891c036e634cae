//! Parallel, deduplicating download of the dependency graph.
//!
//! Every distinct `(name, version)` pair is fetched exactly once, however
//! many manifests in the transitive closure reference it. Tasks run on
//! scoped threads and spawn child tasks as nested manifests are discovered;
//! the downloader returns only after every spawned task has finished.
//! Fetch errors are captured in the result map rather than propagated - the
//! linker re-examines the graph in deterministic order and surfaces the
//! first error it actually depends on.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::thread;

use anyhow::{Context, Result};

use crate::core::dependency::{Dependency, GitSource, LocalSource, Source};
use crate::core::lock::LockSet;
use crate::core::manifest::{Manifest, MANIFEST_FILE};
use crate::ops::error::EnsureError;
use crate::sources::{Driver, GitDriver, InstallContext, LocalDriver};
use crate::util::fs;
use crate::util::hash::hash_dir;

/// Name of the staging area under the vendor directory.
pub const CACHE_DIR: &str = ".cache";

/// Identity of one download: canonical name plus the version the manifest
/// requested (not the resolved one).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageRef {
    pub name: String,
    pub version: String,
}

impl PackageRef {
    /// Build the key for a manifest dependency.
    pub fn of(dep: &Dependency) -> Self {
        PackageRef {
            name: dep.name(),
            version: dep.version.clone(),
        }
    }
}

/// Where a fetched package's content lives.
#[derive(Debug, Clone)]
pub enum Staging {
    /// Staged under the cache; the package sits at `<dir>/<name>`
    Cache(PathBuf),

    /// A live local directory, linked as-is
    Local(PathBuf),
}

impl Staging {
    /// Directory holding the package content itself.
    pub fn package_dir(&self, name: &str) -> PathBuf {
        match self {
            Staging::Cache(dir) => dir.join(name),
            Staging::Local(dir) => dir.clone(),
        }
    }

    /// Target the vendor symlink for this package should point at.
    pub fn link_target(&self, name: &str) -> PathBuf {
        self.package_dir(name)
    }
}

/// Outcome of one download task.
#[derive(Debug)]
pub enum Downloaded {
    /// The package is present and verified
    Complete {
        /// Resolved dependency record for the lock
        lock: Dependency,
        /// Where its content lives
        staging: Staging,
        /// Its own manifest, when present and recursion is wanted
        manifest: Option<Manifest>,
    },

    /// The fetch failed; the linker raises this if the package is required
    Failed(anyhow::Error),
}

/// Map `(name, version)` to its staging directory under the cache.
///
/// Cache entries are keyed by the requested version so different versions
/// of the same package coexist; percent-encoding keeps names containing
/// slashes path-safe.
pub fn cache_path(vendor_dir: &Path, dep: &Dependency) -> PathBuf {
    let key = format!("{}-{}", dep.name(), dep.version);
    vendor_dir
        .join(CACHE_DIR)
        .join(urlencoding::encode(&key).into_owned())
}

/// Concurrent downloader for one ensure run.
///
/// Construct through [`ParallelDownloader::ensure`]; the value is consumed
/// by the run and must not be reused.
pub struct ParallelDownloader<'a> {
    vendor_dir: &'a Path,
    root_dir: &'a Path,
    old_locks: &'a LockSet,
    ctx: &'a InstallContext,

    /// Claimed `(name, version)` slots; the first task to insert a key owns
    /// the download
    seen: Mutex<HashSet<PackageRef>>,

    /// Results of finished tasks
    results: Mutex<HashMap<PackageRef, Downloaded>>,
}

impl<'a> ParallelDownloader<'a> {
    /// Recursively download all dependencies reachable from `direct`.
    ///
    /// `parent_dir` is the directory of the manifest declaring `direct`,
    /// used to resolve local sources. Returns once every spawned task has
    /// completed; failed fetches are recorded in the returned map, not
    /// raised.
    pub fn ensure(
        direct: &[Dependency],
        vendor_dir: &'a Path,
        root_dir: &'a Path,
        old_locks: &'a LockSet,
        ctx: &'a InstallContext,
    ) -> HashMap<PackageRef, Downloaded> {
        let downloader = ParallelDownloader {
            vendor_dir,
            root_dir,
            old_locks,
            ctx,
            seen: Mutex::default(),
            results: Mutex::default(),
        };

        thread::scope(|scope| {
            downloader.spawn_all(scope, direct.to_vec(), root_dir.to_path_buf());
        });

        downloader
            .results
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Spawn one task per dependency on the shared scope.
    fn spawn_all<'scope>(
        &'scope self,
        scope: &'scope thread::Scope<'scope, '_>,
        deps: Vec<Dependency>,
        parent_dir: PathBuf,
    ) {
        for dep in deps {
            let parent_dir = parent_dir.clone();
            scope.spawn(move || self.process(scope, dep, parent_dir));
        }
    }

    /// One download task: claim, fetch, then recurse into the package's
    /// own manifest.
    fn process<'scope>(
        &'scope self,
        scope: &'scope thread::Scope<'scope, '_>,
        dep: Dependency,
        parent_dir: PathBuf,
    ) {
        let key = PackageRef::of(&dep);
        if !self
            .seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone())
        {
            return;
        }

        let (lock, staging) = match self.fetch(&dep, &parent_dir) {
            Ok(fetched) => fetched,
            Err(err) => {
                self.record(key, Downloaded::Failed(err));
                return;
            }
        };

        if dep.single {
            self.record(
                key,
                Downloaded::Complete {
                    lock,
                    staging,
                    manifest: None,
                },
            );
            return;
        }

        let pkg_dir = staging.package_dir(&key.name);
        let manifest = match Manifest::load_if_exists(&pkg_dir.join(MANIFEST_FILE)) {
            Ok(manifest) => manifest,
            Err(err) => {
                self.record(key, Downloaded::Failed(err));
                return;
            }
        };

        let Some(manifest) = manifest else {
            self.record(
                key,
                Downloaded::Complete {
                    lock,
                    staging,
                    manifest: None,
                },
            );
            return;
        };

        // Nested local dependencies resolve relative to the real location
        // of this package, so follow symlinks before recursing.
        let next_parent = match pkg_dir.canonicalize() {
            Ok(path) => path,
            Err(err) => {
                let err = anyhow::Error::new(err).context(format!(
                    "failed to resolve package directory for {}",
                    key.name
                ));
                self.record(key, Downloaded::Failed(err));
                return;
            }
        };

        let children = manifest.dependencies.clone();
        self.record(
            key,
            Downloaded::Complete {
                lock,
                staging,
                manifest: Some(manifest),
            },
        );

        self.spawn_all(scope, children, next_parent);
    }

    /// Fetch a single package: decide download vs. reuse, stage, verify.
    fn fetch(&self, dep: &Dependency, parent_dir: &Path) -> Result<(Dependency, Staging)> {
        match &dep.source {
            Source::Local(local) => self.fetch_local(dep, local, parent_dir),
            Source::Git(git) => self.fetch_remote(dep, git),
        }
    }

    /// Local packages are resolved in place: no staging, no hashing, no
    /// lock precedence. Health is existence of the resolved directory.
    fn fetch_local(
        &self,
        dep: &Dependency,
        local: &LocalSource,
        parent_dir: &Path,
    ) -> Result<(Dependency, Staging)> {
        let driver = LocalDriver::new(local, parent_dir, self.root_dir);
        driver.install(self.ctx, &dep.name(), self.vendor_dir, "")?;

        let mut resolved = dep.clone();
        resolved.version = String::new();
        resolved.sum = String::new();
        resolved.source = Source::Local(LocalSource {
            directory: driver.logical_path().to_path_buf(),
        });

        Ok((resolved, Staging::Local(driver.directory().to_path_buf())))
    }

    /// Remote packages honor the lock: a locked entry pins the version, and
    /// an intact staging directory skips the download entirely.
    fn fetch_remote(&self, dep: &Dependency, git: &GitSource) -> Result<(Dependency, Staging)> {
        let cache = cache_path(self.vendor_dir, dep);

        let mut fetch_dep = dep.clone();
        let mut expected_sum = String::new();

        if let Some(locked) = self.old_locks.get(&dep.name()) {
            if integrity_intact(locked, &cache) {
                return Ok((locked.clone(), Staging::Cache(cache)));
            }
            // pin the symbolic request to the previously resolved version
            fetch_dep.version = locked.version.clone();
            expected_sum = locked.sum.clone();
        }

        fs::remove_dir_all_if_exists(&cache)?;
        fs::ensure_dir(&cache)?;

        let name = fetch_dep.name();
        let driver = GitDriver::new(git);
        let resolved_version = driver.install(self.ctx, &name, &cache, &fetch_dep.version)?;

        let sum = hash_dir(&cache.join(&name))
            .with_context(|| format!("failed to hash staged content of {name}"))?;

        if !expected_sum.is_empty() && expected_sum != sum {
            return Err(EnsureError::IntegrityMismatch {
                name,
                version: resolved_version,
            }
            .into());
        }

        fetch_dep.version = resolved_version;
        fetch_dep.sum = sum;
        Ok((fetch_dep, Staging::Cache(cache)))
    }

    fn record(&self, key: PackageRef, result: Downloaded) {
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, result);
    }
}

/// Check a staged cache directory against a locked dependency.
fn integrity_intact(locked: &Dependency, cache: &Path) -> bool {
    if locked.sum.is_empty() {
        return false;
    }

    let pkg_dir = cache.join(locked.name());
    if !pkg_dir.exists() {
        return false;
    }

    match hash_dir(&pkg_dir) {
        Ok(sum) if sum == locked.sum => true,
        Ok(_) => {
            tracing::warn!(
                "checksum mismatch for {}@{}, refetching",
                locked.name(),
                locked.version
            );
            false
        }
        Err(err) => {
            tracing::warn!("failed to verify {}: {err:#}", locked.name());
            false
        }
    }
}
