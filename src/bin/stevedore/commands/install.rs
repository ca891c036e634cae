//! `stevedore install` command

use std::path::Path;

use anyhow::{bail, Result};

use crate::cli::InstallArgs;
use stevedore::core::dependency::{Dependency, GitSource, LocalSource, Source};
use stevedore::core::lock::LOCK_FILE;
use stevedore::core::manifest::{Manifest, MANIFEST_FILE};
use stevedore::ops::{ensure, load_lockfile, save_lockfile, EnsureError};

pub fn execute(args: InstallArgs, vendor_dir: &Path) -> Result<()> {
    let manifest_path = Path::new(MANIFEST_FILE);
    if !manifest_path.exists() {
        bail!("`{}` not found; run `stevedore init` first", MANIFEST_FILE);
    }

    let mut manifest = Manifest::load(manifest_path)?;
    let locks = load_lockfile(Path::new(LOCK_FILE))?;

    for spec in &args.packages {
        let dep = parse_package_spec(spec)?.single(args.single);
        let existing = manifest.dependency(&dep.name()).map(|d| d.version.clone());
        match existing {
            Some(version) if version != dep.version => {
                return Err(EnsureError::VersionCollision {
                    name: dep.name(),
                    existing: version,
                    requested: dep.version,
                }
                .into());
            }
            Some(_) => {}
            None => manifest.dependencies.push(dep),
        }
    }

    let root = std::env::current_dir()?;
    let new_locks = ensure(&manifest, &root, vendor_dir, &locks)?;

    manifest.save(manifest_path)?;
    save_lockfile(Path::new(LOCK_FILE), &new_locks)?;

    eprintln!("   Installed {} package(s)", new_locks.len());
    Ok(())
}

/// Parse a package spec from the command line.
///
/// Local paths start with `.` or `/`; everything else is read as
/// `host/user/repo[/subdir…][@version]` and turned into an https remote.
fn parse_package_spec(spec: &str) -> Result<Dependency> {
    let (target, version) = match spec.rsplit_once('@') {
        Some((target, version)) => (target, version.to_string()),
        None => (spec, String::new()),
    };

    if target.starts_with('.') || target.starts_with('/') {
        return Ok(Dependency::new(
            Source::Local(LocalSource {
                directory: target.into(),
            }),
            "",
        ));
    }

    let mut parts = target.splitn(4, '/');
    let (host, user, repo) = match (parts.next(), parts.next(), parts.next()) {
        (Some(host), Some(user), Some(repo))
            if !host.is_empty() && !user.is_empty() && !repo.is_empty() =>
        {
            (host, user, repo)
        }
        _ => bail!(
            "invalid package spec `{}`: expected `host/user/repo[/subdir][@version]` \
             or a local path",
            spec
        ),
    };
    let subdir = parts.next().unwrap_or("").to_string();

    Ok(Dependency::new(
        Source::Git(GitSource {
            remote: format!("https://{host}/{user}/{repo}"),
            subdir,
        }),
        version,
    ))
}
