//! High-level operations.
//!
//! This module contains the ensure pipeline and lock persistence.

pub mod download;
pub mod ensure;
pub mod error;
pub mod link;
pub mod lockfile;

pub use download::{cache_path, Downloaded, PackageRef, ParallelDownloader, Staging};
pub use ensure::{ensure, ensure_with};
pub use error::EnsureError;
pub use lockfile::{load_lockfile, save_lockfile};
