//! Stevedore - a vendoring package manager for configuration-language
//! module trees.
//!
//! This crate provides the core library functionality for Stevedore:
//! resolving a manifest of direct dependencies into a hash-verified vendor
//! tree, maintaining the lock record, and pruning content that no longer
//! belongs.

pub mod core;
pub mod ops;
pub mod sources;
pub mod util;

pub use self::core::dependency::{Dependency, GitSource, LocalSource, Source};
pub use self::core::lock::LockSet;
pub use self::core::manifest::Manifest;
pub use self::ops::ensure::{ensure, ensure_with};
pub use self::ops::error::EnsureError;
