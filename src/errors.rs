//! Error taxonomy for the resolver core.
//!
//! Upstream pkg-config calls `exit(1)` straight out of the parser whenever
//! strict mode is set. This crate re-expresses that as a fail-fast `Error`
//! value propagated through `Result`; only the front-end binary
//! (`src/bin/pkgmeta.rs`) decides whether to turn an `Err` into a process
//! exit.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Every way the resolver can fail, grouped by how a caller should react:
/// recoverable-under-strict-mode, always-fatal, resource, internal.
#[derive(Debug, Error)]
pub enum Error {
    /// A descriptor syntax error that `parse_strict` promotes to fatal.
    /// In lax mode the caller logs this and moves on instead of
    /// constructing it.
    #[error("{0}")]
    Strict(String),

    #[error("package '{key}' has no {field}: field")]
    MissingField { key: String, field: &'static str },

    #[error(
        "package '{pkg}' requires '{dep} {op} {wanted}' but version of {dep} is {got}"
    )]
    VersionConstraint {
        pkg: String,
        dep: String,
        op: &'static str,
        wanted: String,
        got: String,
    },

    #[error(
        "Version {version} of {name} creates a conflict.\n\
         ({conflict_name} {op} {conflict_version} conflicts with {owner_name} {owner_version})"
    )]
    Conflict {
        name: String,
        version: String,
        conflict_name: String,
        op: &'static str,
        conflict_version: String,
        owner_name: String,
        owner_version: String,
    },

    #[error(
        "Package {0} was not found in the package search path.\n\
         Perhaps you should add the directory containing `{0}.pc'\n\
         to the search path"
    )]
    NotFound(String),

    #[error("dependency cycle detected while resolving '{0}'")]
    Cycle(String),

    #[error("internal pkgmeta error, package with no key, please file a bug report")]
    Internal,

    #[error("failed to open '{path}': {source}")]
    Io {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
}

impl Error {
    /// Convenience constructor used by the parser for recoverable
    /// conditions promoted to fatal under strict mode.
    pub fn strict(msg: impl Into<String>) -> Self {
        Error::Strict(msg.into())
    }
}
