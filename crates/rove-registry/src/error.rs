//! Error types for registry operations.
//!
//! [`RegistryError`] is the single error type returned by all [`Registry`](crate::Registry)
//! trait methods. The crucial distinction is [`RegistryError::NotFound`]
//! (the entry is absent — callers may fall through to the next registry in
//! a chain) versus everything else (the registry misbehaved — fatal, never
//! silently treated as absence).

use thiserror::Error;

use crate::types::{ModuleName, Version};

fn at_version(version: &Option<Version>) -> String {
    match version {
        Some(v) => format!("@{v}"),
        None => String::new(),
    }
}

/// Errors returned by [`Registry`](crate::Registry) operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The registry has no entry for this module (or module version).
    ///
    /// This is the only variant a registry chain continues past.
    #[error("module `{module}{}` not found in registry `{registry}`", at_version(.version))]
    NotFound {
        /// The registry that was queried.
        registry: String,
        /// The module that was requested.
        module: ModuleName,
        /// The version that was requested, when the lookup was
        /// version-specific.
        version: Option<Version>,
    },

    /// The registry could not be reached or answered abnormally: I/O
    /// failure, network failure, timeout, or an unexpected HTTP status.
    #[error("registry `{registry}`: transport failure: {detail}")]
    Transport {
        /// The registry that was queried.
        registry: String,
        /// Description of the failure.
        detail: String,
    },

    /// The registry answered, but the entry's contents are invalid: bad
    /// TOML, a declaration that contradicts the requested coordinates, or a
    /// module entry missing its source descriptor.
    #[error("registry `{registry}`: malformed entry `{path}`: {detail}")]
    Malformed {
        /// The registry that served the entry.
        registry: String,
        /// The entry path within the registry layout.
        path: String,
        /// Description of the problem.
        detail: String,
    },
}

impl RegistryError {
    /// Returns `true` for the absence case a chain may continue past.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
