//! Resolution error types.
//!
//! Defines [`ResolveError`], the unified error type for a resolution run.
//! Every variant names the offending module and, where known, version and
//! registry, and its message ends with actionable guidance — root-cause
//! diagnosis should never require a debugger.
//!
//! All of these are fatal: there is no partial or degraded resolution mode.

use std::fmt;

use crate::config::ConfigError;
use crate::manifest::ManifestError;
use crate::model::overrides::DuplicateOverride;
use crate::model::{ModuleKey, ModuleName, Version};
use rove_registry::RegistryError;

// ---------------------------------------------------------------------------
// ResolveError
// ---------------------------------------------------------------------------

/// Unified error type for module resolution.
///
/// Each variant is designed to be self-contained: the user should be able
/// to understand what happened and what to do next without additional
/// context.
#[derive(Debug)]
pub enum ResolveError {
    /// No registries are configured but a registry lookup was needed.
    NoRegistries {
        /// The module that needed a registry.
        module: ModuleName,
    },

    /// A required module/version is absent from every configured registry.
    ModuleNotFound {
        /// The module that could not be resolved.
        module: ModuleName,
        /// The version that was requested.
        version: Version,
        /// The module that declared the requirement, when known.
        requested_by: Option<ModuleKey>,
        /// Versions each registry does offer, for diagnosis.
        available: Vec<(String, Vec<Version>)>,
    },

    /// A registry could not be reached or answered abnormally.
    Transport {
        /// The registry that failed.
        registry: String,
        /// Description of the failure.
        detail: String,
    },

    /// A registry served an entry whose contents are invalid.
    MalformedRegistry {
        /// The registry that served the entry.
        registry: String,
        /// The entry path within the registry layout.
        path: String,
        /// Description of the problem.
        detail: String,
    },

    /// The root declares two overrides for the same module.
    DuplicateOverride {
        /// The module declared twice.
        module: ModuleName,
    },

    /// An override source's module file could not be read.
    Inspect {
        /// The overridden module.
        module: ModuleName,
        /// The override kind (`local_path`, `archive`, `git`).
        kind: &'static str,
        /// Description of the failure.
        detail: String,
    },

    /// A root-declared patch file does not exist on disk.
    UnresolvedPatch {
        /// The module the patch was declared for.
        module: ModuleKey,
        /// The patch as declared.
        patch: String,
        /// Description of the failure.
        detail: String,
    },

    /// A declared integrity string is not valid.
    InvalidIntegrity {
        /// The module the integrity was declared for.
        module: ModuleKey,
        /// The invalid value.
        value: String,
        /// Why it is invalid.
        reason: String,
    },

    /// Fetched content does not match its declared integrity.
    ///
    /// Produced by the fetch driver through
    /// [`Integrity::verify`](crate::model::source::Integrity::verify).
    IntegrityMismatch {
        /// The module whose content mismatched.
        module: ModuleKey,
        /// The digest the declaration expects.
        expected: String,
        /// The digest the content actually has.
        actual: String,
    },

    /// Selection chose a version the serving registry has withdrawn.
    YankedVersion {
        /// The yanked module version.
        module: ModuleKey,
        /// The registry that withdrew it.
        registry: String,
        /// The registry's stated reason.
        reason: String,
    },

    /// Selected modules require each other cyclically.
    Cycle {
        /// The cycle, starting and ending at the same module.
        path: Vec<ModuleKey>,
    },

    /// The resolution deadline expired.
    Timeout {
        /// The configured deadline in seconds.
        seconds: u64,
    },

    /// The root manifest could not be loaded or validated.
    Manifest(ManifestError),

    /// The resolver configuration could not be loaded.
    Config(ConfigError),
}

// ---------------------------------------------------------------------------
// Display — actionable error messages
// ---------------------------------------------------------------------------

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRegistries { module } => {
                write!(
                    f,
                    "no registries are configured, but `{module}` must be looked up in one.\n  To fix: add registry locations under [resolve] in rove.toml, or pass --registry."
                )
            }
            Self::ModuleNotFound {
                module,
                version,
                requested_by,
                available,
            } => {
                write!(f, "module `{module}@{version}` was not found in any registry")?;
                if let Some(requirer) = requested_by {
                    write!(f, " (required by `{requirer}`)")?;
                }
                write!(f, ".")?;
                for (registry, versions) in available {
                    if versions.is_empty() {
                        write!(f, "\n  registry `{registry}` does not know `{module}`")?;
                    } else {
                        let listed: Vec<String> =
                            versions.iter().map(ToString::to_string).collect();
                        write!(
                            f,
                            "\n  registry `{registry}` has versions: {}",
                            listed.join(", ")
                        )?;
                    }
                }
                write!(
                    f,
                    "\n  To fix: require an available version, or add an override for `{module}`."
                )
            }
            Self::Transport { registry, detail } => {
                write!(
                    f,
                    "registry `{registry}` failed: {detail}\n  To fix: check network/filesystem access to the registry and retry."
                )
            }
            Self::MalformedRegistry {
                registry,
                path,
                detail,
            } => {
                write!(
                    f,
                    "registry `{registry}` served a malformed entry `{path}`: {detail}\n  To fix: report the broken entry to the registry operator, or pin the module to a different registry."
                )
            }
            Self::DuplicateOverride { module } => {
                write!(
                    f,
                    "module `{module}` has more than one override.\n  To fix: keep exactly one [[overrides]] entry for `{module}` in module.toml."
                )
            }
            Self::Inspect {
                module,
                kind,
                detail,
            } => {
                write!(
                    f,
                    "cannot read the module file of `{module}` ({kind} override): {detail}\n  To fix: check the override's source, or drop the override."
                )
            }
            Self::UnresolvedPatch {
                module,
                patch,
                detail,
            } => {
                write!(
                    f,
                    "patch `{patch}` for `{module}` cannot be used: {detail}\n  To fix: check the patch path in the override declaration."
                )
            }
            Self::InvalidIntegrity {
                module,
                value,
                reason,
            } => {
                write!(
                    f,
                    "integrity declared for `{module}` is invalid: {value:?}: {reason}\n  To fix: declare integrity as `sha256-` followed by 64 lowercase hex digits."
                )
            }
            Self::IntegrityMismatch {
                module,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "content fetched for `{module}` does not match its declared integrity: expected {expected}, got {actual}\n  To fix: the declared digest or the source is wrong; verify the source and update the declaration."
                )
            }
            Self::YankedVersion {
                module,
                registry,
                reason,
            } => {
                write!(
                    f,
                    "selected version `{module}` was yanked by registry `{registry}`: {reason}\n  To fix: require a newer version, or pin `{}` explicitly with a single_version override to keep using it.",
                    module.name
                )
            }
            Self::Cycle { path } => {
                let listed: Vec<String> = path.iter().map(ToString::to_string).collect();
                write!(
                    f,
                    "modules require each other cyclically: {}\n  To fix: break the cycle in one of the modules, or set cycles = \"allow\" under [resolve] in rove.toml.",
                    listed.join(" -> ")
                )
            }
            Self::Timeout { seconds } => {
                write!(
                    f,
                    "resolution did not finish within {seconds}s.\n  To fix: raise timeout_seconds under [resolve] in rove.toml, or check registry responsiveness."
                )
            }
            Self::Manifest(err) => write!(f, "{err}"),
            Self::Config(err) => write!(f, "{err}"),
        }
    }
}

// ---------------------------------------------------------------------------
// std::error::Error
// ---------------------------------------------------------------------------

impl std::error::Error for ResolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Manifest(err) => Some(err),
            Self::Config(err) => Some(err),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// From impls
// ---------------------------------------------------------------------------

impl From<ManifestError> for ResolveError {
    fn from(err: ManifestError) -> Self {
        Self::Manifest(err)
    }
}

impl From<ConfigError> for ResolveError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<DuplicateOverride> for ResolveError {
    fn from(err: DuplicateOverride) -> Self {
        Self::DuplicateOverride { module: err.module }
    }
}

impl From<RegistryError> for ResolveError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound {
                module, version, ..
            } => Self::ModuleNotFound {
                module,
                version: version.unwrap_or_else(Version::placeholder),
                requested_by: None,
                available: Vec::new(),
            },
            RegistryError::Transport { registry, detail } => {
                Self::Transport { registry, detail }
            }
            RegistryError::Malformed {
                registry,
                path,
                detail,
            } => Self::MalformedRegistry {
                registry,
                path,
                detail,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
