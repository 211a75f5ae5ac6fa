//! The [`Registry`] trait and the first-hit-wins [`RegistryChain`].
//!
//! All resolver code performs registry I/O exclusively through this trait.
//! Implementations may be backed by a local directory ([`LocalRegistry`](crate::LocalRegistry)),
//! an HTTP prefix ([`HttpRegistry`](crate::HttpRegistry)), or a test double.
//!
//! # Object safety
//!
//! The trait is object-safe and `Send + Sync`: the resolver queries
//! registries from parallel worklist fetches through `&dyn Registry`.

use crate::error::RegistryError;
use crate::http::HttpRegistry;
use crate::local::LocalRegistry;
use crate::types::{ModuleName, Version};
use crate::wire::{ModuleFile, ModuleList, SourceFile};

/// The registry abstraction used by the resolver.
pub trait Registry: Send + Sync {
    /// A stable identity for this registry — its configured location.
    /// Used for caching keys, fetch specs, and diagnostics.
    fn id(&self) -> &str;

    /// The registry's per-module metadata: available and yanked versions.
    ///
    /// # Errors
    /// [`RegistryError::NotFound`] if the registry does not know the module
    /// at all; transport or malformed-entry errors otherwise.
    fn metadata(&self, name: &ModuleName) -> Result<ModuleList, RegistryError>;

    /// The module file for an exact (name, version) pair.
    ///
    /// # Errors
    /// [`RegistryError::NotFound`] if the registry has no entry for this
    /// exact pair; transport or malformed-entry errors otherwise.
    fn module(&self, name: &ModuleName, version: &Version) -> Result<ModuleFile, RegistryError>;

    /// The source descriptor for an exact (name, version) pair.
    ///
    /// # Errors
    /// [`RegistryError::NotFound`] if the registry has no entry for this
    /// exact pair; transport or malformed-entry errors otherwise.
    fn source(&self, name: &ModuleName, version: &Version) -> Result<SourceFile, RegistryError>;
}

/// Construct a registry backend from a configured location string.
///
/// `http://` and `https://` prefixes select the HTTP backend; anything else
/// is treated as a local directory path.
#[must_use]
pub fn registry_at(location: &str) -> Box<dyn Registry> {
    if location.starts_with("http://") || location.starts_with("https://") {
        Box::new(HttpRegistry::new(location))
    } else {
        Box::new(LocalRegistry::new(location))
    }
}

// ---------------------------------------------------------------------------
// RegistryChain
// ---------------------------------------------------------------------------

/// A complete registry hit: the module file, its source descriptor, and the
/// yank status, all served by the same registry.
#[derive(Clone, Debug)]
pub struct RegistryModule {
    /// Identity of the registry that served the entry.
    pub registry: String,
    /// The module's declaration file.
    pub file: ModuleFile,
    /// The module's source descriptor.
    pub source: SourceFile,
    /// The yank reason, if this registry has withdrawn the version.
    pub yanked: Option<String>,
}

/// An ordered list of registries, consulted first-match-wins.
///
/// The first registry with an entry for an exact (name, version) pair wins
/// outright; entries are never merged across registries. A
/// [`RegistryError::NotFound`] falls through to the next registry; any other
/// error aborts the lookup.
pub struct RegistryChain {
    registries: Vec<Box<dyn Registry>>,
}

impl RegistryChain {
    /// Build a chain from pre-constructed registries.
    #[must_use]
    pub fn new(registries: Vec<Box<dyn Registry>>) -> Self {
        Self { registries }
    }

    /// Build a chain from configured location strings, in priority order.
    #[must_use]
    pub fn from_locations<S: AsRef<str>>(locations: &[S]) -> Self {
        Self {
            registries: locations
                .iter()
                .map(|loc| registry_at(loc.as_ref()))
                .collect(),
        }
    }

    /// Returns `true` if no registries are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registries.is_empty()
    }

    /// Number of configured registries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registries.len()
    }

    /// The configured registry identities, in priority order.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        self.registries.iter().map(|r| r.id().to_owned()).collect()
    }

    /// Resolve an exact (name, version) pair against the chain.
    ///
    /// Queries registries in priority order. The first registry whose
    /// `module` lookup succeeds serves the whole entry: its source
    /// descriptor and metadata are then required from that same registry (a
    /// missing source or metadata file there is a malformed entry, not a
    /// reason to fall through). The served module file must declare the
    /// requested coordinates.
    ///
    /// # Errors
    /// [`RegistryError::NotFound`] when every registry lacks the entry;
    /// the first transport/malformed error otherwise.
    pub fn resolve(
        &self,
        name: &ModuleName,
        version: &Version,
    ) -> Result<RegistryModule, RegistryError> {
        for registry in &self.registries {
            match resolve_in(registry.as_ref(), name, version) {
                Ok(hit) => return Ok(hit),
                Err(err) if err.is_not_found() => {
                    tracing::debug!(
                        registry = registry.id(),
                        module = %name,
                        version = %version,
                        "registry miss, trying next"
                    );
                }
                Err(err) => return Err(err),
            }
        }
        Err(RegistryError::NotFound {
            registry: self.ids().join(", "),
            module: name.clone(),
            version: Some(version.clone()),
        })
    }

    /// The versions each registry offers for `name`, for diagnostics.
    ///
    /// Registries that do not know the module, or that fail, contribute an
    /// empty list — this accessor is only used to enrich error messages and
    /// must not mask the original failure.
    #[must_use]
    pub fn available(&self, name: &ModuleName) -> Vec<(String, Vec<Version>)> {
        self.registries
            .iter()
            .map(|registry| {
                let versions = registry
                    .metadata(name)
                    .map(|list| list.versions)
                    .unwrap_or_default();
                (registry.id().to_owned(), versions)
            })
            .collect()
    }
}

/// Resolve an exact (name, version) pair against a single registry.
///
/// Used by the chain, and directly by the resolver when an override names a
/// specific registry for one module.
///
/// # Errors
/// Propagates the registry's errors; a missing source or metadata file for
/// a present module is reported as a malformed entry.
pub fn resolve_in(
    registry: &dyn Registry,
    name: &ModuleName,
    version: &Version,
) -> Result<RegistryModule, RegistryError> {
    let file = registry.module(name, version)?;
    if file.module.name != *name || file.module.version != *version {
        return Err(RegistryError::Malformed {
            registry: registry.id().to_owned(),
            path: format!("modules/{name}/{version}/module.toml"),
            detail: format!(
                "declares `{}@{}`, expected `{name}@{version}`",
                file.module.name, file.module.version
            ),
        });
    }

    let entry_error = |what: &str, err: RegistryError| {
        if err.is_not_found() {
            RegistryError::Malformed {
                registry: registry.id().to_owned(),
                path: format!("modules/{name}/{version}/{what}"),
                detail: format!("module entry exists but `{what}` is missing"),
            }
        } else {
            err
        }
    };

    let source = registry
        .source(name, version)
        .map_err(|e| entry_error("source.toml", e))?;
    let metadata = registry
        .metadata(name)
        .map_err(|e| entry_error("metadata.toml", e))?;

    Ok(RegistryModule {
        registry: registry.id().to_owned(),
        yanked: metadata.yank_reason(version).map(str::to_owned),
        file,
        source,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
