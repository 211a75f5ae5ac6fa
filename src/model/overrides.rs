//! Override model — root-declared replacements for registry resolution.
//!
//! An override replaces the default registry-driven resolution for one
//! module name. The four kinds:
//!
//! - [`ModuleOverride::SingleVersion`] — stay registry-backed, but pin an
//!   exact version and/or redirect to a different registry, with extra
//!   patches layered on top of the registry's own.
//! - [`ModuleOverride::Archive`] — sources come from a downloadable archive
//!   instead of any registry.
//! - [`ModuleOverride::Git`] — sources come from a version-control checkout
//!   at a fixed revision.
//! - [`ModuleOverride::LocalPath`] — sources are a directory already on
//!   disk; no fetch, no version, no patches.
//!
//! Only `SingleVersion` keeps the module inside version selection; the
//! other three fix the module's identity outright (it resolves at the
//! placeholder version and never participates in the max-version step).

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::{ModuleName, Version};

// ---------------------------------------------------------------------------
// ModuleOverride
// ---------------------------------------------------------------------------

/// One override, as declared in the root manifest.
///
/// Serialized with a `"type"` tag:
/// `{ type = "single_version", version = "1.0", ... }` etc.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModuleOverride {
    /// Pin to an exact version and/or redirect to a different registry.
    ///
    /// With `version` absent, selection still runs normally and only the
    /// registry (and patches) change — "change the source, not the version".
    SingleVersion {
        /// The exact version to force, if pinning.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        version: Option<Version>,
        /// Registry location to use for this module instead of the chain.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        registry: Option<String>,
        /// Extra patch files (root-relative), applied after the registry's.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        patches: Vec<String>,
        /// Strip depth for the patches; defaults to the registry's when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        patch_strip: Option<u32>,
    },

    /// Sources come from an archive instead of any registry.
    Archive {
        /// Candidate archive URLs, tried in order by the fetch transport.
        urls: Vec<String>,
        /// Expected archive integrity (`sha256-<hex>`).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        integrity: Option<String>,
        /// Leading path component to strip when extracting.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        strip_prefix: Option<String>,
        /// Patch files (root-relative), applied in order.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        patches: Vec<String>,
        /// Strip depth for the patches.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        patch_strip: Option<u32>,
    },

    /// Sources come from a version-control checkout at a fixed revision.
    Git {
        /// Remote URL of the repository.
        remote: String,
        /// Commit hash or tag to check out.
        commit: String,
        /// Patch files (root-relative), applied in order.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        patches: Vec<String>,
        /// Strip depth for the patches.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        patch_strip: Option<u32>,
    },

    /// Sources are a directory already present on disk.
    LocalPath {
        /// The directory, absolute or relative to the root manifest.
        path: PathBuf,
    },
}

impl ModuleOverride {
    /// Returns `true` if the module stays registry-backed (and thus inside
    /// version selection, unless pinned).
    #[must_use]
    pub const fn is_registry_backed(&self) -> bool {
        matches!(self, Self::SingleVersion { .. })
    }

    /// The exact version this override pins the module to, if any.
    #[must_use]
    pub const fn pinned_version(&self) -> Option<&Version> {
        match self {
            Self::SingleVersion { version, .. } => version.as_ref(),
            _ => None,
        }
    }

    /// The root-declared patch files for this override, in order.
    #[must_use]
    pub fn patches(&self) -> &[String] {
        match self {
            Self::SingleVersion { patches, .. }
            | Self::Archive { patches, .. }
            | Self::Git { patches, .. } => patches,
            Self::LocalPath { .. } => &[],
        }
    }

    /// The declared patch strip depth, when one was given.
    #[must_use]
    pub const fn patch_strip(&self) -> Option<u32> {
        match self {
            Self::SingleVersion { patch_strip, .. }
            | Self::Archive { patch_strip, .. }
            | Self::Git { patch_strip, .. } => *patch_strip,
            Self::LocalPath { .. } => None,
        }
    }

    /// The override kind as written in a manifest.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::SingleVersion { .. } => "single_version",
            Self::Archive { .. } => "archive",
            Self::Git { .. } => "git",
            Self::LocalPath { .. } => "local_path",
        }
    }
}

impl fmt::Display for ModuleOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}

// ---------------------------------------------------------------------------
// OverrideDirective
// ---------------------------------------------------------------------------

/// One entry of the root manifest's ordered `[[overrides]]` list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideDirective {
    /// The module the override applies to.
    pub module: ModuleName,
    /// What to do for that module.
    #[serde(flatten)]
    pub op: ModuleOverride,
}

// ---------------------------------------------------------------------------
// OverrideTable
// ---------------------------------------------------------------------------

/// Error returned when the root declares two overrides for one module.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DuplicateOverride {
    /// The module declared twice.
    pub module: ModuleName,
}

impl fmt::Display for DuplicateOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "module `{}` has more than one override", self.module)
    }
}

impl std::error::Error for DuplicateOverride {}

/// The root's overrides, one per module name.
///
/// Built once, before any registry I/O, from the root manifest's ordered
/// directive list; rejects duplicate directives for the same name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OverrideTable {
    entries: BTreeMap<ModuleName, ModuleOverride>,
}

impl OverrideTable {
    /// Build the table from the root's directive list.
    ///
    /// # Errors
    /// Returns [`DuplicateOverride`] if a module name appears in more than
    /// one directive.
    pub fn build(directives: &[OverrideDirective]) -> Result<Self, DuplicateOverride> {
        let mut entries = BTreeMap::new();
        for directive in directives {
            if entries
                .insert(directive.module.clone(), directive.op.clone())
                .is_some()
            {
                return Err(DuplicateOverride {
                    module: directive.module.clone(),
                });
            }
        }
        Ok(Self { entries })
    }

    /// The override for `name`, if the root declared one.
    #[must_use]
    pub fn get(&self, name: &ModuleName) -> Option<&ModuleOverride> {
        self.entries.get(name)
    }

    /// Returns `true` if the root declared any override for `name`.
    #[must_use]
    pub fn contains(&self, name: &ModuleName) -> bool {
        self.entries.contains_key(name)
    }

    /// Returns `true` if no overrides are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate overrides in module-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&ModuleName, &ModuleOverride)> {
        self.entries.iter()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
