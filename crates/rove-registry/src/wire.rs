//! On-the-wire file formats served by a registry.
//!
//! A registry (directory or URL prefix) exposes three TOML files per module:
//!
//! - `modules/<name>/metadata.toml` — [`ModuleList`]: available versions and
//!   yanked versions with reasons.
//! - `modules/<name>/<version>/module.toml` — [`ModuleFile`]: the module's
//!   own declaration (name, version, direct dependencies with optional
//!   apparent-name remaps). Parsed leniently: unknown fields are ignored, so
//!   a module file that carries root-only sections (e.g. overrides) still
//!   loads — those sections simply have no effect outside the root project.
//! - `modules/<name>/<version>/source.toml` — [`SourceFile`]: where the
//!   module's sources come from (archive URL, integrity, strip prefix) and
//!   the registry's own default patches. Parsed strictly: the layout is
//!   registry-owned, so unknown fields are rejected.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::types::{ModuleName, RepoName, Version};

// ---------------------------------------------------------------------------
// ModuleList
// ---------------------------------------------------------------------------

/// Per-module registry metadata: the versions a registry offers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleList {
    /// Available versions, in the order the registry lists them.
    #[serde(default)]
    pub versions: Vec<Version>,

    /// Versions the registry has withdrawn, with the reason for each.
    ///
    /// A yanked version still resolves when explicitly pinned by an
    /// override; otherwise selecting it fails resolution.
    #[serde(default)]
    pub yanked: BTreeMap<Version, String>,
}

impl ModuleList {
    /// Parse a `metadata.toml` document.
    ///
    /// # Errors
    /// Returns the underlying TOML error on invalid syntax or unknown fields.
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// The yank reason for `version`, if the registry has withdrawn it.
    #[must_use]
    pub fn yank_reason(&self, version: &Version) -> Option<&str> {
        self.yanked.get(version).map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// ModuleFile
// ---------------------------------------------------------------------------

/// The `[module]` table of a module file.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ModuleDecl {
    /// The module's canonical name.
    pub name: ModuleName,
    /// The module's version.
    pub version: Version,
}

/// One direct dependency declaration.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct DepSpec {
    /// Canonical name of the dependency.
    pub name: ModuleName,
    /// The version this module requires.
    pub version: Version,
    /// The name this module's own sources use to refer to the dependency.
    /// Defaults to the canonical name.
    #[serde(default)]
    pub repo_name: Option<RepoName>,
}

impl DepSpec {
    /// The apparent name for this edge: the declared `repo_name`, or the
    /// dependency's canonical name.
    #[must_use]
    pub fn apparent(&self) -> RepoName {
        self.repo_name
            .clone()
            .unwrap_or_else(|| RepoName::from(&self.name))
    }
}

/// A module's own declaration file (`module.toml`).
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ModuleFile {
    /// The module's identity.
    pub module: ModuleDecl,

    /// Direct dependencies, in declaration order.
    #[serde(default)]
    pub deps: Vec<DepSpec>,
}

impl ModuleFile {
    /// Parse a `module.toml` document (lenient — unknown fields ignored).
    ///
    /// # Errors
    /// Returns the underlying TOML error on invalid syntax or invalid values.
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

// ---------------------------------------------------------------------------
// SourceFile
// ---------------------------------------------------------------------------

/// One patch bundled by the registry itself.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatchEntry {
    /// Patch locator as the registry publishes it — a path or URL resolved
    /// by the fetch transport against the registry location.
    pub file: String,
    /// Expected integrity of the patch contents (`sha256-<hex>`), if the
    /// registry publishes one.
    #[serde(default)]
    pub integrity: Option<String>,
}

/// Where a registry-served module's sources come from (`source.toml`).
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceFile {
    /// Archive URL for the module's sources.
    pub url: String,

    /// Expected integrity of the archive (`sha256-<hex>`).
    #[serde(default)]
    pub integrity: Option<String>,

    /// Leading path component to strip when extracting the archive.
    #[serde(default)]
    pub strip_prefix: Option<String>,

    /// Patches the registry applies on top of the archive, in order.
    #[serde(default)]
    pub patches: Vec<PatchEntry>,

    /// Path-component strip count for the registry's patches.
    #[serde(default)]
    pub patch_strip: u32,
}

impl SourceFile {
    /// Parse a `source.toml` document (strict — unknown fields rejected).
    ///
    /// # Errors
    /// Returns the underlying TOML error on invalid syntax or unknown fields.
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
