//! Requirement and resolution graphs.
//!
//! Discovery produces a [`RequirementGraph`]: every fetched module version
//! with its requirement edges, parallel edges at different versions
//! preserved. Selection collapses it into a [`ResolvedGraph`]: exactly one
//! [`ModuleKey`] per reachable module name. Both use `BTreeMap` throughout
//! so iteration order — and therefore every downstream artifact — is
//! deterministic.

use std::collections::BTreeMap;

use serde::Serialize;

use rove_registry::wire::SourceFile;

use super::{ModuleKey, ModuleName, RepoName, Version};

// ---------------------------------------------------------------------------
// RequirementGraph
// ---------------------------------------------------------------------------

/// One requirement edge: "the owning module needs `name` at `version`, and
/// refers to it in its own sources as `apparent`".
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Requirement {
    /// Canonical name of the required module.
    pub name: ModuleName,
    /// The version the requirer asked for (as declared — selection may
    /// resolve the name to a higher version).
    pub version: Version,
    /// The requirer's own name for this dependency.
    pub apparent: RepoName,
}

/// Where a discovered module's metadata came from, when a registry served it.
#[derive(Clone, Debug)]
pub struct RegistrySource {
    /// Identity of the registry that served the module.
    pub registry: String,
    /// The registry's source descriptor and default patches.
    pub file: SourceFile,
}

/// Everything discovery learned about one module version.
#[derive(Clone, Debug)]
pub struct DiscoveredModule {
    /// The module's identity.
    pub key: ModuleKey,
    /// Requirement edges, in declaration order.
    pub deps: Vec<Requirement>,
    /// Registry source data; `None` for the root and for modules whose
    /// sources an override supplies.
    pub source: Option<RegistrySource>,
    /// The yank reason, if the serving registry has withdrawn this version.
    pub yanked: Option<String>,
}

/// The full requirement multigraph, keyed by module version.
///
/// Built incrementally by discovery, never mutated once selection starts.
/// Redundant parallel edges (the same name required at different versions by
/// different requirers) are preserved — selection needs them all.
#[derive(Clone, Debug)]
pub struct RequirementGraph {
    /// The root module's key.
    pub root: ModuleKey,
    /// Every fetched module version (plus the root), in key order.
    pub modules: BTreeMap<ModuleKey, DiscoveredModule>,
}

impl RequirementGraph {
    /// The discovered node for `key`, if present.
    #[must_use]
    pub fn get(&self, key: &ModuleKey) -> Option<&DiscoveredModule> {
        self.modules.get(key)
    }

    /// Number of nodes, the root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Returns `true` if the graph holds no nodes at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// All versions at which `name` was requested anywhere in the graph,
    /// deduplicated and sorted.
    #[must_use]
    pub fn requested_versions(&self, name: &ModuleName) -> Vec<Version> {
        let mut versions: Vec<Version> = self
            .modules
            .values()
            .flat_map(|module| module.deps.iter())
            .filter(|req| req.name == *name)
            .map(|req| req.version.clone())
            .collect();
        versions.sort();
        versions.dedup();
        versions
    }
}

// ---------------------------------------------------------------------------
// ResolvedGraph
// ---------------------------------------------------------------------------

/// One resolved dependency edge: the requirer's apparent name and the
/// dependency's canonical name (look the name up in the resolved graph for
/// its selected key).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolvedDep {
    /// Canonical name of the dependency.
    pub name: ModuleName,
    /// The requirer's own name for it.
    pub apparent: RepoName,
}

/// One module after selection: its single selected identity and its direct
/// dependency edges.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolvedModule {
    /// The selected `name@version` (or `name@_` for override identities).
    pub key: ModuleKey,
    /// Direct dependencies, in declaration order.
    pub deps: Vec<ResolvedDep>,
}

/// The resolution result: exactly one module per reachable name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolvedGraph {
    /// The root module's name (also present in `modules`).
    pub root: ModuleName,
    /// Every name reachable from the root, exactly once.
    pub modules: BTreeMap<ModuleName, ResolvedModule>,
}

impl ResolvedGraph {
    /// The resolved module for `name`, if reachable.
    #[must_use]
    pub fn get(&self, name: &ModuleName) -> Option<&ResolvedModule> {
        self.modules.get(name)
    }

    /// The selected key for `name`, if reachable.
    #[must_use]
    pub fn selected(&self, name: &ModuleName) -> Option<&ModuleKey> {
        self.modules.get(name).map(|m| &m.key)
    }

    /// Number of resolved modules, the root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Returns `true` if nothing resolved (never the case after a
    /// successful run — the root is always present).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

// ---------------------------------------------------------------------------
// RepoMapping
// ---------------------------------------------------------------------------

/// One module's own naming view of its dependencies.
///
/// Maps the apparent names used inside that module's sources to the
/// canonical identities selection chose. Each module owns its table:
/// renaming a dependency in the root's declarations never changes how any
/// other module refers to the same dependency.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RepoMapping {
    entries: BTreeMap<RepoName, ModuleKey>,
}

impl RepoMapping {
    /// An empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `apparent` refers to `key`. Returns the previous target
    /// if the apparent name was already mapped.
    pub fn insert(&mut self, apparent: RepoName, key: ModuleKey) -> Option<ModuleKey> {
        self.entries.insert(apparent, key)
    }

    /// The canonical identity behind `apparent`, if mapped.
    #[must_use]
    pub fn get(&self, apparent: &RepoName) -> Option<&ModuleKey> {
        self.entries.get(apparent)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in apparent-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&RepoName, &ModuleKey)> {
        self.entries.iter()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
