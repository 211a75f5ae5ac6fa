//! Graph discovery — the worklist fetch loop.
//!
//! Builds the [`RequirementGraph`] from the root's direct dependencies by
//! repeatedly fetching module metadata for every not-yet-visited
//! (name, version) pair. The override table is consulted *before* the
//! registry: a non-registry override fixes a module's identity outright, a
//! pinned override forces its version, and a registry redirect changes
//! where its metadata comes from.
//!
//! Lookups within one frontier wave are independent (distinct keys) and run
//! in parallel; results are merged into the graph single-threaded, in key
//! order, so the resulting graph is identical regardless of which fetch
//! finished first. The first failure aborts the run: later waves are never
//! issued, and remaining results of the failing wave are discarded.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use rayon::prelude::*;

use crate::error::ResolveError;
use crate::inspect::SourceInspector;
use crate::manifest::RootManifest;
use crate::model::graph::{DiscoveredModule, RegistrySource, Requirement, RequirementGraph};
use crate::model::overrides::{ModuleOverride, OverrideTable};
use crate::model::{ModuleKey, ModuleName, Version};
use rove_registry::registry::{registry_at, resolve_in, RegistryModule};
use rove_registry::wire::DepSpec;
use rove_registry::{Registry, RegistryChain, RegistryError};

/// The deadline for a whole discovery run.
#[derive(Clone, Copy)]
pub struct Deadline {
    at: Instant,
    seconds: u64,
}

impl Deadline {
    /// A deadline `seconds` from now. `None` disables the deadline.
    #[must_use]
    pub fn after(timeout: Option<std::time::Duration>) -> Option<Self> {
        timeout.map(|t| Self {
            at: Instant::now() + t,
            seconds: t.as_secs(),
        })
    }

    fn check(this: Option<&Self>) -> Result<(), ResolveError> {
        match this {
            Some(deadline) if Instant::now() >= deadline.at => Err(ResolveError::Timeout {
                seconds: deadline.seconds,
            }),
            _ => Ok(()),
        }
    }
}

/// Build the requirement graph for a root manifest.
///
/// # Errors
/// Fails on the first unresolvable module, transport failure, unreadable
/// override source, or deadline expiry. No partial graph is returned.
pub fn discover(
    manifest: &RootManifest,
    overrides: &OverrideTable,
    chain: &RegistryChain,
    inspector: &dyn SourceInspector,
    deadline: Option<Deadline>,
) -> Result<RequirementGraph, ResolveError> {
    let context = Context::new(overrides, chain, inspector);
    let root_key = ModuleKey::new(
        manifest.module.name.clone(),
        manifest.module.version.clone(),
    );

    let root_node = DiscoveredModule {
        key: root_key.clone(),
        deps: requirements(&manifest.deps),
        source: None,
        yanked: None,
    };

    let mut graph = RequirementGraph {
        root: root_key.clone(),
        modules: BTreeMap::new(),
    };
    let mut visited: BTreeSet<ModuleKey> = BTreeSet::new();
    visited.insert(root_key.clone());

    // Frontier entries remember the first requirer, for error messages.
    let mut frontier: BTreeMap<ModuleKey, ModuleKey> = BTreeMap::new();
    enqueue(&root_node, overrides, &visited, &mut frontier);
    graph.modules.insert(root_key, root_node);

    while !frontier.is_empty() {
        Deadline::check(deadline.as_ref())?;

        let wave: Vec<(ModuleKey, ModuleKey)> = std::mem::take(&mut frontier).into_iter().collect();
        tracing::debug!(wave = wave.len(), known = graph.modules.len(), "discovery wave");
        for (key, _) in &wave {
            visited.insert(key.clone());
        }

        let results: Vec<Result<DiscoveredModule, ResolveError>> = wave
            .par_iter()
            .map(|(key, requirer)| context.fetch(key, requirer))
            .collect();

        for result in results {
            let node = result?;
            enqueue(&node, overrides, &visited, &mut frontier);
            graph.modules.insert(node.key.clone(), node);
        }
    }

    Ok(graph)
}

/// Map declared dependencies to requirement edges.
fn requirements(deps: &[DepSpec]) -> Vec<Requirement> {
    deps.iter()
        .map(|dep| Requirement {
            apparent: dep.apparent(),
            name: dep.name.clone(),
            version: dep.version.clone(),
        })
        .collect()
}

/// The key a requirement edge actually resolves to, override table applied:
/// non-registry overrides fix the placeholder identity, pins force their
/// version, everything else is fetched as declared.
fn requested_key(name: &ModuleName, declared: &Version, overrides: &OverrideTable) -> ModuleKey {
    let version = match overrides.get(name) {
        Some(op) if !op.is_registry_backed() => Version::placeholder(),
        Some(op) => op.pinned_version().unwrap_or(declared).clone(),
        None => declared.clone(),
    };
    ModuleKey::new(name.clone(), version)
}

fn enqueue(
    node: &DiscoveredModule,
    overrides: &OverrideTable,
    visited: &BTreeSet<ModuleKey>,
    frontier: &mut BTreeMap<ModuleKey, ModuleKey>,
) {
    for req in &node.deps {
        let target = requested_key(&req.name, &req.version, overrides);
        if !visited.contains(&target) {
            frontier.entry(target).or_insert_with(|| node.key.clone());
        }
    }
}

// ---------------------------------------------------------------------------
// Per-module fetch
// ---------------------------------------------------------------------------

struct Context<'a> {
    overrides: &'a OverrideTable,
    chain: &'a RegistryChain,
    inspector: &'a dyn SourceInspector,
    /// Registries named by `single_version` redirects, built once so their
    /// caches live for the whole run.
    redirects: BTreeMap<ModuleName, Box<dyn Registry>>,
}

impl<'a> Context<'a> {
    fn new(
        overrides: &'a OverrideTable,
        chain: &'a RegistryChain,
        inspector: &'a dyn SourceInspector,
    ) -> Self {
        let mut redirects: BTreeMap<ModuleName, Box<dyn Registry>> = BTreeMap::new();
        for (name, op) in overrides.iter() {
            if let ModuleOverride::SingleVersion {
                registry: Some(location),
                ..
            } = op
            {
                redirects.insert(name.clone(), registry_at(location));
            }
        }
        Self {
            overrides,
            chain,
            inspector,
            redirects,
        }
    }

    fn fetch(&self, key: &ModuleKey, requirer: &ModuleKey) -> Result<DiscoveredModule, ResolveError> {
        match self.overrides.get(&key.name) {
            Some(op) if !op.is_registry_backed() => self.inspect_override(key, op),
            _ => self.fetch_registry(key, requirer),
        }
    }

    /// A non-registry override: no version discovery; the source's own
    /// module file supplies the dependency list.
    fn inspect_override(
        &self,
        key: &ModuleKey,
        op: &ModuleOverride,
    ) -> Result<DiscoveredModule, ResolveError> {
        let file =
            self.inspector
                .inspect(&key.name, op)
                .map_err(|e| ResolveError::Inspect {
                    module: key.name.clone(),
                    kind: op.kind(),
                    detail: e.detail,
                })?;
        Ok(DiscoveredModule {
            key: key.clone(),
            deps: requirements(&file.deps),
            source: None,
            yanked: None,
        })
    }

    fn fetch_registry(
        &self,
        key: &ModuleKey,
        requirer: &ModuleKey,
    ) -> Result<DiscoveredModule, ResolveError> {
        let hit = match self.redirects.get(&key.name) {
            Some(registry) => resolve_in(registry.as_ref(), &key.name, &key.version),
            None => {
                if self.chain.is_empty() {
                    return Err(ResolveError::NoRegistries {
                        module: key.name.clone(),
                    });
                }
                self.chain.resolve(&key.name, &key.version)
            }
        };
        let hit = hit.map_err(|e| self.not_found_context(key, requirer, e))?;
        Ok(discovered(key, hit))
    }

    /// Enrich an absence error with what the registries *do* offer.
    fn not_found_context(
        &self,
        key: &ModuleKey,
        requirer: &ModuleKey,
        err: RegistryError,
    ) -> ResolveError {
        if !err.is_not_found() {
            return err.into();
        }
        let available = self.redirects.get(&key.name).map_or_else(
            || self.chain.available(&key.name),
            |registry| {
                let versions = registry
                    .metadata(&key.name)
                    .map(|list| list.versions)
                    .unwrap_or_default();
                vec![(registry.id().to_owned(), versions)]
            },
        );
        ResolveError::ModuleNotFound {
            module: key.name.clone(),
            version: key.version.clone(),
            requested_by: Some(requirer.clone()),
            available,
        }
    }
}

fn discovered(key: &ModuleKey, hit: RegistryModule) -> DiscoveredModule {
    DiscoveredModule {
        key: key.clone(),
        deps: requirements(&hit.file.deps),
        source: Some(RegistrySource {
            registry: hit.registry,
            file: hit.source,
        }),
        yanked: hit.yanked,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
