//! The resolution pipeline.
//!
//! One call, four phases, strictly in order:
//!
//! 1. [`OverrideTable`] built from the root manifest (no I/O — duplicate
//!    overrides fail before any fetch);
//! 2. [`discovery`] — worklist traversal building the requirement graph;
//! 3. [`selection`] — minimal version selection over the immutable graph;
//! 4. [`materialize`] + [`mapping`] — fetch specs and per-module repo
//!    mappings from the selection result.
//!
//! Everything after discovery is pure computation; a [`Resolution`] is only
//! returned when the whole pipeline succeeded.

pub mod discovery;
pub mod mapping;
pub mod materialize;
pub mod selection;

use std::collections::BTreeMap;
use std::path::Path;

use crate::config::ResolveConfig;
use crate::error::ResolveError;
use crate::inspect::SourceInspector;
use crate::manifest::RootManifest;
use crate::model::graph::{RepoMapping, RequirementGraph, ResolvedGraph};
use crate::model::overrides::OverrideTable;
use crate::model::source::FetchSpec;
use crate::model::ModuleName;
use rove_registry::RegistryChain;

use discovery::Deadline;

/// The complete, immutable result of one resolution run.
#[derive(Clone, Debug)]
pub struct Resolution {
    /// The requirement graph discovery built.
    pub graph: RequirementGraph,
    /// One selected module per reachable name.
    pub resolved: ResolvedGraph,
    /// One fetch spec per resolved module (the root excluded), in name order.
    pub fetch_specs: Vec<FetchSpec>,
    /// Each module's own apparent-name table.
    pub mappings: BTreeMap<ModuleName, RepoMapping>,
}

/// The resolver: configuration plus the two I/O collaborators.
pub struct Resolver<'a> {
    config: &'a ResolveConfig,
    chain: &'a RegistryChain,
    inspector: &'a dyn SourceInspector,
}

impl<'a> Resolver<'a> {
    /// Assemble a resolver.
    #[must_use]
    pub fn new(
        config: &'a ResolveConfig,
        chain: &'a RegistryChain,
        inspector: &'a dyn SourceInspector,
    ) -> Self {
        Self {
            config,
            chain,
            inspector,
        }
    }

    /// Run the full pipeline for a root manifest.
    ///
    /// `root_dir` is the directory the manifest was loaded from; relative
    /// override paths and patch files resolve against it.
    ///
    /// # Errors
    /// Any phase failure aborts the run; no partial result is exposed.
    pub fn resolve(
        &self,
        manifest: &RootManifest,
        root_dir: &Path,
    ) -> Result<Resolution, ResolveError> {
        let overrides = OverrideTable::build(&manifest.overrides)?;
        tracing::debug!(
            deps = manifest.deps.len(),
            overrides = manifest.overrides.len(),
            registries = self.chain.len(),
            "resolving {}@{}",
            manifest.module.name,
            manifest.module.version
        );

        let deadline = Deadline::after(self.config.timeout());
        let graph = discovery::discover(
            manifest,
            &overrides,
            self.chain,
            self.inspector,
            deadline,
        )?;
        let resolved = selection::select(&graph, &overrides, self.config.cycles)?;
        let fetch_specs = materialize::materialize(&resolved, &graph, &overrides, root_dir)?;
        let mappings = mapping::mappings(&resolved);

        tracing::debug!(
            discovered = graph.len(),
            selected = resolved.len(),
            "resolution complete"
        );
        Ok(Resolution {
            graph,
            resolved,
            fetch_specs,
            mappings,
        })
    }
}
