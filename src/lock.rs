//! The lockfile (`rove.lock`).
//!
//! A deterministic JSON rendering of a [`Resolution`]: selected modules,
//! fetch specs, and repo mappings. Sorted maps plus fixed field order make
//! the output byte-identical across runs on identical inputs, so the
//! lockfile doubles as the idempotence witness — and as the handoff
//! artifact the downstream build system consumes.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::graph::RepoMapping;
use crate::model::source::FetchSpec;
use crate::model::{ModuleKey, ModuleName};
use crate::resolve::Resolution;

/// The current lockfile format version.
pub const LOCK_FORMAT: u32 = 1;

/// One locked module.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LockedModule {
    /// The selected `name@version`.
    pub selected: ModuleKey,
    /// This module's apparent-name table.
    pub mapping: RepoMapping,
    /// How to fetch it; absent for the root module.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetch: Option<FetchSpec>,
}

/// The lockfile document.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Lockfile {
    /// Format version.
    pub version: u32,
    /// The root module's name.
    pub root: ModuleName,
    /// Every resolved module, in name order.
    pub modules: BTreeMap<ModuleName, LockedModule>,
}

impl Lockfile {
    /// Build the lockfile for a finished resolution.
    #[must_use]
    pub fn from_resolution(resolution: &Resolution) -> Self {
        let fetch_by_name: BTreeMap<&ModuleName, &FetchSpec> = resolution
            .fetch_specs
            .iter()
            .map(|spec| (&spec.module.name, spec))
            .collect();

        let mut modules = BTreeMap::new();
        for (name, module) in &resolution.resolved.modules {
            modules.insert(
                name.clone(),
                LockedModule {
                    selected: module.key.clone(),
                    mapping: resolution
                        .mappings
                        .get(name)
                        .cloned()
                        .unwrap_or_default(),
                    fetch: fetch_by_name.get(name).map(|spec| (*spec).clone()),
                },
            );
        }
        Self {
            version: LOCK_FORMAT,
            root: resolution.resolved.root.clone(),
            modules,
        }
    }

    /// Render the canonical JSON document, newline-terminated.
    #[must_use]
    pub fn to_json_string(&self) -> String {
        let mut text = serde_json::to_string_pretty(self)
            .unwrap_or_else(|_| unreachable!("lockfile serialization is infallible"));
        text.push('\n');
        text
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
