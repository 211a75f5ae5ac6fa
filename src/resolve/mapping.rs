//! Repo-mapping computation.
//!
//! For each resolved module, builds the table from the apparent names used
//! inside that module's own sources to the canonical identities selection
//! chose. Tables are owned per module — there is deliberately no global
//! rename map, because the root renaming a dependency must never change how
//! a third module refers to that same dependency.

use std::collections::BTreeMap;

use crate::model::graph::{RepoMapping, ResolvedGraph};
use crate::model::{ModuleName, RepoName};

/// Build every module's repo-mapping table, keyed by module name.
///
/// Each table maps the module's own name to its own key, plus one entry per
/// direct dependency edge.
#[must_use]
pub fn mappings(resolved: &ResolvedGraph) -> BTreeMap<ModuleName, RepoMapping> {
    let mut tables = BTreeMap::new();
    for (name, module) in &resolved.modules {
        let mut table = RepoMapping::new();
        table.insert(RepoName::from(name), module.key.clone());
        for dep in &module.deps {
            let Some(target) = resolved.selected(&dep.name) else {
                unreachable!("dependency `{}` of `{name}` was resolved", dep.name)
            };
            if let Some(previous) = table.insert(dep.apparent.clone(), target.clone()) {
                if previous != *target {
                    tracing::warn!(
                        module = %name,
                        apparent = %dep.apparent,
                        "apparent name remapped to a different module"
                    );
                }
            }
        }
        tables.insert(name.clone(), table);
    }
    tables
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
