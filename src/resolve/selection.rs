//! Minimal Version Selection.
//!
//! Collapses the requirement multigraph to one version per module name: the
//! maximum version required, transitively, by any module that is itself at
//! its eventually selected version. Computed as a fixpoint by repeated
//! relaxation — raising one module's version can expose new, higher
//! transitive requirements, so a single pass is not enough — followed by a
//! reachability walk that prunes names no selected module requires anymore.
//!
//! Names fixed by an override (any non-registry kind, or a pinned
//! `single_version`) never move: only their outgoing edges participate.
//!
//! Everything here iterates ordered maps, so identical inputs give
//! identical outputs regardless of discovery's fetch timing.

use std::collections::BTreeMap;

use crate::config::CyclePolicy;
use crate::error::ResolveError;
use crate::model::graph::{
    DiscoveredModule, RequirementGraph, ResolvedDep, ResolvedGraph, ResolvedModule,
};
use crate::model::overrides::OverrideTable;
use crate::model::{ModuleKey, ModuleName, Version};

/// Select one version per reachable module name.
///
/// # Errors
/// Fails when a selected version is yanked by its registry (and the name is
/// not overridden), or on a requirement cycle under [`CyclePolicy::Error`].
pub fn select(
    graph: &RequirementGraph,
    overrides: &OverrideTable,
    cycles: CyclePolicy,
) -> Result<ResolvedGraph, ResolveError> {
    let candidates = fixpoint(graph, overrides);
    walk(graph, overrides, &candidates, cycles)
}

/// Whether selection may move this name, or an override fixed it a priori.
fn is_fixed(name: &ModuleName, overrides: &OverrideTable) -> bool {
    overrides
        .get(name)
        .is_some_and(|op| !op.is_registry_backed() || op.pinned_version().is_some())
}

/// The relaxation fixpoint over requirement edges.
///
/// Candidates start at the minimum version seen per name. Each pass raises
/// dependency candidates along edges whose requirer is currently selected
/// (the root and override-fixed modules always are). Versions only ever
/// rise and the version set is finite, so this terminates.
fn fixpoint(graph: &RequirementGraph, overrides: &OverrideTable) -> BTreeMap<ModuleName, Version> {
    let mut candidates: BTreeMap<ModuleName, Version> = BTreeMap::new();
    // Keys iterate in ascending (name, version) order: the first version
    // seen per name is the minimum.
    for key in graph.modules.keys() {
        candidates
            .entry(key.name.clone())
            .or_insert_with(|| key.version.clone());
    }

    let mut passes = 0_u32;
    loop {
        passes += 1;
        let mut changed = false;
        for (key, node) in &graph.modules {
            if !requirer_active(key, graph, overrides, &candidates) {
                continue;
            }
            for req in &node.deps {
                if is_fixed(&req.name, overrides) {
                    continue;
                }
                let raise = candidates
                    .get(&req.name)
                    .is_some_and(|current| req.version > *current);
                if raise {
                    candidates.insert(req.name.clone(), req.version.clone());
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }
    tracing::debug!(passes, names = candidates.len(), "selection fixpoint");
    candidates
}

fn requirer_active(
    key: &ModuleKey,
    graph: &RequirementGraph,
    overrides: &OverrideTable,
    candidates: &BTreeMap<ModuleName, Version>,
) -> bool {
    *key == graph.root
        || is_fixed(&key.name, overrides)
        || candidates.get(&key.name) == Some(&key.version)
}

/// The key `name` resolves to under the computed candidates.
fn selected_key(
    name: &ModuleName,
    graph: &RequirementGraph,
    candidates: &BTreeMap<ModuleName, Version>,
) -> ModuleKey {
    if *name == graph.root.name {
        return graph.root.clone();
    }
    let version = candidates
        .get(name)
        .cloned()
        .unwrap_or_else(Version::placeholder);
    ModuleKey::new(name.clone(), version)
}

// ---------------------------------------------------------------------------
// Reachability walk
// ---------------------------------------------------------------------------

struct Frame {
    name: ModuleName,
    node_key: ModuleKey,
    deps: Vec<ResolvedDep>,
    next: usize,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

/// Depth-first walk from the root over selected modules, producing the
/// [`ResolvedGraph`], checking yank status, and detecting cycles.
fn walk(
    graph: &RequirementGraph,
    overrides: &OverrideTable,
    candidates: &BTreeMap<ModuleName, Version>,
    cycles: CyclePolicy,
) -> Result<ResolvedGraph, ResolveError> {
    let mut resolved = ResolvedGraph {
        root: graph.root.name.clone(),
        modules: BTreeMap::new(),
    };
    let mut state: BTreeMap<ModuleName, Visit> = BTreeMap::new();
    let mut stack: Vec<Frame> = vec![make_frame(&graph.root.name, graph, overrides, candidates)?];
    state.insert(graph.root.name.clone(), Visit::InProgress);

    while let Some(frame) = stack.last_mut() {
        if frame.next < frame.deps.len() {
            let dep_name = frame.deps[frame.next].name.clone();
            frame.next += 1;
            match state.get(&dep_name) {
                Some(Visit::Done) => {}
                Some(Visit::InProgress) => {
                    if cycles == CyclePolicy::Error {
                        return Err(cycle_error(&stack, &dep_name));
                    }
                }
                None => {
                    state.insert(dep_name.clone(), Visit::InProgress);
                    stack.push(make_frame(&dep_name, graph, overrides, candidates)?);
                }
            }
        } else {
            let frame = stack.pop().unwrap_or_else(|| unreachable!("stack is non-empty"));
            state.insert(frame.name.clone(), Visit::Done);
            resolved.modules.insert(
                frame.name,
                ResolvedModule {
                    key: frame.node_key,
                    deps: frame.deps,
                },
            );
        }
    }

    Ok(resolved)
}

fn make_frame(
    name: &ModuleName,
    graph: &RequirementGraph,
    overrides: &OverrideTable,
    candidates: &BTreeMap<ModuleName, Version>,
) -> Result<Frame, ResolveError> {
    let key = selected_key(name, graph, candidates);
    let Some(node) = graph.get(&key) else {
        unreachable!("selected `{key}` was discovered")
    };
    check_yank(node, overrides, graph)?;
    let deps = node
        .deps
        .iter()
        .map(|req| ResolvedDep {
            name: req.name.clone(),
            apparent: req.apparent.clone(),
        })
        .collect();
    Ok(Frame {
        name: name.clone(),
        node_key: key,
        deps,
        next: 0,
    })
}

/// A yanked selection fails unless the root overrode the name — an override
/// is the explicit opt-in to keep using a withdrawn release.
fn check_yank(
    node: &DiscoveredModule,
    overrides: &OverrideTable,
    graph: &RequirementGraph,
) -> Result<(), ResolveError> {
    if node.key == graph.root || overrides.contains(&node.key.name) {
        return Ok(());
    }
    if let (Some(reason), Some(source)) = (&node.yanked, &node.source) {
        return Err(ResolveError::YankedVersion {
            module: node.key.clone(),
            registry: source.registry.clone(),
            reason: reason.clone(),
        });
    }
    Ok(())
}

fn cycle_error(stack: &[Frame], back_to: &ModuleName) -> ResolveError {
    let start = stack
        .iter()
        .position(|frame| frame.name == *back_to)
        .unwrap_or(0);
    let mut path: Vec<ModuleKey> = stack[start..]
        .iter()
        .map(|frame| frame.node_key.clone())
        .collect();
    if let Some(first) = path.first().cloned() {
        path.push(first);
    }
    ResolveError::Cycle { path }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::graph::Requirement;
    use crate::model::overrides::{ModuleOverride, OverrideDirective};
    use crate::model::RepoName;

    fn key(s: &str) -> ModuleKey {
        ModuleKey::parse(s).unwrap()
    }

    fn name(s: &str) -> ModuleName {
        ModuleName::new(s).unwrap()
    }

    fn requirement(target: &str) -> Requirement {
        let target = key(target);
        Requirement {
            apparent: RepoName::from(&target.name),
            name: target.name,
            version: target.version,
        }
    }

    fn node(key_str: &str, deps: &[&str]) -> DiscoveredModule {
        DiscoveredModule {
            key: key(key_str),
            deps: deps.iter().map(|d| requirement(d)).collect(),
            source: None,
            yanked: None,
        }
    }

    fn graph(root: &str, nodes: Vec<DiscoveredModule>) -> RequirementGraph {
        RequirementGraph {
            root: key(root),
            modules: nodes.into_iter().map(|n| (n.key.clone(), n)).collect(),
        }
    }

    fn pin(module: &str, version: &str) -> OverrideTable {
        OverrideTable::build(&[OverrideDirective {
            module: name(module),
            op: ModuleOverride::SingleVersion {
                version: Some(Version::parse(version).unwrap()),
                registry: None,
                patches: Vec::new(),
                patch_strip: None,
            },
        }])
        .unwrap()
    }

    fn local(module: &str) -> OverrideTable {
        OverrideTable::build(&[OverrideDirective {
            module: name(module),
            op: ModuleOverride::LocalPath {
                path: "../x".into(),
            },
        }])
        .unwrap()
    }

    #[test]
    fn diamond_selects_maximum() {
        let g = graph(
            "app@0.1",
            vec![
                node("app@0.1", &["alpha@1.1", "beta@1.0"]),
                node("alpha@1.0", &[]),
                node("alpha@1.1", &[]),
                node("beta@1.0", &["alpha@1.0"]),
            ],
        );
        let resolved = select(&g, &OverrideTable::default(), CyclePolicy::Error).unwrap();
        assert_eq!(resolved.selected(&name("alpha")), Some(&key("alpha@1.1")));
        assert_eq!(resolved.selected(&name("beta")), Some(&key("beta@1.0")));
        assert_eq!(resolved.len(), 3);
    }

    #[test]
    fn fixpoint_propagates_transitive_raises() {
        // Raising beta to 2.0 exposes a higher alpha requirement.
        let g = graph(
            "app@0.1",
            vec![
                node("app@0.1", &["beta@2.0", "gamma@1.0"]),
                node("gamma@1.0", &["beta@1.0"]),
                node("beta@1.0", &["alpha@1.0"]),
                node("beta@2.0", &["alpha@2.0"]),
                node("alpha@1.0", &[]),
                node("alpha@2.0", &[]),
            ],
        );
        let resolved = select(&g, &OverrideTable::default(), CyclePolicy::Error).unwrap();
        assert_eq!(resolved.selected(&name("beta")), Some(&key("beta@2.0")));
        assert_eq!(resolved.selected(&name("alpha")), Some(&key("alpha@2.0")));
    }

    #[test]
    fn superseded_versions_requirements_do_not_bind() {
        // Only beta@1.0 needs delta; once beta@2.0 is selected, delta is
        // unreachable and must not appear in the result.
        let g = graph(
            "app@0.1",
            vec![
                node("app@0.1", &["beta@2.0"]),
                node("beta@1.0", &["delta@1.0"]),
                node("beta@2.0", &[]),
                node("delta@1.0", &[]),
            ],
        );
        let resolved = select(&g, &OverrideTable::default(), CyclePolicy::Error).unwrap();
        assert!(resolved.get(&name("delta")).is_none());
        assert_eq!(resolved.len(), 2);
    }

    #[test]
    fn pinned_name_ignores_higher_requests() {
        // beta still *declares* alpha@1.1; the pin keeps the edge from
        // raising anything (discovery never even fetched alpha@1.1).
        let g = graph(
            "app@0.1",
            vec![
                node("app@0.1", &["alpha@1.0", "beta@1.1"]),
                node("beta@1.1", &["alpha@1.1"]),
                node("alpha@1.0", &[]),
            ],
        );
        let resolved = select(&g, &pin("alpha", "1.0"), CyclePolicy::Error).unwrap();
        assert_eq!(resolved.selected(&name("alpha")), Some(&key("alpha@1.0")));
        let beta = resolved.get(&name("beta")).unwrap();
        assert_eq!(beta.deps[0].name, name("alpha"));
    }

    #[test]
    fn override_identity_excluded_from_max_step() {
        let g = graph(
            "app@0.1",
            vec![
                node("app@0.1", &["gamma@3.0", "beta@1.0"]),
                node("gamma@_", &["alpha@1.1"]),
                node("beta@1.0", &["gamma@9.9", "alpha@1.0"]),
                node("alpha@1.0", &[]),
                node("alpha@1.1", &[]),
            ],
        );
        let resolved = select(&g, &local("gamma"), CyclePolicy::Error).unwrap();
        // gamma stays at the placeholder whatever anyone requests...
        assert_eq!(resolved.selected(&name("gamma")), Some(&key("gamma@_")));
        // ...and its outgoing edges still propagate (alpha raised to 1.1).
        assert_eq!(resolved.selected(&name("alpha")), Some(&key("alpha@1.1")));
    }

    #[test]
    fn resolved_edges_keep_declaration_order_and_apparents() {
        let mut alpha_edge = requirement("alpha@1.0");
        alpha_edge.apparent = RepoName::new("my_alpha").unwrap();
        let root = DiscoveredModule {
            key: key("app@0.1"),
            deps: vec![requirement("beta@1.0"), alpha_edge],
            source: None,
            yanked: None,
        };
        let g = graph(
            "app@0.1",
            vec![root, node("beta@1.0", &[]), node("alpha@1.0", &[])],
        );
        let resolved = select(&g, &OverrideTable::default(), CyclePolicy::Error).unwrap();
        let app = resolved.get(&name("app")).unwrap();
        assert_eq!(app.deps[0].name, name("beta"));
        assert_eq!(app.deps[1].apparent.as_str(), "my_alpha");
    }

    #[test]
    fn yanked_selection_fails() {
        let mut alpha = node("alpha@1.0", &[]);
        alpha.yanked = Some("bad archive".to_owned());
        alpha.source = Some(crate::model::graph::RegistrySource {
            registry: "/srv/registry".to_owned(),
            file: rove_registry::wire::SourceFile::parse(
                "url = \"https://example.com/a.tar.gz\"",
            )
            .unwrap(),
        });
        let g = graph("app@0.1", vec![node("app@0.1", &["alpha@1.0"]), alpha]);
        let err = select(&g, &OverrideTable::default(), CyclePolicy::Error).unwrap_err();
        match err {
            ResolveError::YankedVersion { module, reason, .. } => {
                assert_eq!(module, key("alpha@1.0"));
                assert_eq!(reason, "bad archive");
            }
            other => panic!("expected YankedVersion, got {other:?}"),
        }
    }

    #[test]
    fn yanked_selection_allowed_when_overridden() {
        let mut alpha = node("alpha@1.0", &[]);
        alpha.yanked = Some("bad archive".to_owned());
        alpha.source = Some(crate::model::graph::RegistrySource {
            registry: "/srv/registry".to_owned(),
            file: rove_registry::wire::SourceFile::parse(
                "url = \"https://example.com/a.tar.gz\"",
            )
            .unwrap(),
        });
        let g = graph("app@0.1", vec![node("app@0.1", &["alpha@1.0"]), alpha]);
        let resolved = select(&g, &pin("alpha", "1.0"), CyclePolicy::Error).unwrap();
        assert_eq!(resolved.selected(&name("alpha")), Some(&key("alpha@1.0")));
    }

    #[test]
    fn cycle_rejected_by_default() {
        let g = graph(
            "app@0.1",
            vec![
                node("app@0.1", &["alpha@1.0"]),
                node("alpha@1.0", &["beta@1.0"]),
                node("beta@1.0", &["alpha@1.0"]),
            ],
        );
        let err = select(&g, &OverrideTable::default(), CyclePolicy::Error).unwrap_err();
        match err {
            ResolveError::Cycle { path } => {
                assert_eq!(path.first(), path.last());
                assert!(path.contains(&key("alpha@1.0")));
                assert!(path.contains(&key("beta@1.0")));
            }
            other => panic!("expected Cycle, got {other:?}"),
        }
    }

    #[test]
    fn cycle_allowed_by_policy() {
        let g = graph(
            "app@0.1",
            vec![
                node("app@0.1", &["alpha@1.0"]),
                node("alpha@1.0", &["beta@1.0"]),
                node("beta@1.0", &["alpha@1.0"]),
            ],
        );
        let resolved = select(&g, &OverrideTable::default(), CyclePolicy::Allow).unwrap();
        assert_eq!(resolved.len(), 3);
        assert_eq!(resolved.selected(&name("alpha")), Some(&key("alpha@1.0")));
    }

    #[test]
    fn self_cycle_detected() {
        let g = graph(
            "app@0.1",
            vec![
                node("app@0.1", &["alpha@1.0"]),
                node("alpha@1.0", &["alpha@1.0"]),
            ],
        );
        let err = select(&g, &OverrideTable::default(), CyclePolicy::Error).unwrap_err();
        match err {
            ResolveError::Cycle { path } => {
                assert_eq!(path, vec![key("alpha@1.0"), key("alpha@1.0")]);
            }
            other => panic!("expected Cycle, got {other:?}"),
        }
    }

    #[test]
    fn root_always_resolves_to_its_own_key() {
        let g = graph("app@0.1", vec![node("app@0.1", &[])]);
        let resolved = select(&g, &OverrideTable::default(), CyclePolicy::Error).unwrap();
        assert_eq!(resolved.root, name("app"));
        assert_eq!(resolved.selected(&name("app")), Some(&key("app@0.1")));
    }

    #[test]
    fn identical_inputs_identical_outputs() {
        let build = || {
            let g = graph(
                "app@0.1",
                vec![
                    node("app@0.1", &["alpha@1.1", "beta@1.0"]),
                    node("alpha@1.0", &[]),
                    node("alpha@1.1", &[]),
                    node("beta@1.0", &["alpha@1.0"]),
                ],
            );
            select(&g, &OverrideTable::default(), CyclePolicy::Error).unwrap()
        };
        assert_eq!(build(), build());
    }
}
