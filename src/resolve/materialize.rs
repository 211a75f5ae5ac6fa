//! Fetch-spec production.
//!
//! Turns the resolved graph into one [`FetchSpec`] per module (the root has
//! nothing to fetch): override-driven modules use the override's own source
//! descriptor and patches; registry-backed modules use the serving
//! registry's source descriptor plus the registry's default patches, with a
//! `single_version` override's extra patches appended after them in
//! declaration order. Root-declared patch files are checked to exist here —
//! before any fetch runs — and absolutized for the fetch driver; applying
//! them is the patch tool's job, not ours.

use std::path::Path;

use crate::error::ResolveError;
use crate::model::graph::{RequirementGraph, ResolvedGraph};
use crate::model::overrides::{ModuleOverride, OverrideTable};
use crate::model::source::{FetchSource, FetchSpec, Integrity, PatchSpec};
use crate::model::ModuleKey;

/// Produce fetch specs for every resolved module, in module-name order.
///
/// # Errors
/// Fails on a root-declared patch file that does not exist, or a malformed
/// integrity declaration.
pub fn materialize(
    resolved: &ResolvedGraph,
    graph: &RequirementGraph,
    overrides: &OverrideTable,
    root_dir: &Path,
) -> Result<Vec<FetchSpec>, ResolveError> {
    let mut specs = Vec::with_capacity(resolved.len().saturating_sub(1));
    for (name, module) in &resolved.modules {
        if *name == resolved.root {
            continue;
        }
        let spec = match overrides.get(name) {
            Some(op @ ModuleOverride::Archive { .. }) => archive_spec(&module.key, op, root_dir)?,
            Some(op @ ModuleOverride::Git { .. }) => git_spec(&module.key, op, root_dir)?,
            Some(ModuleOverride::LocalPath { path }) => FetchSpec {
                module: module.key.clone(),
                source: FetchSource::LocalPath { path: path.clone() },
                patches: Vec::new(),
                patch_strip: 0,
            },
            op => registry_spec(&module.key, op, graph, root_dir)?,
        };
        specs.push(spec);
    }
    Ok(specs)
}

fn archive_spec(
    key: &ModuleKey,
    op: &ModuleOverride,
    root_dir: &Path,
) -> Result<FetchSpec, ResolveError> {
    let ModuleOverride::Archive {
        urls,
        integrity,
        strip_prefix,
        patches,
        patch_strip,
    } = op
    else {
        unreachable!("archive_spec is only called for archive overrides")
    };
    Ok(FetchSpec {
        module: key.clone(),
        source: FetchSource::Archive {
            urls: urls.clone(),
            integrity: parse_integrity(key, integrity.as_deref())?,
            strip_prefix: strip_prefix.clone(),
        },
        patches: root_patches(key, patches, root_dir)?,
        patch_strip: patch_strip.unwrap_or(0),
    })
}

fn git_spec(
    key: &ModuleKey,
    op: &ModuleOverride,
    root_dir: &Path,
) -> Result<FetchSpec, ResolveError> {
    let ModuleOverride::Git {
        remote,
        commit,
        patches,
        patch_strip,
    } = op
    else {
        unreachable!("git_spec is only called for git overrides")
    };
    Ok(FetchSpec {
        module: key.clone(),
        source: FetchSource::Git {
            remote: remote.clone(),
            commit: commit.clone(),
        },
        patches: root_patches(key, patches, root_dir)?,
        patch_strip: patch_strip.unwrap_or(0),
    })
}

/// A registry-backed module: the registry's source and default patches,
/// plus a `single_version` override's extras when one is declared.
fn registry_spec(
    key: &ModuleKey,
    op: Option<&ModuleOverride>,
    graph: &RequirementGraph,
    root_dir: &Path,
) -> Result<FetchSpec, ResolveError> {
    let Some(node) = graph.get(key) else {
        unreachable!("resolved `{key}` was discovered")
    };
    let Some(source) = &node.source else {
        unreachable!("registry-backed `{key}` carries registry source data")
    };

    let mut patches = Vec::new();
    for entry in &source.file.patches {
        patches.push(PatchSpec {
            file: entry.file.clone(),
            integrity: parse_integrity(key, entry.integrity.as_deref())?,
        });
    }
    let mut patch_strip = source.file.patch_strip;

    if let Some(op) = op {
        patches.extend(root_patches(key, op.patches(), root_dir)?);
        if let Some(strip) = op.patch_strip() {
            patch_strip = strip;
        }
    }

    Ok(FetchSpec {
        module: key.clone(),
        source: FetchSource::Registry {
            registry: source.registry.clone(),
            url: source.file.url.clone(),
            integrity: parse_integrity(key, source.file.integrity.as_deref())?,
            strip_prefix: source.file.strip_prefix.clone(),
        },
        patches,
        patch_strip,
    })
}

/// Root-declared patches: must exist on disk now, handed downstream as
/// absolute paths.
fn root_patches(
    key: &ModuleKey,
    patches: &[String],
    root_dir: &Path,
) -> Result<Vec<PatchSpec>, ResolveError> {
    patches
        .iter()
        .map(|declared| {
            let path = {
                let p = Path::new(declared);
                if p.is_absolute() {
                    p.to_owned()
                } else {
                    root_dir.join(p)
                }
            };
            if !path.is_file() {
                return Err(ResolveError::UnresolvedPatch {
                    module: key.clone(),
                    patch: declared.clone(),
                    detail: format!("`{}` does not exist", path.display()),
                });
            }
            Ok(PatchSpec {
                file: path.display().to_string(),
                integrity: None,
            })
        })
        .collect()
}

fn parse_integrity(
    key: &ModuleKey,
    declared: Option<&str>,
) -> Result<Option<Integrity>, ResolveError> {
    declared
        .map(|value| {
            Integrity::parse(value).map_err(|e| ResolveError::InvalidIntegrity {
                module: key.clone(),
                value: e.value,
                reason: e.reason,
            })
        })
        .transpose()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
