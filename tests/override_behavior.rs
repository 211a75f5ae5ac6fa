//! Override scenarios: pinning, registry redirects, archives, git
//! checkouts, local paths, and patch composition.

mod common;

use common::{resolve_project, resolve_with, MapInspector, ScratchProject, ScratchRegistry};

use rove::config::ResolveConfig;
use rove::model::source::FetchSource;
use rove::model::{ModuleKey, ModuleName, RepoName};
use rove::ResolveError;

fn key(s: &str) -> ModuleKey {
    ModuleKey::parse(s).unwrap()
}

fn name(s: &str) -> ModuleName {
    ModuleName::new(s).unwrap()
}

fn repo(s: &str) -> RepoName {
    RepoName::new(s).unwrap()
}

#[test]
fn single_version_override_with_patch_wins_over_mvs() {
    let registry = ScratchRegistry::new();
    registry.module("alpha", "1.0").create();
    registry.module("alpha", "1.1").create();
    registry
        .module("beta", "1.1")
        .dep("alpha", "1.1")
        .create();
    let project = ScratchProject::new(
        "app",
        "0.1",
        r#"
[[deps]]
name = "alpha"
version = "1.1"

[[deps]]
name = "beta"
version = "1.1"

[[overrides]]
module = "alpha"
type = "single_version"
version = "1.0"
patches = ["patches/alpha.patch"]
patch_strip = 1
"#,
    );
    project.file("patches/alpha.patch", "--- a/lib.c\n+++ b/lib.c\n");

    let resolution = resolve_project(&project, &[&registry]).unwrap();

    // MVS alone would pick 1.1; the pin forces 1.0 for everyone.
    assert_eq!(
        resolution.resolved.selected(&name("alpha")),
        Some(&key("alpha@1.0"))
    );
    let beta_mapping = &resolution.mappings[&name("beta")];
    assert_eq!(beta_mapping.get(&repo("alpha")), Some(&key("alpha@1.0")));

    let alpha_spec = resolution
        .fetch_specs
        .iter()
        .find(|spec| spec.module.name == name("alpha"))
        .unwrap();
    assert_eq!(alpha_spec.patches.len(), 1);
    assert!(alpha_spec.patches[0].file.ends_with("alpha.patch"));
    assert_eq!(alpha_spec.patch_strip, 1);
}

#[test]
fn registry_redirect_changes_source_not_version() {
    let main = ScratchRegistry::new();
    main.module("alpha", "1.0").create();
    main.module("beta", "1.0").dep("alpha", "1.0").create();

    let mirror = ScratchRegistry::new();
    mirror
        .module("alpha", "1.0")
        .url("https://mirror.test/alpha-1.0.tar.gz")
        .create();

    let project = ScratchProject::new(
        "app",
        "0.1",
        &format!(
            r#"
[[deps]]
name = "alpha"
version = "1.0"

[[deps]]
name = "beta"
version = "1.0"

[[overrides]]
module = "alpha"
type = "single_version"
registry = {:?}
"#,
            mirror.location()
        ),
    );

    let resolution = resolve_project(&project, &[&main]).unwrap();

    // Version unchanged, source redirected.
    assert_eq!(
        resolution.resolved.selected(&name("alpha")),
        Some(&key("alpha@1.0"))
    );
    let alpha_spec = resolution
        .fetch_specs
        .iter()
        .find(|spec| spec.module.name == name("alpha"))
        .unwrap();
    match &alpha_spec.source {
        FetchSource::Registry { registry, url, .. } => {
            assert_eq!(*registry, mirror.location());
            assert!(url.contains("mirror.test"));
        }
        other => panic!("expected registry source, got {other:?}"),
    }

    // beta still comes from the main registry.
    let beta_spec = resolution
        .fetch_specs
        .iter()
        .find(|spec| spec.module.name == name("beta"))
        .unwrap();
    match &beta_spec.source {
        FetchSource::Registry { registry, .. } => assert_eq!(*registry, main.location()),
        other => panic!("expected registry source, got {other:?}"),
    }
}

#[test]
fn registry_default_patches_compose_with_override_patches() {
    let registry = ScratchRegistry::new();
    registry
        .module("alpha", "1.0")
        .patch("patches/upstream-fix.patch")
        .patch_strip(2)
        .create();
    let project = ScratchProject::new(
        "app",
        "0.1",
        r#"
[[deps]]
name = "alpha"
version = "1.0"

[[overrides]]
module = "alpha"
type = "single_version"
version = "1.0"
patches = ["local.patch"]
patch_strip = 1
"#,
    );
    project.file("local.patch", "--- a\n+++ b\n");

    let resolution = resolve_project(&project, &[&registry]).unwrap();
    let spec = &resolution.fetch_specs[0];

    // Registry patches first, override patches appended after.
    assert_eq!(spec.patches.len(), 2);
    assert_eq!(spec.patches[0].file, "patches/upstream-fix.patch");
    assert!(spec.patches[1].file.ends_with("local.patch"));
    // Override strip depth wins when specified.
    assert_eq!(spec.patch_strip, 1);
}

#[test]
fn registry_default_patches_keep_registry_strip_without_override() {
    let registry = ScratchRegistry::new();
    registry
        .module("alpha", "1.0")
        .patch("patches/upstream-fix.patch")
        .patch_strip(2)
        .create();
    let project = ScratchProject::new(
        "app",
        "0.1",
        r#"
[[deps]]
name = "alpha"
version = "1.0"
"#,
    );

    let resolution = resolve_project(&project, &[&registry]).unwrap();
    let spec = &resolution.fetch_specs[0];
    assert_eq!(spec.patches.len(), 1);
    assert_eq!(spec.patch_strip, 2);
}

#[test]
fn missing_override_patch_file_fails() {
    let registry = ScratchRegistry::new();
    registry.module("alpha", "1.0").create();
    let project = ScratchProject::new(
        "app",
        "0.1",
        r#"
[[deps]]
name = "alpha"
version = "1.0"

[[overrides]]
module = "alpha"
type = "single_version"
version = "1.0"
patches = ["patches/ghost.patch"]
"#,
    );

    let err = resolve_project(&project, &[&registry]).unwrap_err();
    match err {
        ResolveError::UnresolvedPatch { module, patch, .. } => {
            assert_eq!(module, key("alpha@1.0"));
            assert_eq!(patch, "patches/ghost.patch");
        }
        other => panic!("expected UnresolvedPatch, got {other:?}"),
    }
}

#[test]
fn duplicate_override_fails_before_any_fetch() {
    // The registry location does not even exist: if resolution tried to
    // fetch anything it would fail differently.
    let project = ScratchProject::new(
        "app",
        "0.1",
        r#"
[[deps]]
name = "alpha"
version = "1.0"

[[overrides]]
module = "alpha"
type = "local_path"
path = "../alpha"

[[overrides]]
module = "alpha"
type = "git"
remote = "https://git.test/alpha.git"
commit = "deadbeef"
"#,
    );

    let err = resolve_project(&project, &[]).unwrap_err();
    match err {
        ResolveError::DuplicateOverride { module } => assert_eq!(module, name("alpha")),
        other => panic!("expected DuplicateOverride, got {other:?}"),
    }
}

#[test]
fn local_path_override_bypasses_registry_and_carries_nothing() {
    let registry = ScratchRegistry::new();
    registry.module("alpha", "1.0").create();
    // Note: no gamma in any registry.
    let project = ScratchProject::new(
        "app",
        "0.1",
        r#"
[[deps]]
name = "gamma"
version = "3.0"

[[overrides]]
module = "gamma"
type = "local_path"
path = "vendor/gamma"
"#,
    );
    project.local_module(
        "vendor/gamma",
        r#"
[module]
name = "gamma"
version = "3.0"

[[deps]]
name = "alpha"
version = "1.0"
"#,
    );

    let resolution = resolve_project(&project, &[&registry]).unwrap();

    // gamma resolves at the override identity.
    assert_eq!(
        resolution.resolved.selected(&name("gamma")),
        Some(&key("gamma@_"))
    );
    // Its transitive deps come solely from the local source.
    assert_eq!(
        resolution.resolved.selected(&name("alpha")),
        Some(&key("alpha@1.0"))
    );

    let gamma_spec = resolution
        .fetch_specs
        .iter()
        .find(|spec| spec.module.name == name("gamma"))
        .unwrap();
    match &gamma_spec.source {
        FetchSource::LocalPath { path } => {
            assert_eq!(path.to_str().unwrap(), "vendor/gamma");
        }
        other => panic!("expected local path source, got {other:?}"),
    }
    assert!(gamma_spec.patches.is_empty());
    assert_eq!(gamma_spec.patch_strip, 0);
}

#[test]
fn archive_override_replaces_registry_source() {
    let registry = ScratchRegistry::new();
    registry.module("alpha", "1.0").create();
    registry.module("alpha", "1.1").create();
    registry.module("beta", "1.1").dep("alpha", "1.1").create();
    let project = ScratchProject::new(
        "app",
        "0.1",
        r#"
[[deps]]
name = "alpha"
version = "1.1"

[[deps]]
name = "beta"
version = "1.1"

[[overrides]]
module = "alpha"
type = "archive"
urls = ["https://files.test/alpha-fork.tar.gz"]
strip_prefix = "alpha-fork"
patches = ["fork.patch"]
patch_strip = 1
"#,
    );
    project.file("fork.patch", "--- a\n+++ b\n");

    // The archive's module file is supplied by the inspector double — in
    // production the fetch transport provides it.
    let inspector = MapInspector::new(&[(
        "alpha",
        "[module]\nname = \"alpha\"\nversion = \"1.0\"\n",
    )]);
    let resolution =
        resolve_with(&project, &[&registry], &ResolveConfig::default(), &inspector).unwrap();

    assert_eq!(
        resolution.resolved.selected(&name("alpha")),
        Some(&key("alpha@_"))
    );
    // beta's edge lands on the override identity too.
    let beta_mapping = &resolution.mappings[&name("beta")];
    assert_eq!(beta_mapping.get(&repo("alpha")), Some(&key("alpha@_")));

    let alpha_spec = resolution
        .fetch_specs
        .iter()
        .find(|spec| spec.module.name == name("alpha"))
        .unwrap();
    match &alpha_spec.source {
        FetchSource::Archive {
            urls, strip_prefix, ..
        } => {
            assert_eq!(urls, &["https://files.test/alpha-fork.tar.gz"]);
            assert_eq!(strip_prefix.as_deref(), Some("alpha-fork"));
        }
        other => panic!("expected archive source, got {other:?}"),
    }
    assert_eq!(alpha_spec.patches.len(), 1);
    assert_eq!(alpha_spec.patch_strip, 1);
}

#[test]
fn git_override_pins_a_revision() {
    let registry = ScratchRegistry::new();
    registry.module("alpha", "1.1").create();
    let project = ScratchProject::new(
        "app",
        "0.1",
        r#"
[[deps]]
name = "alpha"
version = "1.1"

[[overrides]]
module = "alpha"
type = "git"
remote = "https://git.test/alpha.git"
commit = "0b7a3ba9c913f9e8a6014eafe2ef6a1d53038b1c"
"#,
    );

    let inspector = MapInspector::new(&[(
        "alpha",
        "[module]\nname = \"alpha\"\nversion = \"1.1\"\n",
    )]);
    let resolution =
        resolve_with(&project, &[&registry], &ResolveConfig::default(), &inspector).unwrap();

    let alpha_spec = resolution
        .fetch_specs
        .iter()
        .find(|spec| spec.module.name == name("alpha"))
        .unwrap();
    match &alpha_spec.source {
        FetchSource::Git { remote, commit } => {
            assert_eq!(remote, "https://git.test/alpha.git");
            assert_eq!(commit, "0b7a3ba9c913f9e8a6014eafe2ef6a1d53038b1c");
        }
        other => panic!("expected git source, got {other:?}"),
    }
}

#[test]
fn override_suppresses_yank_failure() {
    let registry = ScratchRegistry::new();
    registry.module("alpha", "1.0").create();
    registry.yank("alpha", "1.0", "bad release");
    let project = ScratchProject::new(
        "app",
        "0.1",
        r#"
[[deps]]
name = "alpha"
version = "1.0"

[[overrides]]
module = "alpha"
type = "single_version"
version = "1.0"
"#,
    );

    let resolution = resolve_project(&project, &[&registry]).unwrap();
    assert_eq!(
        resolution.resolved.selected(&name("alpha")),
        Some(&key("alpha@1.0"))
    );
}

#[test]
fn archive_override_without_transport_fails_inspection() {
    let registry = ScratchRegistry::new();
    let project = ScratchProject::new(
        "app",
        "0.1",
        r#"
[[deps]]
name = "alpha"
version = "1.0"

[[overrides]]
module = "alpha"
type = "archive"
urls = ["https://files.test/alpha.tar.gz"]
"#,
    );

    // The default DiskInspector cannot read archive sources.
    let err = resolve_project(&project, &[&registry]).unwrap_err();
    match err {
        ResolveError::Inspect { module, kind, .. } => {
            assert_eq!(module, name("alpha"));
            assert_eq!(kind, "archive");
        }
        other => panic!("expected Inspect, got {other:?}"),
    }
}
