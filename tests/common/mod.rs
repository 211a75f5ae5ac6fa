//! Shared test helpers for rove integration tests.
//!
//! All tests run against scratch registries and scratch projects in temp
//! directories — no network, no side effects outside the tempdirs.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use rove::config::ResolveConfig;
use rove::inspect::{DiskInspector, InspectError, SourceInspector};
use rove::manifest::RootManifest;
use rove::model::overrides::ModuleOverride;
use rove::model::ModuleName;
use rove::resolve::{Resolution, Resolver};
use rove::ResolveError;
use rove_registry::wire::ModuleFile;
use rove_registry::RegistryChain;

// ---------------------------------------------------------------------------
// ScratchRegistry
// ---------------------------------------------------------------------------

#[derive(Default)]
struct RegistryState {
    versions: BTreeMap<String, BTreeSet<String>>,
    yanked: BTreeMap<String, BTreeMap<String, String>>,
}

/// A local registry in a temp directory, populated module by module.
pub struct ScratchRegistry {
    dir: TempDir,
    state: RefCell<RegistryState>,
}

impl ScratchRegistry {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create registry temp dir"),
            state: RefCell::new(RegistryState::default()),
        }
    }

    /// The registry's location string, as configured in `rove.toml`.
    pub fn location(&self) -> String {
        self.dir.path().display().to_string()
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Start defining `name@version`; call [`ModuleWriter::create`] to write it.
    pub fn module(&self, name: &str, version: &str) -> ModuleWriter<'_> {
        ModuleWriter {
            registry: self,
            name: name.to_owned(),
            version: version.to_owned(),
            deps: Vec::new(),
            patches: Vec::new(),
            patch_strip: 0,
            url: None,
            integrity: None,
            strip_prefix: None,
        }
    }

    /// Mark `name@version` yanked with a reason.
    pub fn yank(&self, name: &str, version: &str, reason: &str) {
        {
            let mut state = self.state.borrow_mut();
            state
                .yanked
                .entry(name.to_owned())
                .or_default()
                .insert(version.to_owned(), reason.to_owned());
        }
        self.write_metadata(name);
    }

    fn write_metadata(&self, name: &str) {
        let state = self.state.borrow();
        let mut doc = String::from("versions = [");
        let versions = state.versions.get(name).cloned().unwrap_or_default();
        let quoted: Vec<String> = versions.iter().map(|v| format!("{v:?}")).collect();
        doc.push_str(&quoted.join(", "));
        doc.push_str("]\n");
        if let Some(yanked) = state.yanked.get(name) {
            doc.push_str("\n[yanked]\n");
            for (version, reason) in yanked {
                let _ = writeln!(doc, "{version:?} = {reason:?}");
            }
        }
        let dir = self.dir.path().join("modules").join(name);
        std::fs::create_dir_all(&dir).expect("failed to create module dir");
        std::fs::write(dir.join("metadata.toml"), doc).expect("failed to write metadata.toml");
    }
}

/// Builder for one registry entry.
pub struct ModuleWriter<'a> {
    registry: &'a ScratchRegistry,
    name: String,
    version: String,
    deps: Vec<(String, String, Option<String>)>,
    patches: Vec<(String, Option<String>)>,
    patch_strip: u32,
    url: Option<String>,
    integrity: Option<String>,
    strip_prefix: Option<String>,
}

impl ModuleWriter<'_> {
    pub fn dep(mut self, name: &str, version: &str) -> Self {
        self.deps.push((name.to_owned(), version.to_owned(), None));
        self
    }

    /// A dependency this module refers to under its own apparent name.
    pub fn dep_as(mut self, name: &str, version: &str, repo_name: &str) -> Self {
        self.deps.push((
            name.to_owned(),
            version.to_owned(),
            Some(repo_name.to_owned()),
        ));
        self
    }

    /// A registry-bundled default patch.
    pub fn patch(mut self, file: &str) -> Self {
        self.patches.push((file.to_owned(), None));
        self
    }

    pub fn patch_strip(mut self, strip: u32) -> Self {
        self.patch_strip = strip;
        self
    }

    pub fn url(mut self, url: &str) -> Self {
        self.url = Some(url.to_owned());
        self
    }

    pub fn integrity(mut self, integrity: &str) -> Self {
        self.integrity = Some(integrity.to_owned());
        self
    }

    pub fn strip_prefix(mut self, prefix: &str) -> Self {
        self.strip_prefix = Some(prefix.to_owned());
        self
    }

    /// Write the entry and update the registry's metadata.
    pub fn create(self) {
        let dir = self
            .registry
            .dir
            .path()
            .join("modules")
            .join(&self.name)
            .join(&self.version);
        std::fs::create_dir_all(&dir).expect("failed to create version dir");

        let mut module_toml = format!(
            "[module]\nname = {:?}\nversion = {:?}\n",
            self.name, self.version
        );
        for (name, version, repo_name) in &self.deps {
            let _ = write!(
                module_toml,
                "\n[[deps]]\nname = {name:?}\nversion = {version:?}\n"
            );
            if let Some(repo_name) = repo_name {
                let _ = writeln!(module_toml, "repo_name = {repo_name:?}");
            }
        }
        std::fs::write(dir.join("module.toml"), module_toml)
            .expect("failed to write module.toml");

        let url = self.url.clone().unwrap_or_else(|| {
            format!("https://files.test/{}-{}.tar.gz", self.name, self.version)
        });
        let mut source_toml = format!("url = {url:?}\n");
        if let Some(integrity) = &self.integrity {
            let _ = writeln!(source_toml, "integrity = {integrity:?}");
        }
        if let Some(prefix) = &self.strip_prefix {
            let _ = writeln!(source_toml, "strip_prefix = {prefix:?}");
        }
        if self.patch_strip != 0 {
            let _ = writeln!(source_toml, "patch_strip = {}", self.patch_strip);
        }
        for (file, integrity) in &self.patches {
            let _ = write!(source_toml, "\n[[patches]]\nfile = {file:?}\n");
            if let Some(integrity) = integrity {
                let _ = writeln!(source_toml, "integrity = {integrity:?}");
            }
        }
        std::fs::write(dir.join("source.toml"), source_toml)
            .expect("failed to write source.toml");

        {
            let mut state = self.registry.state.borrow_mut();
            state
                .versions
                .entry(self.name.clone())
                .or_default()
                .insert(self.version.clone());
        }
        self.registry.write_metadata(&self.name);
    }
}

// ---------------------------------------------------------------------------
// ScratchProject
// ---------------------------------------------------------------------------

/// A root project in a temp directory, with a generated `module.toml`.
pub struct ScratchProject {
    dir: TempDir,
}

impl ScratchProject {
    /// Create a project: the `[module]` table is generated from
    /// `name`/`version`, `manifest_body` supplies the rest (deps, overrides).
    pub fn new(name: &str, version: &str, manifest_body: &str) -> Self {
        let dir = TempDir::new().expect("failed to create project temp dir");
        let manifest =
            format!("[module]\nname = {name:?}\nversion = {version:?}\n{manifest_body}");
        std::fs::write(dir.path().join("module.toml"), manifest)
            .expect("failed to write module.toml");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dir.path().join("module.toml")
    }

    /// Write a file (e.g. a patch) relative to the project root.
    pub fn file(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create parent dir");
        }
        std::fs::write(&path, contents).expect("failed to write project file");
        path
    }

    /// Write a local module directory (for `local_path` overrides).
    pub fn local_module(&self, rel: &str, module_toml: &str) -> PathBuf {
        let dir = self.dir.path().join(rel);
        std::fs::create_dir_all(&dir).expect("failed to create local module dir");
        std::fs::write(dir.join("module.toml"), module_toml)
            .expect("failed to write local module.toml");
        dir
    }
}

// ---------------------------------------------------------------------------
// Resolution helpers
// ---------------------------------------------------------------------------

/// Resolve a scratch project against scratch registries with defaults.
pub fn resolve_project(
    project: &ScratchProject,
    registries: &[&ScratchRegistry],
) -> Result<Resolution, ResolveError> {
    let inspector = DiskInspector::new(project.path());
    resolve_with(project, registries, &ResolveConfig::default(), &inspector)
}

/// Resolve with a custom config and inspector.
pub fn resolve_with(
    project: &ScratchProject,
    registries: &[&ScratchRegistry],
    config: &ResolveConfig,
    inspector: &dyn SourceInspector,
) -> Result<Resolution, ResolveError> {
    let locations: Vec<String> = registries.iter().map(|r| r.location()).collect();
    let chain = RegistryChain::from_locations(&locations);
    let manifest = RootManifest::load(&project.manifest_path())?;
    Resolver::new(config, &chain, inspector).resolve(&manifest, project.path())
}

/// Inspector double serving module files from memory, for archive/git
/// override scenarios where no fetch transport exists in tests.
pub struct MapInspector {
    files: BTreeMap<String, String>,
}

impl MapInspector {
    pub fn new(files: &[(&str, &str)]) -> Self {
        Self {
            files: files
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect(),
        }
    }
}

impl SourceInspector for MapInspector {
    fn inspect(
        &self,
        name: &ModuleName,
        _source: &ModuleOverride,
    ) -> Result<ModuleFile, InspectError> {
        self.files
            .get(name.as_str())
            .map(|text| ModuleFile::parse(text).expect("test module file parses"))
            .ok_or_else(|| InspectError {
                detail: format!("no in-memory source for `{name}`"),
            })
    }
}
