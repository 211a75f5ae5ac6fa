//! Override-source inspection — the seam to the fetch transport.
//!
//! A module replaced by a non-registry override still contributes its own
//! declared dependencies to the graph, which means its module file must be
//! read from the override's source. For a `local_path` override that is a
//! plain file read; for archive and git overrides it requires the external
//! fetch transport. [`SourceInspector`] is the trait boundary; the shipped
//! [`DiskInspector`] handles what can be done without a transport.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::model::overrides::ModuleOverride;
use crate::model::ModuleName;
use rove_registry::wire::ModuleFile;

// ---------------------------------------------------------------------------
// InspectError
// ---------------------------------------------------------------------------

/// Error reading an override source's module file.
#[derive(Debug)]
pub struct InspectError {
    /// Human-readable description of the failure.
    pub detail: String,
}

impl InspectError {
    fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

impl fmt::Display for InspectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.detail)
    }
}

impl std::error::Error for InspectError {}

// ---------------------------------------------------------------------------
// SourceInspector
// ---------------------------------------------------------------------------

/// Reads the module file declared by a non-registry override's source.
///
/// Object-safe and `Send + Sync`: discovery calls inspectors from parallel
/// worklist fetches.
pub trait SourceInspector: Send + Sync {
    /// The module file for `name` as declared by the override's source.
    ///
    /// # Errors
    /// Returns an [`InspectError`] when the source cannot be read or its
    /// module file is invalid.
    fn inspect(
        &self,
        name: &ModuleName,
        source: &ModuleOverride,
    ) -> Result<ModuleFile, InspectError>;
}

// ---------------------------------------------------------------------------
// DiskInspector
// ---------------------------------------------------------------------------

/// The inspector available without a fetch transport.
///
/// Fully supports `local_path` overrides by reading `module.toml` from the
/// overridden directory (module files are parsed leniently there, like
/// registry-served ones). Archive and git overrides need their sources
/// fetched first — that is the transport collaborator's job, so this
/// inspector reports them as unreadable rather than guessing an empty
/// dependency list.
pub struct DiskInspector {
    root: PathBuf,
}

impl DiskInspector {
    /// Create an inspector resolving relative `local_path` overrides
    /// against `root` (the root manifest's directory).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn read_local(&self, name: &ModuleName, path: &Path) -> Result<ModuleFile, InspectError> {
        let dir = if path.is_absolute() {
            path.to_owned()
        } else {
            self.root.join(path)
        };
        let module_file = dir.join("module.toml");
        let text = std::fs::read_to_string(&module_file).map_err(|e| {
            InspectError::new(format!("cannot read `{}`: {e}", module_file.display()))
        })?;
        let file = ModuleFile::parse(&text).map_err(|e| {
            InspectError::new(format!("`{}`: {}", module_file.display(), e.message()))
        })?;
        if file.module.name != *name {
            return Err(InspectError::new(format!(
                "`{}` declares module `{}`, expected `{name}`",
                module_file.display(),
                file.module.name
            )));
        }
        Ok(file)
    }
}

impl SourceInspector for DiskInspector {
    fn inspect(
        &self,
        name: &ModuleName,
        source: &ModuleOverride,
    ) -> Result<ModuleFile, InspectError> {
        match source {
            ModuleOverride::LocalPath { path } => self.read_local(name, path),
            ModuleOverride::Archive { .. } | ModuleOverride::Git { .. } => {
                Err(InspectError::new(format!(
                    "a {} override's module file can only be read after fetching; \
                     configure a fetch transport for `{name}`",
                    source.kind()
                )))
            }
            ModuleOverride::SingleVersion { .. } => Err(InspectError::new(
                "single_version overrides stay registry-backed and are never inspected",
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
