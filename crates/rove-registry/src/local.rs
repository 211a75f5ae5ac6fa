//! Directory-backed registry.
//!
//! Layout, relative to the registry root:
//!
//! ```text
//! modules/<name>/metadata.toml
//! modules/<name>/<version>/module.toml
//! modules/<name>/<version>/source.toml
//! ```

use std::io;
use std::path::{Path, PathBuf};

use crate::error::RegistryError;
use crate::registry::Registry;
use crate::types::{ModuleName, Version};
use crate::wire::{ModuleFile, ModuleList, SourceFile};

/// A registry rooted at a local directory.
pub struct LocalRegistry {
    root: PathBuf,
    id: String,
}

impl LocalRegistry {
    /// Create a registry over a directory. The directory need not exist yet;
    /// lookups against a missing directory report the entry as not found.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let id = root.display().to_string();
        Self { root, id }
    }

    /// The registry root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read one registry file, classifying failures.
    fn read(
        &self,
        rel: &str,
        name: &ModuleName,
        version: Option<&Version>,
    ) -> Result<String, RegistryError> {
        let path = self.root.join(rel);
        match std::fs::read_to_string(&path) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(RegistryError::NotFound {
                registry: self.id.clone(),
                module: name.clone(),
                version: version.cloned(),
            }),
            Err(e) => Err(RegistryError::Transport {
                registry: self.id.clone(),
                detail: format!("cannot read `{}`: {e}", path.display()),
            }),
        }
    }

    fn malformed(&self, rel: &str, err: &toml::de::Error) -> RegistryError {
        RegistryError::Malformed {
            registry: self.id.clone(),
            path: rel.to_owned(),
            detail: err.message().to_owned(),
        }
    }
}

impl Registry for LocalRegistry {
    fn id(&self) -> &str {
        &self.id
    }

    fn metadata(&self, name: &ModuleName) -> Result<ModuleList, RegistryError> {
        let rel = format!("modules/{name}/metadata.toml");
        let text = self.read(&rel, name, None)?;
        ModuleList::parse(&text).map_err(|e| self.malformed(&rel, &e))
    }

    fn module(&self, name: &ModuleName, version: &Version) -> Result<ModuleFile, RegistryError> {
        let rel = format!("modules/{name}/{version}/module.toml");
        let text = self.read(&rel, name, Some(version))?;
        ModuleFile::parse(&text).map_err(|e| self.malformed(&rel, &e))
    }

    fn source(&self, name: &ModuleName, version: &Version) -> Result<SourceFile, RegistryError> {
        let rel = format!("modules/{name}/{version}/source.toml");
        let text = self.read(&rel, name, Some(version))?;
        SourceFile::parse(&text).map_err(|e| self.malformed(&rel, &e))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
