//! HTTP-backed registry.
//!
//! Serves the same layout as [`LocalRegistry`](crate::LocalRegistry) under a
//! URL prefix. Successful responses are cached per (name, version) for the
//! lifetime of the registry instance, so a resolution run performs at most
//! one network round-trip per entry even when parallel worklist fetches race
//! on the same module.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::error::RegistryError;
use crate::registry::Registry;
use crate::types::{ModuleName, Version};
use crate::wire::{ModuleFile, ModuleList, SourceFile};

/// Default per-request timeout. The resolver's own deadline bounds the
/// overall run; this only prevents a single hung request from eating it all.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Default)]
struct Cache {
    metadata: HashMap<ModuleName, ModuleList>,
    modules: HashMap<(ModuleName, Version), ModuleFile>,
    sources: HashMap<(ModuleName, Version), SourceFile>,
}

/// A registry served over an HTTP(S) URL prefix.
pub struct HttpRegistry {
    base: String,
    client: reqwest::blocking::Client,
    cache: Mutex<Cache>,
}

impl HttpRegistry {
    /// Create a registry over a URL prefix (trailing slash optional).
    #[must_use]
    pub fn new(base: &str) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            base: base.trim_end_matches('/').to_owned(),
            client,
            cache: Mutex::new(Cache::default()),
        }
    }

    /// GET one registry file. `Ok(None)` is an HTTP 404 — the entry is
    /// absent. Any other non-success status, and any connection failure, is
    /// a transport error: a flaky mirror must not masquerade as a missing
    /// module.
    fn fetch(&self, rel: &str) -> Result<Option<String>, RegistryError> {
        let url = format!("{}/{rel}", self.base);
        tracing::debug!(url = %url, "registry fetch");
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| RegistryError::Transport {
                registry: self.base.clone(),
                detail: format!("GET {url}: {e}"),
            })?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(RegistryError::Transport {
                registry: self.base.clone(),
                detail: format!("GET {url}: unexpected status {status}"),
            });
        }
        let body = response.text().map_err(|e| RegistryError::Transport {
            registry: self.base.clone(),
            detail: format!("GET {url}: reading body: {e}"),
        })?;
        Ok(Some(body))
    }

    fn not_found(&self, name: &ModuleName, version: Option<&Version>) -> RegistryError {
        RegistryError::NotFound {
            registry: self.base.clone(),
            module: name.clone(),
            version: version.cloned(),
        }
    }

    fn malformed(&self, rel: &str, err: &toml::de::Error) -> RegistryError {
        RegistryError::Malformed {
            registry: self.base.clone(),
            path: rel.to_owned(),
            detail: err.message().to_owned(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Cache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Registry for HttpRegistry {
    fn id(&self) -> &str {
        &self.base
    }

    fn metadata(&self, name: &ModuleName) -> Result<ModuleList, RegistryError> {
        if let Some(cached) = self.lock().metadata.get(name) {
            return Ok(cached.clone());
        }
        let rel = format!("modules/{name}/metadata.toml");
        let text = self.fetch(&rel)?.ok_or_else(|| self.not_found(name, None))?;
        let list = ModuleList::parse(&text).map_err(|e| self.malformed(&rel, &e))?;
        self.lock().metadata.insert(name.clone(), list.clone());
        Ok(list)
    }

    fn module(&self, name: &ModuleName, version: &Version) -> Result<ModuleFile, RegistryError> {
        let key = (name.clone(), version.clone());
        if let Some(cached) = self.lock().modules.get(&key) {
            return Ok(cached.clone());
        }
        let rel = format!("modules/{name}/{version}/module.toml");
        let text = self
            .fetch(&rel)?
            .ok_or_else(|| self.not_found(name, Some(version)))?;
        let file = ModuleFile::parse(&text).map_err(|e| self.malformed(&rel, &e))?;
        self.lock().modules.insert(key, file.clone());
        Ok(file)
    }

    fn source(&self, name: &ModuleName, version: &Version) -> Result<SourceFile, RegistryError> {
        let key = (name.clone(), version.clone());
        if let Some(cached) = self.lock().sources.get(&key) {
            return Ok(cached.clone());
        }
        let rel = format!("modules/{name}/{version}/source.toml");
        let text = self
            .fetch(&rel)?
            .ok_or_else(|| self.not_found(name, Some(version)))?;
        let source = SourceFile::parse(&text).map_err(|e| self.malformed(&rel, &e))?;
        self.lock().sources.insert(key, source.clone());
        Ok(source)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
