//! The root module manifest (`module.toml`).
//!
//! The small declarative surface this resolver recognizes: the root
//! module's own identity, its direct dependencies (with optional
//! apparent-name remaps), and the ordered override directive list. The
//! build-file language proper lives outside this crate — by the time a
//! manifest reaches the resolver it is this plain TOML shape.

use std::fmt;
use std::path::Path;

use serde::Deserialize;

use crate::model::overrides::OverrideDirective;
use rove_registry::wire::{DepSpec, ModuleDecl};

// ---------------------------------------------------------------------------
// RootManifest
// ---------------------------------------------------------------------------

/// The root project's module declaration.
///
/// Unlike registry-served module files, the root manifest is parsed
/// strictly: a typo in an override directive must fail loudly, not resolve
/// to something subtly different.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RootManifest {
    /// The root module's identity.
    pub module: ModuleDecl,

    /// Direct dependencies, in declaration order.
    #[serde(default)]
    pub deps: Vec<DepSpec>,

    /// Override directives, in declaration order.
    #[serde(default)]
    pub overrides: Vec<OverrideDirective>,
}

impl RootManifest {
    /// Load a manifest from disk.
    ///
    /// # Errors
    /// Returns a [`ManifestError`] if the file is missing, unreadable, or
    /// fails to parse or validate.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ManifestError {
            path: Some(path.to_owned()),
            message: format!("could not read file: {e}"),
        })?;
        Self::parse(&contents).map_err(|mut e| {
            e.path = Some(path.to_owned());
            e
        })
    }

    /// Parse a manifest from a TOML string.
    ///
    /// # Errors
    /// Returns a [`ManifestError`] with line-level detail on invalid TOML,
    /// unknown fields, or declaration conflicts.
    pub fn parse(toml_str: &str) -> Result<Self, ManifestError> {
        let manifest: Self = toml::from_str(toml_str).map_err(|e| {
            let mut message = e.message().to_owned();
            if let Some(span) = e.span() {
                let line = toml_str[..span.start]
                    .chars()
                    .filter(|&c| c == '\n')
                    .count()
                    + 1;
                message = format!("line {line}: {message}");
            }
            ManifestError {
                path: None,
                message,
            }
        })?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Declaration-level checks TOML cannot express.
    fn validate(&self) -> Result<(), ManifestError> {
        let mut seen_names = std::collections::BTreeSet::new();
        let mut seen_apparents = std::collections::BTreeSet::new();
        for dep in &self.deps {
            if !seen_names.insert(dep.name.clone()) {
                return Err(ManifestError {
                    path: None,
                    message: format!("dependency `{}` is declared twice", dep.name),
                });
            }
            let apparent = dep.apparent();
            if !seen_apparents.insert(apparent.clone()) {
                return Err(ManifestError {
                    path: None,
                    message: format!(
                        "repo name `{apparent}` is used by more than one dependency"
                    ),
                });
            }
            if dep.name == self.module.name {
                return Err(ManifestError {
                    path: None,
                    message: format!(
                        "module `{}` cannot declare itself as a dependency",
                        dep.name
                    ),
                });
            }
        }
        for directive in &self.overrides {
            if directive.module == self.module.name {
                return Err(ManifestError {
                    path: None,
                    message: format!(
                        "the root module `{}` cannot override itself",
                        directive.module
                    ),
                });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ManifestError
// ---------------------------------------------------------------------------

/// Error loading or validating a root manifest.
#[derive(Debug)]
pub struct ManifestError {
    /// The path that was being loaded (if available).
    pub path: Option<std::path::PathBuf>,
    /// Human-readable message with line-level detail when possible.
    pub message: String,
}

impl fmt::Display for ManifestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(p) = &self.path {
            write!(f, "{}: {}", p.display(), self.message)
        } else {
            write!(f, "manifest error: {}", self.message)
        }
    }
}

impl std::error::Error for ManifestError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
