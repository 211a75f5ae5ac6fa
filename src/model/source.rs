//! Fetch specifications — the resolver's output to the fetch transport.
//!
//! A [`FetchSpec`] tells the downstream fetch driver where one resolved
//! module's sources come from and which patches to apply before use. The
//! resolver only *sequences and parameterizes* patching; applying patches
//! and downloading archives belong to external collaborators.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::ModuleKey;

// ---------------------------------------------------------------------------
// Integrity
// ---------------------------------------------------------------------------

/// Error returned when an integrity string is malformed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntegrityError {
    /// The invalid value.
    pub value: String,
    /// Human-readable explanation.
    pub reason: String,
}

impl fmt::Display for IntegrityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid integrity {:?}: {}", self.value, self.reason)
    }
}

impl std::error::Error for IntegrityError {}

/// Error returned when fetched content does not match its declared digest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntegrityMismatch {
    /// The digest the declaration expects.
    pub expected: String,
    /// The digest the content actually has.
    pub actual: String,
}

impl fmt::Display for IntegrityMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "content does not match declared integrity: expected {}, got {}",
            self.expected, self.actual
        )
    }
}

impl std::error::Error for IntegrityMismatch {}

/// A declared content digest: `sha256-<64 lowercase hex digits>`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Integrity {
    digest_hex: String,
}

impl Integrity {
    /// Parse a `sha256-<hex>` integrity string.
    ///
    /// # Errors
    /// Returns an error if the prefix is not `sha256-` or the digest is not
    /// exactly 64 lowercase hex digits.
    pub fn parse(s: &str) -> Result<Self, IntegrityError> {
        let err = |reason: &str| IntegrityError {
            value: s.to_owned(),
            reason: reason.to_owned(),
        };
        let Some(hex) = s.strip_prefix("sha256-") else {
            return Err(err("expected a `sha256-` prefix"));
        };
        if hex.len() != 64 {
            return Err(err("digest must be 64 hex digits"));
        }
        if !hex
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
        {
            return Err(err("digest must be lowercase hex"));
        }
        Ok(Self {
            digest_hex: hex.to_owned(),
        })
    }

    /// Compute the integrity of raw content.
    #[must_use]
    pub fn of(content: &[u8]) -> Self {
        let digest = Sha256::digest(content);
        let digest_hex: String = digest.iter().map(|byte| format!("{byte:02x}")).collect();
        Self { digest_hex }
    }

    /// Check raw content against this declaration.
    ///
    /// Called by the fetch driver after downloading; a mismatch is fatal to
    /// the whole resolution.
    ///
    /// # Errors
    /// Returns [`IntegrityMismatch`] carrying both digests.
    pub fn verify(&self, content: &[u8]) -> Result<(), IntegrityMismatch> {
        let actual = Self::of(content);
        if actual == *self {
            Ok(())
        } else {
            Err(IntegrityMismatch {
                expected: self.to_string(),
                actual: actual.to_string(),
            })
        }
    }
}

impl fmt::Display for Integrity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sha256-{}", self.digest_hex)
    }
}

impl TryFrom<String> for Integrity {
    type Error = IntegrityError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Integrity> for String {
    fn from(integrity: Integrity) -> Self {
        integrity.to_string()
    }
}

// ---------------------------------------------------------------------------
// PatchSpec
// ---------------------------------------------------------------------------

/// One patch to apply, in unified-diff format.
///
/// `file` is either an absolute path (root-declared patches are absolutized
/// against the root project directory) or a registry-relative locator the
/// fetch transport resolves against the serving registry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchSpec {
    /// Patch locator.
    pub file: String,
    /// Expected integrity of the patch contents, when declared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integrity: Option<Integrity>,
}

// ---------------------------------------------------------------------------
// FetchSource / FetchSpec
// ---------------------------------------------------------------------------

/// Where one resolved module's sources come from.
///
/// Serialized with a `"type"` tag for the lockfile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FetchSource {
    /// A registry-served archive.
    Registry {
        /// Identity of the serving registry.
        registry: String,
        /// Archive URL.
        url: String,
        /// Expected archive integrity.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        integrity: Option<Integrity>,
        /// Leading path component to strip when extracting.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        strip_prefix: Option<String>,
    },
    /// A root-declared archive override.
    Archive {
        /// Candidate URLs, tried in order.
        urls: Vec<String>,
        /// Expected archive integrity.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        integrity: Option<Integrity>,
        /// Leading path component to strip when extracting.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        strip_prefix: Option<String>,
    },
    /// A version-control checkout at a fixed revision.
    Git {
        /// Remote URL.
        remote: String,
        /// Commit hash or tag.
        commit: String,
    },
    /// A directory already present on disk; nothing to fetch.
    LocalPath {
        /// The directory.
        path: PathBuf,
    },
}

/// Everything the fetch transport needs for one resolved module.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchSpec {
    /// The module this spec materializes.
    pub module: ModuleKey,
    /// Where the sources come from.
    pub source: FetchSource,
    /// Patches to apply after extraction, in order: the registry's own
    /// default patches first, then root-declared override patches.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patches: Vec<PatchSpec>,
    /// Path-component strip count for the patches.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub patch_strip: u32,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_zero(n: &u32) -> bool {
    *n == 0
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
