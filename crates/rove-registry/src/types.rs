//! Identity types used in registry trait signatures.
//!
//! Foundation types shared by the registry layer and the resolver core:
//! module names, apparent repo names, versions, and the `name@version`
//! module key. All are validated newtypes that serialize as plain strings.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error returned when a module or repo name fails validation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("invalid {what} {value:?}: {reason}")]
pub struct NameError {
    /// What kind of name was being validated (`"module name"` or `"repo name"`).
    pub what: &'static str,
    /// The invalid value.
    pub value: String,
    /// Human-readable explanation.
    pub reason: String,
}

/// Error returned when a version string fails to parse.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("invalid version {value:?}: {reason}")]
pub struct VersionError {
    /// The invalid value.
    pub value: String,
    /// Human-readable explanation.
    pub reason: String,
}

/// Error returned when a `name@version` module key fails to parse.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("invalid module key {value:?}: {reason}")]
pub struct ModuleKeyError {
    /// The invalid value.
    pub value: String,
    /// Human-readable explanation.
    pub reason: String,
}

// ---------------------------------------------------------------------------
// ModuleName
// ---------------------------------------------------------------------------

/// A validated module name.
///
/// Module names are the canonical identity of a module across all
/// registries: lowercase letter first, then lowercase alphanumerics,
/// hyphens, underscores, and dots; 1–128 characters.
/// Examples: `alpha`, `proto-gen`, `corp.http_client`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModuleName(String);

impl ModuleName {
    /// The maximum length of a module name.
    pub const MAX_LEN: usize = 128;

    /// Create a new `ModuleName` from a string, validating format.
    ///
    /// # Errors
    /// Returns an error if the name is empty, too long, or contains invalid
    /// characters.
    pub fn new(s: &str) -> Result<Self, NameError> {
        Self::validate(s)?;
        Ok(Self(s.to_owned()))
    }

    /// Return the name as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(s: &str) -> Result<(), NameError> {
        let err = |reason: String| NameError {
            what: "module name",
            value: s.to_owned(),
            reason,
        };
        if s.is_empty() {
            return Err(err("module name must not be empty".to_owned()));
        }
        if s.len() > Self::MAX_LEN {
            return Err(err(format!(
                "module name must be at most {} characters, got {}",
                Self::MAX_LEN,
                s.len()
            )));
        }
        let first = s.chars().next().unwrap_or_default();
        if !first.is_ascii_lowercase() {
            return Err(err(
                "module name must start with a lowercase letter (a-z)".to_owned(),
            ));
        }
        if !s.chars().all(|c| {
            c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_' || c == '.'
        }) {
            return Err(err(
                "module name must contain only lowercase letters (a-z), digits (0-9), \
                 hyphens (-), underscores (_), and dots (.)"
                    .to_owned(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ModuleName {
    type Err = NameError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ModuleName {
    type Error = NameError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::validate(&s)?;
        Ok(Self(s))
    }
}

impl From<ModuleName> for String {
    fn from(name: ModuleName) -> Self {
        name.0
    }
}

// ---------------------------------------------------------------------------
// RepoName
// ---------------------------------------------------------------------------

/// An apparent repo name — the identifier a module's own sources use to
/// refer to one of its dependencies.
///
/// Defaults to the dependency's canonical module name but may be remapped
/// per dependency edge. Less restrictive than [`ModuleName`]: letters (any
/// case) or underscore first, then letters, digits, hyphens, underscores,
/// and dots.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepoName(String);

impl RepoName {
    /// The maximum length of a repo name.
    pub const MAX_LEN: usize = 128;

    /// Create a new `RepoName` from a string, validating format.
    ///
    /// # Errors
    /// Returns an error if the name is empty, too long, or contains invalid
    /// characters.
    pub fn new(s: &str) -> Result<Self, NameError> {
        Self::validate(s)?;
        Ok(Self(s.to_owned()))
    }

    /// Return the name as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(s: &str) -> Result<(), NameError> {
        let err = |reason: String| NameError {
            what: "repo name",
            value: s.to_owned(),
            reason,
        };
        if s.is_empty() {
            return Err(err("repo name must not be empty".to_owned()));
        }
        if s.len() > Self::MAX_LEN {
            return Err(err(format!(
                "repo name must be at most {} characters, got {}",
                Self::MAX_LEN,
                s.len()
            )));
        }
        let first = s.chars().next().unwrap_or_default();
        if !(first.is_ascii_alphabetic() || first == '_') {
            return Err(err(
                "repo name must start with a letter or underscore".to_owned(),
            ));
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
        {
            return Err(err(
                "repo name must contain only letters, digits, hyphens (-), \
                 underscores (_), and dots (.)"
                    .to_owned(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for RepoName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RepoName {
    type Err = NameError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for RepoName {
    type Error = NameError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::validate(&s)?;
        Ok(Self(s))
    }
}

impl From<RepoName> for String {
    fn from(name: RepoName) -> Self {
        name.0
    }
}

impl From<&ModuleName> for RepoName {
    /// Every valid module name is a valid repo name.
    fn from(name: &ModuleName) -> Self {
        Self(name.as_str().to_owned())
    }
}

// ---------------------------------------------------------------------------
// Version
// ---------------------------------------------------------------------------

/// One dot-separated segment of a version's release or prerelease part.
///
/// Numeric segments compare numerically and sort before non-numeric ones;
/// non-numeric segments compare lexicographically by ASCII.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum Segment {
    Number(u64),
    Text(String),
}

impl Segment {
    fn parse(s: &str, raw: &str) -> Result<Self, VersionError> {
        let err = |reason: String| VersionError {
            value: raw.to_owned(),
            reason,
        };
        if s.is_empty() {
            return Err(err("version segments must not be empty".to_owned()));
        }
        if !s.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(err(format!(
                "version segment {s:?} must be alphanumeric"
            )));
        }
        if s.chars().all(|c| c.is_ascii_digit()) {
            let n: u64 = s.parse().map_err(|_| {
                err(format!("numeric version segment {s:?} is too large"))
            })?;
            Ok(Self::Number(n))
        } else {
            Ok(Self::Text(s.to_owned()))
        }
    }
}

/// A totally ordered module version.
///
/// Grammar: `RELEASE("-"PRERELEASE)?("+"BUILD)?`, where RELEASE and
/// PRERELEASE are dot-separated alphanumeric segments and BUILD is ignored
/// for comparison. Ordering rules:
///
/// - release segments compare element-wise; a strict prefix sorts lower
///   (`1.0 < 1.0.1`);
/// - a version with a prerelease sorts below the same release without one
///   (`1.0-pre < 1.0`);
/// - numeric segments compare numerically and sort before non-numeric ones;
///   non-numeric segments compare by ASCII.
///
/// The special value `_` is the **placeholder** identity of a module whose
/// resolution is fixed by a non-registry override. It is equal only to
/// itself, sorts below every real version, and never participates in
/// version selection.
///
/// Equality, ordering, and hashing all ignore build metadata, so
/// `1.0+linux == 1.0+macos`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    raw: String,
    release: Vec<Segment>,
    prerelease: Vec<Segment>,
}

impl Version {
    /// Parse a version string.
    ///
    /// Accepts the version grammar above, plus the placeholder `_`.
    ///
    /// # Errors
    /// Returns an error on an empty string or a segment that is empty,
    /// non-alphanumeric, or numerically too large.
    pub fn parse(s: &str) -> Result<Self, VersionError> {
        if s == "_" {
            return Ok(Self::placeholder());
        }
        if s.is_empty() {
            return Err(VersionError {
                value: s.to_owned(),
                reason: "version must not be empty".to_owned(),
            });
        }
        // Build metadata is carried in `raw` for display but ignored otherwise.
        let before_build = s.split('+').next().unwrap_or_default();
        let (release_part, prerelease_part) = match before_build.split_once('-') {
            Some((rel, pre)) => (rel, Some(pre)),
            None => (before_build, None),
        };
        let release = release_part
            .split('.')
            .map(|seg| Segment::parse(seg, s))
            .collect::<Result<Vec<_>, _>>()?;
        let prerelease = match prerelease_part {
            Some(pre) => pre
                .split('.')
                .map(|seg| Segment::parse(seg, s))
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };
        Ok(Self {
            raw: s.to_owned(),
            release,
            prerelease,
        })
    }

    /// The placeholder identity of a module fixed by a non-registry override.
    ///
    /// Displays as `_`, equals only itself, and sorts below every real
    /// version.
    #[must_use]
    pub fn placeholder() -> Self {
        Self {
            raw: "_".to_owned(),
            release: Vec::new(),
            prerelease: Vec::new(),
        }
    }

    /// Returns `true` if this is the override placeholder.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.release.is_empty()
    }

    /// Return the version as originally written (including build metadata).
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.release == other.release && self.prerelease == other.prerelease
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.release.hash(state);
        self.prerelease.hash(state);
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.release.cmp(&other.release) {
            Ordering::Equal => {}
            ord => return ord,
        }
        // Same release: a prerelease sorts below no prerelease.
        match (self.prerelease.is_empty(), other.prerelease.is_empty()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => self.prerelease.cmp(&other.prerelease),
        }
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for Version {
    type Err = VersionError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Version {
    type Error = VersionError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.raw
    }
}

// ---------------------------------------------------------------------------
// ModuleKey
// ---------------------------------------------------------------------------

/// A specific version of a module: the `(name, version)` pair.
///
/// Displays and serializes as `name@version`; a module fixed by a
/// non-registry override displays as `name@_`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModuleKey {
    /// The module's canonical name.
    pub name: ModuleName,
    /// The module's version, or the placeholder for override identities.
    pub version: Version,
}

impl ModuleKey {
    /// Create a key from a name and version.
    #[must_use]
    pub const fn new(name: ModuleName, version: Version) -> Self {
        Self { name, version }
    }

    /// Parse a `name@version` string.
    ///
    /// # Errors
    /// Returns an error if the `@` separator is missing or either side is
    /// invalid.
    pub fn parse(s: &str) -> Result<Self, ModuleKeyError> {
        let err = |reason: String| ModuleKeyError {
            value: s.to_owned(),
            reason,
        };
        let Some((name, version)) = s.split_once('@') else {
            return Err(err("expected `name@version`".to_owned()));
        };
        let name = ModuleName::new(name).map_err(|e| err(e.reason))?;
        let version = Version::parse(version).map_err(|e| err(e.reason))?;
        Ok(Self { name, version })
    }
}

impl fmt::Display for ModuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

impl FromStr for ModuleKey {
    type Err = ModuleKeyError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ModuleKey {
    type Error = ModuleKeyError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<ModuleKey> for String {
    fn from(key: ModuleKey) -> Self {
        format!("{key}")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
