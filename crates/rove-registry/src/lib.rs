//! Registry access layer for rove.
//!
//! This crate defines the [`Registry`] trait — the single interface through
//! which the resolver performs registry I/O. No other rove crate reads a
//! registry's directory layout or URL scheme directly; they depend on
//! `rove-registry` and program against the trait.
//!
//! # Crate layout
//!
//! - [`registry`] — the [`Registry`] trait, the first-hit-wins
//!   [`RegistryChain`], and the [`registry_at`] backend factory.
//! - [`types`] — identity types used in trait signatures ([`ModuleName`],
//!   [`RepoName`], [`Version`], [`ModuleKey`]).
//! - [`wire`] — the TOML file formats a registry serves ([`ModuleList`],
//!   [`ModuleFile`], [`SourceFile`]).
//! - [`error`] — the [`RegistryError`] enum returned by all trait methods.

pub mod error;
pub mod registry;
pub mod types;
pub mod wire;

// Backend implementation modules
mod http;
mod local;

pub use http::HttpRegistry;
pub use local::LocalRegistry;

// Re-export the main trait and commonly used types at the crate root for
// ergonomic imports: `use rove_registry::{Registry, ModuleName, Version};`
pub use error::RegistryError;
pub use registry::{registry_at, Registry, RegistryChain, RegistryModule};
pub use types::{
    ModuleKey, ModuleKeyError, ModuleName, NameError, RepoName, Version, VersionError,
};
pub use wire::{DepSpec, ModuleDecl, ModuleFile, ModuleList, PatchEntry, SourceFile};
