//! Domain model for module resolution.
//!
//! The identity types ([`ModuleName`], [`RepoName`], [`Version`],
//! [`ModuleKey`]) are owned by the `rove-registry` crate, since registry
//! trait signatures are written in terms of them; they are re-exported here
//! so resolver code has a single model namespace.

pub mod graph;
pub mod overrides;
pub mod source;

pub use rove_registry::types::{ModuleKey, ModuleName, RepoName, Version};
