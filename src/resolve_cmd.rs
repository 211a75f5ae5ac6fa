//! `rove resolve` — run the pipeline and write the lockfile.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use rove::config::RoveConfig;
use rove::inspect::DiskInspector;
use rove::lock::Lockfile;
use rove::manifest::RootManifest;
use rove::resolve::{Resolution, Resolver};
use rove_registry::RegistryChain;

use crate::Cli;

/// Load config + manifest and run the full pipeline.
///
/// Shared with `rove graph`. Returns the resolution and the directory the
/// manifest lives in.
pub fn resolution(cli: &Cli) -> Result<(Resolution, PathBuf)> {
    let config = RoveConfig::load(&cli.config)?;

    // CLI-supplied registries take priority over configured ones.
    let mut locations = cli.registries.clone();
    locations.extend(config.resolve.registries.iter().cloned());
    let chain = RegistryChain::from_locations(&locations);

    let manifest = RootManifest::load(&cli.manifest)?;
    let root_dir = cli
        .manifest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_owned);

    let inspector = DiskInspector::new(root_dir.clone());
    let resolver = Resolver::new(&config.resolve, &chain, &inspector);
    let resolution = resolver
        .resolve(&manifest, &root_dir)
        .with_context(|| format!("resolving `{}`", manifest.module.name))?;
    Ok((resolution, root_dir))
}

pub fn run(cli: &Cli, lock_path: &Path, print: bool) -> Result<()> {
    let (resolution, _) = resolution(cli)?;
    let lockfile = Lockfile::from_resolution(&resolution);
    let rendered = lockfile.to_json_string();

    if print {
        print!("{rendered}");
    } else {
        std::fs::write(lock_path, &rendered)
            .with_context(|| format!("writing `{}`", lock_path.display()))?;
        println!(
            "resolved {} module(s); wrote {}",
            resolution.resolved.len().saturating_sub(1),
            lock_path.display()
        );
    }
    Ok(())
}
