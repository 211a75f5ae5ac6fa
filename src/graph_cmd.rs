//! `rove graph` — print the selected module graph.

use anyhow::Result;

use crate::resolve_cmd;
use crate::Cli;

pub fn run(cli: &Cli) -> Result<()> {
    let (resolution, _) = resolve_cmd::resolution(cli)?;

    for (name, module) in &resolution.resolved.modules {
        if *name == resolution.resolved.root {
            println!("{} (root)", module.key);
        } else {
            println!("{}", module.key);
        }
        for dep in &module.deps {
            let selected = resolution
                .resolved
                .selected(&dep.name)
                .map_or_else(|| "?".to_owned(), ToString::to_string);
            if dep.apparent.as_str() == dep.name.as_str() {
                println!("  -> {selected}");
            } else {
                println!("  -> {selected} (as @{})", dep.apparent);
            }
        }
    }
    Ok(())
}
