use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

#[derive(Clone, Debug, Args)]
pub struct ProbeArg {
    pub archive: PathBuf,
}

/// Prints the folder name, or nothing and exit status 2 when there is none.
pub fn run(arg: ProbeArg) -> anyhow::Result<()> {
    let root = bale_archive::outermost_folder_name(&arg.archive)
        .with_context(|| format!("failed to read '{}'", arg.archive.display()))?;

    match root {
        Some(name) => {
            println!("{name}");
            Ok(())
        }
        None => {
            tracing::info!(archive = %arg.archive.display(), "no single top-level folder");
            std::process::exit(2);
        }
    }
}
