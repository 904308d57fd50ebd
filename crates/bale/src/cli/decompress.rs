use std::path::PathBuf;

use anyhow::Context;
use bale_archive::DecompressOptions;
use clap::Args;

#[derive(Clone, Debug, Args)]
pub struct DecompressArg {
    /// Archive to extract; the format is detected from its contents
    pub archive: PathBuf,

    /// Destination folder, created when missing [default: current folder]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Password for AES-encrypted zip entries
    #[arg(short, long)]
    pub password: Option<String>,
}

pub fn run(arg: DecompressArg) -> anyhow::Result<()> {
    let mut options = DecompressOptions::default();
    if let Some(output) = arg.output {
        options = options.out_dir(output);
    }
    if let Some(password) = arg.password {
        options = options.password(password);
    }

    let report = bale_archive::decompress(&arg.archive, &options)
        .with_context(|| format!("failed to extract '{}'", arg.archive.display()))?;

    println!(
        "{} entries, {} bytes -> {}",
        report.entry_count,
        report.total_bytes,
        options.out_dir_or_current().display()
    );
    Ok(())
}
