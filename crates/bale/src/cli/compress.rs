use std::path::PathBuf;

use anyhow::{Context, bail};
use bale_archive::{CompressOptions, Filter, Format};
use clap::Args;

#[derive(Clone, Debug, Args)]
pub struct CompressArg {
    /// Files or folders to archive
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Output archive; derived from the input name when a single path is given
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Container format: zip, 7z or tar
    #[arg(short, long, default_value_t = Format::Tar)]
    pub format: Format,

    /// Compression filter: none, deflate, gzip or zstd
    #[arg(short = 'c', long, default_value_t = Filter::Gzip)]
    pub filter: Filter,

    /// Keep a folder's own name as the top-level entry
    #[arg(long)]
    pub include_root: bool,

    /// Encrypt zip entries with AES-256
    #[arg(short, long)]
    pub password: Option<String>,

    /// Worker threads for zstd-filtered tar output
    #[arg(long, value_name = "N")]
    pub threads: Option<u32>,
}

impl CompressArg {
    fn options(&self) -> CompressOptions {
        let mut options = CompressOptions::new(self.format, self.filter)
            .include_root_dir(self.include_root);
        if let Some(password) = &self.password {
            options = options.password(password.as_str());
        }
        if let Some(output) = &self.output {
            options = options.out_name(output);
        }
        if let Some(threads) = self.threads {
            options = options.zstd_workers(threads);
        }
        options
    }
}

pub fn run(arg: CompressArg) -> anyhow::Result<()> {
    let options = arg.options();

    let report = match arg.paths.as_slice() {
        [path] => bale_archive::compress(path, &options)
            .with_context(|| format!("failed to compress '{}'", path.display()))?,
        paths => {
            let Some(output) = &arg.output else {
                bail!("--output is required when compressing more than one path");
            };
            bale_archive::compress_paths(paths, output, &options)
                .with_context(|| format!("failed to write '{}'", output.display()))?
        }
    };

    println!(
        "{} ({} entries, {} bytes)",
        report.archive.display(),
        report.entry_count,
        report.total_bytes
    );
    Ok(())
}
