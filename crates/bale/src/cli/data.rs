use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

#[derive(Clone, Debug, Args)]
pub struct DataArg {
    pub input: PathBuf,
    pub output: PathBuf,
}

pub fn pack(arg: DataArg) -> anyhow::Result<()> {
    transform(&arg, bale_archive::compress_data)
}

pub fn unpack(arg: DataArg) -> anyhow::Result<()> {
    transform(&arg, bale_archive::decompress_data)
}

fn transform(
    arg: &DataArg,
    codec: fn(&[u8]) -> bale_archive::Result<Vec<u8>>,
) -> anyhow::Result<()> {
    let input = std::fs::read(&arg.input)
        .with_context(|| format!("failed to read '{}'", arg.input.display()))?;
    let output = codec(&input)
        .with_context(|| format!("failed to process '{}'", arg.input.display()))?;
    std::fs::write(&arg.output, &output)
        .with_context(|| format!("failed to write '{}'", arg.output.display()))?;

    tracing::info!(input = input.len(), output = output.len(), "done");
    Ok(())
}
