use clap::{ArgAction, Parser, Subcommand};

pub mod compress;
pub mod data;
pub mod decompress;
pub mod probe;

#[derive(Clone, Debug, Parser)]
#[command(name = "bale", version = env!("CARGO_PKG_VERSION"), about, long_about = None, propagate_version = true)]
pub struct App {
    #[command(subcommand)]
    pub cmd: Commands,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    #[command(alias = "c", name = "compress", about = "Create an archive from files and folders")]
    Compress(compress::CompressArg),
    #[command(alias = "x", name = "decompress", about = "Extract an archive")]
    Decompress(decompress::DecompressArg),
    #[command(alias = "p", name = "probe", about = "Print the single top-level folder of an archive")]
    Probe(probe::ProbeArg),

    // Buffer codec
    #[command(name = "pack-data", about = "Compress a file into one zstd frame")]
    PackData(data::DataArg),
    #[command(name = "unpack-data", about = "Decompress a file written by pack-data")]
    UnpackData(data::DataArg),
}
