use clap::Parser;

mod cli;
mod logging;

use cli::{App, Commands};

fn main() {
    let app = App::parse();
    logging::init(app.verbose);

    let result = match app.cmd {
        Commands::Compress(arg) => cli::compress::run(arg),
        Commands::Decompress(arg) => cli::decompress::run(arg),
        Commands::Probe(arg) => cli::probe::run(arg),
        Commands::PackData(arg) => cli::data::pack(arg),
        Commands::UnpackData(arg) => cli::data::unpack(arg),
    };

    if let Err(e) = result {
        tracing::debug!("command failed: {e:?}");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
