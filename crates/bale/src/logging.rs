//! Subscriber setup for the command-line front end.
//!
//! `RUST_LOG` takes precedence; otherwise `-v` selects debug and `-vv` trace
//! for both the binary and the library.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub fn init(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        EnvFilter::new(format!("bale={level},bale_archive={level}"))
    });

    let subscriber = tracing_subscriber::registry().with(filter).with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .compact(),
    );

    // Ignore a subscriber installed earlier.
    let _ = tracing::subscriber::set_global_default(subscriber);
}
