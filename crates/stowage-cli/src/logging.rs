//! Tracing subscriber setup for the binary.

use tracing_subscriber::EnvFilter;

/// Default filter for a `-v` count.
pub const fn default_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber. Logs go to stderr; `RUST_LOG` wins over
/// the verbosity flag when set.
pub fn init(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
