//! tracing-subscriber setup. Logs go to stderr; stdout carries results.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Level picked from `-v` / `-q` when `RUST_LOG` is unset.
pub const fn level(verbose: u8, quiet: bool) -> Level {
    if quiet {
        return Level::ERROR;
    }
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    }
}

/// Install the global subscriber. A second call is a no-op.
pub fn init(verbose: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = level(verbose, quiet);
        EnvFilter::new(format!("keymesh_ca={level},keymesh_cli={level}"))
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
