//! # GW-BASIC
//!
//! Runs the interpreter in a terminal. Set `RUST_LOG` to see what it is
//! doing.

use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
    basic::term::main();
}
