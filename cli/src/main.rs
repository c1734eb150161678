//! Terminal host application for Setto wallet payments.
//!
//! Stands in for a mobile or desktop host: the "browser" is the terminal (the wallet URL
//! is printed), and deep links are pasted back on stdin.
//!
//! Commands:
//! - `pay` – Open a payment and wait for its callback URI on stdin
//! - `callback` – Deliver a callback URI to a fresh process (cold start)
//! - `status` – Query the server-side state of a payment
//!
//! Environment:
//! - `.env` values loaded at startup
//! - `CONFIG` points at the JSON configuration file
//! - `RUST_LOG` controls log verbosity (logs go to stderr)

mod config;
mod run;
mod sig_down;
mod telemetry;

use std::process;

use crate::run::run;

#[tokio::main]
async fn main() {
    let result = run().await;
    if let Err(e) = result {
        eprintln!("{e}");
        process::exit(1)
    }
}
