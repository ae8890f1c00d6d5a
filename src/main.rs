//! tidyset CLI - data quality checks, cleaning and versioning
//!
//! Thin wrapper around [`tidyset::cli::run`].

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use std::process::ExitCode;

fn main() -> ExitCode {
    tidyset::cli::run()
}
