//! Command-line transfer client.
//!
//! Reads `transfer.info` from the working directory, runs one transfer, and
//! reports the outcome. Exits normally in every case so batch callers see the
//! result in the log rather than a crash.

use std::process::ExitCode;

use tracing::error;
use tracing_subscriber::EnvFilter;

use transfer_protocol::config::{TransferConfig, TRANSFER_INFO};
use transfer_protocol::service::{client, IdentityStore};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match TransferConfig::from_file(TRANSFER_INFO) {
        Ok(config) => config,
        Err(e) => {
            error!(file = TRANSFER_INFO, error = %e, "invalid transfer description");
            return ExitCode::FAILURE;
        }
    };

    match client::run(&config, &IdentityStore::default()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "transfer failed");
            ExitCode::FAILURE
        }
    }
}
