//! # Configuration Management
//!
//! Parsing and validation of the transfer configuration file.
//!
//! The on-disk format is part of the external interface shared with other
//! tooling: a plain text file with `ip:port` on the first line, the client
//! name on the second, and the path of the file to transfer on the third.
//!
//! ## Configuration Sources
//! - the conventional `transfer.info` in the working directory
//! - any explicit path via `from_file()`

use std::fs;
use std::path::{Path, PathBuf};

use crate::core::wire::NAME_SIZE;
use crate::error::{ProtocolError, Result};

/// Conventional config file name, looked up in the working directory.
pub const TRANSFER_INFO: &str = "transfer.info";

/// Upper bound on the client name read from the config file.
const MAX_CLIENT_NAME: usize = 100;

/// Parsed transfer configuration.
#[derive(Debug, Clone)]
pub struct TransferConfig {
    /// Server IPv4 address or the literal `localhost`.
    pub address: String,
    /// Server port, 1-65535.
    pub port: u16,
    /// Display name used for registration and reconnection.
    pub client_name: String,
    /// Path of the file to transfer.
    pub file_path: PathBuf,
}

impl TransferConfig {
    /// Load and parse a config file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(&path).map_err(|e| {
            ProtocolError::Config(format!(
                "couldn't read {}: {e}",
                path.as_ref().display()
            ))
        })?;
        Self::from_str_contents(&contents)
    }

    /// Parse config file contents.
    pub fn from_str_contents(contents: &str) -> Result<Self> {
        let mut lines = contents.lines();
        let endpoint = lines
            .next()
            .ok_or_else(|| ProtocolError::Config("missing ip:port line".into()))?
            .trim();
        let client_name = lines
            .next()
            .ok_or_else(|| ProtocolError::Config("missing client name line".into()))?
            .trim()
            .to_string();
        let file_path = lines
            .next()
            .ok_or_else(|| ProtocolError::Config("missing file path line".into()))?
            .trim();

        let (address, port_str) = endpoint
            .split_once(':')
            .ok_or_else(|| ProtocolError::Config("first line needs ip:port, separator ':' missing".into()))?;
        let port: u16 = port_str
            .parse()
            .map_err(|_| ProtocolError::Config(format!("bad port number {port_str:?}")))?;
        if port == 0 {
            return Err(ProtocolError::Config("port must be in 1-65535".into()));
        }

        if client_name.is_empty() || client_name.len() > MAX_CLIENT_NAME {
            return Err(ProtocolError::Config(format!(
                "client name must be 1-{MAX_CLIENT_NAME} characters, got {}",
                client_name.len()
            )));
        }
        if file_path.is_empty() || file_path.len() >= NAME_SIZE {
            return Err(ProtocolError::Config(format!(
                "file path must be 1-{} characters, got {}",
                NAME_SIZE - 1,
                file_path.len()
            )));
        }

        Ok(TransferConfig {
            address: address.trim().to_string(),
            port,
            client_name,
            file_path: PathBuf::from(file_path),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_three_line_format() {
        let config =
            TransferConfig::from_str_contents("127.0.0.1:1234\nalice\n/tmp/report.txt\n").unwrap();
        assert_eq!(config.address, "127.0.0.1");
        assert_eq!(config.port, 1234);
        assert_eq!(config.client_name, "alice");
        assert_eq!(config.file_path, PathBuf::from("/tmp/report.txt"));
    }

    #[test]
    fn rejects_missing_lines_and_bad_endpoint() {
        assert!(TransferConfig::from_str_contents("").is_err());
        assert!(TransferConfig::from_str_contents("127.0.0.1:1234\nalice").is_err());
        assert!(TransferConfig::from_str_contents("127.0.0.1\nalice\nf.txt").is_err());
        assert!(TransferConfig::from_str_contents("127.0.0.1:0\nalice\nf.txt").is_err());
        assert!(TransferConfig::from_str_contents("127.0.0.1:notaport\nalice\nf.txt").is_err());
    }

    #[test]
    fn rejects_oversized_name_and_path() {
        let long_name = format!("127.0.0.1:1234\n{}\nf.txt", "x".repeat(101));
        assert!(TransferConfig::from_str_contents(&long_name).is_err());

        let long_path = format!("127.0.0.1:1234\nalice\n{}", "p".repeat(NAME_SIZE));
        assert!(TransferConfig::from_str_contents(&long_path).is_err());
    }
}
