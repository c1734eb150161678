//! Command line arguments and configuration file loading.

use clap::{Parser, Subcommand};
use setto_types::config::SettoConfig;
use std::fs;
use std::path::{Path, PathBuf};

/// CLI arguments for the Setto terminal host.
#[derive(Parser, Debug)]
#[command(name = "setto-cli")]
#[command(about = "Pay with the Setto hosted wallet from a terminal")]
pub struct CliArgs {
    /// Path to the JSON configuration file
    #[arg(long, short, env = "CONFIG", default_value = "setto.json")]
    pub config: PathBuf,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Open a payment, then read callback URIs from stdin until it resolves
    Pay {
        /// Decimal amount, e.g. 12.50
        #[arg(long)]
        amount: String,
        #[arg(long)]
        order_id: Option<String>,
        /// Identity-provider token for this payment; overrides the configured one
        #[arg(long, env = "SETTO_IDP_TOKEN")]
        idp_token: Option<String>,
    },
    /// Deliver a callback URI to a fresh process and print the recovered result
    Callback { uri: String },
    /// Print the server-side state of a payment
    Status { payment_id: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {0}: {1}")]
    FileRead(PathBuf, std::io::Error),
    #[error("Failed to parse config file: {0}")]
    JsonParse(#[from] serde_json::Error),
}

/// Reads a [`SettoConfig`] from a JSON file. `$VAR` values are resolved from the environment.
pub fn load(path: &Path) -> Result<SettoConfig, ConfigError> {
    let content =
        fs::read_to_string(path).map_err(|e| ConfigError::FileRead(path.to_path_buf(), e))?;
    let config = serde_json::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use setto_types::config::Environment;

    #[test]
    fn test_parse_pay_command() {
        let args = CliArgs::try_parse_from([
            "setto-cli",
            "--config",
            "shop.json",
            "pay",
            "--amount",
            "12.50",
            "--order-id",
            "O-1",
        ])
        .unwrap();
        assert_eq!(args.config, PathBuf::from("shop.json"));
        match args.command {
            Command::Pay {
                amount, order_id, ..
            } => {
                assert_eq!(amount, "12.50");
                assert_eq!(order_id.as_deref(), Some("O-1"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_callback_command() {
        let args =
            CliArgs::try_parse_from(["setto-cli", "callback", "setto-shop://callback?status=success"])
                .unwrap();
        assert_eq!(
            args.command,
            Command::Callback {
                uri: "setto-shop://callback?status=success".into()
            }
        );
    }

    #[test]
    fn test_pay_requires_amount() {
        assert!(CliArgs::try_parse_from(["setto-cli", "pay"]).is_err());
    }

    #[test]
    fn test_load_config_file() {
        let path = std::env::temp_dir().join(format!("setto-cli-test-{}.json", std::process::id()));
        fs::write(
            &path,
            r#"{"environment":"dev","merchant_id":"shop42","debug":true}"#,
        )
        .unwrap();

        let config = load(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(config.environment, Environment::Dev);
        assert_eq!(config.merchant_id(), "shop42");
        assert!(config.debug);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let err = load(Path::new("/definitely/not/here/setto.json")).unwrap_err();
        assert!(matches!(err, ConfigError::FileRead(..)));
    }
}
