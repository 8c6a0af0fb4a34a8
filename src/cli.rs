//! Command-line interface parsing for Husky Meal Finder
//!
//! This module handles parsing of CLI arguments using clap and turns the
//! global flags into a [`FetcherConfig`].

use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand};
use thiserror::Error;

use crate::cache::CacheManager;
use crate::menu::{FetcherConfig, LocationError, LocationRegistry, DEFAULT_BASE_URL};
use crate::subscriptions::SubscriptionRecord;

/// Default subscription file, relative to the working directory
pub const DEFAULT_SUBSCRIPTIONS_FILE: &str = "subscriptions.csv";

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The date argument is not a YYYY-MM-DD calendar date
    #[error("Invalid date: '{0}'. Expected YYYY-MM-DD")]
    InvalidDate(String),

    /// A field argument is not of the form column=value
    #[error("Invalid field: '{0}'. Expected column=value")]
    InvalidField(String),

    /// The same column was given more than once
    #[error("Column '{0}' given more than once")]
    DuplicateField(String),
}

/// Husky Meal Finder - dining hall menus and menu subscriptions
#[derive(Parser, Debug)]
#[command(name = "huskymeal")]
#[command(about = "Dining hall menus with an on-disk cache, plus a subscription list")]
#[command(version)]
pub struct Cli {
    /// Directory for cached menu files (defaults to the XDG cache directory)
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Menu API endpoint
    #[arg(long, global = true, value_name = "URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Network timeout for menu requests, in seconds
    #[arg(long, global = true, value_name = "SECS", default_value_t = 15)]
    pub timeout_secs: u64,

    /// JSON file mapping location keys to API ids, replacing the built-in list
    #[arg(long, global = true, value_name = "FILE")]
    pub locations: Option<PathBuf>,

    /// Subscription CSV file
    #[arg(long, global = true, value_name = "FILE", default_value = DEFAULT_SUBSCRIPTIONS_FILE)]
    pub subscriptions: PathBuf,

    /// Increase log output (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the menu for a location as JSON
    ///
    /// Examples:
    ///   huskymeal menu Stwest
    ///   huskymeal menu IV --date 2024-03-07
    Menu {
        /// Location key, e.g. Stwest, Steast, IV
        location: String,

        /// Menu date (defaults to today)
        #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
    },

    /// List known dining locations
    Locations,

    /// Manage the subscription list
    #[command(subcommand)]
    Subscriptions(SubscriptionCommand),
}

#[derive(Subcommand, Debug)]
pub enum SubscriptionCommand {
    /// Print all subscriptions as CSV
    List,

    /// Add a subscription and save the file
    ///
    /// Example:
    ///   huskymeal subscriptions add name=Alice email=a@x.com
    Add {
        /// Values as column=value, one per header column
        #[arg(required = true, value_name = "COLUMN=VALUE", value_parser = parse_field_arg)]
        fields: Vec<(String, String)>,
    },

    /// Remove every subscription whose column equals value, then save
    Remove {
        column: String,
        value: String,
    },

    /// Create a new subscription file with the given columns
    Init {
        #[arg(required = true, value_name = "COLUMN")]
        columns: Vec<String>,
    },
}

/// Parses a YYYY-MM-DD date argument
pub fn parse_date_arg(s: &str) -> Result<NaiveDate, CliError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| CliError::InvalidDate(s.to_string()))
}

/// Parses a `column=value` argument; the value may itself contain `=`
pub fn parse_field_arg(s: &str) -> Result<(String, String), CliError> {
    match s.split_once('=') {
        Some((column, value)) if !column.is_empty() => {
            Ok((column.to_string(), value.to_string()))
        }
        _ => Err(CliError::InvalidField(s.to_string())),
    }
}

/// Builds a subscription record from parsed `column=value` arguments
pub fn subscription_record(fields: &[(String, String)]) -> Result<SubscriptionRecord, CliError> {
    let mut record = SubscriptionRecord::new();
    for (column, value) in fields {
        if record.get(column).is_some() {
            return Err(CliError::DuplicateField(column.clone()));
        }
        record.insert(column.as_str(), value.as_str());
    }
    Ok(record)
}

impl Cli {
    /// Builds the fetcher configuration from the global flags
    pub fn fetcher_config(&self) -> Result<FetcherConfig, LocationError> {
        let registry = match &self.locations {
            Some(path) => LocationRegistry::from_file(path)?,
            None => LocationRegistry::default(),
        };
        let cache_dir = self
            .cache_dir
            .clone()
            .unwrap_or_else(CacheManager::default_dir_or_fallback);

        Ok(FetcherConfig::default()
            .with_base_url(self.base_url.clone())
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_cache_dir(cache_dir)
            .with_registry(registry))
    }

    /// Default log filter for the chosen verbosity
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_arg_valid() {
        assert_eq!(
            parse_date_arg("2024-03-07").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 7).unwrap()
        );
    }

    #[test]
    fn test_parse_date_arg_invalid() {
        let result = parse_date_arg("03/07/2024");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Invalid date"));
        assert!(parse_date_arg("2024-02-30").is_err());
    }

    #[test]
    fn test_parse_field_arg() {
        assert_eq!(
            parse_field_arg("email=a@x.com").unwrap(),
            ("email".to_string(), "a@x.com".to_string())
        );
        assert_eq!(
            parse_field_arg("note=a=b").unwrap(),
            ("note".to_string(), "a=b".to_string())
        );
        assert_eq!(
            parse_field_arg("food=").unwrap(),
            ("food".to_string(), String::new())
        );
    }

    #[test]
    fn test_parse_field_arg_invalid() {
        assert!(parse_field_arg("no-equals").is_err());
        assert!(parse_field_arg("=value").is_err());
    }

    #[test]
    fn test_subscription_record_keeps_argument_order() {
        let fields = vec![
            ("email".to_string(), "a@x.com".to_string()),
            ("name".to_string(), "Alice".to_string()),
        ];
        let record = subscription_record(&fields).unwrap();
        assert_eq!(record.columns().collect::<Vec<_>>(), vec!["email", "name"]);
        assert_eq!(record.get("name"), Some("Alice"));
    }

    #[test]
    fn test_subscription_record_rejects_repeated_column() {
        let fields = vec![
            ("name".to_string(), "A".to_string()),
            ("name".to_string(), "B".to_string()),
        ];
        let err = subscription_record(&fields).unwrap_err();
        assert!(matches!(err, CliError::DuplicateField(ref c) if c == "name"));
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_cli_parse_menu_defaults() {
        let cli = Cli::parse_from(["huskymeal", "menu", "Stwest"]);
        match cli.command {
            Command::Menu { location, date } => {
                assert_eq!(location, "Stwest");
                assert!(date.is_none());
            }
            other => panic!("Unexpected command: {:?}", other),
        }
        assert_eq!(cli.timeout_secs, 15);
        assert_eq!(cli.base_url, DEFAULT_BASE_URL);
        assert_eq!(cli.subscriptions, PathBuf::from(DEFAULT_SUBSCRIPTIONS_FILE));
    }

    #[test]
    fn test_cli_parse_menu_with_date() {
        let cli = Cli::parse_from(["huskymeal", "menu", "IV", "--date", "2024-03-07"]);
        match cli.command {
            Command::Menu { date, .. } => {
                assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 7));
            }
            other => panic!("Unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_parse_subscriptions_add() {
        let cli = Cli::parse_from([
            "huskymeal",
            "subscriptions",
            "add",
            "name=Alice",
            "email=a@x.com",
        ]);
        match cli.command {
            Command::Subscriptions(SubscriptionCommand::Add { fields }) => {
                assert_eq!(fields.len(), 2);
                assert_eq!(fields[0], ("name".to_string(), "Alice".to_string()));
            }
            other => panic!("Unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_rejects_bad_field() {
        let result = Cli::try_parse_from(["huskymeal", "subscriptions", "add", "oops"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_log_level_from_verbosity() {
        let quiet = Cli::parse_from(["huskymeal", "locations"]);
        assert_eq!(quiet.log_level(), "warn");
        let chatty = Cli::parse_from(["huskymeal", "-vv", "locations"]);
        assert_eq!(chatty.log_level(), "debug");
    }

    #[test]
    fn test_fetcher_config_from_flags() {
        let cli = Cli::parse_from([
            "huskymeal",
            "--cache-dir",
            "/tmp/menus",
            "--timeout-secs",
            "3",
            "locations",
        ]);
        let config = cli.fetcher_config().unwrap();

        assert_eq!(config.cache_dir, PathBuf::from("/tmp/menus"));
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.registry.len(), 3);
    }

    #[test]
    fn test_fetcher_config_missing_locations_file() {
        let cli = Cli::parse_from([
            "huskymeal",
            "--locations",
            "/nonexistent/locations.json",
            "locations",
        ]);
        assert!(cli.fetcher_config().is_err());
    }
}
