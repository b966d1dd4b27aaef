//! CLI command definitions for support-config
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod export;
pub mod import;

use clap::{Args, Parser, Subcommand, ValueEnum};
use export::ExportArgs;
use import::ImportArgs;
use serde_json::Value;
use std::path::PathBuf;

/// Output format for printed documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn render(&self, value: &Value) -> anyhow::Result<String> {
        Ok(match self {
            OutputFormat::Json => serde_json::to_string_pretty(value)?,
            OutputFormat::Yaml => serde_yaml::to_string(value)?,
        })
    }
}

/// Administration tool for the support app configuration
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to settings file
    #[arg(short, long, global = true)]
    pub settings: Option<String>,

    /// Path to database file (overrides settings)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the whole configuration document
    Show {
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// Print the value at a dotted path, e.g. `emotional.timeouts.waitTime`
    Get { path: String },

    /// Set the value at a dotted path
    Set(SetArgs),

    /// Merge a JSON object into one category
    Category {
        /// One of: user, communication, emotional, food, schedule, system
        name: String,
        /// JSON object with the keys to change
        json: String,
    },

    /// Restore the default configuration
    Reset,

    /// Export the configuration with a checksum
    Export(ExportArgs),

    /// Import a configuration export
    Import(ImportArgs),

    /// List stored keys
    Keys,

    /// Show storage usage
    Info,

    /// Dump every stored key to a backup file
    Backup {
        /// Output file path (default: stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Restore a backup written by `backup`
    Restore {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

/// Arguments for the set subcommand
#[derive(Args, Debug)]
pub struct SetArgs {
    pub path: String,

    /// New value. Parsed as JSON when possible, otherwise taken as a string.
    pub value: String,

    /// Always treat the value as a string
    #[arg(long)]
    pub raw: bool,
}

impl SetArgs {
    pub fn parsed_value(&self) -> Value {
        if self.raw {
            return Value::String(self.value.clone());
        }
        serde_json::from_str(&self.value).unwrap_or_else(|_| Value::String(self.value.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_value_parsing() {
        let parse = |value: &str, raw: bool| {
            SetArgs {
                path: "p".into(),
                value: value.into(),
                raw,
            }
            .parsed_value()
        };
        assert_eq!(parse("42", false), json!(42));
        assert_eq!(parse("true", false), json!(true));
        assert_eq!(parse("Ana", false), json!("Ana"));
        assert_eq!(parse("42", true), json!("42"));
        assert_eq!(parse(r#"{"a":1}"#, false), json!({"a": 1}));
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::parse_from(["support-config", "set", "user.name", "Ana"]);
        assert!(matches!(cli.command, Command::Set(ref a) if a.path == "user.name"));

        let cli = Cli::parse_from(["support-config", "-v", "show", "--format", "yaml"]);
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Command::Show {
                format: OutputFormat::Yaml
            }
        ));
    }

    #[test]
    fn test_render_formats() {
        let value = json!({"a": 1});
        assert!(OutputFormat::Json.render(&value).unwrap().contains("\"a\": 1"));
        assert_eq!(OutputFormat::Yaml.render(&value).unwrap(), "a: 1\n");
    }
}
