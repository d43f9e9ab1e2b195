//! Command line surface of the publisher.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tm_api::LabelAction;

#[derive(Parser, Debug)]
#[command(name = "tm-publisher")]
#[command(about = "Publish test execution results to Jira test management")]
#[command(version)]
pub struct Cli {
    /// Settings file (defaults to the platform config directory)
    #[arg(short, long, global = true, env = "TM_SETTINGS")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Probe the server with the configured credentials
    Check,

    /// Post results from a JSON file holding one issue or an array of issues
    Publish {
        /// Results file
        results: PathBuf,
        /// Exit with an error when any step of any issue failed
        #[arg(long)]
        strict: bool,
    },

    /// Add or remove an issue label
    Label {
        /// add or remove
        action: LabelAction,
        /// Issue key
        issue: String,
        /// Label text
        label: String,
    },

    /// List comments of an issue
    Comments {
        /// Issue key
        issue: String,
    },

    /// Remove published comments older than the retention period
    Expire {
        /// Issue key
        issue: String,
        /// Retention in days (defaults to the settings value)
        #[arg(short, long)]
        days: Option<u32>,
    },
}
