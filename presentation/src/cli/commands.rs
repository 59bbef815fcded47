//! CLI command definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use onboard_domain::ToolStatus;
use std::path::PathBuf;

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable, colored when the terminal supports it
    Text,
    /// Pretty-printed JSON
    Json,
}

/// CLI arguments for tool-onboard
#[derive(Parser, Debug)]
#[command(name = "tool-onboard")]
#[command(author, version, about = "Onboard external tool services through validation, deployment and discovery")]
#[command(long_about = r#"
tool-onboard drives user-submitted tool integrations through their lifecycle:

  SUBMITTED -> VALIDATING_SOURCE -> DEPLOYING -> DISCOVERING_OPERATIONS -> APPROVED

Any automatic step may fail the record; failed records can be resubmitted and
resume at the step that failed. Records routed to MANUAL_REVIEW wait for an
administrator to approve or reject them.

Configuration files are loaded from (in priority order):
1. ONBOARD_* environment variables (e.g. ONBOARD_GATEWAY__ENDPOINT)
2. --config <path>           Explicit config file
3. ./onboard.toml            Project-level config
4. ~/.config/tool-onboard/config.toml   Global config

Example:
  tool-onboard submit --owner alice --source-url https://git.example.com/acme/tool --spec @deploy.json
  tool-onboard status 7f1c...
  tool-onboard approve 7f1c...
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text", global = true)]
    pub output: OutputFormat,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Directory for daily rotated log files
    #[arg(long, value_name = "DIR", global = true)]
    pub log_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Submit a new tool and drive it as far as it goes
    Submit(SubmitArgs),

    /// Show one record
    Status {
        /// Record id
        id: String,
    },

    /// List records, optionally filtered by status
    List {
        /// Only show records in this status (e.g. FAILED, manual-review)
        #[arg(long, value_name = "STATUS")]
        status: Option<ToolStatus>,
    },

    /// Approve a record waiting in MANUAL_REVIEW
    Approve {
        /// Record id
        id: String,
    },

    /// Reject a record waiting in MANUAL_REVIEW
    Reject {
        /// Record id
        id: String,

        /// Reason stored on the failed record
        #[arg(long)]
        reason: Option<String>,
    },

    /// Force a record into any status, bypassing the lifecycle graph
    Force {
        /// Record id
        id: String,

        /// Target status
        status: ToolStatus,

        /// Reason recorded with the override
        #[arg(long, default_value = "")]
        reason: String,
    },

    /// Resume a FAILED record at the step that failed
    Resubmit {
        /// Record id
        id: String,
    },

    /// Resume every record left in an automatic state and drain the queue
    Run,

    /// Show configuration sources and validation results
    Config,
}

#[derive(Args, Debug)]
pub struct SubmitArgs {
    /// Submitting user
    #[arg(long)]
    pub owner: String,

    /// Source repository reference to validate
    #[arg(long, value_name = "URL")]
    pub source_url: String,

    /// Deployment spec as inline JSON, or @path to read it from a file
    #[arg(long, value_name = "JSON|@FILE", default_value = "{}")]
    pub spec: String,

    /// Explicit record id (generated when omitted)
    #[arg(long)]
    pub id: Option<String>,

    /// Route the record to manual review instead of the automatic pipeline
    #[arg(long)]
    pub review: bool,
}

impl SubmitArgs {
    /// The `--spec` value: a file path when prefixed with `@`.
    pub fn spec_source(&self) -> SpecSource<'_> {
        match self.spec.strip_prefix('@') {
            Some(path) => SpecSource::File(PathBuf::from(path)),
            None => SpecSource::Inline(&self.spec),
        }
    }
}

/// Where the deployment spec comes from
#[derive(Debug, PartialEq, Eq)]
pub enum SpecSource<'a> {
    Inline(&'a str),
    File(PathBuf),
}
