//! CLI parse: clap types for FlagForge. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// FlagForge CLI - Manifest-driven flag preprocessing for versioned installs
#[derive(Parser)]
#[command(name = "flagforge")]
#[command(about = "Download, verify, and merge flag-list manifests into versioned installs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Settings file path (overrides the default location)
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Skip remote sources; local manifests and cached content only
    #[arg(long)]
    pub offline: bool,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Merge selected fragments and write the result into every install
    Apply {
        /// Report what would be written without writing
        #[arg(long)]
        dry_run: bool,
    },
    /// List the fragment files the current selections resolve to
    Resolve {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show every selected fragment, parsed, keyed by cache path
    Dump {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// List manifest items, their features, and current selections
    List {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Enable an item
    Enable {
        /// Item name
        item: String,
    },
    /// Disable an item
    Disable {
        /// Item name
        item: String,
    },
    /// Choose option(s) for a feature of an item
    Select {
        /// Item name
        item: String,

        /// Feature name
        feature: String,

        /// Option value(s); omit to choose interactively
        values: Vec<String>,
    },
    /// List discovered install directories
    Installs {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show sources, cache, and install summary
    Status {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}
