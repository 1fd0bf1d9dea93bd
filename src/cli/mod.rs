// Command Line Interface Module
// Console surface replacing the old interactive dashboard

pub mod commands;

use clap::{Parser, Subcommand};
use colored::*;

/// Skywatch - Cloud Telemetry Console
#[derive(Parser)]
#[command(name = "skywatch")]
#[command(author = "Skywatch Team")]
#[command(version = "0.4.0")]
#[command(about = "Cloud telemetry console - poll instance metrics and manage compute resources", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "skywatch.toml", global = true)]
    pub config: String,

    /// Emit logs as JSON instead of human-readable text
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Poll telemetry for an instance until interrupted
    Monitor {
        /// Instance id to monitor
        instance: String,

        /// Region override (defaults to the configured region)
        #[arg(short, long)]
        region: Option<String>,

        /// Refresh interval override in seconds
        #[arg(short, long)]
        interval: Option<u64>,

        /// Emit updates as JSON lines instead of the terminal table
        #[arg(long)]
        json: bool,
    },

    /// Show the configured metric catalog
    Catalog,

    /// List available regions and endpoints
    Regions,

    /// Manage compute instances
    Instances {
        #[command(subcommand)]
        action: InstanceAction,
    },

    /// Manage key pairs
    Keypairs {
        #[command(subcommand)]
        action: KeypairAction,
    },

    /// List security groups in a region
    SecurityGroups {
        #[arg(short, long)]
        region: Option<String>,
    },

    /// Manage object storage buckets
    Buckets {
        #[command(subcommand)]
        action: BucketAction,
    },

    /// Manage objects within a bucket
    Objects {
        #[command(subcommand)]
        action: ObjectAction,
    },

    /// Validate the configuration file
    Validate {
        /// Configuration file to validate
        #[arg(short, long, default_value = "skywatch.toml")]
        file: String,
    },
}

#[derive(Subcommand)]
pub enum InstanceAction {
    /// List instances in a region
    List {
        #[arg(short, long)]
        region: Option<String>,
    },

    /// Start an instance by id or Name tag
    Start {
        identifier: String,

        #[arg(short, long)]
        region: Option<String>,
    },

    /// Stop an instance by id or Name tag
    Stop {
        identifier: String,

        #[arg(short, long)]
        region: Option<String>,
    },

    /// Launch new instances
    Launch {
        /// Name tag for the new instances
        name: String,

        #[arg(short, long)]
        region: Option<String>,

        /// Machine image id
        #[arg(long, default_value = "ami-08eb150f611ca277f")]
        image: String,

        /// Instance type
        #[arg(short = 't', long, default_value = "t3.micro")]
        instance_type: String,

        /// Key pair name
        #[arg(short, long, default_value = "lab-key")]
        key_pair: String,

        /// Security group id
        #[arg(short, long, default_value = "sg-default")]
        security_group: String,

        /// Number of instances to launch
        #[arg(short = 'n', long, default_value = "1")]
        count: usize,
    },
}

#[derive(Subcommand)]
pub enum KeypairAction {
    /// List key pairs in a region
    List {
        #[arg(short, long)]
        region: Option<String>,
    },

    /// Create a key pair and save the private key to <name>.pem
    Create {
        name: String,

        #[arg(short, long)]
        region: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum BucketAction {
    /// List all buckets
    List,

    /// Create a bucket
    Create {
        name: String,

        #[arg(short, long)]
        region: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ObjectAction {
    /// List objects in a bucket
    List { bucket: String },

    /// Upload a local file to a bucket
    Put {
        bucket: String,

        /// Path of the file to upload
        file: String,

        /// Object key (defaults to the file name)
        #[arg(short, long)]
        key: Option<String>,
    },

    /// Delete an object from a bucket
    Delete { bucket: String, key: String },
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red().bold(), msg);
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue().bold(), msg);
}

/// Print a warning message
pub fn warning(msg: &str) {
    println!("{} {}", "⚠".yellow().bold(), msg);
}
