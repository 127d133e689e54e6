use clap::{Parser, Subcommand};
use std::path::PathBuf;

use dr_core::Feature;

#[derive(Parser)]
#[command(name = "demoreel")]
#[command(author, version, about = "Assemble feature demo videos from rendered banners")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render, encode and join a demo video
    Generate {
        /// Feature to showcase, as NAME=VALUE (repeatable, keeps order)
        #[arg(short, long = "feature", value_name = "NAME=VALUE")]
        features: Vec<Feature>,

        /// Seconds each feature stays on screen
        #[arg(short, long)]
        duration: Option<f64>,

        /// Overlay a library track or a synthesized tone
        #[arg(long)]
        music: bool,

        /// Re-encode the final video to shrink it
        #[arg(long)]
        compress: bool,

        /// Constant rate factor used with --compress (0-51)
        #[arg(long)]
        crf: Option<u8>,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Delete stale scratch files
    Purge {
        /// Retention in hours (defaults to the configured value)
        #[arg(long)]
        hours: Option<u64>,
    },

    /// List the features a run would render
    Features,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Run the health monitor for a while and report what it saw
    Monitor {
        /// How long to run
        #[arg(long, default_value = "10")]
        seconds: u64,
    },

    /// Display version information
    Version,
}
