//! Command-line interface definitions for scrollspy

use clap::{Parser, Subcommand};
use scrollspy::observer::TieBreak;
use std::path::PathBuf;

/// CLI structure for the scrollspy application
#[derive(Parser)]
#[command(name = "scrollspy")]
#[command(version)]
#[command(about = "Scroll-spy navigation for long single-page articles", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for scrollspy
#[derive(Subcommand)]
pub enum Commands {
    /// Write a starter page.toml from a built-in template
    Init {
        /// Directory to initialize (defaults to current directory)
        path: Option<PathBuf>,

        /// Template identifier or alias (e.g., article, minimal-v1)
        #[arg(long, default_value = "article")]
        template: String,

        /// Page title
        #[arg(short, long)]
        title: Option<String>,

        /// Overwrite an existing page.toml
        #[arg(short, long)]
        force: bool,
    },

    /// List available page templates
    ListTemplates,

    /// Check a page configuration
    Validate {
        /// Page directory or page.toml file (defaults to current directory)
        #[arg(value_name = "PATH", default_value = ".")]
        input: PathBuf,

        /// Show detailed validation results
        #[arg(short, long)]
        verbose: bool,
    },

    /// Export the page's navigation shell to a static HTML file
    Render {
        /// Page directory or page.toml file (defaults to current directory)
        #[arg(value_name = "PATH", default_value = ".")]
        input: PathBuf,

        /// Output HTML file
        #[arg(short, long, default_value = "index.html")]
        output: PathBuf,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Replay scroll and click steps against an in-memory page
    Simulate {
        /// Page directory or page.toml file
        #[arg(value_name = "PATH", default_value = ".")]
        input: PathBuf,

        /// Steps: scroll:<y>, click:<id>, popover:<id>, cta, settle
        #[arg(value_name = "STEP", last = true)]
        steps: Vec<String>,

        /// Viewport height in pixels
        #[arg(long, default_value_t = 800.0)]
        viewport_height: f64,

        /// Height of every section in pixels
        #[arg(long, default_value_t = 1200.0)]
        section_height: f64,

        /// Override the page's tie-break policy
        #[arg(long, value_enum)]
        tie_break: Option<TieBreak>,

        /// Declared section that is not rendered (repeatable)
        #[arg(long = "missing", value_name = "ID")]
        missing: Vec<String>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}
