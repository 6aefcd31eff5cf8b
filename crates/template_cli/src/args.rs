//! Command-line argument definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Validate template configurations and run documents through the template pipeline
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub action: Action,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Build the registry and report what a configuration defines
    Check {
        /// Template configuration (JSON)
        config: PathBuf,
    },

    /// List the element descriptors of a configuration
    List {
        config: PathBuf,

        /// Only list descriptors of this type
        #[arg(short = 't', long = "type")]
        element_type: Option<String>,
    },

    /// Load a document, repair its templates and write it back out
    Normalize {
        config: PathBuf,

        /// Document markup to load
        input: PathBuf,

        /// Write here instead of standard output
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Emit the editing view instead of the data
        #[arg(long)]
        editing: bool,
    },

    /// Append a fresh template instance to a document
    Insert {
        config: PathBuf,

        /// Name of the template to insert
        template: String,

        /// Document to insert into; an empty document when omitted
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}
