//! CLI argument definitions

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "covload")]
#[command(about = "Load case metadata and lineage assignments into a graph store")]
#[command(version = "0.1.0")]
pub struct Cli {
    /// Path to the config file, see config.json.template
    pub config_file: PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Graph backend, overriding `graph_backend` from the config
    #[arg(short, long, value_enum)]
    pub backend: Option<Backend>,

    /// Summary format
    #[arg(short = 'f', long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Suppress the summary
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Neo4j,
    Memory,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Neo4j => write!(f, "neo4j"),
            Backend::Memory => write!(f, "memory"),
        }
    }
}
