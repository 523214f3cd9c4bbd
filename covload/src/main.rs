//! Command-line loader for the CovGraph case and lineage graph

use clap::Parser;
use covgraph_adapter_in_memory::InMemoryStore;
use covgraph_adapter_neo4j::Neo4jStore;
use covgraph_core::prelude::*;
use std::process;
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod output;

use cli::*;
use config::{check_file, LoaderConfig};

#[tokio::main]
async fn main() {
    let args = Cli::parse();

    // Initialize logging, RUST_LOG wins over -v
    let log_level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_str().to_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match run(&args).await {
        Ok(summary) => {
            info!("Load completed in {}ms", summary.elapsed().num_milliseconds());
            if !args.quiet {
                if let Err(e) = output::display_summary(&summary, args.format) {
                    error!("Failed to display summary: {}", e);
                    process::exit(1);
                }
            }
        }
        Err(e) => {
            error!("Load failed: {}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

async fn run(args: &Cli) -> Result<LoadSummary, CoreError> {
    let config_file = check_file(&args.config_file, false)?;
    let loaded = LoaderConfig::load(&config_file)?;
    for key in &loaded.missing_keys {
        warn!(
            "Expected {} in config file {} but could not find such a key",
            key,
            config_file.display()
        );
    }
    let config = loaded.config.with_overrides(args);

    let sources = config.sources()?;
    let log_file = check_file(&config.graph_load_log_file, true)?;
    info!("Validated log file as {}", log_file.display());
    let mut audit = AuditLog::create(&log_file)?;

    info!("Loading into {} backend", config.graph_backend);
    let store: Box<dyn GraphStore> = match config.graph_backend {
        Backend::Neo4j => Box::new(Neo4jStore::new(config.neo4j_config()).await?),
        Backend::Memory => Box::new(InMemoryStore::new()),
    };

    load_graph(store.as_ref(), &sources, &mut audit).await
}
