//! CLI entry point for the grafito graph store.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

use grafito_core::{Direction, NodeId, StoreConfig};
use grafito_store::GraphDb;

use grafito_cli::commands;

#[derive(Parser)]
#[command(name = "grafito")]
#[command(about = "Inspect and maintain a grafito property-graph store")]
struct Cli {
    /// Store file to open (overrides store.path from config).
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Config file prefix (default: grafito).
    #[arg(short, long, global = true, default_value = "grafito")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the store file if needed and apply the schema.
    Init,
    /// Print node, edge, and graph-property counts.
    Stats,
    /// Print every node with the given label, one JSON object per line.
    Nodes {
        #[arg(short, long)]
        label: String,
    },
    /// Print every edge with the given label, one JSON object per line.
    Edges {
        #[arg(short, long)]
        label: String,
    },
    /// Print the edges incident to a node.
    Neighbors {
        id: i64,

        /// outgoing, incoming, or both.
        #[arg(short, long, default_value = "both")]
        direction: Direction,
    },
    /// Print graph-level properties as a JSON object.
    GraphProps,
    /// Set a graph-level property from JSON text.
    SetGraphProp { key: String, json: String },
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();
    let mut store_config = StoreConfig::load(&cli.config)?;
    if let Some(path) = cli.db {
        store_config.path = path;
    }

    let db = GraphDb::open_with(&store_config)?;

    match cli.command {
        Command::Init => {
            tracing::info!(path = %store_config.path.display(), "Store initialized");
        }
        Command::Stats => print_json(&commands::stats(&db)?)?,
        Command::Nodes { label } => print_lines(&commands::nodes(&db, &label)?)?,
        Command::Edges { label } => print_lines(&commands::edges(&db, &label)?)?,
        Command::Neighbors { id, direction } => {
            print_lines(&commands::neighbors(&db, NodeId(id), direction)?)?
        }
        Command::GraphProps => print_json(&commands::graph_props(&db)?)?,
        Command::SetGraphProp { key, json } => {
            commands::set_graph_prop(&db, &key, &json)?;
        }
    }

    db.close()?;
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_lines<T: Serialize>(items: &[T]) -> anyhow::Result<()> {
    for item in items {
        println!("{}", serde_json::to_string(item)?);
    }
    Ok(())
}
