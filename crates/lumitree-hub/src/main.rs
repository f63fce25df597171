mod demo_seed;
mod outline;

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use lumitree_core::{NodeId, build_tree, flatten};
use lumitree_store::{db, model};

#[derive(Parser, Debug)]
#[command(name = "lumitree")]
#[command(about = "Organize light strings, switches and folders into a hierarchy")]
struct Args {
    /// Path to the database (defaults to the user data directory)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Insert the demo hierarchy into an empty database
    Seed,
    /// Print the hierarchy
    Show {
        /// Expand every folder instead of only the expanded ones
        #[arg(long)]
        all: bool,
    },
    /// Move a node to a structural path, e.g. `move 7 1 0`
    Move {
        id: NodeId,
        #[arg(required = true)]
        path: Vec<usize>,
    },
    /// Mark a folder expanded
    Expand { id: NodeId },
    /// Mark a folder collapsed
    Collapse { id: NodeId },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Respects RUST_LOG, defaults to info (or debug with --verbose)
    let default_filter = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let conn = match &args.db {
        Some(path) => db::open_db_at(path)?,
        None => db::open_db()?,
    };
    model::init_db(&conn)?;

    match args.command {
        Command::Seed => {
            if demo_seed::seed_demo_data(&conn)? {
                info!("Seeded demo hierarchy");
            } else {
                info!("Database not empty, nothing seeded");
            }
        }
        Command::Show { all } => {
            let records = model::list_records(&conn)?;
            let tree = build_tree(&records);
            let expanded: HashSet<NodeId> = if all {
                records
                    .iter()
                    .filter(|r| r.kind.is_container())
                    .map(|r| r.id)
                    .collect()
            } else {
                model::expanded_ids(&conn)?
            };
            for line in outline::render_outline(&records, &flatten(&tree, &expanded)) {
                println!("{line}");
            }
        }
        Command::Move { id, path } => {
            let patches = model::move_record(&conn, id, &path)?;
            println!("{}", serde_json::to_string_pretty(&patches)?);
        }
        Command::Expand { id } => model::set_expanded(&conn, id, true)?,
        Command::Collapse { id } => model::set_expanded(&conn, id, false)?,
    }

    Ok(())
}
