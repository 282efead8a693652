//! Bookshelf CLI - wishlist and library from the command line
//!
//! Works offline against the local cache and syncs with the server when it
//! is reachable.

mod cli;
mod commands;
mod error;

use clap::Parser;
use tracing_subscriber::filter::Directive;

use crate::cli::{Cli, Commands};
use crate::commands::add::{run_add, AddArgs};
use crate::commands::books::run_books;
use crate::commands::common::{load_config, App};
use crate::commands::completions::run_completions;
use crate::commands::delete::run_delete;
use crate::commands::list::run_list;
use crate::commands::lookup::run_lookup;
use crate::commands::pending::run_pending;
use crate::commands::purchase::run_purchase;
use crate::commands::sync::run_sync;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "bookshelf=info".parse::<Directive>() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Commands::Completions { shell, output } = &cli.command {
        return run_completions(*shell, output.as_deref());
    }

    let config = load_config(cli.api_url.as_deref(), cli.db_path)?;
    let app = App::open(config).await?;

    match cli.command {
        Commands::Add {
            title,
            author,
            isbn,
            notes,
            price,
            lookup,
        } => {
            let args = AddArgs {
                title,
                author,
                isbn,
                notes,
                price,
                lookup,
            };
            run_add(args, &app).await
        }
        Commands::List { query, order, json } => {
            run_list(query.as_deref(), order.into(), json, &app)
        }
        Commands::Pending { json } => run_pending(json, &app).await,
        Commands::Delete { id } => run_delete(&id, &app).await,
        Commands::Purchase { id } => run_purchase(&id, &app).await,
        Commands::Sync { watch } => run_sync(watch, &app).await,
        Commands::Books {
            refresh,
            query,
            order,
            json,
        } => run_books(refresh, query.as_deref(), order.into(), json, &app).await,
        Commands::Lookup { isbn, json } => run_lookup(&isbn, json, &app).await,
        Commands::Completions { shell, output } => run_completions(shell, output.as_deref()),
    }
}
