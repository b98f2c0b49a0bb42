use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use blocker_core::{settings, AnnotationSession, BlockerEngine, ReconcilerOptions};
use clap::{Parser, Subcommand};
use serde::Serialize;
use shared::{
    domain::{Item, ItemHandle, ItemId},
    protocol::{items_from_records, ItemRecord},
};
use storage::SqliteStore;
use tracing::error;
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_settings, normalize_database_url};

#[derive(Parser, Debug)]
#[command(about = "Hide blocked forum threads and keep block counts")]
struct Cli {
    /// Settings file; defaults to ./blocker.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    database_url: Option<String>,
    /// Add keyword-matched threads to the block list.
    #[arg(long)]
    persist_keyword_matches: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify a JSON array of rendered items and record the results.
    Scan {
        items: PathBuf,
    },
    /// Block one thread explicitly.
    Block {
        #[arg(long)]
        id: Option<String>,
        #[arg(long, default_value = "")]
        title: String,
    },
    Unblock {
        id: String,
    },
    /// Print the block list.
    List,
    Words {
        #[command(subcommand)]
        command: WordsCommand,
    },
    /// Print the popup counters.
    Summary,
    /// Print stored keys with their last write time.
    Keys,
}

#[derive(Subcommand, Debug)]
enum WordsCommand {
    List,
    Add { words: Vec<String> },
    Remove { word: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut app_settings = load_settings(cli.config.as_deref())?;
    if let Some(url) = cli.database_url {
        app_settings.database_url = url;
    }
    if cli.persist_keyword_matches {
        app_settings.persist_keyword_matches = true;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(app_settings.log_filter.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let database_url = normalize_database_url(&app_settings.database_url);
    let store = SqliteStore::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify the path and permissions"
        );
        error
    })?;
    let engine = BlockerEngine::new(
        store,
        ReconcilerOptions {
            persist_keyword_matches: app_settings.persist_keyword_matches,
        },
    );

    match cli.command {
        Command::Scan { items } => {
            let items = read_items(&items).await?;
            let mut session = AnnotationSession::new();
            let report = engine.scan(&items, &mut session).await;
            for effect in &report.effects {
                print_json(effect)?;
            }
            print_json(&report.summary())?;
        }
        Command::Block { id, title } => {
            let item = Item {
                handle: ItemHandle(0),
                id: id
                    .as_deref()
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(ItemId::from),
                title,
            };
            let mut session = AnnotationSession::new();
            let report = engine.block_item(&item, &mut session).await;
            print_json(&report.result?)?;
        }
        Command::Unblock { id } => {
            match settings::remove_block_entry(&engine.store, &ItemId::new(id.trim())).await? {
                Some(entry) => print_json(&entry)?,
                None => println!("not blocked: {id}"),
            }
        }
        Command::List => {
            for entry in settings::list_block_entries(&engine.store).await? {
                print_json(&entry)?;
            }
        }
        Command::Words { command } => match command {
            WordsCommand::List => {
                for word in settings::list_keywords(&engine.store).await? {
                    println!("{word}");
                }
            }
            WordsCommand::Add { words } => {
                let added = settings::add_keywords(&engine.store, &words).await?;
                println!("added {} keyword(s)", added.len());
            }
            WordsCommand::Remove { word } => {
                if settings::remove_keyword(&engine.store, &word).await? {
                    println!("removed: {word}");
                } else {
                    println!("not a keyword: {word}");
                }
            }
        },
        Command::Summary => {
            print_json(&settings::summary(&engine.store).await?)?;
        }
        Command::Keys => {
            for key in engine.store.list_keys().await? {
                println!(
                    "{}\t{} bytes\t{}",
                    key.key,
                    key.size_bytes,
                    key.updated_at.to_rfc3339()
                );
            }
        }
    }

    Ok(())
}

/// Loads an item-source document: a JSON array of `{handle?, id?, title}`.
/// Explicit handles must be unique within the document.
async fn read_items(path: &Path) -> Result<Vec<Item>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read items from '{}'", path.display()))?;
    let records: Vec<ItemRecord> = serde_json::from_str(&raw)
        .with_context(|| format!("'{}' is not a JSON array of items", path.display()))?;
    let mut seen = HashSet::new();
    for handle in records.iter().filter_map(|record| record.handle) {
        if !seen.insert(handle) {
            bail!("handle {handle} appears more than once in '{}'", path.display());
        }
    }
    Ok(items_from_records(records))
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
