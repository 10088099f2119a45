use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use tcgsync::sync::FsImageStore;
use tcgsync::{CardRepository, Game, SyncOptions, TcgSync};

#[derive(Parser)]
#[command(name = "tcgsync")]
#[command(about = "Resolve and sync trading card data for Magic, Pokémon and One Piece")]
struct Args {
    /// DuckDB card store
    #[arg(long, env = "TCGSYNC_DB", global = true)]
    db: Option<PathBuf>,

    /// Cache directory
    #[arg(long, env = "TCGSYNC_CACHE_DIR", global = true)]
    cache_dir: Option<PathBuf>,

    #[arg(long, env = "POKEMONTCG_API_KEY", hide_env_values = true, global = true)]
    pokemon_api_key: Option<String>,

    /// Never call external card APIs
    #[arg(long, global = true)]
    offline: bool,

    /// Per-request timeout in seconds, overriding each API's default
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import every card of a game, or of one set
    Sync {
        #[arg(long, value_parser = parse_game)]
        game: Game,
        #[arg(long)]
        set: Option<String>,
        /// Download card images into this directory
        #[arg(long)]
        images: Option<PathBuf>,
        #[arg(long)]
        skip_existing_images: bool,
        #[arg(long)]
        update_existing: bool,
    },
    /// Look one card up by set and number
    Resolve {
        #[arg(long, value_parser = parse_game)]
        game: Game,
        #[arg(long)]
        set: String,
        #[arg(long)]
        number: String,
        /// Refresh from the external API even when stored
        #[arg(long)]
        force: bool,
    },
    /// Search stored cards by name
    Search {
        query: String,
        #[arg(long, value_parser = parse_game)]
        game: Option<Game>,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// List a game's sets
    Sets {
        #[arg(long, value_parser = parse_game)]
        game: Game,
    },
}

fn parse_game(tag: &str) -> Result<Game, String> {
    Game::parse(tag).map_err(|e| e.to_string())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tcgsync=info")),
        )
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> tcgsync::Result<ExitCode> {
    let mut builder = TcgSync::builder().offline(args.offline);
    if let Some(db) = &args.db {
        builder = builder.database(db);
    }
    if let Some(dir) = &args.cache_dir {
        builder = builder.cache_dir(dir);
    }
    if let Some(key) = args.pokemon_api_key {
        builder = builder.pokemon_api_key(key);
    }
    let timeout = args.timeout.map(Duration::from_secs);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    let client = builder.build()?;

    match args.command {
        Command::Sync {
            game,
            set,
            images,
            skip_existing_images,
            update_existing,
        } => {
            let options = SyncOptions {
                update_existing,
                skip_existing_images,
            };
            let image_timeout = timeout.unwrap_or(tcgsync::config::SET_LISTING_TIMEOUT);
            let store = images
                .map(|dir| FsImageStore::new(dir, image_timeout))
                .transpose()?;
            let mut job = client.bulk_sync();
            if let Some(store) = &store {
                job = job.with_images(store);
            }
            let report = job.run(game, set.as_deref(), options)?;
            print_json(&report)?;
        }
        Command::Resolve {
            game,
            set,
            number,
            force,
        } => {
            let resolver = client.resolver();
            let card = if force {
                resolver.force_sync(game.as_str(), &set, &number)?
            } else {
                resolver.resolve(game.as_str(), &set, &number, true)?
            };
            match card {
                Some(card) => print_json(&card.to_fields())?,
                None => {
                    tracing::info!(%game, %set, %number, "card not found");
                    return Ok(ExitCode::from(3));
                }
            }
        }
        Command::Search { query, game, limit } => {
            let cards = client.cards().search_by_name(&query, game, limit)?;
            let fields: Vec<_> = cards.iter().map(|c| c.to_fields()).collect();
            print_json(&fields)?;
        }
        Command::Sets { game } => {
            print_json(&client.resolver().sets(game)?)?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> tcgsync::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
