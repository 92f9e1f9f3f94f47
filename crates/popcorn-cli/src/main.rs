use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use popcorn_api::qbittorrent::{AddOptions, QbClient};
use popcorn_api::yts::{ListQuery, SortOrder, YtsClient};
use popcorn_core::config::AppConfig;
use popcorn_core::error::PopcornError;
use popcorn_core::ledger::Ledger;
use popcorn_core::scanner;

#[derive(Parser)]
#[command(name = "popcorn", about = "Browse movies and send them to qBittorrent")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Browse or search the movie listing
    Browse {
        /// Search term
        #[arg(long)]
        search: Option<String>,
        /// Genre filter (e.g. action, sci-fi, film-noir)
        #[arg(long)]
        genre: Option<String>,
        /// Sort key: trending, latest, rating, seeds, year, title
        #[arg(long, default_value = "trending")]
        sort: String,
        /// Page number
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Show everything, including downloaded/hidden/watched movies
        #[arg(long)]
        all: bool,
    },
    /// Send a movie's magnet link to qBittorrent and record it
    Download {
        /// Listing id of the movie (shown by `browse`)
        movie_id: u64,
        /// Preferred quality variant
        #[arg(long, default_value = "1080p")]
        quality: String,
    },
    /// Inspect or edit the download ledger
    Ledger {
        #[command(subcommand)]
        command: LedgerCommand,
    },
    /// Scan library folders for movies already on disk
    Scan {
        /// Folders to scan; defaults to the configured library folders
        folders: Vec<String>,
        /// Persist the given folders as the configured library folders
        #[arg(long)]
        save: bool,
    },
}

#[derive(Subcommand)]
enum LedgerCommand {
    /// List recorded downloads, newest first
    List,
    /// Remove a download record by IMDB code
    Remove { imdb_code: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "popcorn=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load()?;

    // A ledger that cannot be opened disables download tracking; browsing
    // still works.
    let ledger = match open_ledger() {
        Ok(ledger) => Some(ledger),
        Err(e) => {
            warn!(error = %e, "Download tracking disabled, ledger unavailable");
            None
        }
    };

    match cli.command {
        Command::Browse {
            search,
            genre,
            sort,
            page,
            all,
        } => browse(&config, ledger.as_ref(), search, genre, sort, page, all).await,
        Command::Download { movie_id, quality } => {
            download(&config, ledger.as_ref(), movie_id, &quality).await
        }
        Command::Ledger { command } => {
            let ledger = ledger.context("ledger unavailable")?;
            match command {
                LedgerCommand::List => ledger_list(&ledger),
                LedgerCommand::Remove { imdb_code } => {
                    ledger.remove_download(&imdb_code)?;
                    println!("Removed {imdb_code}");
                    Ok(())
                }
            }
        }
        Command::Scan { folders, save } => scan(ledger.as_ref(), folders, save),
    }
}

fn open_ledger() -> Result<Ledger, PopcornError> {
    let path = AppConfig::ensure_db_path()?;
    Ledger::open(&path)
}

fn listing_client(config: &AppConfig) -> YtsClient {
    YtsClient::new(
        config.listing.mirrors.clone(),
        Duration::from_secs(config.listing.timeout_secs),
    )
}

#[allow(clippy::too_many_arguments)]
async fn browse(
    config: &AppConfig,
    ledger: Option<&Ledger>,
    search: Option<String>,
    genre: Option<String>,
    sort: String,
    page: u32,
    all: bool,
) -> Result<()> {
    let query = ListQuery {
        search_term: search,
        genre: genre
            .map(|g| g.parse().map_err(anyhow::Error::msg))
            .transpose()?,
        sort: sort.parse().map_err(anyhow::Error::msg)?,
        order: SortOrder::Desc,
        minimum_rating: config.listing.minimum_rating,
        page,
        page_size: config.listing.page_size,
    };

    let listing = listing_client(config).list_movies(&query).await?;

    let (downloaded, hidden, watched) = match ledger {
        Some(ledger) => (
            ledger.downloaded_codes()?,
            ledger.hidden_codes()?,
            ledger.watched_codes()?,
        ),
        None => Default::default(),
    };

    // Hiding happens after pagination: a hidden movie shrinks the printed
    // page, never the page fetched from the listing.
    let mut shown = 0;
    for movie in &listing.movies {
        let is_downloaded = downloaded.contains(&movie.imdb_code);
        if !all {
            if config.general.hide_downloaded && is_downloaded {
                continue;
            }
            if hidden.contains(&movie.imdb_code) {
                continue;
            }
            if config.general.hide_watched && watched.contains(&movie.imdb_code) {
                continue;
            }
        }
        shown += 1;

        let marker = if is_downloaded { "  [downloaded]" } else { "" };
        println!(
            "{:>7}  {} ({})  \u{2605} {:.1}  {}{}",
            movie.id,
            movie.title,
            movie.year,
            movie.rating,
            movie.genres.join("/"),
            marker
        );
    }

    if shown == 0 {
        println!("(nothing to show on this page)");
    }
    if listing.has_more {
        println!("-- more available: --page {}", page + 1);
    }
    Ok(())
}

async fn download(
    config: &AppConfig,
    ledger: Option<&Ledger>,
    movie_id: u64,
    quality: &str,
) -> Result<()> {
    let movie = listing_client(config)
        .movie_details(movie_id)
        .await?
        .with_context(|| format!("movie {movie_id} not found"))?;
    let magnet = movie
        .magnet_link(quality)
        .with_context(|| format!("\"{}\" has no download variants", movie.title))?;

    let qb = QbClient::new(&config.remote.host, config.remote.port);
    let session = qb
        .login(&config.remote.username, &config.remote.password)
        .await?;
    let version = qb.version(&session).await?;
    info!(version = %version, "Connected to qBittorrent");

    let options = AddOptions {
        category: Some(config.remote.category.clone()),
        save_path: config.remote.save_path.clone(),
    };
    qb.add_magnet(&session, &magnet, &options).await?;

    match ledger {
        Some(ledger) => ledger.record_download(&movie.imdb_code, &movie.title)?,
        None => warn!("Ledger unavailable, download not recorded"),
    }

    println!("Sent \"{}\" to qBittorrent", movie.title);
    Ok(())
}

fn ledger_list(ledger: &Ledger) -> Result<()> {
    let records = ledger.all_downloads()?;
    if records.is_empty() {
        println!("(no recorded downloads)");
        return Ok(());
    }
    for record in records {
        println!(
            "{}  {}  {}",
            record.added_at.format("%Y-%m-%d %H:%M"),
            record.imdb_code,
            record.title
        );
    }
    Ok(())
}

fn scan(ledger: Option<&Ledger>, folders: Vec<String>, save: bool) -> Result<()> {
    let folders = if folders.is_empty() {
        ledger
            .context("no folders given and ledger unavailable")?
            .library_folders()?
    } else {
        folders
    };
    if folders.is_empty() {
        println!("No library folders configured; pass folders to scan.");
        return Ok(());
    }

    let movies = scanner::scan_folders(&folders);
    for movie in &movies {
        match movie.year {
            Some(year) => println!("{} ({})  {}", movie.title, year, movie.path.display()),
            None => println!("{}  {}", movie.title, movie.path.display()),
        }
    }
    println!("{} movies on disk", movies.len());

    if save {
        ledger
            .context("cannot save folders, ledger unavailable")?
            .set_library_folders(&folders)?;
        println!("Saved library folders");
    }
    Ok(())
}
