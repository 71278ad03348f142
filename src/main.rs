use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use music_recommender::catalog_import::import_catalog_file;
use music_recommender::catalog_store::{CatalogStore, SearchKind, Track, TrackId};
use music_recommender::config::{AppConfig, CliConfig, FileConfig, DEFAULT_STORE_TIMEOUT_MS};
use music_recommender::history_store::{HistoryStore, PlayEvent, TrackPlayCount, UserId};
use music_recommender::recommendation::{
    ExhaustedCatalogPolicy, RecommendationResult, Recommender, DEFAULT_AFFINITY_TOP_K,
    DEFAULT_MAX_RECOMMENDATION_LIMIT, DEFAULT_RECOMMENDATION_LIMIT,
};
use music_recommender::sqlite_store::SqliteMusicStore;

fn parse_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[command(name = "music-recommender")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")"))]
#[command(about = "Track recommendations from listening history")]
struct CliArgs {
    /// Path to the SQLite music database. Created if missing.
    #[clap(long = "db", value_parser = parse_path)]
    pub db_path: Option<PathBuf>,

    /// Optional TOML config file, its values override CLI flags.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Milliseconds to wait on a locked database before failing.
    #[clap(long, default_value_t = DEFAULT_STORE_TIMEOUT_MS)]
    pub store_timeout_ms: u64,

    /// Number of recommendations when `recommend` gets no --limit.
    #[clap(long, default_value_t = DEFAULT_RECOMMENDATION_LIMIT)]
    pub default_limit: usize,

    /// Largest accepted --limit.
    #[clap(long, default_value_t = DEFAULT_MAX_RECOMMENDATION_LIMIT)]
    pub max_limit: usize,

    /// How many top genres and artists define a user's affinity.
    #[clap(long, default_value_t = DEFAULT_AFFINITY_TOP_K)]
    pub affinity_top_k: usize,

    /// What to do when unplayed tracks run out.
    #[clap(long, value_enum, default_value_t = ExhaustedCatalogPolicy::AllowRepeats)]
    pub exhausted_catalog_policy: ExhaustedCatalogPolicy,

    /// Print results as JSON.
    #[clap(long, default_value_t = false)]
    pub json: bool,

    #[command(subcommand)]
    command: Command,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            db_path: self.db_path.clone(),
            store_timeout_ms: self.store_timeout_ms,
            default_limit: self.default_limit,
            max_limit: self.max_limit,
            affinity_top_k: self.affinity_top_k,
            exhausted_catalog_policy: self.exhausted_catalog_policy,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Imports genres, artists and tracks from a JSON catalog document.
    Import {
        #[clap(value_parser = parse_path)]
        catalog_file: PathBuf,
    },

    /// Creates a user with the given handle.
    AddUser { user_handle: String },

    /// Records that a user played a track.
    Play {
        user_handle: String,
        track_id: TrackId,
        /// Play count to record, useful to seed a history.
        #[clap(long, default_value_t = 1)]
        times: usize,
    },

    /// Recommends tracks to a user.
    Recommend {
        user_handle: String,
        #[clap(long)]
        limit: Option<usize>,
    },

    /// Shows a user's top genres and artists.
    Affinity { user_handle: String },

    /// Shows the most played tracks across all users.
    Popular {
        #[clap(long, default_value_t = 10)]
        limit: usize,
    },

    /// Shows a user's most played tracks.
    Favorites {
        user_handle: String,
        #[clap(long, default_value_t = 10)]
        limit: usize,
    },

    /// Searches the catalog by title, artist name or genre name.
    Search {
        query: String,
        #[clap(long, value_enum, default_value_t = SearchKind::All)]
        kind: SearchKind,
    },
}

fn resolve_user(store: &SqliteMusicStore, user_handle: &str) -> Result<UserId> {
    store
        .get_user_id(user_handle)?
        .with_context(|| format!("User {} not found", user_handle))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_recommendations(result: &RecommendationResult) {
    if result.cold_start {
        println!("No listening history yet, random picks:");
    }
    for (position, entry) in result.tracks.iter().enumerate() {
        println!(
            "{:>3}. [{}] {} - {} ({}) {:?}",
            position + 1,
            entry.track.id,
            entry.artist_name.as_deref().unwrap_or("?"),
            entry.track.title,
            entry.genre_name.as_deref().unwrap_or("no genre"),
            entry.source,
        );
    }
}

fn print_play_counts(store: &SqliteMusicStore, counts: &[TrackPlayCount]) -> Result<()> {
    let ids: Vec<TrackId> = counts.iter().map(|c| c.track_id).collect();
    let titles: HashMap<TrackId, String> = store
        .get_tracks(&ids)?
        .into_iter()
        .map(|t| (t.id, t.title))
        .collect();
    for count in counts {
        println!(
            "{:>6}  [{}] {}",
            count.play_count,
            count.track_id,
            titles
                .get(&count.track_id)
                .map(String::as_str)
                .unwrap_or("?")
        );
    }
    Ok(())
}

fn print_tracks(store: &SqliteMusicStore, tracks: &[Track]) -> Result<()> {
    let artist_ids: Vec<_> = tracks.iter().map(|t| t.artist_id).collect();
    let artists: HashMap<_, String> = store
        .get_artists(&artist_ids)?
        .into_iter()
        .map(|a| (a.id, a.name))
        .collect();
    for track in tracks {
        println!(
            "[{}] {} - {}",
            track.id,
            artists
                .get(&track.artist_id)
                .map(String::as_str)
                .unwrap_or("?"),
            track.title
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    info!("Opening music database at {:?}...", config.db_path);
    let store = Arc::new(SqliteMusicStore::with_timeout(
        &config.db_path,
        config.store_timeout(),
    )?);

    match cli_args.command {
        Command::Import { catalog_file } => {
            let stats = import_catalog_file(&store, &catalog_file)?;
            let counts = store.get_counts()?;
            info!(
                "Imported {} genres, {} artists, {} tracks",
                stats.genres_imported, stats.artists_imported, stats.tracks_imported
            );
            info!(
                "Database contains {} genres, {} artists, {} tracks",
                counts.genres, counts.artists, counts.tracks
            );
        }
        Command::AddUser { user_handle } => {
            let user_id = store.create_user(&user_handle)?;
            println!("Created user {} with id {}", user_handle, user_id);
        }
        Command::Play {
            user_handle,
            track_id,
            times,
        } => {
            let user_id = resolve_user(&store, &user_handle)?;
            for _ in 0..times {
                store.record_play(&PlayEvent::now(user_id, track_id))?;
            }
            info!(
                "Recorded {} play(s) of track {} for {}",
                times, track_id, user_handle
            );
        }
        Command::Recommend { user_handle, limit } => {
            let user_id = resolve_user(&store, &user_handle)?;
            let recommender = Recommender::new(
                store.clone(),
                store.clone(),
                config.recommendation.clone(),
            );
            let result = match limit {
                Some(limit) => recommender.recommend(user_id, limit)?,
                None => recommender.recommend_default(user_id)?,
            };
            if cli_args.json {
                print_json(&result)?;
            } else {
                print_recommendations(&result);
            }
        }
        Command::Affinity { user_handle } => {
            let user_id = resolve_user(&store, &user_handle)?;
            let recommender = Recommender::new(
                store.clone(),
                store.clone(),
                config.recommendation.clone(),
            );
            let top_k = recommender.settings().affinity_top_k;
            let genres = recommender.ranker().genre_affinities(user_id, top_k)?;
            let artists = recommender.ranker().artist_affinities(user_id, top_k)?;
            if cli_args.json {
                print_json(&serde_json::json!({ "genres": genres, "artists": artists }))?;
            } else {
                let genre_ids: Vec<_> = genres.iter().map(|g| g.genre_id).collect();
                let artist_ids: Vec<_> = artists.iter().map(|a| a.artist_id).collect();
                let genre_names = store.get_genres(&genre_ids)?;
                let artist_names = store.get_artists(&artist_ids)?;
                println!("Top genres:");
                for genre in &genres {
                    let name = genre_names
                        .iter()
                        .find(|g| g.id == genre.genre_id)
                        .map(|g| g.name.as_str())
                        .unwrap_or("?");
                    println!("{:>6}  {}", genre.play_count, name);
                }
                println!("Top artists:");
                for artist in &artists {
                    let name = artist_names
                        .iter()
                        .find(|a| a.id == artist.artist_id)
                        .map(|a| a.name.as_str())
                        .unwrap_or("?");
                    println!("{:>6}  {}", artist.play_count, name);
                }
            }
        }
        Command::Popular { limit } => {
            let popular = store.popular_tracks(limit)?;
            if cli_args.json {
                print_json(&popular)?;
            } else {
                print_play_counts(&store, &popular)?;
            }
        }
        Command::Favorites { user_handle, limit } => {
            let user_id = resolve_user(&store, &user_handle)?;
            let favorites = store.user_top_tracks(user_id, limit)?;
            if cli_args.json {
                print_json(&favorites)?;
            } else if favorites.is_empty() {
                println!("{} has not played anything yet", user_handle);
            } else {
                print_play_counts(&store, &favorites)?;
            }
        }
        Command::Search { query, kind } => {
            let tracks = store.search_tracks(&query, kind)?;
            if cli_args.json {
                print_json(&tracks)?;
            } else if tracks.is_empty() {
                println!("No tracks match \"{}\"", query);
            } else {
                print_tracks(&store, &tracks)?;
            }
        }
    }

    Ok(())
}
