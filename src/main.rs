mod config;
mod downloads;
mod filename;
mod logging;
mod matching;
mod metadata;
mod normalize;
mod song;
mod stats;
mod time;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::{
    Result,
    eyre::{Context, eyre},
};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::{
    config::Config,
    downloads::{find_downloaded_file, rename_to_standard},
    filename::{song_filename, song_label},
    logging::setup_logging,
    matching::MatchSelector,
    metadata::write_metadata,
    normalize::Normalizer,
    song::{SearchResult, Song},
    stats::{Stats, print_summary},
    time::parse_minutes_seconds,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The config file to use
    #[arg(short, long, env = "PLAYLIST_FETCH_CONFIG")]
    config: Option<PathBuf>,

    /// Console log level (default: off)
    #[arg(long, default_value = "off", global = true, env = "LOG_LEVEL")]
    log_level: log::LevelFilter,

    /// File log level (default: debug)
    #[arg(long, default_value = "debug", global = true)]
    log_file_level: log::LevelFilter,

    /// Path to log file
    #[arg(long, env = "PLAYLIST_FETCH_LOG_FILE", global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

fn is_directory(s: &str) -> Result<PathBuf, String> {
    let p: PathBuf = s.into();
    if p.is_dir() {
        Ok(p)
    } else {
        Err(format!("`{}` is not an existing directory", s))
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Pick the best search result for a song
    Select {
        /// JSON file with the song's title, artist, album and time
        #[arg(short, long)]
        song: PathBuf,

        /// JSON file with the search results, in search order
        #[arg(short, long)]
        results: PathBuf,
    },
    /// Rename, tag and optionally normalize the songs a playlist download produced
    Finalize {
        /// The directory the songs were downloaded to
        #[arg(short, long, value_parser = is_directory)]
        directory: PathBuf,

        /// JSON file listing each song with the search result it was downloaded from
        #[arg(short, long)]
        manifest: PathBuf,

        /// Playlist name used in the summary (default: the directory name)
        #[arg(short, long)]
        playlist: Option<String>,

        /// Normalize the loudness of each song after tagging
        #[arg(long)]
        normalize: bool,
    },
    /// Normalize the loudness of a single file, replacing it
    Normalize {
        /// The file to normalize
        file: PathBuf,
    },
    /// Convert a mm:ss time to seconds
    ParseTime {
        /// The time, e.g. 3:45
        time: String,
    },
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Create a default config file, if it doesn't exist
    CreateDefault,
    /// Print the path to the config file
    Path,
}

/// One entry of a finalize manifest
#[derive(Debug, Deserialize)]
struct DownloadedSong {
    song: Song,
    /// Title of the search result that was downloaded
    title: String,
    /// Url of the search result that was downloaded
    #[serde(default)]
    url: Option<String>,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Find the download for one song, give it its standard name and tags.
/// Returns the final path of the song.
fn finalize_song(
    directory: &Path,
    entry: &DownloadedSong,
    normalizer: Option<&Normalizer>,
) -> Result<PathBuf> {
    let downloaded = find_downloaded_file(directory, &entry.title, entry.url.as_deref())
        .with_context(|| format!("Failed to list {}", directory.display()))?
        .ok_or_else(|| eyre!("No downloaded file found for '{}'", entry.title))?;

    let path = rename_to_standard(directory, &downloaded, &entry.song)
        .with_context(|| format!("Failed to rename {}", downloaded))?;
    // Put the download back under its own name so the next run retries it
    // instead of skipping a file that was never tagged.
    if let Err(e) = write_metadata(&entry.song, directory) {
        std::fs::rename(&path, directory.join(&downloaded))
            .with_context(|| format!("Failed to restore {}", downloaded))?;
        return Err(e).with_context(|| format!("Failed to write metadata to {}", path.display()));
    }

    if let Some(normalizer) = normalizer {
        let normalized = normalizer
            .normalize_audio(&path)
            .with_context(|| format!("Failed to normalize {}", path.display()))?;
        std::fs::rename(&normalized, &path)
            .with_context(|| format!("Failed to rename {}", normalized.display()))?;
    }

    Ok(path)
}

fn finalize(
    directory: &Path,
    manifest: &Path,
    playlist: Option<String>,
    normalize: bool,
    config: &Config,
) -> Result<Stats> {
    let entries: Vec<DownloadedSong> = read_json(manifest)?;
    let normalizer = normalize.then(|| Normalizer::new(config.normalize.clone()));
    let folder = playlist.unwrap_or_else(|| {
        directory
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default()
    });

    let mut stats = Stats::default();
    for entry in &entries {
        stats.record_requested();
        let label = song_label(&entry.song, &folder);

        if directory.join(song_filename(&entry.song)).is_file() {
            log::info!("Already exists, skipping: {}", label);
            stats.record_skipped();
            continue;
        }

        match finalize_song(directory, entry, normalizer.as_ref()) {
            Ok(path) => {
                log::info!("Finished: {} -> {}", label, path.display());
                stats.record_downloaded();
            }
            Err(e) => {
                log::warn!("Failed: {}: {:#}", label, e);
                stats.record_failed();
            }
        }
    }

    print_summary(&stats, &folder);
    Ok(stats)
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    setup_logging(args.log_level, args.log_file.clone(), args.log_file_level)?;

    log::debug!("Loading configuration");
    let config = {
        if let Some(config) = args.config {
            Config::from_file(&config)
        } else {
            Config::load()
        }
    }
    .with_context(|| "Failed to load playlist-fetch config")?;

    match args.command {
        Commands::Select { song, results } => {
            let song: Song = read_json(&song)?;
            let results: Vec<SearchResult> = read_json(&results)?;
            let selector = MatchSelector::new(config.matching);
            match selector.select_best(&song, &results) {
                Some(best) => println!("{}", serde_json::to_string_pretty(best)?),
                None => println!("No match found"),
            }
        }
        Commands::Finalize {
            directory,
            manifest,
            playlist,
            normalize,
        } => {
            log::debug!("Finalizing downloads in: {}", directory.display());
            finalize(&directory, &manifest, playlist, normalize, &config)?;
        }
        Commands::Normalize { file } => {
            let normalized = Normalizer::new(config.normalize).normalize_audio(&file)?;
            println!("{}", normalized.display());
        }
        Commands::ParseTime { time } => {
            println!("{}", parse_minutes_seconds(&time)?);
        }
        Commands::Config(config_commands) => match config_commands {
            ConfigCommands::CreateDefault => {
                let path = Config::create_default()?;
                log::info!("Default config created at {}", path.display());
                println!("{}", path.display());
            }
            ConfigCommands::Path => match Config::config_path() {
                Some(path) => println!("{}", path.display()),
                None => println!("No default config path found"),
            },
        },
    }

    Ok(())
}
