mod config;
mod logging;
mod photos_rs;
mod ports;
mod services;
#[cfg(test)]
mod test_utils;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::{
    Result,
    eyre::{Context, eyre},
};
use tokio::signal;
use tokio::sync::watch;
use url::Url;

use crate::{
    config::Config,
    logging::setup_logging,
    photos_rs::PHOTOS_API_BASE_URL,
    services::{
        albums::AlbumResolver,
        credentials::{provider::TokenProvider, store::FileCredentialStore},
        ingest::{IngestionLoop, WatchSettings},
        photos::{
            build_http_client, client::PhotosHttpAdapter, oauth_client::GoogleOAuthAdapter,
        },
        upload::{UploadOutcome, UploadPipeline},
    },
};

type Pipeline = UploadPipeline<FileCredentialStore, GoogleOAuthAdapter, PhotosHttpAdapter>;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The config file to use
    #[arg(short, long, env = "PHOTO_UPLOADER_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Console log level (default: info)
    #[arg(long, default_value = "info", global = true, env = "LOG_LEVEL")]
    log_level: log::LevelFilter,

    /// File log level (default: debug)
    #[arg(long, default_value = "debug", global = true)]
    log_file_level: log::LevelFilter,

    /// Path to log file
    #[arg(long, env = "PHOTO_UPLOADER_LOG_FILE", global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

fn is_file(s: &str) -> Result<PathBuf, String> {
    let p: PathBuf = s.into();
    if p.is_file() {
        Ok(p)
    } else {
        Err(format!("`{}` is not an existing file", s))
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Watch a directory and upload new images until stopped
    Watch {
        /// Directory to watch (overrides the config file)
        #[arg(short, long, env = "PHOTO_UPLOADER_WATCH_DIRECTORY")]
        directory: Option<PathBuf>,

        /// Album to upload into (overrides the config file)
        #[arg(short, long, env = "PHOTO_UPLOADER_ALBUM")]
        album: Option<String>,
    },
    /// Upload a single file once, without moving it
    Upload {
        /// The image to upload
        #[arg(short, long, value_parser = is_file)]
        file: PathBuf,

        /// Album to upload into (overrides the config file)
        #[arg(short, long, env = "PHOTO_UPLOADER_ALBUM")]
        album: Option<String>,
    },
    /// Run the browser consent flow and store a fresh credential
    Authorize,
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

fn load_config(path: Option<PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(&path),
        None => Config::load(),
    }
    .wrap_err("Failed to load photo-uploader config")
}

fn build_pipeline(config: &Config) -> Result<Pipeline> {
    let http = build_http_client(config.request_timeout())?;
    let base_url = Url::parse(PHOTOS_API_BASE_URL).wrap_err("Invalid Photos API base URL")?;

    log::debug!("Using token file: {}", config.token_path().display());
    let tokens = TokenProvider::new(
        FileCredentialStore::new(config.token_path()),
        GoogleOAuthAdapter::new(
            http.clone(),
            config.client_secrets_path(),
            config.redirect_port(),
        ),
    );
    let photos = Arc::new(PhotosHttpAdapter::new(http, base_url));

    Ok(UploadPipeline::new(
        tokens,
        AlbumResolver::new(photos.clone()),
        photos,
    ))
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            log::info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            log::info!("Received SIGTERM signal");
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    setup_logging(args.log_level, args.log_file.clone(), args.log_file_level)?;

    log::debug!("Photo uploader starting");

    match args.command {
        Commands::Watch { directory, album } => {
            let config = load_config(args.config)?;
            let pipeline = build_pipeline(&config)?;
            let settings = WatchSettings {
                watch_directory: directory.unwrap_or_else(|| config.watch_directory()),
                archive_directory: config.archive_directory(),
                album_title: album.unwrap_or_else(|| config.album_title().to_string()),
                poll_interval: config.poll_interval(),
            };

            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            tokio::spawn(async move {
                shutdown_signal().await;
                let _ = shutdown_tx.send(true);
            });

            IngestionLoop::new(pipeline, settings)
                .run(shutdown_rx)
                .await?;
            log::info!("Photo uploader stopped");
        }
        Commands::Upload { file, album } => {
            let config = load_config(args.config)?;
            let pipeline = build_pipeline(&config)?;
            let album = album.unwrap_or_else(|| config.album_title().to_string());

            match pipeline.upload(&file, &album).await {
                UploadOutcome::Success { media_item_id } => {
                    log::info!(
                        "Uploaded {} to album \"{}\" (media item {})",
                        file.display(),
                        album,
                        media_item_id.as_deref().unwrap_or("unknown")
                    );
                }
                UploadOutcome::Failure(failure) => {
                    return Err(eyre!("Failed to upload {}: {}", file.display(), failure));
                }
            }
        }
        Commands::Authorize => {
            let config = load_config(args.config)?;
            let pipeline = build_pipeline(&config)?;
            pipeline
                .tokens()
                .reauthorize()
                .await
                .wrap_err("Authorization failed")?;
            log::info!(
                "Authorization complete, credential saved to {}",
                config.token_path().display()
            );
        }
        Commands::Config(config_commands) => match config_commands {
            ConfigCommands::CreateDefault => {
                log::debug!("Creating default config");
                let path = Config::create_default()?;
                log::info!("Default config at {}", path.display());
            }
            ConfigCommands::Path => match Config::config_path() {
                Some(path) => println!("{}", path.display()),
                None => println!("No default config path found"),
            },
        },
    }

    Ok(())
}
