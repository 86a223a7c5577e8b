use crate::commands::Cli;
use crate::playlist::conversion::tagger::Id3TagWriter;
use crate::playlist::download_playlist;
use crate::playlist::downloader::DownloaderConfig;
use crate::util::fs::{album_dir, create_and_enter_album_dir};
use anyhow::Result;
use clap::Parser;
use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

mod commands;
mod error;
mod playlist;
mod util;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenv::dotenv().ok();
    let logger = env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .build();

    let level = logger.filter();
    let pb = MultiProgress::new();

    LogWrapper::new(pb.clone(), logger).try_init()?;
    log::set_max_level(level);

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            err.print()?;
            return Ok(if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            });
        }
    };

    let request = cli.playlist_request();
    create_and_enter_album_dir(&album_dir(Path::new("."), &request.artist, &request.album))
        .await?;

    let config = DownloaderConfig::new(&cli.downloader);
    download_playlist(
        &config,
        &request,
        Path::new("."),
        Arc::new(Id3TagWriter),
        &pb,
    )
    .await?;

    Ok(ExitCode::SUCCESS)
}
