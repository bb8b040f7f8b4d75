//! Media matcher command line
//!
//! Pairs the video files found under the given paths with the episodes of a
//! JSON episode list, or prints the series name the files have in common.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use media_matcher::cli::{CliOptions, USAGE};
use media_matcher::config::Config;
use media_matcher::services::{
    DateMatcher, Episode, Matcher, MediaFile, SeasonEpisodeMatcher, SeriesNameMatcher, collect_media_files,
    episode_sequence, init_tracing,
};

#[derive(Debug, Serialize)]
struct MatchLine {
    file: String,
    episode: String,
}

#[derive(Debug, Serialize)]
struct Report {
    matches: Vec<MatchLine>,
    unmatched: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let options = CliOptions::from_args().map_err(|e| anyhow!("{e}\n{USAGE}"))?;
    if options.help {
        println!("{USAGE}");
        return Ok(());
    }

    let mut config = Config::from_env()?;
    if let Some(strict) = options.strict {
        config.strict = strict;
    }
    init_tracing(&config.log_settings())?;
    info!(strict = config.strict, paths = options.paths.len(), "Starting media matcher");

    let files = collect_media_files(&options.paths);

    if options.series_name {
        let names: Vec<String> = files.iter().map(|f| f.file_name().into_owned()).collect();
        let matcher = SeriesNameMatcher::new(config.season_episode_matcher()?, config.common_sequence_matcher());
        match matcher.common_series_name(&names) {
            Some(name) => println!("{name}"),
            None => warn!(files = names.len(), "No common series name"),
        }
        return Ok(());
    }

    let episodes_path = options.episodes.context("--episodes is required")?;
    let episodes = load_episodes(&episodes_path)?;
    info!(files = files.len(), episodes = episodes.len(), "Loaded inputs");

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling match");
            interrupt.cancel();
        }
    });

    let season_episode = config.season_episode_matcher()?;
    let strict = config.strict;
    let report = tokio::task::spawn_blocking(move || run_match(files, episodes, season_episode, strict, &cancel))
        .await
        .context("Matcher task failed")??;

    print_report(&report, options.json)
}

fn load_episodes(path: &Path) -> Result<Vec<Episode>> {
    let data = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("Invalid episode list in {}", path.display()))
}

fn run_match(
    files: Vec<MediaFile>,
    episodes: Vec<Episode>,
    season_episode: SeasonEpisodeMatcher,
    strict: bool,
    cancel: &CancellationToken,
) -> Result<Report> {
    let metrics = episode_sequence::<MediaFile, Episode>(season_episode, DateMatcher::default())?;
    let matcher = Matcher::new(&files, &episodes, strict, &metrics);

    let mut matches: Vec<MatchLine> = matcher
        .match_all(cancel)?
        .iter()
        .map(|m| MatchLine {
            file: m.value().to_string(),
            episode: m.candidate().to_string(),
        })
        .collect();
    matches.sort_by(|a, b| a.file.cmp(&b.file));

    let unmatched = matcher.remaining_values().iter().map(|f| f.to_string()).collect();
    Ok(Report { matches, unmatched })
}

fn print_report(report: &Report, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    for line in &report.matches {
        println!("{} -> {}", line.file, line.episode);
    }
    for file in &report.unmatched {
        println!("{file} -> (unmatched)");
    }
    Ok(())
}
