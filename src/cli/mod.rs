use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
};

use crate::{
    config::{self, Config},
    domain::Visibility,
    links,
    pipeline::{Collaborators, Pipeline, RunInput, RunResult, collaborators::Renderer},
    playlist,
    preview::{self, Preview},
    release,
    services::{archive::ArchiveClient, ffmpeg::FfmpegRenderer, youtube::YouTubePublisher},
    storage::{ArtifactNamer, fs},
};

#[derive(Parser)]
#[command(name = "archive-to-yt")]
#[command(version)]
#[command(about = "Publish archive.org recordings as one video per track")]
pub struct Cli {
    /// Path to the config TOML file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show what a collection would be published as, without downloading
    Preview {
        /// archive.org identifier or details URL
        url: String,
        /// Probe every bound file's duration with ffprobe
        #[arg(short, long)]
        durations: bool,
    },
    /// Download, render and publish every track, then sync the playlist
    Run {
        url: String,
        /// Visibility of new items and a new playlist (default from config)
        #[arg(long)]
        visibility: Option<Visibility>,
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// List artifacts an interrupted run left behind
    Status { url: String },
    /// Change visibility of everything already published for a collection
    Release {
        url: String,
        #[arg(long, default_value = "public")]
        visibility: Visibility,
    },
    /// Run http server offering previews
    Serve,
}

/// Entrypoint for CLI
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let path = cli.config.to_string_lossy();
    let cfg = config::Config::load(&path)?;

    match cli.command {
        Commands::Preview { url, durations } => {
            let archive = ArchiveClient::new(&cfg.archive);
            let loaded = preview::load(&archive, &url)?;
            let renderer = FfmpegRenderer::new(cfg.render.clone());
            let preview = preview::build(&loaded, durations.then_some(&renderer as &dyn Renderer));
            print_preview(&preview);
        }

        Commands::Run {
            url,
            visibility,
            yes,
        } => run_collection(&cfg, &url, visibility, yes)?,

        Commands::Status { url } => {
            let identifier = links::identifier_from_input(&url)
                .ok_or_else(|| anyhow!("not an archive.org identifier or details URL: {url}"))?;
            let namer = ArtifactNamer::new(&cfg.workspace.artifact_dir, &identifier);
            let artifacts = fs::scan_artifacts(namer.dir())?;

            if artifacts.is_empty() {
                println!("Nothing left in {}", namer.dir().display());
            } else {
                println!("{} ({} files):", namer.dir().display(), artifacts.len());
                for artifact in &artifacts {
                    let track = artifact
                        .track
                        .map(|n| format!("track {n}"))
                        .unwrap_or_default();
                    println!(
                        "    - {:<10} {:<9} {:>12} bytes  {}",
                        format!("{:?}", artifact.kind),
                        track,
                        artifact.size,
                        artifact.path.to_string_lossy()
                    );
                }
            }
        }

        Commands::Release { url, visibility } => {
            let archive = ArchiveClient::new(&cfg.archive);
            let loaded = preview::load(&archive, &url)?;
            let publisher = YouTubePublisher::new(cfg.publish.clone())?;
            let outcome = release::release(&publisher, &loaded.resolved.metadata, visibility)
                .context("changing visibility")?;

            println!("{} items set to {visibility}", outcome.items);
            if let Some(id) = outcome.playlist_id {
                println!("Playlist {} set to {visibility}", links::playlist_url(&id));
            }
        }

        Commands::Serve => {
            println!("Starting HTTP server...");

            let http_server = crate::http::server::HttpServer::new(
                ArchiveClient::new(&cfg.archive),
                FfmpegRenderer::new(cfg.render.clone()),
                cfg.http.clone(),
            );

            println!(
                "HTTP server running at http://{}:{}",
                http_server.config.bind_addr, http_server.config.port
            );
            http_server.run();
        }
    }
    Ok(())
}

fn run_collection(
    cfg: &Config,
    url: &str,
    visibility: Option<Visibility>,
    yes: bool,
) -> anyhow::Result<()> {
    let archive = ArchiveClient::new(&cfg.archive);
    let loaded = preview::load(&archive, url)?;
    let visibility = visibility.unwrap_or(cfg.publish.default_visibility);

    print_preview(&preview::build(&loaded, None));
    if !yes && !confirm(&format!("Publish these tracks as {visibility}?"))? {
        println!("Aborted");
        return Ok(());
    }

    let renderer = FfmpegRenderer::new(cfg.render.clone());
    let publisher = YouTubePublisher::new(cfg.publish.clone())?;
    let meta = &loaded.resolved.metadata;
    let pipeline = Pipeline::new(
        Collaborators {
            downloader: &archive,
            renderer: &renderer,
            publisher: &publisher,
        },
        &cfg.workspace.artifact_dir,
        &meta.identifier,
    );
    let input = RunInput {
        metadata: meta,
        bindings: &loaded.matched.bindings,
        unmatched: &loaded.matched.unmatched,
        total_tracks: loaded.total_tracks(),
        image: loaded.resolved.image.as_ref(),
    };

    let result = pipeline.run(&input, visibility)?;
    print_result(&result);

    if result.published.is_empty() {
        return Ok(());
    }
    let sync = playlist::sync(
        &publisher,
        meta,
        &loaded.resolved.tracks,
        &result.published,
        visibility,
    )
    .context("syncing playlist")?;
    println!(
        "Playlist {}{} ({} added)",
        links::playlist_url(&sync.playlist_id),
        if sync.created { " [NEW]" } else { "" },
        sync.inserted
    );
    Ok(())
}

fn confirm(question: &str) -> anyhow::Result<bool> {
    print!("{question} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn print_preview(preview: &Preview) {
    println!("{}", preview.playlist_title);
    println!("  source: {}", preview.source_url);
    if let Some(image) = &preview.image {
        println!("  background: {image}");
    } else {
        println!("  background: none, black frame");
    }
    for track in &preview.tracks {
        let duration = track
            .duration_secs
            .map(|s| format!(" [{}:{:02}]", (s / 60.0) as u64, (s % 60.0) as u64))
            .unwrap_or_default();
        match &track.file {
            Some(file) => println!("  {:>3}. {}{duration}\n       <- {file}", track.number, track.title),
            None => println!("  {:>3}. {}\n       [UNMATCHED] no audio file", track.number, track.title),
        }
    }
    let unmatched: Vec<String> = preview.unmatched().map(|t| t.number.to_string()).collect();
    if !unmatched.is_empty() {
        println!(
            "{} of {} tracks have no audio file and will be skipped: {}",
            unmatched.len(),
            preview.tracks.len(),
            unmatched.join(", ")
        );
    }
}

fn print_result(result: &RunResult) {
    println!(
        "{} published ({} new), {} failed",
        result.published.len(),
        result.newly_published(),
        result.failures.len()
    );
    for item in &result.published {
        let tag = if item.newly_published { "[NEW]" } else { "     " };
        println!(
            "  {tag} {:>3}. {}  {}",
            item.track_number,
            item.title,
            links::video_url(&item.item_id)
        );
    }
    for failure in &result.failures {
        println!(
            "  [FAILED] {:>3}. {} at {}: {}",
            failure.track.number, failure.track.name, failure.stage, failure.error
        );
    }
}
