//! CLI entry point for the guidelines tool.

use anyhow::{Result, bail};
use clap::Parser;
use guidelines_core::service::no_content_message;
use guidelines_core::{GuidelineService, IndexState};
use tracing::{debug, info, warn};

mod cli;

use cli::{Args, Command};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // stdout carries only command output
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let settings = args.settings();
    match &settings.credentials {
        Some(credentials) => {
            info!(username = %credentials.username(), "authentication configured");
        }
        None => {
            warn!("authentication not configured, some documents may be unavailable");
            info!("set NCCN_USERNAME and NCCN_PASSWORD for full access");
        }
    }

    let service = GuidelineService::new(settings);

    match args.command {
        Command::Index { raw } => {
            let refresh = service.start_index_refresh();
            match refresh.wait().await {
                IndexState::Ready {
                    categories,
                    entries,
                } => debug!(categories, entries, "index ready"),
                IndexState::Failed(reason) => bail!(reason),
                IndexState::Pending => {}
            }
            let output = if raw {
                service.raw_index().await?
            } else {
                service.render_index().await?
            };
            println!("{output}");
        }
        Command::Refresh => {
            let catalog = service.refresh_index().await?;
            println!(
                "Guidelines index refreshed: {} categories, {} guidelines",
                catalog.category_count(),
                catalog.entry_count()
            );
        }
        Command::Download { url } => {
            let result = service.download(&url).await;
            let message = service.describe_download(&url, &result);
            if !result.success {
                bail!(message);
            }
            println!("{message}");
        }
        Command::Extract { path, pages } => {
            let (resolved, content) = service.extract(&path, pages.as_deref()).await?;
            if content.is_empty() {
                warn!(path = %resolved.display(), "no content extracted");
                println!("{}", no_content_message(&resolved, pages.as_deref()));
            } else {
                println!("{content}");
            }
        }
    }

    Ok(())
}
