mod cards;
mod catalog;
mod config;
mod download;
mod error;
mod manifest;
mod pages;
mod parser;
mod pipeline;
mod store;
mod utils;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use crate::config::Settings;
use crate::pages::IssuePages;
use crate::store::CardStore;

#[derive(Parser)]
#[command(name = "nucleus_cards", about = "Turn The Nucleus PDF archive into article cards")]
struct Cli {
    /// Output root for the catalog, cards and manifest
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Scratch root for PDFs and intermediate article files
    #[arg(long, global = true)]
    work_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape the archive page into the issue catalog
    Catalog,
    /// Download every catalogued PDF not already on disk
    Download,
    /// Segment downloaded issues into article files
    Split,
    /// Build cards and the manifest from article files
    Cards,
    /// Split + cards in one pass (PDFs must already be downloaded)
    Run,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load()
        .context("failed to load settings")?
        .with_overrides(cli.data_dir, cli.work_dir);

    let result = match cli.command {
        Commands::Catalog => {
            let issues = catalog::scrape_catalog(&settings).await?;
            if issues.is_empty() {
                bail!("no issues found at {}", settings.archive_url);
            }
            catalog::save_catalog(&settings.issues_path(), &issues)?;
            println!(
                "Saved {} issues to {}",
                issues.len(),
                settings.issues_path().display()
            );
            Ok(())
        }
        Commands::Download => {
            let issues = catalog::load_catalog(&settings.issues_path())?;
            println!("Downloading {} issues...", issues.len());
            let stats = download::download_issues(&settings, &issues).await?;
            println!(
                "Done: {} issues ({} downloaded, {} already present, {} failed).",
                stats.total, stats.downloaded, stats.cached, stats.failed
            );
            Ok(())
        }
        Commands::Split => {
            let issues = catalog::load_catalog(&settings.issues_path())?;
            let source = IssuePages::new(settings.pdf_dir());
            println!("Splitting {} issues...", issues.len());
            let report = pipeline::run_split(&issues, &source, &settings.articles_dir());
            report.print();
            Ok(())
        }
        Commands::Cards => {
            let articles_dir = settings.articles_dir();
            if !articles_dir.is_dir() {
                bail!("no article files in {}. Run 'split' first.", articles_dir.display());
            }
            let files = store::list_issue_articles(&articles_dir)?;
            println!("Building cards for {} issues...", files.len());
            let report = pipeline::run_cards(
                &files,
                &CardStore::from_settings(&settings),
                &settings.manifest_path(),
            )
            .context("failed to write manifest")?;
            report.print();
            Ok(())
        }
        Commands::Run => {
            let issues = catalog::load_catalog(&settings.issues_path())?;
            let source = IssuePages::new(settings.pdf_dir());
            println!("Pipeline: {} issues...", issues.len());
            let report = pipeline::run_all(
                &issues,
                &source,
                &CardStore::from_settings(&settings),
                &settings.manifest_path(),
            )
            .context("failed to write manifest")?;
            report.print();
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
