mod batch;
mod config;
mod lyrics;
mod tag;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use batch::{Outcome, Processor};
use lyrics::{CleanRules, Resolver, ResolverConfig};

#[derive(Debug, Parser)]
#[command(name = "verse", version, about = "Fetch song lyrics and embed them into MP3 tags")]
struct Cli {
    /// MP3 file or directory to process.
    path: std::path::PathBuf,

    /// Genius API token (defaults to $GENIUS_ACCESS_TOKEN or the config file).
    #[arg(short, long)]
    token: Option<String>,

    /// Replace lyrics tags that are already present.
    #[arg(short, long)]
    overwrite: bool,

    /// Number of files processed concurrently.
    #[arg(short = 'j', long)]
    workers: Option<usize>,

    /// Override config file path.
    #[arg(long)]
    config: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref()).context("load config")?;

    let token = cli
        .token
        .or_else(|| std::env::var("GENIUS_ACCESS_TOKEN").ok())
        .or(cfg.genius.token)
        .filter(|token| !token.trim().is_empty());
    if token.is_none() {
        tracing::warn!("no Genius token; primary source disabled");
    }

    let resolver = Resolver::new(&ResolverConfig {
        genius_token: token,
    });
    let workers = cli.workers.unwrap_or(cfg.batch.workers);
    let processor = Processor::new(resolver, CleanRules::default(), cli.overwrite, workers);

    let (reports, summary) = processor.run(&cli.path).await?;

    for report in &reports {
        match &report.outcome {
            Outcome::Failed { reason } => println!(
                "{:<10} {} ({reason})",
                report.outcome.label(),
                report.path.display()
            ),
            _ => println!("{:<10} {}", report.outcome.label(), report.path.display()),
        }
    }
    println!(
        "{} written, {} skipped, {} without lyrics, {} failed ({} files)",
        summary.written,
        summary.skipped,
        summary.not_found,
        summary.failed,
        summary.total()
    );
    Ok(())
}
