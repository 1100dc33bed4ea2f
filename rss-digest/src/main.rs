use anyhow::Context;
use clap::{ArgAction, Parser};
use rss_digest::logging;
use rss_digest::{
    Digest, DigestConfig, ExportSettings, Fetcher, PandocConverter, RssFeedSource, RunConfig,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Generate a news digest document from RSS feeds.
#[derive(Parser, Debug)]
#[command(name = "rss-digest", version, about)]
struct Cli {
    /// The title of the document.
    #[arg(short, long)]
    title: Option<String>,

    /// Name of the output file.
    #[arg(short, long, default_value = "output.pdf")]
    output: PathBuf,

    /// Output format (pdf, epub, docx, ...); html writes the raw document.
    #[arg(long, default_value = "pdf")]
    format: String,

    /// Disable the table of contents.
    #[arg(long = "no-toc", action = ArgAction::SetFalse)]
    toc: bool,

    /// Print debug info.
    #[arg(long)]
    debug: bool,

    /// Disable progress bars.
    #[arg(long = "no-progress", action = ArgAction::SetFalse)]
    progress: bool,

    /// Configuration file.
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Additional flags passed verbatim to pandoc, after `--`.
    #[arg(last = true, value_name = "PANDOC_FLAGS")]
    pandoc_args: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.debug);

    info!("Starting RSS digest");

    // Everything that can invalidate the run is checked before any request
    let config = DigestConfig::load(&cli.config)?;
    let collections = config.collections()?;

    let run = RunConfig {
        progress: cli.progress,
        fetch: config.fetch.clone(),
    };
    let fetcher = Arc::new(Fetcher::new(run.fetch.clone())?);
    let feeds = RssFeedSource::new(fetcher.clone());

    let mut digest = Digest::new(run);
    for collection in collections {
        digest.add_collection(collection);
    }

    digest.ingest_all(&feeds, fetcher.as_ref()).await;

    info!("Collection statistics:");
    for collection in digest.collections() {
        let r = collection.report();
        info!(
            "  {}: {} sources read, {} failed, {} admitted, {} duplicates, {} too old, {} fetched, {} fetch failures",
            collection.id,
            r.sources_read,
            r.sources_failed,
            r.admitted,
            r.duplicates,
            r.too_old,
            r.fetched,
            r.fetch_failed
        );
    }

    let settings = ExportSettings::new(&config.general, cli.title, cli.toc, &cli.pandoc_args);
    digest
        .export(&cli.output, &cli.format, &settings, Arc::new(PandocConverter::new()))
        .await
        .with_context(|| format!("exporting {}", cli.output.display()))?;

    info!("RSS digest finished");
    Ok(())
}
