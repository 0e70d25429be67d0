mod classify;
mod crawler;
mod db;
mod dedupe;
mod discovery;
mod evidence;
mod export;
mod fetch;
mod parser;
mod record;
mod runner;
mod settings;
mod target;

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crawler::Crawler;
use db::{RecordSink, SqliteSink};
use dedupe::Deduplicator;
use settings::Settings;
use target::CrawlTarget;

const DEFAULT_URLS_PATH: &str = "config/urls.txt";

#[derive(Parser)]
#[command(name = "site_intel", about = "Company website crawler and qualifier")]
struct Cli {
    /// Config file layered over the built-in defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl every target and write CSV + raw text exports
    Crawl {
        /// Targets file: one `url` or `url | source` per line
        #[arg(long, default_value = DEFAULT_URLS_PATH)]
        urls: PathBuf,
        /// Source label applied to every target
        #[arg(long)]
        source: Option<String>,
        /// Max targets to crawl (default: all)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Upsert each record into the local store
        #[arg(long)]
        sink: bool,
        /// Stop the run when the store rejects a record
        #[arg(long)]
        strict: bool,
    },
    /// Print the pages that would be crawled for one seed
    Discover { url: String },
    /// Record counts per status in the local store
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    let log_path = settings.output.log_path();
    let (file_layer, log_error) = match open_log(&log_path) {
        Ok(file) => (
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file))),
            None,
        ),
        Err(e) => (None, Some(e)),
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(fmt::layer())
        .with(file_layer)
        .init();
    if let Some(e) = log_error {
        warn!("run log {} unavailable: {}", log_path.display(), e);
    }

    let result = match cli.command {
        Commands::Crawl {
            urls,
            source,
            limit,
            sink,
            strict,
        } => {
            let mut targets = target::read_targets(&urls)?;
            if let Some(label) = &source {
                for t in &mut targets {
                    t.source = label.clone();
                }
            }
            if let Some(n) = limit {
                targets.truncate(n);
            }
            if targets.is_empty() {
                println!("No targets in {}.", urls.display());
                return Ok(());
            }
            let use_sink = sink || settings.sink.enabled;
            let strict = strict || settings.sink.strict;

            let crawler = Crawler::new(&settings)?;
            let dedup = Deduplicator::new(&settings.dedupe)?;
            let mut store = if use_sink {
                match SqliteSink::open(Path::new(&settings.sink.path)) {
                    Ok(s) => Some(s),
                    Err(e) if strict => return Err(e.into()),
                    Err(e) => {
                        warn!("store unavailable, continuing with local output only: {}", e);
                        None
                    }
                }
            } else {
                None
            };

            let report = runner::run(
                &crawler,
                &dedup,
                &settings.output,
                &targets,
                store.as_mut().map(|s| s as &mut dyn RecordSink),
                strict,
            )
            .await?;
            println!("Wrote {} rows to {}", report.rows.len(), report.csv_path.display());
            report.summary.print();
            Ok(())
        }
        Commands::Discover { url } => {
            let target = CrawlTarget::parse(&url, "")
                .with_context(|| format!("invalid seed: {}", url))?;
            let crawler = Crawler::new(&settings)?;
            let pages = crawler
                .discovery()
                .discover(crawler.fetcher(), target.url())
                .await;
            for (i, page) in pages.iter().enumerate() {
                println!("{:>3}  {}", i + 1, page);
            }
            Ok(())
        }
        Commands::Stats => {
            let sink = SqliteSink::open(Path::new(&settings.sink.path))?;
            let s = sink.stats()?;
            println!("Total:     {}", s.total);
            for (status, count) in &s.by_status {
                println!("{:<10} {}", format!("{}:", status), count);
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

/// Run log shared by every invocation; appended to, never truncated.
fn open_log(path: &Path) -> std::io::Result<File> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
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
