use std::future::Future;
use std::path::{Path, PathBuf};

use anyhow::bail;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, warn};

use crate::classify::Status;
use crate::crawler::{CrawlOutcome, Crawler};
use crate::db::{RecordSink, Upsert};
use crate::dedupe::Deduplicator;
use crate::export;
use crate::record::CompanyRecord;
use crate::settings::OutputSettings;
use crate::target::{self, CrawlTarget, RawTarget};

#[derive(Debug, Default)]
pub struct RunSummary {
    pub total: usize,
    pub qualified: usize,
    pub disqualified: usize,
    pub ambiguous: usize,
    pub errors: usize,
    pub inserted: usize,
    pub updated: usize,
    pub sink_failures: usize,
}

impl RunSummary {
    fn count(&mut self, record: &CompanyRecord) {
        self.total += 1;
        match record.status.unwrap_or(Status::Error) {
            Status::Qualified => self.qualified += 1,
            Status::Disqualified => self.disqualified += 1,
            Status::Ambiguous => self.ambiguous += 1,
            Status::Error => self.errors += 1,
        }
    }

    pub fn print(&self) {
        println!(
            "Crawled {} companies ({} CY, {} CN, {} C?, {} X).",
            self.total, self.qualified, self.disqualified, self.ambiguous, self.errors,
        );
        if self.inserted + self.updated + self.sink_failures > 0 {
            println!(
                "Store: {} inserted, {} updated, {} failed.",
                self.inserted, self.updated, self.sink_failures,
            );
        }
    }
}

pub struct RunReport {
    pub summary: RunSummary,
    pub rows: Vec<Vec<String>>,
    pub csv_path: PathBuf,
}

/// Crawl targets one at a time. Every target yields exactly one row, even
/// when its seed is malformed or its crawl panics. A store failure is logged
/// and skipped, unless `strict`, in which case the run stops after writing the
/// rows gathered so far.
pub async fn run(
    crawler: &Crawler,
    dedup: &Deduplicator,
    output: &OutputSettings,
    targets: &[RawTarget],
    mut sink: Option<&mut dyn RecordSink>,
    strict: bool,
) -> anyhow::Result<RunReport> {
    let schema = &output.schema;
    let out_dir = Path::new(&output.dir);
    let mut raw = export::RawExport::create(out_dir)?;

    let pb = ProgressBar::new(targets.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let mut summary = RunSummary::default();
    let mut rows = Vec::with_capacity(targets.len());
    let mut halted = None;

    for (i, raw_target) in targets.iter().enumerate() {
        pb.set_message(truncate(&raw_target.url, 40));
        let (record, raw_text) = crawl_one(crawler, raw_target).await;

        let units = dedup.dedupe(&raw_text);
        raw.append(&record, &units, i + 1)?;
        rows.push(record.row(schema));
        summary.count(&record);
        pb.inc(1);

        if let Some(s) = sink.as_deref_mut() {
            match s.upsert(&record, schema) {
                Ok(Upsert::Inserted) => summary.inserted += 1,
                Ok(Upsert::Updated) => summary.updated += 1,
                Err(e) if strict => {
                    error!("store rejected {}: {}", record.homepage_url, e);
                    summary.sink_failures += 1;
                    halted = Some(e);
                    break;
                }
                Err(e) => {
                    warn!("store rejected {}: {}", record.homepage_url, e);
                    summary.sink_failures += 1;
                }
            }
        }
    }
    pb.finish_and_clear();

    let csv_path = export::write_csv(out_dir, schema, &rows)?;
    info!("Raw text written to {}", raw.path().display());

    if let Some(e) = halted {
        bail!(
            "run stopped in strict mode after {} of {} targets: {}",
            rows.len(),
            targets.len(),
            e
        );
    }
    Ok(RunReport {
        summary,
        rows,
        csv_path,
    })
}

/// Parse the seed and crawl it in isolation. A malformed seed becomes a
/// failed record without touching the network.
async fn crawl_one(crawler: &Crawler, raw: &RawTarget) -> (CompanyRecord, String) {
    let target = match CrawlTarget::parse(&raw.url, &raw.source) {
        Ok(t) => t,
        Err(e) => {
            warn!("skipping {:?}: {}", raw.url, e);
            let domain = target::best_effort_domain(&raw.url);
            return (CompanyRecord::failed(&raw.url, &domain, &raw.source, e.tag()), String::new());
        }
    };

    let crawl = {
        let crawler = crawler.clone();
        let target = target.clone();
        async move { crawler.crawl(&target).await }
    };
    isolate(&target, crawl).await
}

/// Run a crawl in its own task so a panic anywhere in it becomes an
/// erroneous record instead of ending the run.
async fn isolate<F>(target: &CrawlTarget, crawl: F) -> (CompanyRecord, String)
where
    F: Future<Output = CrawlOutcome> + Send + 'static,
{
    match tokio::spawn(crawl).await {
        Ok(outcome) => (outcome.record, outcome.raw_text),
        Err(e) => {
            error!("crawl of {} aborted: {}", target.url(), e);
            let record =
                CompanyRecord::failed(target.url().as_str(), target.domain(), target.source(), "panic");
            (record, String::new())
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}
