use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{Datelike, Utc};
use tracing::{info, warn};

use crate::classify::StatusPolicy;
use crate::discovery::Discovery;
use crate::evidence::HtmlEvidence;
use crate::fetch::Fetcher;
use crate::parser::extract::Extractors;
use crate::parser::process_page;
use crate::record::CompanyRecord;
use crate::settings::Settings;
use crate::target::CrawlTarget;

/// Result of crawling one company: the merged record and the raw text of
/// every page that was fetched, in visit order.
pub struct CrawlOutcome {
    pub record: CompanyRecord,
    pub raw_text: String,
}

/// Per-company crawl driver. Cheap to clone; all vocabularies are shared.
#[derive(Clone)]
pub struct Crawler {
    fetcher: Fetcher,
    discovery: Arc<Discovery>,
    extractors: Arc<Extractors>,
    strong_targets: Arc<BTreeSet<String>>,
    policy: StatusPolicy,
    evidence: Option<Arc<HtmlEvidence>>,
}

impl Crawler {
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        let fetcher = Fetcher::new(&settings.fetch)?;
        let extractors = Extractors::new(&settings.extract, &settings.signals)?;
        let crawler = Self::from_parts(
            fetcher,
            Discovery::new(&settings.discovery),
            extractors,
            settings.signals.status_policy,
        );
        Ok(if settings.output.save_html {
            crawler.with_evidence(HtmlEvidence::new(&settings.output.evidence_dir))
        } else {
            crawler
        })
    }

    pub fn from_parts(
        fetcher: Fetcher,
        discovery: Discovery,
        extractors: Extractors,
        policy: StatusPolicy,
    ) -> Self {
        let strong_targets = Arc::new(extractors.signals().strong_targets().clone());
        Self {
            fetcher,
            discovery: Arc::new(discovery),
            extractors: Arc::new(extractors),
            strong_targets,
            policy,
            evidence: None,
        }
    }

    /// Also keep the raw HTML of every fetched page.
    pub fn with_evidence(mut self, evidence: HtmlEvidence) -> Self {
        self.evidence = Some(Arc::new(evidence));
        self
    }

    pub fn discovery(&self) -> &Discovery {
        &self.discovery
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// Visit every discovered page once, in order, and merge what each one
    /// yields. A failed page flags the company and the crawl moves on.
    pub async fn crawl(&self, target: &CrawlTarget) -> CrawlOutcome {
        let current_year = Utc::now().year();
        let homepage = target.url().as_str();
        let mut record = CompanyRecord::new(homepage, target.domain(), target.source());
        let mut raw_text = String::new();

        let pages = self.discovery.discover(&self.fetcher, target.url()).await;
        info!("{}: {} page(s) to visit", target.domain(), pages.len());
        record.pages = pages.iter().map(|p| p.to_string()).collect();

        for (i, page) in pages.iter().enumerate() {
            let url = page.as_str();
            match self.fetcher.fetch(url).await {
                Ok(markup) => {
                    if let Some(evidence) = &self.evidence {
                        evidence.save(target.domain(), url, &markup);
                    }
                    let processed = process_page(&self.extractors, url, &markup, current_year);
                    info!("[{}/{}] {} ({} chars)", i + 1, pages.len(), url, processed.text.len());
                    record.merge_page(
                        url,
                        processed.findings,
                        current_year,
                        self.extractors.revenue_per_employee(),
                    );
                    if !raw_text.is_empty() {
                        raw_text.push('\n');
                    }
                    raw_text.push_str(&processed.text);
                }
                Err(e) => {
                    warn!("[{}/{}] {} failed: {}", i + 1, pages.len(), url, e);
                    record.record_error(url, e.tag());
                }
            }
        }

        let status = record.finalize(&self.strong_targets, self.policy);
        info!(
            "{}: {} ({} ok, {} failed)",
            target.domain(),
            status,
            pages.len() - record.errors.len(),
            record.errors.len()
        );
        CrawlOutcome { record, raw_text }
    }
}
