use std::collections::HashSet;

use tracing::{info, warn};
use url::Url;

use crate::fetch::Fetcher;
use crate::parser::normalize::Document;
use crate::settings::DiscoverySettings;

/// Shallow same-site page discovery gated by a path-keyword allowlist.
#[derive(Debug, Clone)]
pub struct Discovery {
    keywords: Vec<String>,
    max_pages: usize,
}

impl Discovery {
    pub fn new(settings: &DiscoverySettings) -> Self {
        Self {
            keywords: settings
                .keywords
                .iter()
                .map(|k| k.trim().trim_matches('/').to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
            max_pages: settings.max_pages.max(1),
        }
    }

    /// Fetch the seed and return the ordered page list, seed first.
    /// A failed seed fetch degrades to `[seed]`.
    pub async fn discover(&self, fetcher: &Fetcher, seed: &Url) -> Vec<Url> {
        info!("Discovering pages from {}", seed);
        match fetcher.fetch(seed.as_str()).await {
            Ok(markup) => {
                let pages = self.select_pages(seed, &markup);
                info!("Discovered {} pages for {}", pages.len(), seed);
                pages
            }
            Err(e) => {
                warn!("Seed fetch failed for {}: {}", seed, e);
                vec![seed.clone()]
            }
        }
    }

    /// Pure link selection over the seed's markup.
    pub fn select_pages(&self, seed: &Url, markup: &str) -> Vec<Url> {
        let hrefs = Document::parse(markup).hrefs();

        let mut pages = vec![seed.clone()];
        let mut seen: HashSet<String> = HashSet::from([seed.as_str().to_string()]);

        for href in hrefs {
            if pages.len() >= self.max_pages {
                break;
            }
            let Ok(mut url) = seed.join(&href) else {
                continue;
            };
            url.set_fragment(None);
            if !matches!(url.scheme(), "http" | "https") || !same_site(seed, &url) {
                continue;
            }
            if !self.path_matches(&url) {
                continue;
            }
            if seen.insert(url.as_str().to_string()) {
                pages.push(url);
            }
        }
        pages
    }

    /// True when any keyword appears as `/<keyword>` in the lower-cased path,
    /// i.e. as a path segment, a segment prefix, or the path suffix.
    fn path_matches(&self, url: &Url) -> bool {
        let path = url.path().to_lowercase();
        self.keywords.iter().any(|k| path.contains(&format!("/{}", k)))
    }
}

/// Exact host (and port) match, case-insensitive. Subdomains are different sites.
fn same_site(seed: &Url, other: &Url) -> bool {
    let host = |u: &Url| u.host_str().map(|h| h.to_ascii_lowercase());
    host(seed).is_some()
        && host(seed) == host(other)
        && seed.port_or_known_default() == other.port_or_known_default()
}
