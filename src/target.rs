use std::path::Path;

use anyhow::{Context, Result};
use thiserror::Error;
use url::Url;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TargetError {
    #[error("empty seed url")]
    Empty,
    #[error("unparseable seed url '{0}': {1}")]
    Unparseable(String, String),
    #[error("seed url '{0}' has no host")]
    NoHost(String),
}

impl TargetError {
    pub fn tag(&self) -> &'static str {
        match self {
            TargetError::Empty => "empty_seed",
            TargetError::Unparseable(..) => "invalid_seed",
            TargetError::NoHost(_) => "invalid_seed",
        }
    }
}

/// A seed to crawl, as read from the targets file.
#[derive(Debug, Clone)]
pub struct RawTarget {
    pub url: String,
    pub source: String,
}

/// A validated seed. Immutable once built.
#[derive(Debug, Clone)]
pub struct CrawlTarget {
    url: Url,
    domain: String,
    source: String,
}

impl CrawlTarget {
    pub fn parse(raw: &str, source: &str) -> Result<Self, TargetError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(TargetError::Empty);
        }
        let with_scheme = with_scheme(raw);
        let url = Url::parse(&with_scheme)
            .map_err(|e| TargetError::Unparseable(raw.to_string(), e.to_string()))?;
        let domain = match url.host_str() {
            Some(host) if !host.is_empty() => domain_of_host(host),
            _ => return Err(TargetError::NoHost(raw.to_string())),
        };
        Ok(Self {
            url,
            domain,
            source: source.trim().to_string(),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Prefix `https://` unless the seed already carries an http(s) scheme.
pub fn with_scheme(raw: &str) -> String {
    let lower = raw.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    }
}

fn domain_of_host(host: &str) -> String {
    let host = host.to_ascii_lowercase();
    host.strip_prefix("www.").map(str::to_string).unwrap_or(host)
}

/// Domain identity for seeds that failed to parse. Falls back to a crude
/// split so the erroneous record still carries something recognisable.
pub fn best_effort_domain(raw: &str) -> String {
    let with_scheme = with_scheme(raw.trim());
    if let Some(host) = Url::parse(&with_scheme).ok().and_then(|u| u.host_str().map(String::from)) {
        return domain_of_host(&host);
    }
    let host = with_scheme
        .split("//")
        .nth(1)
        .unwrap_or("")
        .split(['/', '?', '#'])
        .next()
        .unwrap_or("");
    domain_of_host(host)
}

/// Parse targets-file content: `url` or `url | source`, `#` comments.
pub fn parse_targets(content: &str) -> Vec<RawTarget> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(|l| match l.split_once('|') {
            Some((url, source)) => RawTarget {
                url: url.trim().to_string(),
                source: source.trim().to_string(),
            },
            None => RawTarget {
                url: l.to_string(),
                source: String::new(),
            },
        })
        .collect()
}

pub fn read_targets(path: &Path) -> Result<Vec<RawTarget>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read targets file: {}", path.display()))?;
    Ok(parse_targets(&content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_host_gets_https() {
        let t = CrawlTarget::parse("example-shop.com", "Manual").unwrap();
        assert_eq!(t.url().as_str(), "https://example-shop.com/");
        assert_eq!(t.domain(), "example-shop.com");
        assert_eq!(t.source(), "Manual");
    }

    #[test]
    fn www_is_stripped_and_host_lowercased() {
        let t = CrawlTarget::parse("http://WWW.Acme-Tool.com/home", "").unwrap();
        assert_eq!(t.url().scheme(), "http");
        assert_eq!(t.domain(), "acme-tool.com");
    }

    #[test]
    fn malformed_seeds() {
        assert_eq!(CrawlTarget::parse("   ", "").unwrap_err(), TargetError::Empty);
        let err = CrawlTarget::parse("http://exa mple.com", "").unwrap_err();
        assert_eq!(err.tag(), "invalid_seed");
    }

    #[test]
    fn best_effort_domain_handles_garbage() {
        assert_eq!(best_effort_domain("www.Foo.com/about"), "foo.com");
        assert_eq!(best_effort_domain("bad host.com/x"), "bad host.com");
    }

    #[test]
    fn targets_file_lines() {
        let content = "# header\n\nacme.com | AMBA\n  https://b.example.org  \n";
        let targets = parse_targets(content);
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].url, "acme.com");
        assert_eq!(targets[0].source, "AMBA");
        assert_eq!(targets[1].url, "https://b.example.org");
        assert_eq!(targets[1].source, "");
    }
}
