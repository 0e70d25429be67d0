use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use url::Url;

/// Raw HTML of every fetched page, kept under `<root>/<domain>/pages/`.
#[derive(Debug, Clone)]
pub struct HtmlEvidence {
    root: PathBuf,
}

/// `/about/team/` -> `about_team.html`; the site root is `index.html`.
pub fn page_file_name(url: &str) -> String {
    let path = Url::parse(url).map(|u| u.path().to_string()).unwrap_or_default();
    let name = path.trim_matches('/').replace('/', "_");
    if name.is_empty() {
        "index.html".to_string()
    } else {
        format!("{}.html", name)
    }
}

impl HtmlEvidence {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn page_path(&self, domain: &str, url: &str) -> PathBuf {
        self.root.join(domain).join("pages").join(page_file_name(url))
    }

    /// Best effort: a failed write is logged and the crawl carries on.
    pub fn save(&self, domain: &str, url: &str, html: &str) -> Option<PathBuf> {
        if html.is_empty() {
            return None;
        }
        let path = self.page_path(domain, url);
        match write_page(&path, html) {
            Ok(()) => {
                debug!("Saved {} to {}", url, path.display());
                Some(path)
            }
            Err(e) => {
                warn!("could not save html for {} to {}: {}", url, path.display(), e);
                None
            }
        }
    }
}

fn write_page(path: &Path, html: &str) -> std::io::Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(path, html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_names_follow_the_path() {
        assert_eq!(page_file_name("https://acme.com/"), "index.html");
        assert_eq!(page_file_name("https://acme.com"), "index.html");
        assert_eq!(page_file_name("https://acme.com/about"), "about.html");
        assert_eq!(page_file_name("https://acme.com/about/team/?x=1"), "about_team.html");
    }

    #[test]
    fn saves_under_domain_pages() {
        let dir = TempDir::new().unwrap();
        let ev = HtmlEvidence::new(dir.path());
        let path = ev.save("acme.com", "https://acme.com/careers", "<p>hi</p>").unwrap();
        assert_eq!(path, dir.path().join("acme.com/pages/careers.html"));
        assert_eq!(fs::read_to_string(path).unwrap(), "<p>hi</p>");
        assert_eq!(ev.save("acme.com", "https://acme.com/", ""), None);
    }

    #[test]
    fn write_failure_is_not_fatal() {
        let dir = TempDir::new().unwrap();
        // a file where the domain directory should be
        fs::write(dir.path().join("acme.com"), "x").unwrap();
        let ev = HtmlEvidence::new(dir.path());
        assert_eq!(ev.save("acme.com", "https://acme.com/about", "<p>hi</p>"), None);
    }
}
