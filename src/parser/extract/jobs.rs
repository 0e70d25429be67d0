use std::collections::BTreeSet;

use regex::{Regex, RegexBuilder};

use crate::settings::ExtractSettings;

pub const OPENINGS_ENTRY: &str = "Openings listed";

/// Job-title matcher for careers pages.
#[derive(Debug, Clone)]
pub struct JobsExtractor {
    url_keywords: Vec<String>,
    titles: Vec<Regex>,
    openings: Option<Regex>,
}

/// `CNC Machinist` -> `\bCNC\s*Machinist\b`, case-insensitive.
fn title_pattern(title: &str) -> Result<Regex, regex::Error> {
    let words: Vec<String> = title.split_whitespace().map(regex::escape).collect();
    RegexBuilder::new(&format!(r"\b{}\b", words.join(r"\s*")))
        .case_insensitive(true)
        .build()
}

impl JobsExtractor {
    pub fn new(settings: &ExtractSettings) -> Result<Self, regex::Error> {
        let titles = settings
            .job_titles
            .iter()
            .filter(|t| !t.trim().is_empty())
            .map(|t| title_pattern(t))
            .collect::<Result<Vec<_>, _>>()?;

        let phrases: Vec<String> = settings
            .opening_phrases
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .map(regex::escape)
            .collect();
        let openings = if phrases.is_empty() {
            None
        } else {
            Some(
                RegexBuilder::new(&format!(r"\b(?:{})\b", phrases.join("|")))
                    .case_insensitive(true)
                    .build()?,
            )
        };

        Ok(Self {
            url_keywords: settings
                .job_url_keywords
                .iter()
                .map(|k| k.to_lowercase())
                .collect(),
            titles,
            openings,
        })
    }

    pub fn is_jobs_url(&self, url: &str) -> bool {
        let path = url::Url::parse(url)
            .map(|u| u.path().to_lowercase())
            .unwrap_or_else(|_| url.to_lowercase());
        self.url_keywords.iter().any(|k| path.contains(k.as_str()))
    }

    /// `"; "`-joined sorted titles as written on the page; only for careers URLs.
    pub fn extract(&self, url: &str, text: &str) -> Option<String> {
        if !self.is_jobs_url(url) {
            return None;
        }
        let mut titles: BTreeSet<String> = self
            .titles
            .iter()
            .flat_map(|re| re.find_iter(text).map(|m| m.as_str().to_string()))
            .collect();
        if self.openings.as_ref().is_some_and(|re| re.is_match(text)) {
            titles.insert(OPENINGS_ENTRY.to_string());
        }
        (!titles.is_empty()).then(|| titles.into_iter().collect::<Vec<_>>().join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;

    fn jobs() -> JobsExtractor {
        JobsExtractor::new(&Settings::defaults().unwrap().extract).unwrap()
    }

    #[test]
    fn only_runs_on_careers_urls() {
        let text = "Now hiring a CNC Machinist";
        assert_eq!(jobs().extract("https://acme.com/about", text), None);
        assert!(jobs().extract("https://acme.com/careers", text).is_some());
        // keyword in the host is not a careers page
        assert_eq!(jobs().extract("https://jobs-shop.com/", text), None);
    }

    #[test]
    fn titles_and_openings() {
        let text = "Open roles: CNC Machinist (2nd shift), Quality Engineer. Apply now!";
        let out = jobs().extract("https://acme.com/careers/", text).unwrap();
        assert_eq!(
            out,
            "CNC Machinist; Engineer; Machinist; Openings listed; Quality Engineer"
        );
    }

    #[test]
    fn careers_page_without_matches() {
        assert_eq!(jobs().extract("https://acme.com/jobs", "Check back later."), None);
    }
}
