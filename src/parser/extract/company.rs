use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::parser::normalize::Document;

const NAME_MAX_CHARS: usize = 160;

static TITLE_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(?:home|welcome)\s*\|\s*").unwrap());
static TITLE_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*\|\s*(?:home|welcome|official site).*$").unwrap());
static LIST_SEP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[•|\n;,]+").unwrap());
static SQFT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,3}(?:,\d{3})+|\d{3,7})\s*(?:sq\.?\s*ft\b|square\s*f(?:ee|oo)t\b|ft²)").unwrap()
});
static EMPLOYEES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,3}(?:,\d{3})+|\d{1,5})\+?\s+(?:full[- ]time\s+)?(?:employees|team members|staff|people|associates)\b").unwrap()
});

/// Document title minus "Home |" / "| Official Site" boilerplate, else first `<h1>`.
pub fn company_name(doc: &Document) -> Option<String> {
    let from_title = doc.title().map(|t| {
        let t = TITLE_PREFIX_RE.replace(&t, "");
        TITLE_SUFFIX_RE.replace(&t, "").trim().to_string()
    });
    from_title
        .filter(|t| !t.is_empty())
        .or_else(|| doc.first_heading())
        .map(|n| n.chars().take(NAME_MAX_CHARS).collect())
}

/// Vocabulary-gated list capture after a heading such as "Industries" or
/// "Capabilities". Compiled once from configured word lists.
#[derive(Debug, Clone)]
pub struct ListExtractor {
    heading: Regex,
    vocab: Regex,
    max_items: usize,
}

impl ListExtractor {
    pub fn new(headings: &[String], words: &[String], max_items: usize) -> Result<Self, regex::Error> {
        let heading = Regex::new(&format!(
            r"(?i)\b(?:{})\b[:\-]?\s*([^.|]{{20,200}})",
            alternation(headings)
        ))?;
        let vocab = Regex::new(&format!("(?i)(?:{})", alternation(words)))?;
        Ok(Self {
            heading,
            vocab,
            max_items,
        })
    }

    /// Comma-joined, order-preserving, case-insensitively de-duplicated items.
    pub fn extract(&self, text: &str) -> Option<String> {
        let mut items: Vec<&str> = Vec::new();
        if let Some(caps) = self.heading.captures(text) {
            let span = caps.get(1).map_or("", |m| m.as_str());
            items = self.vocab_items(span);
        }
        if items.is_empty() {
            items = self.vocab_items(text);
        }

        let mut seen = HashSet::new();
        let out: Vec<&str> = items
            .into_iter()
            .filter(|it| seen.insert(it.to_lowercase()))
            .take(self.max_items)
            .collect();
        (!out.is_empty()).then(|| out.join(", "))
    }

    fn vocab_items<'a>(&self, span: &'a str) -> Vec<&'a str> {
        LIST_SEP_RE
            .split(span)
            .map(str::trim)
            .filter(|p| (2..=80).contains(&p.chars().count()) && self.vocab.is_match(p))
            .collect()
    }
}

/// Facility size in square feet, digits only.
pub fn facility_sqft(text: &str) -> Option<String> {
    SQFT_RE.captures(text).map(|c| c[1].replace(',', ""))
}

/// Headcount, digits only.
pub fn employee_count(text: &str) -> Option<String> {
    EMPLOYEES_RE
        .captures(text)
        .map(|c| c[1].replace(',', ""))
        .filter(|n| n.parse::<u64>().is_ok_and(|v| v > 0))
}

/// `employees * per_head` as `$N,NNN (est)`. Non-numeric input yields `None`.
pub fn estimated_revenue(employees: &str, per_head: u64) -> Option<String> {
    let n: u64 = employees.trim().parse().ok()?;
    Some(format!("${} (est)", thousands(n.checked_mul(per_head)?)))
}

fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub(crate) fn alternation(words: &[String]) -> String {
    words
        .iter()
        .map(|w| w.trim())
        .filter(|w| !w.is_empty())
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;

    fn industries() -> ListExtractor {
        let s = Settings::defaults().unwrap().extract;
        ListExtractor::new(&s.industry_headings, &s.industry_words, s.max_list_items).unwrap()
    }

    fn services() -> ListExtractor {
        let s = Settings::defaults().unwrap().extract;
        ListExtractor::new(&s.service_headings, &s.service_words, s.max_list_items).unwrap()
    }

    #[test]
    fn name_from_title_without_boilerplate() {
        let doc = Document::parse("<title>Home | Acme Tool &amp; Die</title><h1>Welcome</h1>");
        assert_eq!(company_name(&doc).as_deref(), Some("Acme Tool & Die"));
        let doc = Document::parse("<title>Precision Molds Inc | Official Site</title>");
        assert_eq!(company_name(&doc).as_deref(), Some("Precision Molds Inc"));
    }

    #[test]
    fn name_falls_back_to_h1() {
        let doc = Document::parse("<title>Home | </title><h1>Midwest Mold</h1>");
        assert_eq!(company_name(&doc).as_deref(), Some("Midwest Mold"));
        assert_eq!(company_name(&Document::parse("<p>nothing</p>")), None);
    }

    #[test]
    fn industries_after_heading() {
        let text = "Industries: Aerospace, Medical Devices, Automotive, Toys. Contact us.";
        assert_eq!(
            industries().extract(text).as_deref(),
            Some("Aerospace, Medical Devices, Automotive")
        );
    }

    #[test]
    fn industries_fallback_scans_full_text_and_dedupes() {
        let text = "Quality first | medical | Defense contracts; MEDICAL | gardening";
        assert_eq!(industries().extract(text).as_deref(), Some("medical, Defense contracts"));
    }

    #[test]
    fn services_capped() {
        let mut s = Settings::defaults().unwrap().extract;
        s.max_list_items = 2;
        let ex = ListExtractor::new(&s.service_headings, &s.service_words, s.max_list_items).unwrap();
        let text = "Capabilities: CNC machining, wire EDM, surface grinding, mold design and more";
        assert_eq!(ex.extract(text).as_deref(), Some("CNC machining, wire EDM"));
        assert_eq!(services().extract("We bake bread, cakes, pies"), None);
    }

    #[test]
    fn facility_and_employees() {
        assert_eq!(facility_sqft("a 45,000 sq. ft. plant").as_deref(), Some("45000"));
        assert_eq!(facility_sqft("our 12000 square feet facility").as_deref(), Some("12000"));
        assert_eq!(facility_sqft("no size given"), None);
        assert_eq!(employee_count("over 120 employees strong").as_deref(), Some("120"));
        assert_eq!(employee_count("1,250 team members").as_deref(), Some("1250"));
        assert_eq!(employee_count("our people matter"), None);
    }

    #[test]
    fn revenue_estimate() {
        assert_eq!(estimated_revenue("45", 200_000).as_deref(), Some("$9,000,000 (est)"));
        assert_eq!(estimated_revenue("3", 200_000).as_deref(), Some("$600,000 (est)"));
        assert_eq!(estimated_revenue("", 200_000), None);
        assert_eq!(estimated_revenue("n/a", 200_000), None);
    }
}
