pub mod company;
pub mod contact;
pub mod founded;
pub mod jobs;
pub mod ownership;
pub mod signals;

use crate::parser::normalize::Document;
use crate::settings::{ExtractSettings, SignalSettings};

use company::ListExtractor;
use contact::Address;
use founded::Founded;
use jobs::JobsExtractor;
use ownership::Ownership;
use signals::{CapabilityFlags, SignalHits, SignalMatcher};

/// Everything the extractors found on one page. Each field is independent;
/// merging across pages happens in the company record.
#[derive(Debug, Clone, Default)]
pub struct PageFindings {
    pub company_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<Address>,
    pub industries: Option<String>,
    pub services: Option<String>,
    pub facility_sqft: Option<String>,
    pub employees: Option<String>,
    pub founded: Option<Founded>,
    pub ownership: Ownership,
    pub signals: SignalHits,
    pub jobs: Option<String>,
    pub flags: CapabilityFlags,
}

/// The configured extractor set. Vocabularies are compiled once here and
/// injected; extractors hold no state between pages.
#[derive(Debug, Clone)]
pub struct Extractors {
    industries: ListExtractor,
    services: ListExtractor,
    jobs: JobsExtractor,
    signals: SignalMatcher,
    revenue_per_employee: u64,
}

impl Extractors {
    pub fn new(extract: &ExtractSettings, signals: &SignalSettings) -> Result<Self, regex::Error> {
        Ok(Self {
            industries: ListExtractor::new(
                &extract.industry_headings,
                &extract.industry_words,
                extract.max_list_items,
            )?,
            services: ListExtractor::new(
                &extract.service_headings,
                &extract.service_words,
                extract.max_list_items,
            )?,
            jobs: JobsExtractor::new(extract)?,
            signals: SignalMatcher::new(signals)?,
            revenue_per_employee: extract.revenue_per_employee,
        })
    }

    pub fn signals(&self) -> &SignalMatcher {
        &self.signals
    }

    pub fn revenue_per_employee(&self) -> u64 {
        self.revenue_per_employee
    }

    pub fn extract_all(&self, url: &str, doc: &Document, text: &str, current_year: i32) -> PageFindings {
        PageFindings {
            company_name: company::company_name(doc),
            phone: contact::find_phone(text),
            address: contact::find_address(text),
            industries: self.industries.extract(text),
            services: self.services.extract(text),
            facility_sqft: company::facility_sqft(text),
            employees: company::employee_count(text),
            founded: founded::year_established(text, current_year),
            ownership: ownership::ownership(text),
            signals: self.signals.detect(text),
            jobs: self.jobs.extract(url, text),
            flags: signals::capability_flags(text),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::parser::normalize::normalize;
    use crate::settings::Settings;

    pub(crate) fn extractors() -> Extractors {
        let s = Settings::defaults().unwrap();
        Extractors::new(&s.extract, &s.signals).unwrap()
    }

    pub(crate) fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}.html", name)).unwrap()
    }

    fn run(name: &str, url: &str) -> PageFindings {
        let html = fixture(name);
        let doc = Document::parse(&html);
        extractors().extract_all(url, &doc, &normalize(&html), 2026)
    }

    #[test]
    fn homepage_fixture() {
        let f = run("home", "https://example-shop.com/");
        assert_eq!(f.company_name.as_deref(), Some("Example Shop Precision Molding"));
        assert_eq!(f.phone.as_deref(), Some("(608) 555-0142"));
        let a = f.address.unwrap();
        assert_eq!(a.street, "4100 Commerce Dr");
        assert_eq!(a.city, "Madison");
        assert_eq!(a.state, "WI");
        assert_eq!(a.zip, "53704");
        assert_eq!(f.founded.as_ref().map(|y| y.year), Some(1987));
        assert_eq!(f.ownership.owner.as_deref(), Some("Jane Doe"));
        assert!(f.ownership.family);
        assert!(f.signals.equipment.contains("Haas"));
        assert!(f.flags.cnc_5axis);
        // not a careers URL
        assert_eq!(f.jobs, None);
    }

    #[test]
    fn about_fixture() {
        let f = run("about", "https://example-shop.com/about");
        assert_eq!(f.employees.as_deref(), Some("45"));
        assert_eq!(f.facility_sqft.as_deref(), Some("30000"));
        assert_eq!(
            f.industries.as_deref(),
            Some("Medical, Aerospace, Automotive, Consumer electronics")
        );
        assert!(f.signals.targets.contains("medical device"));
        assert!(f.flags.spares_repairs);
    }

    #[test]
    fn careers_fixture() {
        let f = run("careers", "https://example-shop.com/careers");
        let jobs = f.jobs.unwrap();
        assert!(jobs.contains("CNC Machinist"));
        assert!(jobs.contains("Openings listed"));
    }
}
