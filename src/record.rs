//! Per-company record and the cross-page merge policy.
//!
//! Scalar fields are plain strings where empty means "not found yet"; they are
//! only ever written through [`fill`], so the first non-empty value wins.
//! Signal fields are sets and only grow.

use std::collections::BTreeSet;

use chrono::{DateTime, Local};

use crate::classify::{classify, Status, StatusPolicy};
use crate::parser::extract::signals::SignalHits;
use crate::parser::extract::{company, PageFindings};

const TIMESTAMP_FMT: &str = "%m/%d/%Y %H:%M";
const FLAG_YES: &str = "Y";

/// Set `slot` to `value` only if `slot` is empty and `value` is not.
/// Returns whether the write happened.
pub fn fill(slot: &mut String, value: impl Into<String>) -> bool {
    if !slot.is_empty() {
        return false;
    }
    let value = value.into();
    if value.trim().is_empty() {
        return false;
    }
    *slot = value;
    true
}

/// Accumulated qualification evidence for one company.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignalSet {
    pub equipment: BTreeSet<String>,
    pub targets: BTreeSet<String>,
    pub disqualifiers: BTreeSet<String>,
}

impl SignalSet {
    pub fn absorb(&mut self, hits: SignalHits) {
        self.equipment.extend(hits.equipment);
        self.targets.extend(hits.targets);
        self.disqualifiers.extend(hits.disqualifiers);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageError {
    pub url: String,
    pub tag: String,
}

#[derive(Debug, Clone)]
pub struct CompanyRecord {
    pub company_name: String,
    pub homepage_url: String,
    pub domain: String,
    pub source: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub phone: String,
    pub industries: String,
    pub services: String,
    pub facility_sqft: String,
    pub employees: String,
    pub revenue: String,
    pub year_established: String,
    pub years_of_operation: String,
    pub year_evidence_url: String,
    pub year_evidence_snippet: String,
    pub owner: String,
    pub owner_status: String,
    pub ownership: String,
    pub owner_evidence_url: String,
    pub family_business: String,
    pub cnc_3axis: String,
    pub cnc_5axis: String,
    pub spares_repairs: String,
    pub jobs: String,
    pub signals: SignalSet,
    pub status: Option<Status>,
    pub pages: Vec<String>,
    pub errors: Vec<PageError>,
    pub first_seen: DateTime<Local>,
    pub last_seen: DateTime<Local>,
}

impl CompanyRecord {
    pub fn new(homepage_url: &str, domain: &str, source: &str) -> Self {
        let now = Local::now();
        Self {
            company_name: String::new(),
            homepage_url: homepage_url.to_string(),
            domain: domain.to_string(),
            source: source.to_string(),
            street: String::new(),
            city: String::new(),
            state: String::new(),
            zip: String::new(),
            phone: String::new(),
            industries: String::new(),
            services: String::new(),
            facility_sqft: String::new(),
            employees: String::new(),
            revenue: String::new(),
            year_established: String::new(),
            years_of_operation: String::new(),
            year_evidence_url: String::new(),
            year_evidence_snippet: String::new(),
            owner: String::new(),
            owner_status: String::new(),
            ownership: String::new(),
            owner_evidence_url: String::new(),
            family_business: String::new(),
            cnc_3axis: String::new(),
            cnc_5axis: String::new(),
            spares_repairs: String::new(),
            jobs: String::new(),
            signals: SignalSet::default(),
            status: None,
            pages: Vec::new(),
            errors: Vec::new(),
            first_seen: now,
            last_seen: now,
        }
    }

    /// Minimal record for a target that could not be crawled at all.
    pub fn failed(homepage_url: &str, domain: &str, source: &str, tag: &str) -> Self {
        let mut rec = Self::new(homepage_url, domain, source);
        rec.errors.push(PageError {
            url: homepage_url.to_string(),
            tag: tag.to_string(),
        });
        rec.status = Some(Status::Error);
        rec
    }

    pub fn had_error(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn record_error(&mut self, url: &str, tag: impl Into<String>) {
        self.errors.push(PageError {
            url: url.to_string(),
            tag: tag.into(),
        });
    }

    /// Apply one page's findings: first-wins for scalars, union for signals.
    pub fn merge_page(&mut self, url: &str, findings: PageFindings, current_year: i32, revenue_per_employee: u64) {
        if let Some(name) = findings.company_name {
            fill(&mut self.company_name, name);
        }
        if let Some(phone) = findings.phone {
            fill(&mut self.phone, phone);
        }
        // address parts travel together
        if let Some(addr) = findings.address {
            if self.street.is_empty() && fill(&mut self.street, addr.street) {
                fill(&mut self.city, addr.city);
                fill(&mut self.state, addr.state);
                fill(&mut self.zip, addr.zip);
            }
        }
        if let Some(v) = findings.industries {
            fill(&mut self.industries, v);
        }
        if let Some(v) = findings.services {
            fill(&mut self.services, v);
        }
        if let Some(v) = findings.facility_sqft {
            fill(&mut self.facility_sqft, v);
        }
        if let Some(v) = findings.employees {
            if fill(&mut self.employees, v) {
                if let Some(rev) = company::estimated_revenue(&self.employees, revenue_per_employee) {
                    fill(&mut self.revenue, rev);
                }
            }
        }
        if let Some(founded) = findings.founded {
            if fill(&mut self.year_established, founded.label()) {
                fill(&mut self.years_of_operation, founded.years_of_operation(current_year).to_string());
                fill(&mut self.year_evidence_url, url);
                fill(&mut self.year_evidence_snippet, founded.snippet);
            }
        }

        let own = findings.ownership;
        if !own.is_empty() {
            let summary_found = own.summary().is_some_and(|s| fill(&mut self.ownership, s));
            let owner_found = own.owner.is_some_and(|o| fill(&mut self.owner, o));
            if owner_found || summary_found {
                fill(&mut self.owner_evidence_url, url);
            }
            if let Some(status) = own.status {
                fill(&mut self.owner_status, status.as_str());
            }
            if own.family {
                fill(&mut self.family_business, FLAG_YES);
            }
        }

        self.signals.absorb(findings.signals);

        if let Some(jobs) = findings.jobs {
            fill(&mut self.jobs, jobs);
        }
        if findings.flags.cnc_3axis {
            fill(&mut self.cnc_3axis, FLAG_YES);
        }
        if findings.flags.cnc_5axis {
            fill(&mut self.cnc_5axis, FLAG_YES);
        }
        if findings.flags.spares_repairs {
            fill(&mut self.spares_repairs, FLAG_YES);
        }
    }

    /// Decide the status once every page has been merged.
    pub fn finalize(&mut self, strong_targets: &BTreeSet<String>, policy: StatusPolicy) -> Status {
        let status = classify(
            &self.signals.equipment,
            &self.signals.targets,
            &self.signals.disqualifiers,
            self.had_error(),
            strong_targets,
            policy,
        );
        self.status = Some(status);
        self.last_seen = Local::now();
        status
    }

    /// Value of a schema column. Unknown columns render empty.
    pub fn value(&self, column: &str) -> String {
        let joined = |set: &BTreeSet<String>| set.iter().cloned().collect::<Vec<_>>().join(", ");
        match column {
            "Company Name" => self.company_name.clone(),
            "Target Status" => self.status.map(|s| s.code().to_string()).unwrap_or_default(),
            "Public Website Homepage URL" => self.homepage_url.clone(),
            "Domain" => self.domain.clone(),
            "Source" => self.source.clone(),
            "Street Address" => self.street.clone(),
            "City" => self.city.clone(),
            "State" => self.state.clone(),
            "Zipcode" => self.zip.clone(),
            "Phone" => self.phone.clone(),
            "Industries served" => self.industries.clone(),
            "Products and services offered" => self.services.clone(),
            "Specific references from text search" => joined(&self.signals.targets),
            "Disqualifiers" => joined(&self.signals.disqualifiers),
            "Square footage (facility)" => self.facility_sqft.clone(),
            "Number of employees" => self.employees.clone(),
            "Estimated Revenues" => self.revenue.clone(),
            "Year Established" => self.year_established.clone(),
            "Years of operation" => self.years_of_operation.clone(),
            "Year Evidence URL" => self.year_evidence_url.clone(),
            "Year Evidence Snippet" => self.year_evidence_snippet.clone(),
            "Owner" => self.owner.clone(),
            "Owner Status" => self.owner_status.clone(),
            "Ownership" => self.ownership.clone(),
            "Owner Evidence URL" => self.owner_evidence_url.clone(),
            "Equipment" => joined(&self.signals.equipment),
            "CNC 3-axis" => self.cnc_3axis.clone(),
            "CNC 5-axis" => self.cnc_5axis.clone(),
            "Spares/Repairs" => self.spares_repairs.clone(),
            "Family business" => self.family_business.clone(),
            "Jobs" => self.jobs.clone(),
            "Source URLs" => self.pages.join("|"),
            "First Seen" => self.first_seen.format(TIMESTAMP_FMT).to_string(),
            "Last Seen" | "Last Update" => self.last_seen.format(TIMESTAMP_FMT).to_string(),
            "Errors" => self
                .errors
                .iter()
                .map(|e| format!("{} [{}]", e.url, e.tag))
                .collect::<Vec<_>>()
                .join("; "),
            _ => String::new(),
        }
    }

    /// One value per schema column, in schema order.
    pub fn row(&self, schema: &[String]) -> Vec<String> {
        schema.iter().map(|c| self.value(c)).collect()
    }

    /// Upsert key: the homepage URL, trimmed and lower-cased.
    pub fn key(&self) -> String {
        self.homepage_url.trim().to_lowercase()
    }
}
