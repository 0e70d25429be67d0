//! Collapses the text harvested across a company's pages into a short list of
//! distinct, readable sentences.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use crate::parser::extract::contact;
use crate::parser::normalize::collapse_ws;
use crate::settings::DedupeSettings;

static SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]\s+|[|•]+").unwrap());
static STATE_ZIP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Z]{2}\s?\d{5}").unwrap());

/// Split on sentence-terminal punctuation (kept on the unit) and on bullet or
/// pipe separators (dropped). Units are trimmed; empty ones are skipped.
pub fn segment(buffer: &str) -> Vec<String> {
    let text = collapse_ws(buffer);
    let mut units = Vec::new();
    let mut start = 0;
    for m in SPLIT_RE.find_iter(&text) {
        let sep = m.as_str();
        let end = if sep.starts_with(['.', '!', '?']) {
            m.start() + 1
        } else {
            m.start()
        };
        push_unit(&mut units, &text[start..end]);
        start = m.end();
    }
    push_unit(&mut units, &text[start..]);
    units
}

fn push_unit(units: &mut Vec<String>, raw: &str) {
    let unit = raw.trim();
    if !unit.is_empty() {
        units.push(unit.to_string());
    }
}

fn is_contact_fact(unit: &str) -> bool {
    contact::find_phone(unit).is_some() || STATE_ZIP_RE.is_match(unit)
}

#[derive(Debug, Clone)]
pub struct Deduplicator {
    min_unit_len: usize,
    similarity: f64,
    max_units: usize,
    noise: Vec<Regex>,
}

impl Deduplicator {
    pub fn new(settings: &DedupeSettings) -> Result<Self, regex::Error> {
        let noise = settings
            .noise_patterns
            .iter()
            .map(|p| RegexBuilder::new(p).case_insensitive(true).build())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            min_unit_len: settings.min_unit_len,
            similarity: settings.similarity,
            max_units: settings.max_units,
            noise,
        })
    }

    /// Segment the buffer, then filter the units.
    pub fn dedupe(&self, buffer: &str) -> Vec<String> {
        self.filter_units(segment(buffer))
    }

    /// Length, noise and near-duplicate filtering over already-segmented
    /// units. First occurrences win and order is preserved, so applying this
    /// to its own output returns it unchanged.
    pub fn filter_units<I>(&self, units: I) -> Vec<String>
    where
        I: IntoIterator<Item = String>,
    {
        let mut kept: Vec<String> = Vec::new();
        let mut kept_lower: Vec<String> = Vec::new();

        for unit in units {
            if kept.len() >= self.max_units {
                break;
            }
            if unit.chars().count() < self.min_unit_len && !is_contact_fact(&unit) {
                continue;
            }
            if self.noise.iter().any(|re| re.is_match(&unit)) {
                continue;
            }
            let lower = unit.to_lowercase();
            if kept_lower
                .iter()
                .any(|k| strsim::normalized_levenshtein(k, &lower) >= self.similarity)
            {
                continue;
            }
            kept_lower.push(lower);
            kept.push(unit);
        }
        kept
    }
}
