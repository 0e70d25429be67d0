use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use crate::settings::SignalSettings;

static AXIS3_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\b3[-\s]?axis\b").unwrap());
static AXIS5_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\b5[-\s]?axis\b").unwrap());
static SPARES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:spares|spare parts|repairs?|maintenance)\b").unwrap()
});

/// Signal tokens matched on one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignalHits {
    pub equipment: BTreeSet<String>,
    pub targets: BTreeSet<String>,
    pub disqualifiers: BTreeSet<String>,
}

/// Keyword-presence capability flags for one page.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CapabilityFlags {
    pub cnc_3axis: bool,
    pub cnc_5axis: bool,
    pub spares_repairs: bool,
}

pub fn capability_flags(text: &str) -> CapabilityFlags {
    CapabilityFlags {
        cnc_3axis: AXIS3_RE.is_match(text),
        cnc_5axis: AXIS5_RE.is_match(text),
        spares_repairs: SPARES_RE.is_match(text),
    }
}

/// One vocabulary entry: its canonical token and a word-bounded matcher.
#[derive(Debug, Clone)]
struct Term {
    token: String,
    re: Regex,
}

fn compile_terms(words: &[String]) -> Result<Vec<Term>, regex::Error> {
    words
        .iter()
        .map(|w| w.trim())
        .filter(|w| !w.is_empty())
        .map(|w| {
            let re = RegexBuilder::new(&format!(r"\b{}\b", regex::escape(w)))
                .case_insensitive(true)
                .build()?;
            Ok(Term {
                token: w.to_string(),
                re,
            })
        })
        .collect()
}

fn hits(terms: &[Term], text: &str) -> BTreeSet<String> {
    terms
        .iter()
        .filter(|t| t.re.is_match(text))
        .map(|t| t.token.clone())
        .collect()
}

/// Compiled signal vocabularies. Built once from settings and shared.
#[derive(Debug, Clone)]
pub struct SignalMatcher {
    equipment: Vec<Term>,
    targets: Vec<Term>,
    disqualifiers: Vec<Term>,
    strong: BTreeSet<String>,
}

impl SignalMatcher {
    pub fn new(settings: &SignalSettings) -> Result<Self, regex::Error> {
        Ok(Self {
            equipment: compile_terms(&settings.equipment)?,
            targets: compile_terms(&settings.target_phrases)?,
            disqualifiers: compile_terms(&settings.disqualifiers)?,
            strong: settings
                .strong_targets
                .iter()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        })
    }

    pub fn detect(&self, text: &str) -> SignalHits {
        SignalHits {
            equipment: hits(&self.equipment, text),
            targets: hits(&self.targets, text),
            disqualifiers: hits(&self.disqualifiers, text),
        }
    }

    /// Lower-cased decisive subset of the target phrases.
    pub fn strong_targets(&self) -> &BTreeSet<String> {
        &self.strong
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;

    fn matcher() -> SignalMatcher {
        SignalMatcher::new(&Settings::defaults().unwrap().signals).unwrap()
    }

    #[test]
    fn word_bounded_case_insensitive() {
        let h = matcher().detect("We run HAAS VF-2 mills and an Arburg press. Chaos reigns.");
        assert_eq!(
            h.equipment.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["Arburg", "Haas"]
        );
        assert!(h.targets.is_empty());
        assert!(h.disqualifiers.is_empty());
    }

    #[test]
    fn phrases_and_disqualifiers() {
        let h = matcher().detect("Medical device molding in LSR. We are no longer operating.");
        assert!(h.targets.contains("medical device"));
        assert!(h.targets.contains("lsr"));
        assert!(h.disqualifiers.contains("no longer operating"));
    }

    #[test]
    fn strong_targets_are_lowercased() {
        assert!(matcher().strong_targets().contains("liquid silicone rubber"));
    }

    #[test]
    fn capability_flags_detected() {
        let f = capability_flags("Our 5-axis and 3 axis centers; repair services offered.");
        assert!(f.cnc_3axis && f.cnc_5axis && f.spares_repairs);
        assert_eq!(capability_flags("plastic injection"), CapabilityFlags::default());
    }
}
