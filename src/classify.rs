use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;

/// Final disposition of a crawled company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// `CY`: qualifying evidence found.
    Qualified,
    /// `CN`: only disqualifying evidence found.
    Disqualified,
    /// `C?`: nothing decisive, or evidence both ways.
    Ambiguous,
    /// `X`: at least one page could not be processed.
    Error,
}

impl Status {
    pub fn code(&self) -> &'static str {
        match self {
            Status::Qualified => "CY",
            Status::Disqualified => "CN",
            Status::Ambiguous => "C?",
            Status::Error => "X",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// How to resolve a company with both qualifying and disqualifying evidence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusPolicy {
    /// Mixed evidence stays `C?` for a human to review.
    #[default]
    AmbiguityPreserving,
    /// Any qualifying evidence yields `CY`.
    QualifyingWins,
}

/// Pure status decision over the merged signal sets.
///
/// The error flag forces `X` regardless of the evidence. Equipment hits and
/// strong target phrases (compared lower-cased) count as qualifying; weaker
/// target phrases never decide the status on their own.
pub fn classify(
    equipment: &BTreeSet<String>,
    targets: &BTreeSet<String>,
    disqualifiers: &BTreeSet<String>,
    had_error: bool,
    strong_targets: &BTreeSet<String>,
    policy: StatusPolicy,
) -> Status {
    if had_error {
        return Status::Error;
    }

    let qualifying = !equipment.is_empty()
        || targets
            .iter()
            .any(|t| strong_targets.contains(&t.to_lowercase()));
    let disqualified = !disqualifiers.is_empty();

    match (qualifying, disqualified, policy) {
        (true, false, _) => Status::Qualified,
        (true, true, StatusPolicy::QualifyingWins) => Status::Qualified,
        (true, true, StatusPolicy::AmbiguityPreserving) => Status::Ambiguous,
        (false, true, _) => Status::Disqualified,
        (false, false, _) => Status::Ambiguous,
    }
}
