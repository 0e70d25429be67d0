use std::sync::LazyLock;

use regex::Regex;

pub const EARLIEST_YEAR: i32 = 1850;

static ANCHORED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:since|est|founded|established)\b\.?[^.\d]{0,40}?\b(1[89]\d{2}|20\d{2})\b").unwrap()
});
static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(1[89]\d{2}|20\d{2})\b").unwrap());
static YEARS_PHRASE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d{1,3})\s*\+?\s*years\b").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearKind {
    Exact,
    Estimated,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Founded {
    pub year: i32,
    pub kind: YearKind,
    /// Matched text the year was read from.
    pub snippet: String,
}

impl Founded {
    /// `1987 (exact)` / `1990 (estimated)`
    pub fn label(&self) -> String {
        let kind = match self.kind {
            YearKind::Exact => "exact",
            YearKind::Estimated => "estimated",
        };
        format!("{} ({})", self.year, kind)
    }

    pub fn years_of_operation(&self, current_year: i32) -> i32 {
        (current_year - self.year).max(0)
    }
}

/// Founding year from page text, restricted to `[1850, current_year]`.
///
/// Order of preference: a year next to "since"/"est."/"founded"/"established",
/// then any plausible 4-digit year, then an estimate from "N years" / "N+ years".
pub fn year_established(text: &str, current_year: i32) -> Option<Founded> {
    let in_range = |y: i32| (EARLIEST_YEAR..=current_year).contains(&y);

    let exact = |re: &Regex| {
        re.captures_iter(text).find_map(|caps| {
            let year: i32 = caps[1].parse().ok()?;
            in_range(year).then(|| Founded {
                year,
                kind: YearKind::Exact,
                snippet: caps[0].trim().to_string(),
            })
        })
    };
    if let Some(found) = exact(&ANCHORED_RE).or_else(|| exact(&YEAR_RE)) {
        return Some(found);
    }

    let caps = YEARS_PHRASE_RE.captures(text)?;
    let years: i32 = caps[1].parse().ok()?;
    Some(Founded {
        year: (current_year - years).clamp(EARLIEST_YEAR, current_year),
        kind: YearKind::Estimated,
        snippet: caps[0].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i32 = 2026;

    #[test]
    fn anchored_year_wins_over_earlier_number() {
        let text = "Over 1900 molds shipped. Founded by Jane Doe in 1987.";
        let f = year_established(text, NOW).unwrap();
        assert_eq!(f.year, 1987);
        assert_eq!(f.kind, YearKind::Exact);
        assert_eq!(f.label(), "1987 (exact)");
        assert_eq!(f.snippet, "Founded by Jane Doe in 1987");
        assert_eq!(f.years_of_operation(NOW), 39);
    }

    #[test]
    fn est_abbreviation() {
        let f = year_established("Acme Tool, est. 1962", NOW).unwrap();
        assert_eq!(f.year, 1962);
    }

    #[test]
    fn plain_year_fallback_skips_out_of_range() {
        let f = year_established("Part 1234 rev 2099, serving since the 1970s... 1975", NOW).unwrap();
        assert_eq!(f.year, 1975);
        assert_eq!(f.kind, YearKind::Exact);
    }

    #[test]
    fn estimated_from_years_phrase() {
        let f = year_established("With 40+ years of experience", NOW).unwrap();
        assert_eq!(f.year, 1986);
        assert_eq!(f.kind, YearKind::Estimated);
        assert_eq!(f.label(), "1986 (estimated)");
    }

    #[test]
    fn estimate_is_clamped() {
        let f = year_established("a legacy of 999 years", NOW).unwrap();
        assert_eq!(f.year, EARLIEST_YEAR);
    }

    #[test]
    fn nothing_found() {
        assert_eq!(year_established("We make precision parts.", NOW), None);
        assert_eq!(year_established("", NOW), None);
    }
}
