use std::sync::LazyLock;

use regex::Regex;

const NAME: &str = r"([A-Z][a-z]+(?:\s+[A-Z][a-z]+){0,2})";

static FOUNDED_BY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"\bFounded by\s+{}", NAME)).unwrap());
static OWNER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"\b(?i:owner)\b:?\s+{}", NAME)).unwrap());
static EXEC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"\b(?:CEO|President|Founder)\b,?\s+{}", NAME)).unwrap());
static FAMILY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bfamily[- ]owned\b|\bfamily business\b").unwrap());
static PRIVATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bprivately[- ](?:owned|held)\b").unwrap());
static RETIRED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bretired\b").unwrap());
static ACTIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bstill works\b|\bactive\b").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerStatus {
    Active,
    Retired,
}

impl OwnerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OwnerStatus::Active => "Active",
            OwnerStatus::Retired => "Retired",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ownership {
    pub owner: Option<String>,
    /// e.g. "Privately owned, Family-owned"
    pub descriptor: Option<String>,
    pub family: bool,
    pub status: Option<OwnerStatus>,
}

impl Ownership {
    pub fn is_empty(&self) -> bool {
        self.owner.is_none() && self.descriptor.is_none() && !self.family && self.status.is_none()
    }

    /// Column text: descriptor, then `Owner: <name>`.
    pub fn summary(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(d) = &self.descriptor {
            parts.push(d.clone());
        }
        if let Some(o) = &self.owner {
            parts.push(format!("Owner: {}", o));
        }
        (!parts.is_empty()).then(|| parts.join(", "))
    }
}

pub fn ownership(text: &str) -> Ownership {
    if text.is_empty() {
        return Ownership::default();
    }

    let family = FAMILY_RE.is_match(text);
    let retired = RETIRED_RE.is_match(text);

    let mut bits: Vec<&str> = Vec::new();
    if PRIVATE_RE.is_match(text) {
        bits.push("Privately owned");
    }
    if family {
        bits.push("Family-owned");
    }

    let founder = capture_name(&FOUNDED_BY_RE, text);
    if founder.is_some() && retired {
        bits.push("Founder (retired)");
    }
    let owner = founder
        .or_else(|| capture_name(&OWNER_RE, text))
        .or_else(|| capture_name(&EXEC_RE, text));

    let status = if retired {
        Some(OwnerStatus::Retired)
    } else if ACTIVE_RE.is_match(text) {
        Some(OwnerStatus::Active)
    } else {
        None
    };

    let descriptor = if !bits.is_empty() {
        Some(bits.join(", "))
    } else if owner.is_some() {
        Some("Owner identified".to_string())
    } else {
        None
    };

    Ownership {
        owner,
        descriptor,
        family,
        status,
    }
}

fn capture_name(re: &Regex, text: &str) -> Option<String> {
    re.captures(text).map(|c| c[1].to_string())
}
