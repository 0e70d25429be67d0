use std::sync::LazyLock;

use regex::Regex;

// Optional +1, area code, prefix, line, optional extension (dropped).
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:\+?1[\s.\-]*)?\(?\s*(\d{3})\s*\)?[\s.\-]*(\d{3})[\s.\-]*(\d{4})\b(?:\s*(?:x|ext\.?|extension)\s*\d+)?",
    )
    .unwrap()
});

// street, city, ST zip[, USA]
static ADDRESS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(\d{2,6}\s+[A-Za-z0-9 .'\-]+?),\s*([A-Za-z .'\-]+?),?\s*\b([A-Z]{2})\s+(\d{5}-\d{4}|\d{9}|\d{5}|\d{4})\b(?i:\s*,\s*(?:USA|United States))?",
    )
    .unwrap()
});

static ZIP9_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(\d{5})[- ]?(\d{4})\b").unwrap());
static ZIP5_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(\d{5})\b").unwrap());
static ZIP4_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(\d{4})\b").unwrap());

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

/// First US phone number in the text as `(AAA) PPP-LLLL`.
pub fn find_phone(text: &str) -> Option<String> {
    PHONE_RE
        .captures_iter(text)
        .find(|caps| {
            // a match glued to a preceding digit is the tail of a longer number
            let start = caps.get(0).map_or(0, |m| m.start());
            !text[..start].ends_with(|c: char| c.is_ascii_digit())
        })
        .map(|caps| format!("({}) {}-{}", &caps[1], &caps[2], &caps[3]))
}

/// First US street/city/state/zip in the text.
pub fn find_address(text: &str) -> Option<Address> {
    let caps = ADDRESS_RE.captures(text)?;
    Some(Address {
        street: caps[1].trim().to_string(),
        city: caps[2].trim().to_string(),
        state: caps[3].to_string(),
        zip: normalize_zip(&caps[4]),
    })
}

/// `#####` or `#####-####`; a bare 4-digit zip lost its leading zero.
pub fn normalize_zip(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ' ' || *c == '-')
        .collect();
    if let Some(c) = ZIP9_RE.captures(&cleaned) {
        return format!("{}-{}", &c[1], &c[2]);
    }
    if let Some(c) = ZIP5_RE.captures(&cleaned) {
        return c[1].to_string();
    }
    if let Some(c) = ZIP4_RE.captures(&cleaned) {
        return format!("0{}", &c[1]);
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_variants() {
        for raw in [
            "Call 555-123-4567 today",
            "Call (555) 123-4567 today",
            "Call 555.123.4567 today",
            "Call +1 555 123 4567 today",
            "Call 1-555-123-4567 ext. 22 today",
            "Call 5551234567",
        ] {
            assert_eq!(find_phone(raw).as_deref(), Some("(555) 123-4567"), "{}", raw);
        }
    }

    #[test]
    fn phone_absent() {
        assert_eq!(find_phone("no digits here"), None);
        assert_eq!(find_phone("ISO 9001 since 1987"), None);
    }

    #[test]
    fn zip_normalization() {
        assert_eq!(normalize_zip("12345"), "12345");
        assert_eq!(normalize_zip("123456789"), "12345-6789");
        assert_eq!(normalize_zip("12345-6789"), "12345-6789");
        assert_eq!(normalize_zip("1234"), "01234");
        assert_eq!(normalize_zip("abc"), "");
    }

    #[test]
    fn address_full() {
        let text = "Visit us at 1200 Industrial Pkwy, Rockford, IL 61109, USA for a tour.";
        let a = find_address(text).unwrap();
        assert_eq!(a.street, "1200 Industrial Pkwy");
        assert_eq!(a.city, "Rockford");
        assert_eq!(a.state, "IL");
        assert_eq!(a.zip, "61109");
    }

    #[test]
    fn address_zip_plus_four_and_short_zip() {
        let a = find_address("HQ: 45 Mill St, Hartford, CT 06103-1234").unwrap();
        assert_eq!(a.zip, "06103-1234");
        let b = find_address("45 Mill St, Hartford CT 6103").unwrap();
        assert_eq!(b.city, "Hartford");
        assert_eq!(b.zip, "06103");
    }

    #[test]
    fn address_absent() {
        assert_eq!(find_address("We make molds in Ohio."), None);
    }
}
