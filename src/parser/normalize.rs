use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static TITLE_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());
static H1_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").unwrap());
static LINK_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// Elements whose text never reaches the visible output.
const HIDDEN: &[&str] = &["script", "style", "noscript", "template"];

/// Parsed markup. Not `Send`; keep it out of anything held across an await.
pub struct Document {
    html: Html,
}

impl Document {
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
        }
    }

    /// Visible text with whitespace runs collapsed to single spaces.
    pub fn visible_text(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        for node in self.html.root_element().descendants() {
            let Some(text) = node.value().as_text() else {
                continue;
            };
            let hidden = node.ancestors().any(|a| {
                a.value()
                    .as_element()
                    .is_some_and(|e| HIDDEN.contains(&e.name()))
            });
            if !hidden && !text.trim().is_empty() {
                parts.push(text);
            }
        }
        collapse_ws(&parts.join(" "))
    }

    pub fn title(&self) -> Option<String> {
        self.html
            .select(&TITLE_SEL)
            .next()
            .map(|t| collapse_ws(&t.text().collect::<String>()))
            .filter(|t| !t.is_empty())
    }

    pub fn first_heading(&self) -> Option<String> {
        self.html
            .select(&H1_SEL)
            .next()
            .map(|h| collapse_ws(&h.text().collect::<Vec<_>>().join(" ")))
            .filter(|t| !t.is_empty())
    }

    /// Raw `href` values of every anchor, in document order.
    pub fn hrefs(&self) -> Vec<String> {
        self.html
            .select(&LINK_SEL)
            .filter_map(|a| a.value().attr("href"))
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .collect()
    }
}

/// Markup to plain visible text.
pub fn normalize(markup: &str) -> String {
    if markup.trim().is_empty() {
        return String::new();
    }
    Document::parse(markup).visible_text()
}

pub fn collapse_ws(s: &str) -> String {
    WS_RE.replace_all(s, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_scripts_and_styles() {
        let html = r#"<html><head><title>T</title><style>body{color:red}</style>
            <script>var x = "secret";</script></head>
            <body><noscript>enable js</noscript><p>Hello
               <b>world</b></p></body></html>"#;
        let text = normalize(html);
        assert!(text.contains("Hello world"));
        assert!(!text.contains("secret"));
        assert!(!text.contains("color:red"));
        assert!(!text.contains("enable js"));
    }

    #[test]
    fn empty_input_empty_output() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \n"), "");
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(normalize("<div>a\n\n\t  b</div><div>c</div>"), "a b c");
    }

    #[test]
    fn title_heading_and_links() {
        let doc = Document::parse(
            r#"<title>  Acme   Tool | Home </title><h1>Acme <em>Tool</em></h1>
               <a href="/about">About</a><a href=" ">blank</a><a>none</a>"#,
        );
        assert_eq!(doc.title().as_deref(), Some("Acme Tool | Home"));
        assert_eq!(doc.first_heading().as_deref(), Some("Acme Tool"));
        assert_eq!(doc.hrefs(), vec!["/about".to_string()]);
    }
}
