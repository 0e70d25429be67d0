pub mod extract;
pub mod normalize;

use extract::{Extractors, PageFindings};
use normalize::Document;

/// One fetched page after normalization and extraction.
pub struct ProcessedPage {
    pub text: String,
    pub findings: PageFindings,
}

/// Two-step pipeline: markup → visible text → extracted findings.
/// Synchronous; the parsed document never outlives this call.
pub fn process_page(extractors: &Extractors, url: &str, markup: &str, current_year: i32) -> ProcessedPage {
    let doc = Document::parse(markup);
    let text = doc.visible_text();
    let findings = extractors.extract_all(url, &doc, &text, current_year);
    ProcessedPage { text, findings }
}
