//! HTML title extraction
//!
//! A page's representative title is the text of its first non-empty `<h1>`,
//! falling back to the document `<title>`.

use scraper::{ElementRef, Html, Selector};

/// Extracts the representative title from an HTML document
///
/// # Rules
///
/// 1. The first `<h1>` whose trimmed text is non-empty
/// 2. Otherwise the first `<title>` whose trimmed text is non-empty
/// 3. Otherwise `None`
///
/// Parsing never fails: malformed markup is repaired by the HTML5 parser.
///
/// # Example
///
/// ```
/// use titlescan::crawler::extract_title;
///
/// let html = "<html><head><title>Fallback</title></head><body><h1> Heading </h1></body></html>";
/// assert_eq!(extract_title(html), Some("Heading".to_string()));
/// ```
pub fn extract_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    first_text(&document, "h1").or_else(|| first_text(&document, "title"))
}

/// Returns the trimmed text of the first matching element that has any
fn first_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;

    document
        .select(&selector)
        .map(element_text)
        .find(|text| !text.is_empty())
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
