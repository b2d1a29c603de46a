//! Href extraction from listing HTML.

use scraper::{Html, Selector};

/// All `href` attribute values of `<a>` elements, in document order.
pub fn extract_hrefs(html: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    Html::parse_document(html)
        .select(&selector)
        .filter_map(|a| a.value().attr("href"))
        .map(str::to_string)
        .collect()
}
