//! HTML parser for directory listings
//!
//! This module pulls candidate links out of a listing page:
//! - Raw `href` values from `<a>` tags, in document order
//! - Unfollowable hrefs (scripts, mail, anchors) filtered out
//!
//! Hrefs are returned exactly as written, still relative and still
//! percent-encoded. The traversal resolves them against the listing's own
//! URL; resolution is what turns `..` and sort-order links into absolute
//! URLs the scope filter can judge.

use scraper::{Html, Selector};

/// Extracts the raw href of every followable `<a>` tag
///
/// # Kept
///
/// - Relative hrefs (`sub/`, `a.txt`, `../`)
/// - Absolute URLs
/// - Query-only hrefs such as Apache's `?C=N;O=D` sort links
/// - Percent-encoded hrefs, untouched
///
/// # Dropped
///
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only anchors and empty hrefs
///
/// # Arguments
///
/// * `html` - The listing page body
///
/// # Returns
///
/// The hrefs in document order, duplicates included
///
/// # Example
///
/// ```
/// use odscrape::crawler::extract_hrefs;
///
/// let html = r#"<html><body><a href="sub/">sub/</a><a href="a.txt">a.txt</a></body></html>"#;
/// assert_eq!(extract_hrefs(html), vec!["sub/", "a.txt"]);
/// ```
pub fn extract_hrefs(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut hrefs = Vec::new();

    if let Ok(selector) = Selector::parse("a[href]") {
        for element in document.select(&selector) {
            if let Some(href) = element.value().attr("href") {
                let href = href.trim();
                if followable(href) {
                    hrefs.push(href.to_string());
                }
            }
        }
    }

    hrefs
}

/// Whether an href is worth handing to the traversal at all
///
/// Returns false for links that can never name a listing or a file:
/// - Empty hrefs
/// - `javascript:`, `mailto:`, `tel:` schemes
/// - Data URIs
/// - Same-page anchors (`#...`)
fn followable(href: &str) -> bool {
    if href.is_empty() {
        return false;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return false;
    }

    if href.starts_with('#') {
        return false;
    }

    true
}
