use crate::UrlError;
use url::Url;

/// Canonicalizes a URL string into the form used for identity comparisons
///
/// Every URL in the system passes through this function (or [`resolve`])
/// before it is stored in the visited set or compared against the crawl
/// base, so two spellings of the same resource always collapse to one
/// identity.
///
/// # Canonicalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Reject schemes other than http/https
/// 3. Remove the fragment (everything after #)
/// 4. Remove an empty query string (trailing ?)
///
/// Parsing itself lowercases the scheme and host, removes default ports,
/// and collapses literal dot segments (`.` and `..`) in the path.
///
/// # Arguments
///
/// * `url_str` - The URL string to canonicalize
///
/// # Returns
///
/// * `Ok(Url)` - Canonical URL
/// * `Err(UrlError)` - Failed to parse, or unsupported scheme
///
/// # Examples
///
/// ```
/// use odscrape::url::canonicalize;
///
/// let url = canonicalize("http://EXAMPLE.com/files/a/../b?#listing").unwrap();
/// assert_eq!(url.as_str(), "http://example.com/files/b");
/// ```
pub fn canonicalize(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str).map_err(|e| UrlError::Parse {
        url: url_str.to_string(),
        source: e,
    })?;

    check_scheme(&url)?;
    scrub(&mut url);

    Ok(url)
}

/// Resolves a raw href against the page it appeared on and canonicalizes it
///
/// Relative hrefs (`file.txt`, `sub/`, `../up/`) are joined against the
/// current page URL exactly as a browser would; absolute hrefs replace it.
/// The result is scrubbed by the same rules as [`canonicalize`].
///
/// # Arguments
///
/// * `base` - The URL of the page the href was found on
/// * `href` - The raw href attribute value
///
/// # Returns
///
/// * `Ok(Url)` - Canonical absolute URL
/// * `Err(UrlError)` - The href cannot be resolved, or resolves to an
///   unsupported scheme
pub fn resolve(base: &Url, href: &str) -> Result<Url, UrlError> {
    let mut url = base.join(href).map_err(|e| UrlError::Parse {
        url: href.to_string(),
        source: e,
    })?;

    check_scheme(&url)?;
    scrub(&mut url);

    Ok(url)
}

fn check_scheme(url: &Url) -> Result<(), UrlError> {
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(UrlError::InvalidScheme(other.to_string())),
    }
}

/// Strips the parts of a URL that never contribute to its identity
fn scrub(url: &mut Url) {
    url.set_fragment(None);

    // A dangling '?' parses as an empty query; drop it so "p?" and "p"
    // compare equal.
    if url.query() == Some("") {
        url.set_query(None);
    }
}
