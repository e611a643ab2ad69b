use url::Url;

/// Returns true if `url` falls inside the crawl subtree rooted at `base`
///
/// Containment is a plain prefix test over canonical string forms. The
/// base should normally end with `/`; without one the prefix test also
/// admits siblings that merely share the spelling (`/files` admits
/// `/files-old`).
pub fn in_scope(url: &Url, base: &Url) -> bool {
    url.as_str().starts_with(base.as_str())
}

/// Computes the URL-decoded path of `url` relative to `base`
///
/// Returns `None` when `url` is not inside `base`'s subtree. Percent
/// sequences are decoded bytewise and invalid UTF-8 is replaced rather
/// than rejected, so any remote name maps to some local name.
pub fn decoded_suffix(url: &Url, base: &Url) -> Option<String> {
    let suffix = url.as_str().strip_prefix(base.as_str())?;
    let bytes = urlencoding::decode_binary(suffix.as_bytes());
    Some(String::from_utf8_lossy(&bytes).into_owned())
}
