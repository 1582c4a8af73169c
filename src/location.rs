use std::path::Path;

use percent_encoding::percent_decode_str;
use url::Url;

/// `href` with its fragment replaced by `id`.
pub fn with_fragment(href: &str, id: &str) -> String {
    match Url::parse(href) {
        Ok(mut url) => {
            url.set_fragment(Some(id));
            url.to_string()
        }
        Err(_) => {
            let base = href.split_once('#').map_or(href, |(base, _)| base);
            format!("{}#{}", base, id)
        }
    }
}

/// The decoded, non-empty fragment of `href`.
pub fn fragment(href: &str) -> Option<String> {
    let (_, hash) = href.split_once('#')?;
    let id = decode_hash(hash);
    if id.is_empty() { None } else { Some(id) }
}

/// Strip a leading `#` and undo percent-encoding.
pub fn decode_hash(hash: &str) -> String {
    let raw = hash.strip_prefix('#').unwrap_or(hash);
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

/// `href` without its fragment.
pub fn without_fragment(href: &str) -> &str {
    href.split_once('#').map_or(href, |(base, _)| base)
}

/// A `file://` URL for a local document, if the path can be expressed as one.
pub fn file_url(path: &Path) -> Option<String> {
    let absolute = path.canonicalize().ok()?;
    Url::from_file_path(absolute).ok().map(|url| url.to_string())
}

/// Local path behind a `file://` URL or a plain path-like string.
pub fn local_path(target: &str) -> Option<std::path::PathBuf> {
    match Url::parse(target) {
        Ok(url) if url.scheme() == "file" => url.to_file_path().ok(),
        Ok(_) => None,
        Err(_) => Some(std::path::PathBuf::from(without_fragment(target))),
    }
}
