//! Image-URL classification for scraped and searched candidates
//!
//! Pure predicates. Scraped markup is not contract-stable, so this filter is
//! the last line between a loose pattern match and the response.

use reqwest::Url;

/// Raster extensions accepted as cover images
const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".webp"];

/// Hosts serving the search engine's own assets
const SEARCH_ENGINE_HOSTS: &[&str] = &["gstatic.com", "google.com"];

/// Path fragments that mark decoration rather than a cover photo
const BLOCKED_PATH_FRAGMENTS: &[&str] = &["icon", "logo", "avatar"];

/// Parse an absolute `http(s)` URL; anything else is not a cover candidate
fn parse_web_url(url: &str) -> Option<Url> {
    let parsed = Url::parse(url).ok()?;
    match parsed.scheme() {
        "http" | "https" => Some(parsed),
        _ => None,
    }
}

fn has_image_extension(path: &str) -> bool {
    let path = path.to_ascii_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

fn is_search_engine_host(host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    SEARCH_ENGINE_HOSTS
        .iter()
        .any(|blocked| host == *blocked || host.ends_with(&format!(".{}", blocked)))
}

/// Does the URL path (query ignored) end in a raster image extension?
pub fn is_image_url(url: &str) -> bool {
    parse_web_url(url).is_some_and(|parsed| has_image_extension(parsed.path()))
}

/// Accept a URL as a plausible cover photo
///
/// Rejects search-engine assets, non-network schemes, and icon/logo/avatar
/// paths, then requires an image extension.
pub fn is_cover_photo(url: &str) -> bool {
    let parsed = match parse_web_url(url) {
        Some(parsed) => parsed,
        None => return false,
    };

    match parsed.host_str() {
        Some(host) if !is_search_engine_host(host) => {}
        _ => return false,
    }

    let path = parsed.path().to_ascii_lowercase();
    if BLOCKED_PATH_FRAGMENTS.iter().any(|frag| path.contains(frag)) {
        return false;
    }

    has_image_extension(&path)
}
