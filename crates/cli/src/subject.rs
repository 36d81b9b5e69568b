//! Capture subject normalisation.
//!
//! Web subjects are canonicalised so the same page captured through
//! different spellings of its URL lands under one subject: scheme and host
//! lower-cased, fragment dropped, trailing slash removed except for the root
//! path. The query is kept. Anything that is not an `http(s)` URL is an
//! opaque identifier and passes through untouched.

use url::Url;

pub fn canonicalize_subject(subject: &str) -> String {
    let trimmed = subject.trim();
    let Ok(mut url) = Url::parse(trimmed) else {
        return trimmed.to_string();
    };
    if !matches!(url.scheme(), "http" | "https") {
        return trimmed.to_string();
    }

    url.set_fragment(None);
    let path = url.path().to_string();
    if path != "/" && path.ends_with('/') {
        url.set_path(path.trim_end_matches('/'));
    }
    url.to_string()
}
