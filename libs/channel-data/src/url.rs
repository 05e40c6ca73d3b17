//! URL helpers shared by line selection and timeshift playback

use url::{Host, Url};

/// Host part of `url`, or an empty string when it cannot be parsed
pub fn url_host(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_string()))
        .unwrap_or_default()
}

pub fn is_ipv6(url: &str) -> bool {
    matches!(
        Url::parse(url).ok().as_ref().and_then(|u| u.host()),
        Some(Host::Ipv6(_))
    )
}

/// Append `query` to `url`, with `&` when the URL already carries a
/// non-blank query string and `?` otherwise.
pub fn append_query(url: &str, query: &str) -> String {
    let has_query = match Url::parse(url) {
        Ok(u) => u.query().is_some_and(|q| !q.trim().is_empty()),
        Err(_) => url
            .split_once('?')
            .is_some_and(|(_, q)| !q.trim().is_empty()),
    };

    if has_query {
        format!("{url}&{query}")
    } else {
        // a bare trailing '?' already opens the query
        let base = url.trim_end_matches('?');
        format!("{base}?{query}")
    }
}

/// Whether the source behind `url` serves past programmes
pub fn url_support_playback(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.contains("pltv") || lower.contains("tvod")
}

/// Rewrite a live URL into its catch-up form (`PLTV` -> `TVOD`)
pub fn url_to_can_playback(url: &str) -> String {
    let lower = url.to_ascii_lowercase();
    let mut result = String::with_capacity(url.len());
    let mut last = 0;
    for (idx, _) in lower.match_indices("pltv") {
        result.push_str(&url[last..idx]);
        result.push_str("TVOD");
        last = idx + "pltv".len();
    }
    result.push_str(&url[last..]);
    result
}
