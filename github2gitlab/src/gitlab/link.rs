//! `Link` header pagination.

use reqwest::header::{HeaderMap, LINK};

/// Returns the `rel="next"` target of a `Link` header, if any.
pub(crate) fn next_link(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(LINK)?.to_str().ok()?;
    parse_next(header)
}

fn parse_next(header: &str) -> Option<String> {
    header
        .split(',')
        .filter(|link| link.contains("rel=\"next\""))
        .find_map(|link| {
            let start = link.find('<')? + 1;
            let end = link[start..].find('>')? + start;
            Some(link[start..end].to_string())
        })
}
