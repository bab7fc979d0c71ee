//! Domain names are the identity key for every stored value. Anything coming from outside
//! (a page URL, `location.hostname`, user input on the command line) goes through [normalize]
//! first.

/// Converts a URL or a bare hostname into the canonical domain key: the host part, lowercased,
/// with a leading `www.` removed.
///
/// Never fails. Input that doesn't look like a URL is cleaned up as a whole string.
pub fn normalize(input: &str) -> String {
    let input = input.trim();
    let host = if input.contains('/') {
        extract_host(input).unwrap_or(input)
    } else {
        input
    };
    let host = host.to_lowercase();
    match host.strip_prefix("www.") {
        Some(stripped) => stripped.to_owned(),
        None => host,
    }
}

/// Pulls the host out of `scheme://user@host:port/path?query#fragment`. Returns [None] when the
/// authority is missing or empty.
fn extract_host(url: &str) -> Option<&str> {
    let (scheme, rest) = url.split_once("://")?;
    if scheme.is_empty()
        || !scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    {
        return None;
    }

    let authority = rest
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    let host_port = match authority.rsplit_once('@') {
        Some((_, host_port)) => host_port,
        None => authority,
    };

    let host = if host_port.starts_with('[') {
        // IPv6 literal, keep the brackets
        match host_port.find(']') {
            Some(end) => &host_port[..=end],
            None => host_port,
        }
    } else {
        match host_port.rsplit_once(':') {
            Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) => host,
            _ => host_port,
        }
    };

    (!host.is_empty()).then_some(host)
}

#[cfg(test)]
mod tests {
    use super::normalize;

    #[test]
    fn bare_hosts() {
        assert_eq!(normalize("example.com"), "example.com");
        assert_eq!(normalize("www.Example.com"), "example.com");
        assert_eq!(normalize("WWW.EXAMPLE.COM"), "example.com");
        assert_eq!(normalize("  news.ycombinator.com "), "news.ycombinator.com");
    }

    #[test]
    fn only_leading_www_is_removed() {
        assert_eq!(normalize("www.www.example.com"), "www.example.com");
        assert_eq!(normalize("wwwexample.com"), "wwwexample.com");
        assert_eq!(normalize("blog.www.example.com"), "blog.www.example.com");
    }

    #[test]
    fn urls_are_reduced_to_host() {
        assert_eq!(
            normalize("https://www.YouTube.com/watch?v=abc#t=1"),
            "youtube.com"
        );
        assert_eq!(normalize("http://user:pw@Docs.rs:8080/chrono"), "docs.rs");
        assert_eq!(normalize("https://[::1]:3000/"), "[::1]");
        assert_eq!(normalize("file:///home/user/index.html"), "file:///home/user/index.html");
    }

    #[test]
    fn malformed_input_degrades_to_cleanup() {
        assert_eq!(normalize("not a url/at all"), "not a url/at all");
        assert_eq!(normalize("://www.Broken/"), "://www.broken/");
        assert_eq!(normalize(""), "");
    }
}
