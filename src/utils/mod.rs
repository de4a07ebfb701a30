//! Utility functions and helpers.

pub mod http;

/// Join a base URL and a path segment with exactly one slash.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Strip `prefix` from `url`, returning `url` unchanged when it does not match.
pub fn strip_host<'a>(url: &'a str, prefix: &str) -> &'a str {
    url.strip_prefix(prefix).unwrap_or(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("https://api.example.com/api/v3/", "/items/1"),
            "https://api.example.com/api/v3/items/1"
        );
        assert_eq!(
            join_url("https://api.example.com", "general/search"),
            "https://api.example.com/general/search"
        );
    }

    #[test]
    fn test_strip_host() {
        assert_eq!(
            strip_host("https://api.example.com/api/v3/items", "https://api.example.com"),
            "/api/v3/items"
        );
        assert_eq!(
            strip_host("https://web.example.com/maps", "https://api.example.com"),
            "https://web.example.com/maps"
        );
    }
}
