//! Producer and consumer clients sharing one retry policy and one notion
//! of "what a server URL looks like" with the aggregator they talk to.

mod ingest;
pub mod consumer;
pub mod producer;

pub use ingest::read_record_file;

/// Normalize a user-supplied server address: prepend `http://` when no
/// scheme is present, and collapse an accidental doubled slash between
/// the host and the path we append.
pub fn normalize_base_url(raw: &str) -> String {
    let with_scheme = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("http://{raw}")
    };
    with_scheme.trim_end_matches('/').to_string()
}

/// Join a normalized base URL with the fixed `/weather.json` path,
/// collapsing any doubled slash at the seam.
pub fn weather_url(base: &str) -> String {
    format!("{}/weather.json", normalize_base_url(base))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_host_gets_http_scheme() {
        assert_eq!(normalize_base_url("localhost:4567"), "http://localhost:4567");
    }

    #[test]
    fn existing_scheme_is_preserved() {
        assert_eq!(normalize_base_url("https://weather.example:9"), "https://weather.example:9");
    }

    #[test]
    fn trailing_slash_is_collapsed_before_join() {
        assert_eq!(weather_url("http://localhost:4567/"), "http://localhost:4567/weather.json");
    }

    #[test]
    fn weather_url_prepends_scheme_for_bare_host() {
        assert_eq!(weather_url("localhost:4567"), "http://localhost:4567/weather.json");
    }
}
