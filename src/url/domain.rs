use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use polite_crawler::url::extract_host;
///
/// let url = Url::parse("https://EXAMPLE.COM:8080/path").unwrap();
/// assert_eq!(extract_host(&url), Some("example.com".to_string()));
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns the key used for per-host politeness
///
/// This is the host, plus the port when it is not the scheme's default, so two
/// servers on one machine are spaced independently.
///
/// ```
/// use url::Url;
/// use polite_crawler::url::host_key;
///
/// let url = Url::parse("http://127.0.0.1:8080/").unwrap();
/// assert_eq!(host_key(&url), Some("127.0.0.1:8080".to_string()));
///
/// let url = Url::parse("https://a.test:443/").unwrap();
/// assert_eq!(host_key(&url), Some("a.test".to_string()));
/// ```
pub fn host_key(url: &Url) -> Option<String> {
    let host = extract_host(url)?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    })
}

/// Returns the URL of the robots.txt governing `url`
pub fn robots_url(url: &Url) -> Option<Url> {
    url.host_str()?;
    url.join("/robots.txt").ok()
}
