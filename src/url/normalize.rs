use crate::UrlError;
use url::Url;

/// Tracking query parameters removed during canonicalization
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid"];

/// Canonicalizes a URL into the form used as the deduplication key
///
/// # Canonicalization Steps
///
/// 1. Resolve `raw` against `base` (if given); reject if malformed
/// 2. Reject anything that is not `http` or `https`
/// 3. Lowercase the host; reject URLs without one
/// 4. Drop the scheme's default port (`:80` / `:443`)
/// 5. Remove the fragment
/// 6. Remove tracking query parameters and sort the rest, keeping each
///    parameter's raw encoding; drop an empty query
///
/// Dot segments are resolved by the `url` crate while parsing.
///
/// # Arguments
///
/// * `raw` - The URL string, absolute or relative to `base`
/// * `base` - The page the reference was found on, if any
///
/// # Examples
///
/// ```
/// use polite_crawler::url::canonicalize;
/// use url::Url;
///
/// let url = canonicalize("HTTP://A.TEST:80/x/../page#top", None).unwrap();
/// assert_eq!(url.as_str(), "http://a.test/page");
///
/// let base = Url::parse("https://a.test/dir/index.html").unwrap();
/// let url = canonicalize("other.html?b=2&a=1", Some(&base)).unwrap();
/// assert_eq!(url.as_str(), "https://a.test/dir/other.html?a=1&b=2");
/// ```
pub fn canonicalize(raw: &str, base: Option<&Url>) -> Result<Url, UrlError> {
    let raw = raw.trim();

    let mut url = match base {
        Some(base) => base.join(raw),
        None => Url::parse(raw),
    }
    .map_err(|e| UrlError::Parse(format!("{}: {}", raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or(UrlError::MissingHost)?
        .to_lowercase();
    url.set_host(Some(&host))
        .map_err(|e| UrlError::Parse(format!("invalid host '{}': {}", host, e)))?;

    // Parsing already drops a default port, but set_host can't reintroduce one
    // and an explicit check keeps the rule visible.
    if url.port().is_some() && url.port() == default_port(url.scheme()) {
        let _ = url.set_port(None);
    }

    url.set_fragment(None);

    if let Some(query) = url.query() {
        let query = canonical_query(query);
        url.set_query(query.as_deref());
    }

    Ok(url)
}

fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "http" => Some(80),
        "https" => Some(443),
        _ => None,
    }
}

/// Drops tracking and empty parameters and sorts the rest
///
/// Parameters are compared and kept in their raw form, so `?flag` and
/// percent-escapes survive unchanged.
fn canonical_query(query: &str) -> Option<String> {
    let mut params: Vec<&str> = query
        .split('&')
        .filter(|param| !param.is_empty() && !is_tracking_param(param_key(param)))
        .collect();

    params.sort_unstable();
    (!params.is_empty()).then(|| params.join("&"))
}

fn param_key(param: &str) -> &str {
    param.split_once('=').map_or(param, |(key, _)| key)
}

fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://a.test/dir/page.html").unwrap()
    }

    #[test]
    fn test_lowercase_host() {
        let result = canonicalize("https://A.TEST/Page", None).unwrap();
        assert_eq!(result.as_str(), "https://a.test/Page");
    }

    #[test]
    fn test_strip_default_ports() {
        let result = canonicalize("http://a.test:80/", None).unwrap();
        assert_eq!(result.as_str(), "http://a.test/");

        let result = canonicalize("https://a.test:443/x", None).unwrap();
        assert_eq!(result.as_str(), "https://a.test/x");
    }

    #[test]
    fn test_keep_non_default_port() {
        let result = canonicalize("http://a.test:8080/", None).unwrap();
        assert_eq!(result.as_str(), "http://a.test:8080/");
    }

    #[test]
    fn test_remove_fragment() {
        let result = canonicalize("https://a.test/page#section", None).unwrap();
        assert_eq!(result.as_str(), "https://a.test/page");
    }

    #[test]
    fn test_resolve_relative_path() {
        let result = canonicalize("other.html", Some(&base())).unwrap();
        assert_eq!(result.as_str(), "https://a.test/dir/other.html");
    }

    #[test]
    fn test_resolve_root_relative() {
        let result = canonicalize("/top", Some(&base())).unwrap();
        assert_eq!(result.as_str(), "https://a.test/top");
    }

    #[test]
    fn test_resolve_protocol_relative() {
        let result = canonicalize("//B.test/x", Some(&base())).unwrap();
        assert_eq!(result.as_str(), "https://b.test/x");
    }

    #[test]
    fn test_fragment_only_reference_resolves_to_base() {
        let result = canonicalize("#top", Some(&base())).unwrap();
        assert_eq!(result.as_str(), "https://a.test/dir/page.html");
    }

    #[test]
    fn test_dot_segments() {
        let result = canonicalize("https://a.test/a/../b/./c", None).unwrap();
        assert_eq!(result.as_str(), "https://a.test/b/c");
    }

    #[test]
    fn test_remove_tracking_params() {
        let result =
            canonicalize("https://a.test/page?utm_source=x&fbclid=1&gclid=2", None).unwrap();
        assert_eq!(result.as_str(), "https://a.test/page");
    }

    #[test]
    fn test_sort_query_params() {
        let result = canonicalize("https://a.test/page?b=2&a=1&utm_medium=mail", None).unwrap();
        assert_eq!(result.as_str(), "https://a.test/page?a=1&b=2");
    }

    #[test]
    fn test_query_keeps_raw_encoding() {
        let result = canonicalize("https://a.test/search?q=a%20b&flag", None).unwrap();
        assert_eq!(result.as_str(), "https://a.test/search?flag&q=a%20b");

        let result = canonicalize("https://a.test/p?x=1+2&&utm_id=3&", None).unwrap();
        assert_eq!(result.as_str(), "https://a.test/p?x=1+2");
    }

    #[test]
    fn test_empty_query_is_dropped() {
        let result = canonicalize("https://a.test/page?", None).unwrap();
        assert_eq!(result.as_str(), "https://a.test/page");
    }

    #[test]
    fn test_reject_unsupported_schemes() {
        for raw in ["ftp://a.test/file", "mailto:someone@a.test", "javascript:void(0)"] {
            let result = canonicalize(raw, None);
            assert!(
                matches!(result, Err(UrlError::InvalidScheme(_))),
                "expected scheme rejection for {}",
                raw
            );
        }
    }

    #[test]
    fn test_reject_relative_scheme_against_base() {
        let result = canonicalize("mailto:x@a.test", Some(&base()));
        assert!(matches!(result, Err(UrlError::InvalidScheme(_))));
    }

    #[test]
    fn test_malformed_url() {
        let result = canonicalize("not a url", None);
        assert!(matches!(result, Err(UrlError::Parse(_))));
    }

    #[test]
    fn test_equivalent_forms_share_a_key() {
        let a = canonicalize("HTTPS://A.test:443/page?b=1&a=2#frag", None).unwrap();
        let b = canonicalize("/page?a=2&b=1", Some(&base())).unwrap();
        assert_eq!(a, b);
    }
}
