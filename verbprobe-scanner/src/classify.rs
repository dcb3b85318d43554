use url::Url;

/// Schemes the scanner is willing to probe
pub const SUPPORTED_SCHEMES: [&str; 2] = ["http", "https"];

/// What a raw input string turned out to be
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Not a URL: no scheme, no authority, or unparseable
    Invalid,
    /// A URL, but not one we can send HTTP requests to
    UnsupportedScheme(Url),
    /// An absolute http(s) URL ready to be probed
    Eligible(Url),
}

impl Classification {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Classification::Eligible(_))
    }
}

/// Classify a raw input string.
///
/// A string is a URL only if it parses as an absolute URL with both a
/// scheme and a non-empty host. The parser lowercases the scheme, so the
/// membership check against `SUPPORTED_SCHEMES` is exact.
pub fn classify(raw: &str) -> Classification {
    let Ok(url) = Url::parse(raw) else {
        return Classification::Invalid;
    };

    let has_authority = url.host_str().is_some_and(|host| !host.is_empty());
    if url.scheme().is_empty() || !has_authority {
        return Classification::Invalid;
    }

    if SUPPORTED_SCHEMES.contains(&url.scheme()) {
        Classification::Eligible(url)
    } else {
        Classification::UnsupportedScheme(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_invalid() {
        assert_eq!(classify("not a url"), Classification::Invalid);
        assert_eq!(classify(""), Classification::Invalid);
        assert_eq!(classify("невалидная строка"), Classification::Invalid);
    }

    #[test]
    fn test_missing_authority_is_invalid() {
        assert_eq!(classify("mailto:someone@example.com"), Classification::Invalid);
        assert_eq!(classify("file:///etc/hosts"), Classification::Invalid);
        assert_eq!(classify("localhost:8080"), Classification::Invalid);
        assert_eq!(classify("http://"), Classification::Invalid);
    }

    #[test]
    fn test_missing_scheme_is_invalid() {
        assert_eq!(classify("example.com"), Classification::Invalid);
        assert_eq!(classify("//example.com/path"), Classification::Invalid);
        assert_eq!(classify("/relative/path"), Classification::Invalid);
    }

    #[test]
    fn test_other_schemes_are_unsupported() {
        assert!(matches!(
            classify("ftp://example.com"),
            Classification::UnsupportedScheme(_)
        ));
        assert!(matches!(
            classify("ws://example.com/socket"),
            Classification::UnsupportedScheme(_)
        ));
    }

    #[test]
    fn test_http_and_https_are_eligible() {
        let outcome = classify("http://example.com");
        assert!(outcome.is_eligible());

        let Classification::Eligible(url) = classify("https://api.example.com:8443/v1?x=1") else {
            panic!("expected an eligible URL");
        };
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host_str(), Some("api.example.com"));
        assert_eq!(url.port(), Some(8443));
        assert_eq!(url.path(), "/v1");
    }

    #[test]
    fn test_scheme_is_normalized_before_matching() {
        assert!(classify("HTTP://Example.com").is_eligible());
        assert!(classify("HtTpS://example.com").is_eligible());
    }
}
