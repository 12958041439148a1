//! URL rewriting for links and images.

use url::Url;

/// Query parameters used only for analytics.
pub const TRACKING_PARAMS: &[&str] =
    &["utm_source", "utm_medium", "utm_campaign", "utm_term", "utm_content", "fbclid", "gclid"];

/// Placeholder base used to validate relative URLs.
const VALIDATION_BASE: &str = "https://pagemark.invalid/";

fn is_well_formed(href: &str) -> bool {
    if Url::parse(href).is_ok() {
        return true;
    }
    Url::parse(VALIDATION_BASE).and_then(|base| base.join(href)).is_ok()
}

/// Removes [`TRACKING_PARAMS`] from a URL's query string.
///
/// The query is edited textually, so every other parameter, the
/// relative-or-absolute form, the path (including any trailing slash) and the
/// fragment come back exactly as written. A query left empty loses its `?`.
/// Malformed URLs are returned unchanged.
///
/// # Example
///
/// ```rust
/// use pagemark_core::urls::strip_tracking_params;
///
/// assert_eq!(
///     strip_tracking_params("https://example.com?utm_source=a&utm_medium=b&id=123"),
///     "https://example.com?id=123"
/// );
/// ```
pub fn strip_tracking_params(href: &str) -> String {
    if !is_well_formed(href) {
        return href.to_string();
    }

    let (before_fragment, fragment) = match href.find('#') {
        Some(pos) => href.split_at(pos),
        None => (href, ""),
    };

    let Some((base, query)) = before_fragment.split_once('?') else {
        return href.to_string();
    };

    let kept: Vec<&str> = query
        .split('&')
        .filter(|pair| {
            let key = pair.split('=').next().unwrap_or_default();
            !TRACKING_PARAMS.iter().any(|param| key.eq_ignore_ascii_case(param))
        })
        .collect();

    let mut out = String::with_capacity(href.len());
    out.push_str(base);
    if !kept.is_empty() {
        out.push('?');
        out.push_str(&kept.join("&"));
    }
    out.push_str(fragment);
    out
}

/// Resolves `href` against `base`.
///
/// In-page anchors and `mailto:`/`tel:`/`javascript:`/`data:` values are left
/// alone, as is anything the base cannot join.
pub fn resolve_url(href: &str, base: &Url) -> String {
    let trimmed = href.trim();
    let lower = trimmed.to_ascii_lowercase();
    let opaque = ["mailto:", "tel:", "javascript:", "data:"].iter().any(|scheme| lower.starts_with(scheme));
    if trimmed.is_empty() || trimmed.starts_with('#') || opaque {
        return href.to_string();
    }

    base.join(trimmed).map(|url| url.to_string()).unwrap_or_else(|_| href.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("https://example.com?utm_source=a&utm_medium=b&id=123", "https://example.com?id=123")]
    #[case("https://example.com/path/?utm_campaign=x", "https://example.com/path/")]
    #[case("https://example.com/a?id=1&fbclid=abc#section", "https://example.com/a?id=1#section")]
    #[case("/relative/page?gclid=1&q=rust", "/relative/page?q=rust")]
    #[case("https://example.com/?q=1&page=2", "https://example.com/?q=1&page=2")]
    #[case("https://example.com/no-query", "https://example.com/no-query")]
    #[case("https://example.com/?UTM_SOURCE=x&keep=y", "https://example.com/?keep=y")]
    fn test_strip_tracking_params(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(strip_tracking_params(input), expected);
    }

    #[test]
    fn test_malformed_url_unchanged() {
        let malformed = "http://[::1?utm_source=x";
        assert_eq!(strip_tracking_params(malformed), malformed);
    }

    #[test]
    fn test_resolve_url() {
        let base = Url::parse("https://example.com/blog/post").unwrap();
        assert_eq!(resolve_url("/img/a.png", &base), "https://example.com/img/a.png");
        assert_eq!(resolve_url("other", &base), "https://example.com/blog/other");
        assert_eq!(resolve_url("https://cdn.example.org/x", &base), "https://cdn.example.org/x");
        assert_eq!(resolve_url("#top", &base), "#top");
        assert_eq!(resolve_url("mailto:me@example.com", &base), "mailto:me@example.com");
    }
}
