use chrono::NaiveDate;
use url::Url;

/// Collapse every whitespace run to a single space and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Convert a URL path into a filename-safe slug.
///
/// Path segments are joined with `-` and every non-alphanumeric character is
/// replaced with `-`; runs collapse to one dash. An empty path becomes
/// `index`.
pub fn slugify(url: &Url) -> String {
    let joined = url
        .path_segments()
        .map(|segments| {
            segments
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join("-")
        })
        .unwrap_or_default();

    let mut slug = String::with_capacity(joined.len());
    let mut last_dash = false;
    for c in joined.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    let slug = slug.trim_matches('-').to_string();

    if slug.is_empty() {
        return "index".to_string();
    }

    // Keep filenames to a sane length; the date suffix is appended later
    if slug.len() > 80 {
        slug[..80].trim_matches('-').to_string()
    } else {
        slug
    }
}

/// Build the artifact filename stem: `[<index>-]<slug>-<YYYY-MM-DD>`.
///
/// Same-day reruns of the same URL produce the same stem and overwrite;
/// batch runs sort by the index prefix.
pub fn artifact_stem(url: &Url, index: Option<usize>, date: NaiveDate) -> String {
    let prefix = index.map(|i| format!("{i}-")).unwrap_or_default();
    format!("{}{}-{}", prefix, slugify(url), date.format("%Y-%m-%d"))
}

/// Redact a secret value for diagnostics: keep a short prefix, drop the rest.
pub fn redact_secret(value: &str) -> String {
    let visible: String = value.chars().take(4).collect();
    if value.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("{visible}****")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\t b   c "), "a b c");
        assert_eq!(collapse_whitespace(""), "");
        assert_eq!(collapse_whitespace("   "), "");
    }

    #[test]
    fn test_slugify_joins_path_segments() {
        let url = Url::parse("https://example.com/learn/system-design/intro").unwrap();
        assert_eq!(slugify(&url), "learn-system-design-intro");
    }

    #[test]
    fn test_slugify_replaces_non_alphanumerics() {
        let url = Url::parse("https://example.com/learn/caching%20&%20cdn/part_1").unwrap();
        assert_eq!(slugify(&url), "learn-caching-20-20cdn-part-1");
    }

    #[test]
    fn test_slugify_empty_path() {
        let url = Url::parse("https://example.com/").unwrap();
        assert_eq!(slugify(&url), "index");
    }

    #[test]
    fn test_artifact_stem_without_index() {
        let url = Url::parse("https://example.com/learn/system-design/intro").unwrap();
        assert_eq!(
            artifact_stem(&url, None, date(2024, 1, 1)),
            "learn-system-design-intro-2024-01-01"
        );
    }

    #[test]
    fn test_artifact_stem_with_index() {
        let url = Url::parse("https://example.com/learn/system-design/intro").unwrap();
        assert_eq!(
            artifact_stem(&url, Some(6), date(2024, 1, 1)),
            "6-learn-system-design-intro-2024-01-01"
        );
    }

    #[test]
    fn test_redact_secret() {
        assert_eq!(redact_secret("sessiontoken123"), "sess****");
        assert_eq!(redact_secret("abc"), "****");
        assert_eq!(redact_secret(""), "****");
    }
}
