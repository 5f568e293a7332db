//! HTTP URI template grammar.
//!
//! Templates from `http.rules` (`/v1/shelves/{shelf}/books/{book}`) reduce
//! to one of two matcher shapes: an exact path when the template is
//! literal, or an anchored regex when it binds variables or wildcards.

/// A reduced URI matcher.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UriMatcher {
    /// Exact path match.
    Exact(String),
    /// Anchored regex match.
    Regex(String),
}

/// Whether the template binds path variables (`{...}` segments).
///
/// This drives the path-matcher `extract_path_parameters` flag; bare `*`
/// wildcards match without binding.
#[must_use]
pub fn has_variables(template: &str) -> bool {
    template.contains('{')
}

/// Classify a template into its matcher shape.
#[must_use]
pub fn classify(template: &str) -> UriMatcher {
    if has_variables(template) || template.contains('*') {
        UriMatcher::Regex(to_regex(template))
    } else {
        UriMatcher::Exact(template.to_string())
    }
}

/// Reduce a template to an anchored regex: `{x}` and `*` become `[^/]+`,
/// `{x=**}` and `**` become `.*`.
fn to_regex(template: &str) -> String {
    let mut out = String::from("^");
    for (i, segment) in template.split('/').enumerate() {
        if i > 0 {
            out.push('/');
        }
        out.push_str(&segment_pattern(segment));
    }
    out.push('$');
    out
}

fn segment_pattern(segment: &str) -> String {
    let wildcard = if let Some(inner) = segment
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
    {
        // `{name}` defaults to a single-segment binding; `{name=pattern}`
        // carries the pattern explicitly.
        inner.split_once('=').map_or("*", |(_, pattern)| pattern)
    } else {
        segment
    };
    match wildcard {
        "**" => ".*".to_string(),
        "*" => "[^/]+".to_string(),
        literal => literal.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_template_is_exact() {
        assert_eq!(classify("/v1/shelves"), UriMatcher::Exact("/v1/shelves".into()));
        assert!(!has_variables("/v1/shelves"));
    }

    #[test]
    fn single_variable_becomes_segment_regex() {
        assert_eq!(
            classify("/v1/shelves/{shelf}"),
            UriMatcher::Regex("^/v1/shelves/[^/]+$".into())
        );
        assert!(has_variables("/v1/shelves/{shelf}"));
    }

    #[test]
    fn multiple_variables() {
        assert_eq!(
            classify("/v1/shelves/{shelf}/books/{book}"),
            UriMatcher::Regex("^/v1/shelves/[^/]+/books/[^/]+$".into())
        );
    }

    #[test]
    fn double_wildcard_binding_matches_across_segments() {
        assert_eq!(
            classify("/v1/{name=**}"),
            UriMatcher::Regex("^/v1/.*$".into())
        );
    }

    #[test]
    fn bare_wildcards_are_regex_without_bindings() {
        assert_eq!(classify("/v1/*"), UriMatcher::Regex("^/v1/[^/]+$".into()));
        assert!(!has_variables("/v1/*"));
    }

    #[test]
    fn relative_template_keeps_shape() {
        assert_eq!(classify("foo/{id}"), UriMatcher::Regex("^foo/[^/]+$".into()));
        assert_eq!(classify("foo"), UriMatcher::Exact("foo".into()));
    }
}
