use std::fmt;

/// Remote image location that has passed the allow-list.
///
/// Only [`UrlAllowList::accept`] produces one, so holding a `SourceUrl` means
/// the scheme and host checks already succeeded.
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct SourceUrl(String);

impl SourceUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Human-readable label used to name the placed node.
    ///
    /// Last non-empty path segment of the URL, or the whole URL when it has
    /// no usable path.
    pub fn display_name(&self) -> String {
        url::Url::parse(&self.0)
            .ok()
            .and_then(|parsed| {
                parsed
                    .path_segments()
                    .and_then(|segments| {
                        segments.filter(|segment| !segment.is_empty()).last()
                    })
                    .map(str::to_owned)
            })
            .unwrap_or_else(|| self.0.clone())
    }
}

impl fmt::Debug for SourceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SourceUrl").field(&self.0).finish()
    }
}

impl fmt::Display for SourceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SourceUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Scheme + host predicate a URL must satisfy before any processing.
///
/// Both conditions are plain string checks: the URL must start with
/// `scheme_prefix` and contain `host_fragment` somewhere after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlAllowList {
    scheme_prefix: String,
    host_fragment: String,
}

impl UrlAllowList {
    pub fn new(
        scheme_prefix: impl Into<String>,
        host_fragment: impl Into<String>,
    ) -> Self {
        Self {
            scheme_prefix: scheme_prefix.into(),
            host_fragment: host_fragment.into(),
        }
    }

    pub fn scheme_prefix(&self) -> &str {
        &self.scheme_prefix
    }

    pub fn host_fragment(&self) -> &str {
        &self.host_fragment
    }

    pub fn permits(&self, candidate: &str) -> bool {
        candidate
            .strip_prefix(self.scheme_prefix.as_str())
            .is_some_and(|rest| rest.contains(self.host_fragment.as_str()))
    }

    /// The candidate is checked byte for byte; surrounding whitespace is
    /// not stripped.
    pub fn accept(&self, candidate: &str) -> Option<SourceUrl> {
        self.permits(candidate)
            .then(|| SourceUrl(candidate.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allow_list() -> UrlAllowList {
        UrlAllowList::new("https://", "cdn.example.com")
    }

    #[test]
    fn requires_both_scheme_and_host() {
        let list = allow_list();
        assert!(list.permits("https://cdn.example.com/a.png"));
        assert!(!list.permits("http://cdn.example.com/a.png"));
        assert!(!list.permits("https://other.example.org/a.png"));
        assert!(!list.permits("cdn.example.com/https://"));
    }

    #[test]
    fn scheme_must_be_the_literal_prefix() {
        let list = allow_list();
        assert!(list.accept("  https://cdn.example.com/a.png").is_none());
        assert!(list.accept("HTTPS://cdn.example.com/a.png").is_none());

        let url = list.accept("https://cdn.example.com/a.png").unwrap();
        assert_eq!(url.as_str(), "https://cdn.example.com/a.png");
    }

    #[test]
    fn display_name_uses_last_path_segment() {
        let list = allow_list();
        let url = list
            .accept("https://cdn.example.com/jobs/42/grid_0.png?w=1")
            .unwrap();
        assert_eq!(url.display_name(), "grid_0.png");

        let trailing = list.accept("https://cdn.example.com/jobs/42/").unwrap();
        assert_eq!(trailing.display_name(), "42");

        let bare = list.accept("https://cdn.example.com").unwrap();
        assert_eq!(bare.display_name(), "https://cdn.example.com");
    }
}
