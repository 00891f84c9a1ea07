//! Upstream resource locations derived from one base URL.

use url::Url;

/// Errors raised when the configured base URL cannot anchor resource paths.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EndpointError {
    /// Only `http` and `https` upstreams are supported.
    #[error("upstream base url must use http or https, got {scheme}")]
    UnsupportedScheme { scheme: String },
    /// URLs such as `mailto:` cannot carry path segments.
    #[error("upstream base url cannot carry path segments: {url}")]
    NotABase { url: String },
}

/// Builder for upstream resource URLs.
///
/// Path segments are percent-encoded, so ids containing `/` or `?` stay
/// inside their segment.
///
/// # Examples
/// ```
/// use backend::domain::UpstreamEndpoints;
/// use url::Url;
///
/// let base = Url::parse("http://upstream.test/evaluation-service/").expect("url");
/// let endpoints = UpstreamEndpoints::new(base).expect("http base");
/// assert_eq!(
///     endpoints.user_posts("7").as_str(),
///     "http://upstream.test/evaluation-service/users/7/posts"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamEndpoints {
    base: Url,
}

impl UpstreamEndpoints {
    /// Validate `base` and build the endpoint set.
    ///
    /// # Errors
    ///
    /// Returns [`EndpointError`] for non-HTTP schemes or URLs that cannot
    /// carry a path.
    pub fn new(base: Url) -> Result<Self, EndpointError> {
        if !matches!(base.scheme(), "http" | "https") {
            return Err(EndpointError::UnsupportedScheme {
                scheme: base.scheme().to_owned(),
            });
        }
        if base.cannot_be_a_base() {
            return Err(EndpointError::NotABase {
                url: base.to_string(),
            });
        }
        Ok(Self { base })
    }

    /// Base URL every endpoint is resolved against.
    #[must_use]
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// `POST {base}/auth`.
    #[must_use]
    pub fn auth(&self) -> Url {
        self.resolve(&["auth"])
    }

    /// `GET {base}/users`.
    #[must_use]
    pub fn users(&self) -> Url {
        self.resolve(&["users"])
    }

    /// `GET {base}/users/{id}/posts`.
    #[must_use]
    pub fn user_posts(&self, user_id: &str) -> Url {
        self.resolve(&["users", user_id, "posts"])
    }

    /// `GET {base}/posts/{id}/comments`.
    #[must_use]
    pub fn post_comments(&self, post_id: &str) -> Url {
        self.resolve(&["posts", post_id, "comments"])
    }

    fn resolve(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        url.set_query(None);
        url.set_fragment(None);
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}
