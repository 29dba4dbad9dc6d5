use std::fmt;
use std::sync::LazyLock;

use url::{form_urlencoded, Url};

static LINK_BASE: LazyLock<Url> =
    LazyLock::new(|| Url::parse("http://localhost/").expect("base link parses"));

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("access token must not be blank")]
    Blank,
}

/// Opaque access token from the secure link. Never inspected beyond being non-empty.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(raw: impl Into<String>) -> Result<Self, TokenError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TokenError::Blank);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Read the token from a `/f/<token>` path, falling back to `?token=<token>`.
    pub fn from_location(path: &str, query: Option<&str>) -> Option<Self> {
        let mut segments = path.split('/').filter(|segment| !segment.is_empty());
        let from_path = match (segments.next(), segments.next()) {
            (Some("f"), Some(token)) => Self::new(token).ok(),
            _ => None,
        };

        from_path.or_else(|| {
            let query = query?.trim_start_matches('?');
            form_urlencoded::parse(query.as_bytes())
                .find(|(key, _)| key == "token")
                .and_then(|(_, value)| Self::new(value).ok())
        })
    }

    /// Accepts absolute links as well as bare `/f/abc?x=1` paths.
    pub fn from_link(link: &str) -> Option<Self> {
        let url = Url::parse(link)
            .or_else(|_| LINK_BASE.join(link))
            .ok()?;
        Self::from_location(url.path(), url.query())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AccessToken").field(&"<redacted>").finish()
    }
}
