use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribution {
    pub name: String,
    pub profile_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhotoUrls {
    pub regular: Option<String>,
    pub full: Option<String>,
    pub small: Option<String>,
}

/// One photo returned by a provider, already normalised from its wire shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoCandidate {
    pub id: String,
    pub urls: PhotoUrls,
    pub attribution: Option<Attribution>,
}

impl PhotoCandidate {
    /// Largest variant Telegram reliably accepts, falling back to bigger then smaller.
    pub fn preferred_url(&self) -> Option<&str> {
        [&self.urls.regular, &self.urls.full, &self.urls.small]
            .into_iter()
            .flatten()
            .map(|url| url.trim())
            .find(|url| !url.is_empty())
    }
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("photo provider request timed out")]
    Timeout,
    #[error("photo provider request failed: {0}")]
    Transport(String),
    #[error("photo provider denied the request with status {status}: {body}")]
    Denied { status: u16, body: String },
    #[error("photo provider returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("photo provider returned a malformed payload: {0}")]
    Malformed(String),
}

impl ProviderError {
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 | 429 => ProviderError::Denied { status, body },
            _ => ProviderError::Status { status, body },
        }
    }

    /// Auth failures and rate limits won't clear up by asking again with the same term.
    pub fn is_denied(&self) -> bool {
        matches!(self, ProviderError::Denied { .. })
    }
}

#[async_trait]
pub trait PhotoProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Fetch random photos matching `query`. An empty vec means the provider had nothing usable.
    async fn random_photos(&self, query: &str) -> Result<Vec<PhotoCandidate>, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(regular: Option<&str>, full: Option<&str>, small: Option<&str>) -> PhotoCandidate {
        PhotoCandidate {
            id: "abc".to_string(),
            urls: PhotoUrls {
                regular: regular.map(str::to_string),
                full: full.map(str::to_string),
                small: small.map(str::to_string),
            },
            attribution: None,
        }
    }

    #[test]
    fn prefers_regular_then_full_then_small() {
        assert_eq!(
            candidate(Some("r"), Some("f"), Some("s")).preferred_url(),
            Some("r")
        );
        assert_eq!(candidate(Some(" "), Some("f"), None).preferred_url(), Some("f"));
        assert_eq!(candidate(None, None, Some("s")).preferred_url(), Some("s"));
        assert_eq!(candidate(None, None, None).preferred_url(), None);
    }

    #[test]
    fn classifies_auth_and_rate_limit_statuses_as_denied() {
        for status in [401, 403, 429] {
            assert!(ProviderError::from_status(status, String::new()).is_denied());
        }
        for status in [400, 404, 500, 503] {
            assert!(!ProviderError::from_status(status, String::new()).is_denied());
        }
        assert!(!ProviderError::Timeout.is_denied());
    }
}
