use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::photos::provider::{
    Attribution, PhotoCandidate, PhotoProvider, PhotoUrls, ProviderError,
};
use crate::utils::http::get_http_client;

const ERROR_BODY_LOG_LIMIT: usize = 1000;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RandomPhotoPayload {
    Many(Vec<UnsplashPhoto>),
    One(UnsplashPhoto),
}

#[derive(Debug, Deserialize)]
struct UnsplashPhoto {
    id: Option<String>,
    #[serde(default)]
    urls: Option<UnsplashUrls>,
    #[serde(default)]
    user: Option<UnsplashUser>,
}

#[derive(Debug, Deserialize)]
struct UnsplashUrls {
    regular: Option<String>,
    full: Option<String>,
    small: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UnsplashUser {
    name: Option<String>,
    #[serde(default)]
    links: Option<UnsplashUserLinks>,
}

#[derive(Debug, Deserialize)]
struct UnsplashUserLinks {
    html: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn into_candidate(photo: UnsplashPhoto) -> Option<PhotoCandidate> {
    let id = non_empty(photo.id)?;
    let urls = photo
        .urls
        .map(|urls| PhotoUrls {
            regular: non_empty(urls.regular),
            full: non_empty(urls.full),
            small: non_empty(urls.small),
        })
        .unwrap_or_default();
    let attribution = photo.user.and_then(|user| {
        let name = non_empty(user.name)?;
        Some(Attribution {
            name,
            profile_url: non_empty(user.links.and_then(|links| links.html)),
        })
    });
    Some(PhotoCandidate {
        id,
        urls,
        attribution,
    })
}

/// Unsplash answers `/photos/random` with an object, or with a list when `count` is set.
fn parse_random_payload(body: &str) -> Result<Vec<PhotoCandidate>, ProviderError> {
    let payload: RandomPhotoPayload = serde_json::from_str(body).map_err(|err| {
        ProviderError::Malformed(format!("{err}; body starts with {:?}", truncate(body, 200)))
    })?;
    let photos = match payload {
        RandomPhotoPayload::Many(photos) => photos,
        RandomPhotoPayload::One(photo) => vec![photo],
    };
    Ok(photos.into_iter().filter_map(into_candidate).collect())
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[derive(Debug, Clone)]
pub struct UnsplashClient {
    client: Client,
    endpoint: String,
    access_key: String,
    orientation: String,
    content_filter: String,
    count: u32,
    timeout: Duration,
}

impl UnsplashClient {
    pub fn from_config(config: &Config) -> Self {
        UnsplashClient {
            client: get_http_client().clone(),
            endpoint: config.unsplash_api_url.clone(),
            access_key: config.unsplash_access_key.clone(),
            orientation: config.unsplash_orientation.clone(),
            content_filter: config.unsplash_content_filter.clone(),
            count: config.unsplash_count,
            timeout: Duration::from_secs(config.unsplash_timeout_seconds),
        }
    }

    fn query_params(&self, query: &str) -> Vec<(&'static str, String)> {
        let mut params = vec![("query", query.to_string())];
        if !self.orientation.is_empty() {
            params.push(("orientation", self.orientation.clone()));
        }
        if !self.content_filter.is_empty() {
            params.push(("content_filter", self.content_filter.clone()));
        }
        if self.count > 0 {
            params.push(("count", self.count.to_string()));
        }
        params
    }
}

#[async_trait]
impl PhotoProvider for UnsplashClient {
    fn name(&self) -> &str {
        "unsplash"
    }

    async fn random_photos(&self, query: &str) -> Result<Vec<PhotoCandidate>, ProviderError> {
        let response = self
            .client
            .get(&self.endpoint)
            .header("Authorization", format!("Client-ID {}", self.access_key))
            .header("Accept-Version", "v1")
            .query(&self.query_params(query))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    ProviderError::Timeout
                } else {
                    ProviderError::Transport(err.to_string())
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|err| {
            if err.is_timeout() {
                ProviderError::Timeout
            } else {
                ProviderError::Transport(format!("failed to read response body: {err}"))
            }
        })?;

        if !status.is_success() {
            let body = truncate(&body, ERROR_BODY_LOG_LIMIT);
            warn!(
                "Unsplash returned status {} for query={}: {}",
                status.as_u16(),
                query,
                body
            );
            return Err(ProviderError::from_status(status.as_u16(), body));
        }

        let candidates = parse_random_payload(&body)?;
        debug!(
            "Unsplash returned {} candidate(s) for query={}",
            candidates.len(),
            query
        );
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_photo_object() {
        let body = r#"{
            "id": "Dwu85P9SOIk",
            "urls": {"raw": "r", "full": "https://img/full", "regular": "https://img/regular", "small": "https://img/small"},
            "user": {"name": "Jane Doe", "links": {"html": "https://unsplash.com/@jane"}}
        }"#;
        let candidates = parse_random_payload(body).unwrap();
        assert_eq!(candidates.len(), 1);
        let photo = &candidates[0];
        assert_eq!(photo.id, "Dwu85P9SOIk");
        assert_eq!(photo.preferred_url(), Some("https://img/regular"));
        assert_eq!(
            photo.attribution,
            Some(Attribution {
                name: "Jane Doe".to_string(),
                profile_url: Some("https://unsplash.com/@jane".to_string()),
            })
        );
    }

    #[test]
    fn parses_list_and_drops_items_without_id() {
        let body = r#"[
            {"id": "one", "urls": {"small": "https://img/one"}},
            {"urls": {"regular": "https://img/anon"}},
            {"id": "  ", "urls": {"regular": "https://img/blank"}},
            {"id": "two", "user": {"name": "  "}}
        ]"#;
        let candidates = parse_random_payload(body).unwrap();
        let ids: Vec<&str> = candidates.iter().map(|photo| photo.id.as_str()).collect();
        assert_eq!(ids, vec!["one", "two"]);
        assert_eq!(candidates[1].preferred_url(), None);
        assert_eq!(candidates[1].attribution, None);
    }

    #[test]
    fn empty_list_yields_no_candidates() {
        assert!(parse_random_payload("[]").unwrap().is_empty());
    }

    #[test]
    fn garbage_body_is_malformed() {
        let err = parse_random_payload("<html>oops</html>").unwrap_err();
        assert!(matches!(err, ProviderError::Malformed(_)));
        let err = parse_random_payload("42").unwrap_err();
        assert!(matches!(err, ProviderError::Malformed(_)));
    }

    #[test]
    fn builds_optional_query_params() {
        let config = Config::from_lookup(|name| match name {
            "UNSPLASH_ACCESS_KEY" => Some("key".to_string()),
            "UNSPLASH_CONTENT_FILTER" => Some("high".to_string()),
            "UNSPLASH_COUNT" => Some("3".to_string()),
            _ => None,
        });
        let client = UnsplashClient::from_config(&config);
        let params = client.query_params("fog");
        assert_eq!(
            params,
            vec![
                ("query", "fog".to_string()),
                ("orientation", "portrait".to_string()),
                ("content_filter", "high".to_string()),
                ("count", "3".to_string()),
            ]
        );

        let plain = UnsplashClient::from_config(&Config::from_lookup(|_| None));
        assert_eq!(plain.query_params("fog").len(), 2);
    }

    fn client_for(endpoint: String) -> UnsplashClient {
        let mut client = UnsplashClient::from_config(&Config::from_lookup(|name| match name {
            "UNSPLASH_ACCESS_KEY" => Some("key".to_string()),
            "UNSPLASH_API_URL" => Some(endpoint.clone()),
            "UNSPLASH_TIMEOUT_SECONDS" => Some("1".to_string()),
            _ => None,
        }));
        // Local test servers must not go through any proxy from the environment.
        client.client = Client::builder().no_proxy().build().unwrap();
        client
    }

    /// Accepts one connection on a local port and answers it with `response` after `delay`.
    fn serve_once(response: &'static str, delay: std::time::Duration) -> String {
        use std::io::{Read, Write};

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let Ok((mut stream, _)) = listener.accept() else {
                return;
            };
            let mut request = Vec::new();
            let mut buffer = [0u8; 1024];
            while !request.windows(4).any(|window| window == b"\r\n\r\n") {
                match stream.read(&mut buffer) {
                    Ok(0) | Err(_) => return,
                    Ok(read) => request.extend_from_slice(&buffer[..read]),
                }
            }
            std::thread::sleep(delay);
            let _ = stream.write_all(response.as_bytes());
        });
        format!("http://{address}/photos/random")
    }

    #[tokio::test]
    async fn closed_port_is_a_transport_error() {
        let client = client_for("http://127.0.0.1:1/photos/random".to_string());
        let err = client.random_photos("fog").await.unwrap_err();
        assert!(matches!(err, ProviderError::Transport(_)), "got {err:?}");
        assert!(!err.is_denied());
    }

    #[tokio::test]
    async fn rate_limit_response_is_denied() {
        let endpoint = serve_once(
            "HTTP/1.1 429 Too Many Requests\r\nContent-Length: 19\r\nConnection: close\r\n\r\nRate Limit Exceeded",
            std::time::Duration::ZERO,
        );
        let err = client_for(endpoint).random_photos("fog").await.unwrap_err();
        match err {
            ProviderError::Denied { status, body } => {
                assert_eq!(status, 429);
                assert_eq!(body, "Rate Limit Exceeded");
            }
            other => panic!("expected Denied, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn server_error_is_a_plain_status_failure() {
        let endpoint = serve_once(
            "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 4\r\nConnection: close\r\n\r\ndown",
            std::time::Duration::ZERO,
        );
        let err = client_for(endpoint).random_photos("fog").await.unwrap_err();
        assert!(matches!(err, ProviderError::Status { status: 503, .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn successful_response_is_normalised() {
        let endpoint = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 45\r\nConnection: close\r\n\r\n{\"id\":\"xyz\",\"urls\":{\"regular\":\"https://i/x\"}}",
            std::time::Duration::ZERO,
        );
        let candidates = client_for(endpoint).random_photos("fog").await.unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id, "xyz");
        assert_eq!(candidates[0].preferred_url(), Some("https://i/x"));
    }

    #[tokio::test]
    async fn slow_response_is_a_timeout() {
        let endpoint = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\n[]",
            std::time::Duration::from_secs(3),
        );
        let err = client_for(endpoint).random_photos("fog").await.unwrap_err();
        assert!(matches!(err, ProviderError::Timeout), "got {err:?}");
    }
}
