//! Top-games feed retrieval. One GET per call, no retry, no timeout.

use crate::error::IngestError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Value, IngestError>;
}

#[derive(Debug, Clone, Default)]
pub struct HttpFeedFetcher {
    http: Client,
}

impl HttpFeedFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FeedFetcher for HttpFeedFetcher {
    async fn fetch(&self, url: &str) -> Result<Value, IngestError> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| IngestError::fetch(url, e))?;

        // The status is informational only; the body decides.
        let status = resp.status();
        if !status.is_success() {
            warn!(%url, %status, "feed returned non-success status");
        }

        let body = resp.bytes().await.map_err(|e| IngestError::fetch(url, e))?;
        let payload = serde_json::from_slice(&body).map_err(|source| IngestError::Parse {
            url: url.to_string(),
            source,
        })?;
        debug!(%url, bytes = body.len(), "feed fetched");
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve a single canned HTTP response and return the feed URL.
    async fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let mut seen = Vec::new();
            while !seen.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = sock.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                seen.extend_from_slice(&buf[..n]);
            }
            let resp = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            sock.write_all(resp.as_bytes()).await.unwrap();
            sock.shutdown().await.ok();
        });
        format!("http://{addr}/top100.json")
    }

    #[tokio::test]
    async fn parses_json_body() {
        let url = serve_once("200 OK", r#"[{"rank":1,"name":"X","id":"1"}]"#).await;
        let payload = HttpFeedFetcher::new().fetch(&url).await.unwrap();
        assert_eq!(payload, json!([{"rank": 1, "name": "X", "id": "1"}]));
    }

    #[tokio::test]
    async fn non_success_status_still_parses_body() {
        let url = serve_once("503 Service Unavailable", r#"{"error":"down"}"#).await;
        let payload = HttpFeedFetcher::new().fetch(&url).await.unwrap();
        assert_eq!(payload["error"], "down");
    }

    #[tokio::test]
    async fn invalid_json_is_a_parse_error_naming_the_url() {
        let url = serve_once("200 OK", "<html>not json</html>").await;
        let err = HttpFeedFetcher::new().fetch(&url).await.unwrap_err();
        assert!(matches!(err, IngestError::Parse { .. }), "{err:?}");
        assert!(err.to_string().contains(&url));
    }

    #[tokio::test]
    async fn unreachable_host_is_a_fetch_error_naming_the_url() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let url = format!("http://{addr}/gone.json");

        let err = HttpFeedFetcher::new().fetch(&url).await.unwrap_err();
        assert!(matches!(err, IngestError::Fetch { .. }), "{err:?}");
        assert!(err.to_string().starts_with(&format!("Failed to fetch {url}")));
    }
}
