use std::collections::HashMap;

use async_trait::async_trait;
use futures::{stream::BoxStream, StreamExt, TryStreamExt};
use reqwest::Client;
use thiserror::Error;
use tracing::warn;

use super::models::ApiConfig;
use crate::domain::{AppError, ByteSource, ByteStream};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Failed to run resolver tool: {0}")]
    Process(#[from] std::io::Error),

    #[error("Invalid response format: {0}")]
    InvalidResponse(#[from] serde_json::Error),

    #[error("Expected a {expected} URL")]
    UnexpectedKind { expected: &'static str },
}

pub type Result<T> = std::result::Result<T, ApiError>;

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        AppError::Resolution(err.to_string())
    }
}

#[derive(Clone)]
pub struct ApiClient {
    config: ApiConfig,
    http: Client,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Self {
        let http = Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client without user agent: {}", e);
                Client::new()
            });
        Self { config, http }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Download file with progress stream
    /// Returns (total_size, stream)
    pub async fn download_file_stream(
        &self,
        download_url: &str,
        headers: &HashMap<String, String>,
    ) -> Result<(Option<u64>, BoxStream<'static, Result<bytes::Bytes>>)> {
        let mut request = self.http.get(download_url);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request
            .send()
            .await?
            .error_for_status()
            .map_err(|e| ApiError::ApiError(format!("Download request failed: {}", e)))?;

        let total_size = response.content_length();
        let stream = response
            .bytes_stream()
            .map_err(ApiError::RequestError)
            .boxed();

        Ok((total_size, stream))
    }
}

/// Byte source backed by a direct HTTP(S) URL.
#[derive(Clone)]
pub struct HttpSource {
    client: ApiClient,
    url: String,
    headers: HashMap<String, String>,
}

impl HttpSource {
    pub fn new(client: ApiClient, url: String, headers: HashMap<String, String>) -> Self {
        Self {
            client,
            url,
            headers,
        }
    }
}

#[async_trait]
impl ByteSource for HttpSource {
    async fn open(&self) -> std::result::Result<ByteStream, AppError> {
        let (total, stream) = self
            .client
            .download_file_stream(&self.url, &self.headers)
            .await
            .map_err(|e| AppError::Transfer(e.to_string()))?;

        let chunks = stream
            .map_err(|e| AppError::Transfer(e.to_string()))
            .boxed();
        Ok((total, chunks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[tokio::test]
    async fn test_http_source_streams_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/videoplayback.mp4")
            .match_header("referer", "https://www.youtube.com/")
            .with_status(200)
            .with_body("video-bytes")
            .create_async()
            .await;

        let source = HttpSource::new(
            ApiClient::new(ApiConfig::default()),
            format!("{}/videoplayback.mp4", server.url()),
            HashMap::from([("Referer".to_string(), "https://www.youtube.com/".to_string())]),
        );

        let (total, stream) = source.open().await.unwrap();
        assert_eq!(total, Some(11));
        let chunks: Vec<Bytes> = stream.try_collect().await.unwrap();
        assert_eq!(chunks.concat(), b"video-bytes");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_client_sends_configured_user_agent() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/ua.mp4")
            .match_header("user-agent", "flash-test/1.0")
            .with_status(200)
            .with_body("ok")
            .create_async()
            .await;

        let client = ApiClient::new(ApiConfig {
            user_agent: "flash-test/1.0".to_string(),
            ..ApiConfig::default()
        });
        let (_, stream) = client
            .download_file_stream(&format!("{}/ua.mp4", server.url()), &HashMap::new())
            .await
            .unwrap();
        let chunks: Vec<Bytes> = stream.try_collect().await.unwrap();

        assert_eq!(chunks.concat(), b"ok");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_http_source_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/gone.mp4")
            .with_status(403)
            .create_async()
            .await;

        let source = HttpSource::new(
            ApiClient::new(ApiConfig::default()),
            format!("{}/gone.mp4", server.url()),
            HashMap::new(),
        );

        match source.open().await {
            Err(AppError::Transfer(reason)) => assert!(reason.contains("Download request failed")),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected a failure"),
        }
    }

    #[test]
    fn test_api_error_maps_to_resolution() {
        let err: AppError = ApiError::UnexpectedKind { expected: "playlist" }.into();
        assert_eq!(err, AppError::Resolution("Expected a playlist URL".to_string()));
    }
}
