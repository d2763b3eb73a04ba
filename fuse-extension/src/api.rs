use async_trait::async_trait;
use gloo_net::http::{Request, Response};
use shared_types::{ConvertRequest, ConvertResponse, DownloadRequest};

use crate::client::ConversionTransport;
use crate::config::FuseConfig;
use crate::error::ConversionError;

/// Talks to the conversion service over `fetch`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    convert_url: String,
    download_url: String,
}

impl HttpTransport {
    pub fn new(config: &FuseConfig) -> Self {
        Self {
            convert_url: config.convert_url(),
            download_url: config.download_url(),
        }
    }
}

async fn describe_http_error(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if body.trim().is_empty() {
        return format!("HTTP error: {status}");
    }

    if let Ok(json) = serde_json::from_str::<serde_json::Value>(&body) {
        if let Some(error) = json.get("error").and_then(|v| v.as_str()) {
            return format!("HTTP error: {status} ({error})");
        }
        if let Some(message) = json.get("message").and_then(|v| v.as_str()) {
            return format!("HTTP error: {status} ({message})");
        }
    }

    format!("HTTP error: {status} ({body})")
}

#[async_trait(?Send)]
impl ConversionTransport for HttpTransport {
    async fn submit(&self, body: &ConvertRequest) -> Result<ConvertResponse, ConversionError> {
        let response = Request::post(&self.convert_url)
            .json(body)
            .map_err(|e| ConversionError::Transport(format!("Failed to serialize request: {e}")))?
            .send()
            .await
            .map_err(|e| ConversionError::Transport(format!("Request failed: {e}")))?;

        if !response.ok() {
            return Err(ConversionError::Transport(
                describe_http_error(response).await,
            ));
        }

        response
            .json::<ConvertResponse>()
            .await
            .map_err(|e| ConversionError::Transport(format!("Failed to parse JSON: {e}")))
    }

    async fn fetch_artifact(&self, body: &DownloadRequest) -> Result<Vec<u8>, ConversionError> {
        let response = Request::post(&self.download_url)
            .json(body)
            .map_err(|e| ConversionError::Download(format!("Failed to serialize request: {e}")))?
            .send()
            .await
            .map_err(|e| ConversionError::Download(format!("Request failed: {e}")))?;

        if !response.ok() {
            return Err(ConversionError::Download(
                describe_http_error(response).await,
            ));
        }

        response
            .binary()
            .await
            .map_err(|e| ConversionError::Download(format!("Failed to read body: {e}")))
    }
}
