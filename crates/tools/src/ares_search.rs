//! Real-time internet search through the Traversaal Ares API.

use std::time::Duration;

use async_trait::async_trait;
use reactloop_core::action::ActionInput;
use reactloop_core::error::ToolError;
use reactloop_core::provider::GenerationSettings;
use reactloop_core::tool::Tool;
use serde::Deserialize;
use tracing::{debug, warn};

pub const NAME: &str = "ares_search";

pub struct AresSearchTool {
    url: String,
    api_key: String,
    client: reqwest::Client,
}

impl AresSearchTool {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            url: url.into(),
            api_key: api_key.into(),
            client,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AresResponse {
    data: AresData,
}

#[derive(Debug, Deserialize)]
struct AresData {
    response_text: String,
}

#[async_trait]
impl Tool for AresSearchTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Tool to search real-time relevant content from the internet"
    }

    fn argument_spec(&self) -> &str {
        "A single string parameter that will be searched on the internet to find relevant content"
    }

    async fn run(
        &self,
        input: ActionInput,
        _settings: &GenerationSettings,
    ) -> Result<String, ToolError> {
        let query = input.as_text();
        debug!(query = %query, "Searching the internet");

        let response = self
            .client
            .post(&self.url)
            .header("x-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&serde_json::json!({ "query": [query] }))
            .send()
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: NAME.into(),
                reason: e.to_string(),
            })?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            warn!(status, body = %body, "Search request failed");
            return Ok(format!("Error: {status} - {body}"));
        }

        let parsed: AresResponse = response.json().await.map_err(|e| ToolError::ExecutionFailed {
            tool_name: NAME.into(),
            reason: format!("unexpected response format: {e}"),
        })?;

        Ok(parsed.data.response_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one HTTP response and hand back the raw request.
    async fn serve_once(status: &str, body: &str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/live/predict", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let length = text[..header_end]
                        .lines()
                        .find_map(|l| {
                            let (k, v) = l.split_once(':')?;
                            k.eq_ignore_ascii_case("content-length")
                                .then(|| v.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if request.len() >= header_end + 4 + length {
                        break;
                    }
                }
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&request).to_string()
        });

        (url, handle)
    }

    #[tokio::test]
    async fn returns_response_text() {
        let (url, server) = serve_once(
            "200 OK",
            r#"{"data":{"response_text":"Rust 1.88 was released in June."}}"#,
        )
        .await;
        let tool = AresSearchTool::new(url, "ares-test-key");

        let out = tool
            .run(
                ActionInput::Raw("latest rust release".into()),
                &GenerationSettings::default(),
            )
            .await
            .unwrap();
        assert_eq!(out, "Rust 1.88 was released in June.");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /live/predict"));
        assert!(request.to_lowercase().contains("x-api-key: ares-test-key"));
        assert!(request.ends_with(r#"{"query":["latest rust release"]}"#));
    }

    #[tokio::test]
    async fn non_success_status_becomes_observation() {
        let (url, server) = serve_once("401 Unauthorized", "invalid key").await;
        let tool = AresSearchTool::new(url, "bad");

        let out = tool
            .run(ActionInput::Raw("anything".into()), &GenerationSettings::default())
            .await
            .unwrap();
        assert_eq!(out, "Error: 401 - invalid key");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn unexpected_shape_is_an_error() {
        let (url, server) = serve_once("200 OK", r#"{"results":[]}"#).await;
        let tool = AresSearchTool::new(url, "k");

        let err = tool
            .run(ActionInput::Raw("q".into()), &GenerationSettings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::ExecutionFailed { .. }));
        server.await.unwrap();
    }
}
