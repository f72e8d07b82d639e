//! reqwest-backed transport

use std::time::Duration;

use async_trait::async_trait;
use checkout_core::{ApiTransport, CheckoutError, Method, RequestDescriptor, Result};
use serde_json::Value;

/// Production `ApiTransport`
///
/// One outbound request per call, no retries. The timeout applies to the
/// whole exchange.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CheckoutError::Config(format!("HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Wrap an existing client (shares its connection pool)
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn build(&self, request: &RequestDescriptor) -> reqwest::RequestBuilder {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };

        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        if let Some(body) = &request.body {
            builder = builder.body(body.to_string());
        }

        builder
    }
}

#[async_trait]
impl ApiTransport for HttpTransport {
    async fn execute(&self, request: &RequestDescriptor) -> Result<Value> {
        tracing::debug!(method = request.method.as_str(), url = %request.url, "Outbound request");

        let response = self
            .build(request)
            .send()
            .await
            .map_err(|e| CheckoutError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url = %request.url, status = status.as_u16(), "Payment API returned non-success status");
            return Err(CheckoutError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| CheckoutError::Transport(e.to_string()))?;

        Ok(serde_json::from_str(&text)?)
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response and return the base URL
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }

            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        format!("http://{addr}")
    }

    fn transport() -> HttpTransport {
        let client = reqwest::Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        HttpTransport::with_client(client)
    }

    #[tokio::test]
    async fn test_success_body_decoded() {
        let base = serve_once("200 OK", r#"{"status":"Success","message":"ok"}"#).await;

        let body = transport()
            .execute(&RequestDescriptor::get(format!("{base}/redirect?orderId=abc")))
            .await
            .unwrap();

        assert_eq!(body["status"], "Success");
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let base = serve_once("503 Service Unavailable", "{}").await;

        let err = transport()
            .execute(&RequestDescriptor::get(format!("{base}/redirect")))
            .await
            .unwrap_err();

        assert_eq!(err, CheckoutError::HttpStatus { status: 503 });
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_invalid_json_is_decode_error() {
        let base = serve_once("200 OK", "<html>").await;

        let err = transport()
            .execute(&RequestDescriptor::get(format!("{base}/redirect")))
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::Decode(_)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = transport()
            .execute(&RequestDescriptor::get(format!("http://{addr}/redirect")))
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::Transport(_)));
    }
}
