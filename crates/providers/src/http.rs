//! HTTP helpers shared by the vendor adapters.

use std::time::Duration;

use arka_core::error::ProviderError;
use tracing::warn;

/// Build a client with a request timeout.
pub(crate) fn client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .unwrap_or_else(|e| {
            warn!(error = %e, "Falling back to default HTTP client");
            reqwest::Client::new()
        })
}

/// Turn a non-success status into [`ProviderError::Api`] carrying the body.
pub(crate) async fn ensure_success(
    provider: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    warn!(provider, status = status.as_u16(), body = %body, "Provider returned error");
    Err(ProviderError::Api {
        provider: provider.to_string(),
        status: status.as_u16(),
        body,
    })
}

pub(crate) fn network(e: reqwest::Error) -> ProviderError {
    ProviderError::Network(e.to_string())
}

pub(crate) fn decode(e: impl std::fmt::Display) -> ProviderError {
    ProviderError::Decode(e.to_string())
}

#[cfg(test)]
pub(crate) mod testing {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    /// A client that ignores proxy settings from the environment.
    pub(crate) fn direct_client() -> reqwest::Client {
        reqwest::Client::builder().no_proxy().build().unwrap()
    }

    /// Answer exactly one request on a local port, then hang up.
    ///
    /// `declared_len` overrides the advertised content-length, so a value
    /// larger than `body` makes the connection drop mid-body. Returns the
    /// base URL.
    pub(crate) async fn respond_once(
        status: &str,
        content_type: &str,
        body: &str,
        declared_len: Option<usize>,
    ) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let reply = format!(
            "HTTP/1.1 {status}\r\ncontent-type: {content_type}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            declared_len.unwrap_or(body.len())
        );
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            read_request(&mut socket).await;
            socket.write_all(reply.as_bytes()).await.unwrap();
            socket.flush().await.unwrap();
        });
        format!("http://{addr}")
    }

    /// Consume headers and body so the reply is not cut short by a reset.
    async fn read_request(socket: &mut TcpStream) {
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                return;
            }
            request.extend_from_slice(&buf[..n]);
            let Some(end) = request.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let head = String::from_utf8_lossy(&request[..end]).to_ascii_lowercase();
            let body_len = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|value| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if request.len() >= end + 4 + body_len {
                return;
            }
        }
    }
}
