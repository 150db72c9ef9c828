use log::debug;

use crate::error::{Result, ScrapeError};
use crate::layout::USER_AGENT;

/// Build the HTTP client shared by every request in a run.
pub fn client(user_agent: Option<&str>) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(user_agent.unwrap_or(USER_AGENT))
        .build()
        .map_err(|e| ScrapeError::http("<client>", e))
}

/// GET `url` and return the body as text.
///
/// Non-2xx statuses are errors, as are connection failures. There is no retry:
/// a failure here means nothing downstream can run for this URL.
pub async fn fetch_page(client: &reqwest::Client, url: &str) -> Result<String> {
    debug!("GET {url}");

    let resp = client
        .get(url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| ScrapeError::http(url, e))?;

    let body = resp.text().await.map_err(|e| ScrapeError::http(url, e))?;
    debug!("GET {url}: {} bytes", body.len());
    Ok(body)
}

/// One-shot loopback HTTP server for exercising real requests in tests.
#[cfg(test)]
pub(crate) mod test_server {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Answer a single request with `status` and `body`. Returns the base URL and a
    /// handle that resolves to the request line the server received.
    pub(crate) async fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: text/xml; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );

        let handle = tokio::spawn(async move {
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
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();

            String::from_utf8_lossy(&request).lines().next().unwrap_or_default().to_string()
        });

        (base, handle)
    }
}
