//! Document fetchers
//!
//! A volunteer downloads the body of its assigned document from the document
//! host before counting it. Two transports are provided:
//!
//! - [`HttpsFetcher`]: HTTPS on port 443 through `reqwest` (rustls)
//! - [`PlainHttpFetcher`]: hand-written HTTP/1.1 over plain TCP, sending the
//!   protocol's `DocumentFetchRequest`; meant for local document hosts

use crate::config::FetchMode;
use crate::distributed::protocol::{write_message, DocumentFetchRequest, Message};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::net::TcpStream;
use tracing::debug;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Source of document bodies
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// Download the body of `path` from `host`
    async fn fetch(&self, host: &str, path: &str) -> Result<String>;
}

/// Build the fetcher selected by configuration
pub fn fetcher_for(mode: FetchMode) -> Result<Box<dyn DocumentFetcher>> {
    match mode {
        FetchMode::Https => Ok(Box::new(HttpsFetcher::new()?)),
        FetchMode::Plain { port } => Ok(Box::new(PlainHttpFetcher::new(port))),
    }
}

/// HTTPS fetcher
pub struct HttpsFetcher {
    client: reqwest::Client,
}

impl HttpsFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl DocumentFetcher for HttpsFetcher {
    async fn fetch(&self, host: &str, path: &str) -> Result<String> {
        // Validates host and path the same way the plain transport does
        let request = DocumentFetchRequest::new(host, path)?;
        let url = format!("https://{}{}", request.host(), request.path());
        debug!("Fetching {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", url))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Document host returned {} for {}", status, url);
        }

        response
            .text()
            .await
            .with_context(|| format!("Failed to read body of {}", url))
    }
}

/// Plain HTTP/1.1 fetcher
///
/// Writes an encoded [`DocumentFetchRequest`], then reads the response until
/// the host closes the connection. The status line must be 2xx; headers are
/// skipped.
pub struct PlainHttpFetcher {
    port: u16,
}

impl PlainHttpFetcher {
    pub fn new(port: u16) -> Self {
        Self { port }
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

#[async_trait]
impl DocumentFetcher for PlainHttpFetcher {
    async fn fetch(&self, host: &str, path: &str) -> Result<String> {
        let request = DocumentFetchRequest::new(host, path)?;
        debug!("Fetching http://{}:{}{}", host, self.port, path);

        let connect = TcpStream::connect((host, self.port));
        let mut stream = tokio::time::timeout(CONNECT_TIMEOUT, connect)
            .await
            .with_context(|| format!("Timed out connecting to {}:{}", host, self.port))?
            .with_context(|| format!("Failed to connect to {}:{}", host, self.port))?;

        write_message(&mut stream, &Message::DocumentFetch(request))
            .await
            .context("Failed to send document request")?;

        let mut reader = BufReader::new(stream);

        let mut status_line = String::new();
        reader
            .read_line(&mut status_line)
            .await
            .context("Failed to read status line")?;
        let status = parse_status_line(&status_line)?;
        if !(200..300).contains(&status) {
            anyhow::bail!("Document host returned {} for {}", status, path);
        }

        // Skip headers up to the blank line
        loop {
            let mut header = String::new();
            let n = reader
                .read_line(&mut header)
                .await
                .context("Failed to read response headers")?;
            if n == 0 || header.trim_end().is_empty() {
                break;
            }
        }

        let mut body = String::new();
        reader
            .read_to_string(&mut body)
            .await
            .context("Failed to read response body")?;

        Ok(body)
    }
}

/// Status code from `HTTP/1.1 200 OK`
fn parse_status_line(line: &str) -> Result<u16> {
    let mut parts = line.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(version), Some(code)) if version.starts_with("HTTP/") => code
            .parse()
            .with_context(|| format!("Invalid status code in {:?}", line.trim_end())),
        _ => anyhow::bail!("Invalid HTTP status line: {:?}", line.trim_end()),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::distributed::protocol::decode;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    /// Serve `documents` over plain HTTP on an OS-assigned port
    ///
    /// Returns the port. Unknown paths get a 404.
    pub(crate) async fn spawn_document_host(documents: HashMap<String, String>) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let documents = Arc::new(documents);

        tokio::spawn(async move {
            loop {
                let (stream, _) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(_) => break,
                };
                let documents = Arc::clone(&documents);
                tokio::spawn(async move {
                    let mut reader = BufReader::new(stream);
                    let response = match decode(&mut reader).await {
                        Ok(Message::DocumentFetch(req)) => match documents.get(req.path()) {
                            Some(body) => format!(
                                "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\n\r\n{}",
                                body.len(),
                                body
                            ),
                            None => "HTTP/1.1 404 Not Found\r\n\r\n".to_string(),
                        },
                        _ => "HTTP/1.1 400 Bad Request\r\n\r\n".to_string(),
                    };
                    let mut stream = reader.into_inner();
                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.shutdown().await;
                });
            }
        });

        port
    }

    #[test]
    fn test_parse_status_line() {
        assert_eq!(parse_status_line("HTTP/1.1 200 OK\r\n").unwrap(), 200);
        assert_eq!(parse_status_line("HTTP/1.0 404 Not Found").unwrap(), 404);
        assert!(parse_status_line("garbage").is_err());
        assert!(parse_status_line("HTTP/1.1 abc").is_err());
    }

    #[tokio::test]
    async fn test_plain_fetch() {
        let mut documents = HashMap::new();
        documents.insert("/play.txt".to_string(), "Wherefore art thou\nRomeo\n".to_string());
        let port = spawn_document_host(documents).await;

        let fetcher = PlainHttpFetcher::new(port);
        let body = fetcher.fetch("127.0.0.1", "/play.txt").await.unwrap();
        assert_eq!(body, "Wherefore art thou\nRomeo\n");
    }

    #[tokio::test]
    async fn test_plain_fetch_not_found() {
        let port = spawn_document_host(HashMap::new()).await;

        let fetcher = PlainHttpFetcher::new(port);
        let err = fetcher.fetch("127.0.0.1", "/missing.txt").await.unwrap_err();
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn test_plain_fetch_rejects_bad_path() {
        let fetcher = PlainHttpFetcher::new(1);
        assert!(fetcher.fetch("127.0.0.1", "/has space").await.is_err());
    }

    #[test]
    fn test_fetcher_for_plain() {
        assert!(fetcher_for(FetchMode::Plain { port: 8080 }).is_ok());
    }
}
