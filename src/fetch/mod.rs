//! Retrieval of the raw CSV bytes, over HTTP or from disk.

mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use tracing::debug;

use crate::error::PipelineError;

/// Issues a GET through `client` and returns the response body.
///
/// # Errors
///
/// Fails on an unparsable URL, a transport error, or a non-success status.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);

    let resp = client.execute(req).await?;
    check_status(url, resp.status())?;

    Ok(resp.bytes().await?.to_vec())
}

fn check_status(url: &str, status: StatusCode) -> Result<(), PipelineError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(PipelineError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        })
    }
}

/// Loads bytes from a local file path or fetches them over HTTP.
#[tracing::instrument(skip(client))]
pub async fn load_bytes<C: HttpClient>(client: &C, location: &str) -> Result<Vec<u8>> {
    let bytes = if location.starts_with("http") {
        fetch_bytes(client, location).await?
    } else {
        std::fs::read(location).with_context(|| format!("reading {location}"))?
    };
    debug!(bytes = bytes.len(), "Input loaded");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_status_accepts_success() {
        assert!(check_status("https://example.org", StatusCode::OK).is_ok());
    }

    #[test]
    fn test_check_status_rejects_not_found() {
        let err = check_status("https://example.org/x.csv", StatusCode::NOT_FOUND).unwrap_err();
        match err {
            PipelineError::HttpStatus { url, status } => {
                assert_eq!(url, "https://example.org/x.csv");
                assert_eq!(status, 404);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_load_bytes_reads_local_file() {
        let path = std::env::temp_dir().join("etario_semanal_test_load.csv");
        std::fs::write(&path, "a,b\n").unwrap();

        let client = BasicClient::new();
        let bytes = load_bytes(&client, path.to_str().unwrap()).await.unwrap();

        assert_eq!(bytes, b"a,b\n");
        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_load_bytes_missing_file_fails() {
        let client = BasicClient::new();
        let result = load_bytes(&client, "/nonexistent/etario_semanal.csv").await;
        assert!(result.is_err());
    }
}
