use std::{env, path::Path};

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("invalid GITHUB_TOKEN format")]
    InvalidToken,

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("server answered {0}")]
    Status(reqwest::StatusCode),

    #[error("failed to write file: {0}")]
    Io(#[from] std::io::Error),
}

fn request_headers(token: Option<&str>) -> Result<HeaderMap, DownloadError> {
    let mut header_map = HeaderMap::new();

    if let Some(token) = token {
        let auth_value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| DownloadError::InvalidToken)?;
        header_map.insert(AUTHORIZATION, auth_value);
    }
    header_map.insert(ACCEPT, HeaderValue::from_static("application/octet-stream"));

    Ok(header_map)
}

async fn download_file(url: &str, path: &Path) -> Result<(), DownloadError> {
    tracing::info!("Downloading {} from {}", path.display(), url);

    let token = env::var("GITHUB_TOKEN").ok();
    let response = reqwest::Client::new()
        .get(url)
        .headers(request_headers(token.as_deref())?)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(DownloadError::Status(response.status()));
    }

    let bytes = response.bytes().await?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await?;
    Ok(())
}

/// Fetches the model into `model_path` when it is missing and a source URL
/// is configured. Returns whether the file is present afterwards.
pub async fn ensure_model_exists(model_path: &Path, model_url: Option<&str>) -> bool {
    tracing::info!("Checking model...");
    if model_path.exists() {
        return true;
    }

    let Some(url) = model_url else {
        tracing::warn!(
            "{} not found and MODEL_URL is not set",
            model_path.display()
        );
        return false;
    };

    match download_file(url, model_path).await {
        Ok(()) => true,
        Err(err) => {
            tracing::error!("Failed to download model: {}", err);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_without_token() {
        let headers = request_headers(None).unwrap();
        assert!(headers.get(AUTHORIZATION).is_none());
        assert_eq!(headers[ACCEPT], "application/octet-stream");
    }

    #[test]
    fn headers_with_token() {
        let headers = request_headers(Some("abc")).unwrap();
        assert_eq!(headers[AUTHORIZATION], "Bearer abc");
    }

    #[test]
    fn token_with_newline_is_rejected() {
        assert!(matches!(
            request_headers(Some("bad\ntoken")),
            Err(DownloadError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn missing_model_without_url_is_reported() {
        let present = ensure_model_exists(Path::new("./no/such/model.pb"), None).await;
        assert!(!present);
    }
}
