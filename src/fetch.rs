//! Upload client.
//!
//! The server exposes a single endpoint: `POST` a multipart form with either
//! a `queryFile` field (the user's chromatogram file) or the sentinel field
//! `showExample` to request the canned example trace. A 200 response body is
//! the trace JSON; any other status carries an error payload
//! `{"errors": [{"title": ...}, ...]}` whose titles are joined into one
//! display string. A failed request is terminal: no retry, no cancellation.

use std::path::Path;

use reqwest::blocking::{multipart, Client};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Errors from the upload call.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Upload failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to read upload file: {0}")]
    IoError(#[from] std::io::Error),

    /// Joined error titles from the server's error payload.
    #[error("{0}")]
    Server(String),
}

/// Result type for upload operations.
pub type FetchResult<T> = Result<T, FetchError>;

#[derive(Deserialize)]
struct ErrorPayload {
    errors: Vec<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    title: String,
}

fn join_titles(payload: &ErrorPayload) -> String {
    payload
        .errors
        .iter()
        .map(|e| e.title.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Uploads a chromatogram file and returns the decoded trace JSON.
pub fn upload_file(endpoint: &str, path: &Path) -> FetchResult<Value> {
    log::info!("uploading {} to {endpoint}", path.display());
    let form = multipart::Form::new().file("queryFile", path)?;
    post(endpoint, form)
}

/// Requests the server's canned example trace.
pub fn fetch_example(endpoint: &str) -> FetchResult<Value> {
    log::info!("requesting example trace from {endpoint}");
    let form = multipart::Form::new().text("showExample", "showExample");
    post(endpoint, form)
}

fn post(endpoint: &str, form: multipart::Form) -> FetchResult<Value> {
    let response = Client::new().post(endpoint).multipart(form).send()?;
    let status = response.status();
    if status == StatusCode::OK {
        Ok(response.json()?)
    } else {
        let message = match response.json::<ErrorPayload>() {
            Ok(payload) => join_titles(&payload),
            Err(_) => format!("Upload failed with status {status}"),
        };
        log::warn!("upload rejected: {message}");
        Err(FetchError::Server(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_titles_joined() {
        let payload: ErrorPayload = serde_json::from_str(
            r#"{"errors": [{"title": "File too large"}, {"title": "Not a chromatogram"}]}"#,
        )
        .unwrap();
        assert_eq!(join_titles(&payload), "File too large; Not a chromatogram");
    }

    #[test]
    fn test_single_error_title() {
        let payload: ErrorPayload =
            serde_json::from_str(r#"{"errors": [{"title": "Unreadable file"}]}"#).unwrap();
        assert_eq!(join_titles(&payload), "Unreadable file");
    }

    #[test]
    fn test_server_error_display_is_bare_message() {
        let err = FetchError::Server("File too large; Not a chromatogram".to_string());
        assert_eq!(err.to_string(), "File too large; Not a chromatogram");
    }
}
