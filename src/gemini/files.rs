use crate::gemini::config::{API_ROOT, UPLOAD_ROOT};
use crate::http::build_client;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use urlencoding::encode;

#[derive(Debug, Error)]
pub enum GeminiFileError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("invalid response: {0}")]
    Deserialize(String),
}

/// Provider-side lifecycle of an uploaded asset. States this service does
/// not know about decode as `Unknown` instead of failing the whole fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum FileState {
    Processing,
    Active,
    Failed,
    Unknown,
}

impl From<String> for FileState {
    fn from(value: String) -> Self {
        match value.as_str() {
            "PROCESSING" => Self::Processing,
            "ACTIVE" => Self::Active,
            "FAILED" => Self::Failed,
            _ => Self::Unknown,
        }
    }
}

impl Default for FileState {
    fn default() -> Self {
        Self::Processing
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiFile {
    pub name: String,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub state: FileState,
    #[serde(default)]
    pub error: Option<FileFailure>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileFailure {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file: GeminiFile,
}

/// Uploads a video through the resumable upload protocol: one request to
/// open the session, a second to push the bytes and finalize.
pub async fn upload_file(
    bytes: Vec<u8>,
    mime_type: &str,
    display_name: &str,
    api_key: &str,
) -> Result<GeminiFile, GeminiFileError> {
    let client = build_client();
    let start_url = format!("{}?key={}", *UPLOAD_ROOT, api_key);
    let metadata = json!({"file": {"display_name": display_name}});

    let start = client
        .post(start_url)
        .header("X-Goog-Upload-Protocol", "resumable")
        .header("X-Goog-Upload-Command", "start")
        .header("X-Goog-Upload-Header-Content-Length", bytes.len().to_string())
        .header("X-Goog-Upload-Header-Content-Type", mime_type)
        .json(&metadata)
        .send()
        .await
        .map_err(|err| GeminiFileError::Request(err.to_string()))?;

    if !start.status().is_success() {
        return Err(GeminiFileError::Request(format!(
            "HTTP {}",
            start.status()
        )));
    }

    let upload_url = start
        .headers()
        .get("x-goog-upload-url")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .ok_or_else(|| GeminiFileError::Request("missing upload session url".into()))?;

    let finalize = client
        .post(upload_url)
        .header("X-Goog-Upload-Command", "upload, finalize")
        .header("X-Goog-Upload-Offset", "0")
        .header("Content-Type", mime_type)
        .body(bytes)
        .send()
        .await
        .map_err(|err| GeminiFileError::Request(err.to_string()))?;

    if !finalize.status().is_success() {
        return Err(GeminiFileError::Request(format!(
            "HTTP {}",
            finalize.status()
        )));
    }

    let payload: UploadResponse = finalize
        .json()
        .await
        .map_err(|err| GeminiFileError::Deserialize(err.to_string()))?;
    Ok(payload.file)
}

/// Fetches the current state of an uploaded asset by its provider handle
/// (`files/<id>`).
pub async fn get_file(name: &str, api_key: &str) -> Result<GeminiFile, GeminiFileError> {
    let client = build_client();
    let id = name.strip_prefix("files/").unwrap_or(name);
    let url = format!("{}/v1beta/files/{}?key={}", *API_ROOT, encode(id), api_key);
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|err| GeminiFileError::Request(err.to_string()))?;

    if !response.status().is_success() {
        return Err(GeminiFileError::Request(format!(
            "HTTP {}",
            response.status()
        )));
    }

    response
        .json()
        .await
        .map_err(|err| GeminiFileError::Deserialize(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_states_decode_from_wire_names() {
        let file: GeminiFile = serde_json::from_str(
            r#"{"name": "files/abc", "uri": "https://example.com/files/abc", "state": "PROCESSING"}"#,
        )
        .expect("parse");
        assert_eq!(file.state, FileState::Processing);

        let file: GeminiFile =
            serde_json::from_str(r#"{"name": "files/abc", "state": "ACTIVE"}"#).expect("parse");
        assert_eq!(file.state, FileState::Active);

        let file: GeminiFile =
            serde_json::from_str(r#"{"name": "files/abc", "state": "FAILED"}"#).expect("parse");
        assert_eq!(file.state, FileState::Failed);
    }

    #[test]
    fn unrecognized_state_is_preserved_as_unknown() {
        let file: GeminiFile =
            serde_json::from_str(r#"{"name": "files/abc", "state": "ARCHIVED"}"#).expect("parse");
        assert_eq!(file.state, FileState::Unknown);
    }

    #[test]
    fn missing_state_defaults_to_processing() {
        let file: GeminiFile = serde_json::from_str(r#"{"name": "files/abc"}"#).expect("parse");
        assert_eq!(file.state, FileState::Processing);
    }
}
