use crate::gemini::config::API_ROOT;
use crate::http::build_client;
use crate::models::Source;
use eyre::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeminiGenerateError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("upstream returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("invalid response: {0}")]
    Deserialize(String),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            parts: vec![Part::Text { text: text.into() }],
        }
    }

    pub fn model_text(text: impl Into<String>) -> Self {
        Self {
            role: "model".into(),
            parts: vec![Part::Text { text: text.into() }],
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            parts: vec![Part::Text { text: text.into() }],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    FileData {
        #[serde(rename = "fileData")]
        file_data: FileDataPayload,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDataPayload {
    pub mime_type: String,
    pub file_uri: String,
}

/// Generation tool hookup. Only web-search grounding is used here.
#[derive(Debug, Clone, Serialize)]
pub struct Tool {
    #[serde(rename = "google_search", skip_serializing_if = "Option::is_none")]
    google_search: Option<serde_json::Value>,
}

impl Tool {
    pub fn google_search() -> Self {
        Self {
            google_search: Some(serde_json::json!({})),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
}

impl GenerationConfig {
    pub fn json() -> Self {
        Self {
            response_mime_type: Some("application/json".into()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<ContentResponse>,
    #[serde(default)]
    pub grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentResponse {
    #[serde(default)]
    pub parts: Vec<PartResponse>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PartResponse {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    #[serde(default)]
    pub grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroundingChunk {
    #[serde(default)]
    pub web: Option<WebSource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebSource {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

pub async fn generate_content(
    model: &str,
    request: &GenerateContentRequest,
    api_key: &str,
) -> Result<GenerateContentResponse, GeminiGenerateError> {
    let client = build_client();
    let url = format!(
        "{}/v1beta/models/{}:generateContent?key={}",
        *API_ROOT, model, api_key
    );
    let response = client
        .post(url)
        .json(request)
        .send()
        .await
        .map_err(|err| GeminiGenerateError::Request(err.to_string()))?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(GeminiGenerateError::Status {
            status,
            message: decode_error_message(&body),
        });
    }

    response
        .json()
        .await
        .map_err(|err| GeminiGenerateError::Deserialize(err.to_string()))
}

/// First text part of the first candidate, if any.
pub fn extract_text(response: &GenerateContentResponse) -> Option<String> {
    response
        .candidates
        .first()
        .and_then(|candidate| candidate.content.as_ref())
        .and_then(|content| {
            content
                .parts
                .iter()
                .find_map(|part| part.text.clone())
        })
}

/// Grounding citations from the first candidate. Chunks without a URI are
/// dropped; a missing title falls back to the URI itself.
pub fn extract_sources(response: &GenerateContentResponse) -> Vec<Source> {
    response
        .candidates
        .first()
        .and_then(|candidate| candidate.grounding_metadata.as_ref())
        .map(|metadata| {
            metadata
                .grounding_chunks
                .iter()
                .filter_map(|chunk| chunk.web.as_ref())
                .filter_map(|web| {
                    let uri = web.uri.clone()?;
                    let title = web.title.clone().unwrap_or_else(|| uri.clone());
                    Some(Source { title, uri })
                })
                .collect()
        })
        .unwrap_or_default()
}

fn decode_error_message(body: &str) -> String {
    serde_json::from_str::<ErrorWrapper>(body)
        .map(|wrapper| {
            let status = wrapper.error.status.unwrap_or_default();
            let message = wrapper.error.message.unwrap_or_else(|| body.to_string());
            if status.is_empty() {
                message
            } else {
                format!("{status}: {message}")
            }
        })
        .unwrap_or_else(|_| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const GROUNDED_REPLY: &str = r#"{
        "candidates": [{
            "content": {"parts": [{"text": "{\"text\": \"Layer the trench\", \"related_item_ids\": [\"item_02\"]}"}], "role": "model"},
            "groundingMetadata": {
                "groundingChunks": [
                    {"web": {"title": "Street style weekly", "uri": "https://example.com/trends"}},
                    {"web": {"uri": "https://example.com/untitled"}},
                    {"web": {"title": "no uri, dropped"}}
                ]
            }
        }]
    }"#;

    #[test]
    fn extracts_first_candidate_text() {
        let response: GenerateContentResponse =
            serde_json::from_str(GROUNDED_REPLY).expect("parse");
        let text = extract_text(&response).expect("text present");
        assert!(text.contains("Layer the trench"));
    }

    #[test]
    fn extracts_sources_and_drops_uriless_chunks() {
        let response: GenerateContentResponse =
            serde_json::from_str(GROUNDED_REPLY).expect("parse");
        let sources = extract_sources(&response);
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].title, "Street style weekly");
        assert_eq!(sources[0].uri, "https://example.com/trends");
        assert_eq!(sources[1].title, sources[1].uri);
    }

    #[test]
    fn empty_candidates_yield_no_text_or_sources() {
        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates": []}"#).expect("parse");
        assert!(extract_text(&response).is_none());
        assert!(extract_sources(&response).is_empty());
    }

    #[test]
    fn request_serializes_camel_case_wire_names() {
        let request = GenerateContentRequest {
            contents: vec![Content::user_text("hello")],
            system_instruction: Some(Content::system("be brief")),
            tools: vec![Tool::google_search()],
            generation_config: Some(GenerationConfig::json()),
        };
        let value = serde_json::to_value(&request).expect("serialize");
        assert!(value.get("systemInstruction").is_some());
        assert_eq!(
            value["generationConfig"]["responseMimeType"],
            serde_json::json!("application/json")
        );
        assert_eq!(value["tools"][0]["google_search"], serde_json::json!({}));
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hello");
    }

    #[test]
    fn file_part_serializes_as_file_data() {
        let content = Content {
            role: "user".into(),
            parts: vec![Part::FileData {
                file_data: FileDataPayload {
                    mime_type: "video/mp4".into(),
                    file_uri: "https://example.com/files/abc".into(),
                },
            }],
        };
        let value = serde_json::to_value(&content).expect("serialize");
        assert_eq!(value["parts"][0]["fileData"]["mimeType"], "video/mp4");
        assert_eq!(
            value["parts"][0]["fileData"]["fileUri"],
            "https://example.com/files/abc"
        );
    }
}
