use crate::credentials::CredentialPool;
use crate::gemini::config::FALLBACK_MODELS;
use crate::gemini::{self, Content, GenerateContentRequest, Tool};
use crate::models::ClothingItem;
use crate::normalize::{self, NormalizedReply};
use crate::stylist::prompts;
use crate::weather;
use tracing::warn;

/// Asks the model for a stylistic narrative over the detected inventory,
/// walking the fallback model list with a fresh random credential per
/// attempt. Returns `None` when every model fails; callers must tolerate an
/// unenriched welcome message.
pub async fn generate(
    items: &[ClothingItem],
    lat: Option<f64>,
    lon: Option<f64>,
    credentials: &CredentialPool,
) -> Option<NormalizedReply> {
    let snapshot = match (lat, lon) {
        (Some(lat), Some(lon)) => weather::fetch(lat, lon).await,
        _ => None,
    };
    let prompt = prompts::persona_prompt(&prompts::inventory_json(items), snapshot.as_ref());
    let request = GenerateContentRequest {
        contents: vec![Content::user_text(prompt)],
        system_instruction: None,
        tools: vec![Tool::google_search()],
        generation_config: None,
    };

    for model in FALLBACK_MODELS.iter() {
        let Ok(key) = credentials.select() else {
            warn!(
                target = "stylist.persona",
                "no credentials available, skipping persona generation"
            );
            return None;
        };
        match gemini::generate_content(model, &request, key).await {
            Ok(response) => {
                if let Some(text) = gemini::extract_text(&response) {
                    return Some(normalize::normalize(&text));
                }
                warn!(
                    target = "stylist.persona",
                    model = %model,
                    "empty candidates, advancing to next model"
                );
            }
            Err(err) => {
                warn!(
                    target = "stylist.persona",
                    model = %model,
                    error = %err,
                    "persona_generation_failed"
                );
            }
        }
    }
    None
}
