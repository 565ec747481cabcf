use crate::gemini::config::FALLBACK_MODELS;
use crate::gemini::{self, Content, GenerateContentRequest, Tool};
use crate::models::{ChatRequest, ClothingItem, ModelReply};
use crate::normalize;
use crate::stylist::{Stylist, StylistError, prompts};
use crate::weather;
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, warn};

/// Fixed graceful-degradation reply returned when every fallback model
/// fails. The caller never sees a raw upstream error.
pub const HIGH_TRAFFIC_MESSAGE: &str =
    "I'm currently overwhelmed with fashion requests (High Traffic). Please try again in a moment.";

impl Stylist {
    /// Answers one chat turn grounded in the supplied inventory and, when
    /// coordinates are given, the local weather. Walks the fallback model
    /// list with a fresh random credential per attempt; exhaustion yields
    /// the fixed apology reply rather than an error.
    pub async fn chat(&self, request: ChatRequest) -> Result<ModelReply, StylistError> {
        let started = Instant::now();
        if self.credentials.is_empty() {
            return Err(StylistError::no_credentials("chat"));
        }

        let snapshot = match (request.lat, request.lon) {
            (Some(lat), Some(lon)) => weather::fetch(lat, lon).await,
            _ => None,
        };

        let instruction = prompts::chat_system_instruction(
            &prompts::inventory_json(&request.inventory_context),
            snapshot.as_ref(),
        );
        let contents = prompts::history_to_contents(&request.chat_history, &request.user_message);
        let generate_request = GenerateContentRequest {
            contents,
            system_instruction: Some(Content::system(instruction)),
            tools: vec![Tool::google_search()],
            generation_config: None,
        };

        for model in FALLBACK_MODELS.iter() {
            let Ok(key) = self.credentials.select() else {
                break;
            };
            match gemini::generate_content(model, &generate_request, key).await {
                Ok(response) => {
                    let Some(text) = gemini::extract_text(&response) else {
                        warn!(
                            target = "stylist.chat",
                            model = %model,
                            "empty candidates, advancing to next model"
                        );
                        continue;
                    };
                    let sources = gemini::extract_sources(&response);
                    let reply = normalize::normalize(&text);
                    let related_item_ids =
                        filter_known_ids(reply.related_item_ids, &request.inventory_context);
                    crate::metrics::stage_elapsed("chat", started.elapsed().as_millis());
                    return Ok(ModelReply {
                        text: reply.text,
                        related_item_ids: Some(related_item_ids),
                        sources,
                    });
                }
                Err(err) => {
                    warn!(
                        target = "stylist.chat",
                        model = %model,
                        error = %err,
                        "chat_generation_failed"
                    );
                }
            }
        }

        crate::metrics::stage_elapsed("chat", started.elapsed().as_millis());
        Ok(fallback_reply())
    }
}

pub fn fallback_reply() -> ModelReply {
    ModelReply {
        text: HIGH_TRAFFIC_MESSAGE.to_string(),
        related_item_ids: None,
        sources: Vec::new(),
    }
}

/// The generating model is only asked to cite inventory ids; it sometimes
/// invents them anyway. Unknown ids are dropped.
fn filter_known_ids(ids: Vec<String>, inventory: &[ClothingItem]) -> Vec<String> {
    if ids.is_empty() {
        return ids;
    }
    let known: HashSet<&str> = inventory.iter().map(|item| item.id.as_str()).collect();
    let before = ids.len();
    let kept: Vec<String> = ids
        .into_iter()
        .filter(|id| known.contains(id.as_str()))
        .collect();
    if kept.len() < before {
        debug!(
            target = "stylist.chat",
            dropped = before - kept.len(),
            "dropped related item ids not present in inventory"
        );
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str) -> ClothingItem {
        ClothingItem {
            id: id.to_string(),
            item_type: None,
            subtype: None,
            primary_color: None,
            patterns: None,
            season: None,
            formality: None,
            search_tags: Vec::new(),
            emoji: None,
            timestamp_seconds: None,
        }
    }

    #[test]
    fn fallback_reply_has_fixed_shape() {
        let reply = fallback_reply();
        assert_eq!(
            reply.text,
            "I'm currently overwhelmed with fashion requests (High Traffic). Please try again in a moment."
        );
        let value = serde_json::to_value(&reply).expect("serialize");
        assert!(value.get("related_item_ids").is_none());
        assert_eq!(value["sources"], serde_json::json!([]));
    }

    #[test]
    fn unknown_related_ids_are_dropped() {
        let inventory = vec![item("item_01"), item("item_02")];
        let kept = filter_known_ids(
            vec![
                "item_02".to_string(),
                "item_99".to_string(),
                "item_01".to_string(),
            ],
            &inventory,
        );
        assert_eq!(kept, vec!["item_02".to_string(), "item_01".to_string()]);
    }

    #[test]
    fn empty_related_ids_pass_through() {
        let kept = filter_known_ids(Vec::new(), &[item("item_01")]);
        assert!(kept.is_empty());
    }

    #[tokio::test]
    async fn empty_credential_pool_is_a_config_error() {
        let stylist = Stylist::new(crate::credentials::CredentialPool::from_raw(""));
        let request: ChatRequest = serde_json::from_str(
            r#"{"user_message": "What goes with my blue jacket?",
                "chat_history": [{"role": "user", "content": "Hi"}],
                "inventory_context": [{"id": "item_01"}]}"#,
        )
        .expect("parse");
        let err = stylist.chat(request).await.expect_err("no credentials");
        assert_eq!(err.kind(), crate::stylist::StylistErrorKind::NoCredentials);
    }
}
