use crate::gemini::config::{ANALYSIS_MODEL, POLL_INTERVAL, poll_deadline};
use crate::gemini::generate::{FileDataPayload, Part};
use crate::gemini::{
    self, Content, FileState, GeminiFile, GenerateContentRequest, GenerationConfig,
};
use crate::models::{Inventory, InventoryPayload};
use crate::normalize::NormalizedReply;
use crate::stylist::{Stylist, StylistError, persona, prompts};
use std::time::Instant;
use tokio::time::sleep;
use tracing::info;
use uuid::Uuid;

impl Stylist {
    /// Runs the full analysis pipeline: upload the video, wait for the
    /// provider to finish processing it, request a structured inventory,
    /// then enrich the welcome message through the persona generator.
    ///
    /// The whole sequence uses a single credential: uploaded assets are only
    /// visible to the key that created them.
    pub async fn analyze(
        &self,
        video: Vec<u8>,
        mime_type: &str,
        lat: Option<f64>,
        lon: Option<f64>,
    ) -> Result<Inventory, StylistError> {
        let started = Instant::now();
        let key = self
            .credentials
            .select()
            .map_err(|_| StylistError::no_credentials("upload_video"))?
            .to_string();

        let display_name = format!("wardrobe-{}", Uuid::new_v4().simple());
        let file = gemini::upload_file(video, mime_type, &display_name, &key)
            .await
            .map_err(|err| StylistError::upstream("upload_video", err.to_string()))?;
        info!(
            target = "stylist.analyze",
            asset = %file.name,
            "video uploaded, awaiting processing"
        );

        let file = wait_for_active(file, &key).await?;
        let file_uri = file
            .uri
            .clone()
            .ok_or_else(|| StylistError::upstream("await_processing", "asset has no uri"))?;
        let file_mime = file
            .mime_type
            .clone()
            .unwrap_or_else(|| mime_type.to_string());

        // Single-shot generation: no model fallback here, an upstream error
        // propagates directly.
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user".into(),
                parts: vec![
                    Part::FileData {
                        file_data: FileDataPayload {
                            mime_type: file_mime,
                            file_uri,
                        },
                    },
                    Part::Text {
                        text: prompts::INVENTORY_SYSTEM_PROMPT.trim().to_string(),
                    },
                ],
            }],
            system_instruction: None,
            tools: Vec::new(),
            generation_config: Some(GenerationConfig::json()),
        };
        let response = gemini::generate_content(ANALYSIS_MODEL.as_str(), &request, &key)
            .await
            .map_err(|err| StylistError::upstream("extract_inventory", err.to_string()))?;
        let text = gemini::extract_text(&response)
            .ok_or_else(|| StylistError::upstream("extract_inventory", "no text in response"))?;
        let payload: InventoryPayload = serde_json::from_str(&text).map_err(|err| {
            StylistError::upstream("extract_inventory", format!("malformed inventory json: {err}"))
        })?;

        let mut inventory = Inventory::from_payload(payload);
        if !inventory.inventory.is_empty() {
            let narrative =
                persona::generate(&inventory.inventory, lat, lon, &self.credentials).await;
            enrich_welcome_message(&mut inventory, narrative);
        }

        crate::metrics::stage_elapsed("analyze_video", started.elapsed().as_millis());
        info!(
            target = "stylist.analyze",
            items = inventory.inventory.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "analysis complete"
        );
        Ok(inventory)
    }
}

/// Polls the asset at a fixed interval until it leaves `Processing`,
/// bounded by a total deadline rather than looping forever.
async fn wait_for_active(mut file: GeminiFile, api_key: &str) -> Result<GeminiFile, StylistError> {
    let deadline = Instant::now() + poll_deadline();
    while file.state == FileState::Processing {
        if Instant::now() >= deadline {
            return Err(StylistError::asset_timeout(
                "await_processing",
                format!("video still processing after {}s", poll_deadline().as_secs()),
            ));
        }
        sleep(POLL_INTERVAL).await;
        file = gemini::get_file(&file.name, api_key)
            .await
            .map_err(|err| StylistError::upstream("await_processing", err.to_string()))?;
    }

    match file.state {
        FileState::Active => Ok(file),
        FileState::Failed => Err(StylistError::asset_processing(
            "await_processing",
            file.error
                .and_then(|failure| failure.message)
                .unwrap_or_else(|| "video processing failed upstream".into()),
        )),
        state => Err(StylistError::upstream(
            "await_processing",
            format!("unexpected asset state {state:?}"),
        )),
    }
}

fn enrich_welcome_message(inventory: &mut Inventory, narrative: Option<NormalizedReply>) {
    if let Some(reply) = narrative
        && !reply.text.trim().is_empty()
    {
        inventory.welcome_message = Some(reply.text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ClothingItem;
    use chrono::Utc;

    fn sample_inventory() -> Inventory {
        Inventory {
            inventory: vec![ClothingItem {
                id: "item_01".into(),
                item_type: Some("Top".into()),
                subtype: None,
                primary_color: None,
                patterns: None,
                season: None,
                formality: None,
                search_tags: Vec::new(),
                emoji: None,
                timestamp_seconds: None,
            }],
            suggestion_starter: Some("What goes with the shirt?".into()),
            welcome_message: Some("model-generated greeting".into()),
            analyzed_at: Utc::now(),
        }
    }

    #[test]
    fn persona_text_overwrites_welcome_message() {
        let mut inventory = sample_inventory();
        enrich_welcome_message(
            &mut inventory,
            Some(NormalizedReply {
                text: "Your wardrobe leans smart-casual.".into(),
                related_item_ids: Vec::new(),
            }),
        );
        assert_eq!(
            inventory.welcome_message.as_deref(),
            Some("Your wardrobe leans smart-casual.")
        );
    }

    #[test]
    fn absent_persona_keeps_original_welcome_message() {
        let mut inventory = sample_inventory();
        enrich_welcome_message(&mut inventory, None);
        assert_eq!(
            inventory.welcome_message.as_deref(),
            Some("model-generated greeting")
        );
    }

    #[test]
    fn blank_persona_text_keeps_original_welcome_message() {
        let mut inventory = sample_inventory();
        enrich_welcome_message(
            &mut inventory,
            Some(NormalizedReply {
                text: "   ".into(),
                related_item_ids: Vec::new(),
            }),
        );
        assert_eq!(
            inventory.welcome_message.as_deref(),
            Some("model-generated greeting")
        );
    }
}
