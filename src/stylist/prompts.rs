use crate::gemini::Content;
use crate::models::{ChatTurn, ClothingItem, Role};
use crate::weather::WeatherSnapshot;

/// Instruction for the single-shot video analysis call. The response MIME
/// type is constrained to JSON, so no markdown-stripping is needed on the
/// way back.
pub const INVENTORY_SYSTEM_PROMPT: &str = r#"
You are an expert fashion stylist. Analyze the video frame by frame and identify every distinct garment.
Return ONLY a valid JSON object with these keys:
  "inventory": a list of objects with "id", "type", "subtype", "primary_color", "patterns",
    "season", "formality" (integer 1-10), "search_tags" (list of strings), "emoji",
    and "timestamp_seconds" (when the item is best visible in the video);
  "suggestion_starter": one short outfit question the user could ask next;
  "welcome_message": a friendly greeting summarizing what you saw.
The response must be valid JSON and nothing else.
"#;

pub fn inventory_json(items: &[ClothingItem]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".into())
}

pub fn chat_system_instruction(
    inventory_json: &str,
    weather: Option<&WeatherSnapshot>,
) -> String {
    let mut instruction = format!(
        "You are a personal fashion stylist. The user's wardrobe inventory is:\n{inventory_json}\n\n"
    );
    if let Some(snapshot) = weather {
        instruction.push_str(&format!(
            "Current weather at the user's location: {snapshot}. Adapt your recommendations to this weather.\n\n"
        ));
    }
    instruction.push_str(
        "Respond ONLY with a JSON object of the form {\"text\": \"...\", \"related_item_ids\": [\"...\"]}.\n\
         \"text\" is your conversational advice; never include raw item identifiers in it, refer to items by their descriptions.\n\
         \"related_item_ids\" lists the ids of the inventory items your advice draws on.",
    );
    instruction
}

pub fn persona_prompt(inventory_json: &str, weather: Option<&WeatherSnapshot>) -> String {
    let weather_sentence = weather
        .map(|snapshot| format!("Current local weather: {snapshot}. "))
        .unwrap_or_default();
    format!(
        "Here is a wardrobe inventory as JSON:\n{inventory_json}\n\n{weather_sentence}\
         Write a short stylistic persona narrative for this wardrobe's owner covering three analyses: \
         vibe coherence, color palette, and trend spotting. Keep it warm and conversational."
    )
}

/// Converts caller-supplied history into provider turns, skipping entries
/// with empty content, and appends the current user message last.
pub fn history_to_contents(history: &[ChatTurn], user_message: &str) -> Vec<Content> {
    let mut contents: Vec<Content> = history
        .iter()
        .filter(|turn| !turn.content.trim().is_empty())
        .map(|turn| match turn.role {
            Role::User => Content::user_text(&turn.content),
            Role::Model => Content::model_text(&turn.content),
        })
        .collect();
    contents.push(Content::user_text(user_message));
    contents
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weather::WeatherCondition;

    fn sample_item(id: &str) -> ClothingItem {
        ClothingItem {
            id: id.to_string(),
            item_type: Some("Top".into()),
            subtype: Some("Shirt".into()),
            primary_color: Some("Sky Blue".into()),
            patterns: Some("Solid".into()),
            season: Some("Spring/Summer".into()),
            formality: Some(7),
            search_tags: vec!["shirt".into(), "office".into()],
            emoji: Some("👔".into()),
            timestamp_seconds: Some(3.2),
        }
    }

    #[test]
    fn chat_instruction_embeds_weather_when_present() {
        let snapshot = WeatherSnapshot {
            condition: WeatherCondition::Rainy,
            temperature: 15.0,
        };
        let instruction = chat_system_instruction("[]", Some(&snapshot));
        assert!(instruction.contains("Rainy, 15.0°C"));
        assert!(instruction.contains("Adapt your recommendations"));
    }

    #[test]
    fn chat_instruction_omits_weather_when_absent() {
        let instruction = chat_system_instruction("[]", None);
        assert!(!instruction.contains("Current weather"));
        assert!(instruction.contains("related_item_ids"));
    }

    #[test]
    fn persona_prompt_names_the_three_analyses() {
        let prompt = persona_prompt("[]", None);
        for analysis in ["vibe coherence", "color palette", "trend spotting"] {
            assert!(prompt.contains(analysis), "missing {analysis}");
        }
    }

    #[test]
    fn inventory_json_round_trips_item_ids() {
        let rendered = inventory_json(&[sample_item("item_01")]);
        assert!(rendered.contains("\"item_01\""));
        assert!(rendered.contains("\"primary_color\""));
    }

    #[test]
    fn history_skips_empty_turns_and_appends_message() {
        let history = vec![
            ChatTurn {
                role: Role::User,
                content: "Hi".into(),
            },
            ChatTurn {
                role: Role::Model,
                content: "   ".into(),
            },
            ChatTurn {
                role: Role::Model,
                content: "Hello! Ask me anything.".into(),
            },
        ];
        let contents = history_to_contents(&history, "What goes with my blue jacket?");
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0].role, "user");
        assert_eq!(contents[1].role, "model");
        assert_eq!(contents[2].role, "user");
    }
}
