use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

// The upstream model is only probabilistically compliant with the requested
// output schema: replies arrive as bare JSON, JSON inside a markdown fence,
// or JSON surrounded by conversational prose. Extraction degrades in that
// order and never fails.
static JSON_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?si)```json\s*(.+?)\s*```").expect("valid fence regex"));
static BRACE_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("valid brace regex"));

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NormalizedReply {
    pub text: String,
    #[serde(default)]
    pub related_item_ids: Vec<String>,
}

/// Extracts a `{text, related_item_ids}` object from free-form model output.
///
/// Attempts, in order: a fenced ```json block, the first greedy
/// brace-delimited substring, then the whole input as plain conversational
/// text with no related items.
pub fn normalize(raw: &str) -> NormalizedReply {
    if let Some(captures) = JSON_FENCE.captures(raw)
        && let Some(reply) = parse_reply(captures.get(1).map_or("", |m| m.as_str()))
    {
        return reply;
    }

    if let Some(found) = BRACE_BLOCK.find(raw)
        && let Some(reply) = parse_reply(found.as_str())
    {
        return reply;
    }

    NormalizedReply {
        text: raw.to_string(),
        related_item_ids: Vec::new(),
    }
}

fn parse_reply(candidate: &str) -> Option<NormalizedReply> {
    serde_json::from_str(candidate).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_fenced_json_block() {
        let raw = "Here is your outfit:\n```json\n{\"text\": \"Wear the denim jacket\", \"related_item_ids\": [\"item_03\"]}\n```\nEnjoy!";
        let reply = normalize(raw);
        assert_eq!(reply.text, "Wear the denim jacket");
        assert_eq!(reply.related_item_ids, vec!["item_03".to_string()]);
    }

    #[test]
    fn extracts_bare_json_with_surrounding_prose() {
        let raw = "Sure! {\"text\": \"Go monochrome today\", \"related_item_ids\": []} hope that helps";
        let reply = normalize(raw);
        assert_eq!(reply.text, "Go monochrome today");
        assert!(reply.related_item_ids.is_empty());
    }

    #[test]
    fn missing_related_ids_defaults_to_empty() {
        let reply = normalize("{\"text\": \"Linen shirt, white sneakers\"}");
        assert_eq!(reply.text, "Linen shirt, white sneakers");
        assert!(reply.related_item_ids.is_empty());
    }

    #[test]
    fn plain_text_falls_through_unchanged() {
        let raw = "I'd pair the chinos with the sky blue shirt.";
        let reply = normalize(raw);
        assert_eq!(reply.text, raw);
        assert!(reply.related_item_ids.is_empty());
    }

    #[test]
    fn invalid_fence_degrades_to_brace_then_raw() {
        let raw = "```json\nnot json at all\n```";
        let reply = normalize(raw);
        assert_eq!(reply.text, raw);
        assert!(reply.related_item_ids.is_empty());
    }

    #[test]
    fn fence_with_broken_json_still_finds_bare_object() {
        let raw = "```json\noops\n``` but also {\"text\": \"ok\"}";
        let reply = normalize(raw);
        assert_eq!(reply.text, "ok");
    }

    #[test]
    fn idempotent_on_plain_text_output() {
        let raw = "Try the graphic tee with a blazer.";
        let first = normalize(raw);
        let second = normalize(&first.text);
        assert_eq!(first, second);
    }
}
