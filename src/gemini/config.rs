#![allow(dead_code)]

use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

pub static API_ROOT: Lazy<String> = Lazy::new(|| {
    env::var("GEMINI_API_ROOT")
        .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string())
});

pub static UPLOAD_ROOT: Lazy<String> = Lazy::new(|| format!("{}/upload/v1beta/files", *API_ROOT));

/// Model used for the single-shot video analysis call.
pub static ANALYSIS_MODEL: Lazy<String> = Lazy::new(|| {
    env::var("STYLIST_ANALYSIS_MODEL").unwrap_or_else(|_| "gemini-2.0-flash-exp".to_string())
});

/// Ordered fallback list for chat and persona generation. Earlier entries
/// are tried first; order is significant.
pub static FALLBACK_MODELS: Lazy<Vec<String>> = Lazy::new(|| {
    let raw = env::var("STYLIST_MODEL_FALLBACKS")
        .unwrap_or_else(|_| "gemini-2.0-flash-exp,gemini-1.5-flash,gemini-1.5-pro".to_string());
    let models: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect();
    if models.is_empty() {
        vec!["gemini-2.0-flash-exp".to_string()]
    } else {
        models
    }
});

/// Fixed interval between asset status checks.
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Total wait budget for video processing. The poll loop fails explicitly
/// past this cap instead of spinning forever.
pub fn poll_deadline() -> Duration {
    let secs = env::var("VIDEO_POLL_DEADLINE_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(120);
    Duration::from_secs(secs)
}
