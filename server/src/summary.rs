use manole_model::{ChatMessage, ModelHandle};
use manole_searcher::{Searcher, DEFAULT_TOP_K};

const SUMMARY_QUERY: &str =
    "What kinds of files and information does this folder contain overall?";

const SUMMARY_SYSTEM_PROMPT: &str =
    "You are describing a personal file directory to its owner. Given the \
     facts below, write one concise paragraph describing what the folder \
     contains. Do not mention searching, facts, or sources explicitly.";

const SUMMARY_MAX_TOKENS: usize = 256;

/// Computes the one-paragraph `directory_update` summary (spec.md
/// §4.15): runs the directory's own `Searcher` against a fixed prompt,
/// then asks the model to turn the retrieved facts into prose. `None`
/// when nothing was found or the model is unavailable — the caller
/// simply skips the second `directory_update`.
pub async fn synthesize(searcher: &Searcher, model: &ModelHandle) -> Option<String> {
    let (facts_text, sources) = searcher
        .search_and_extract(SUMMARY_QUERY, DEFAULT_TOP_K)
        .await
        .ok()?;
    if sources.is_empty() {
        return None;
    }

    let messages = [
        ChatMessage::system(SUMMARY_SYSTEM_PROMPT),
        ChatMessage::user(facts_text),
    ];
    match model.generate(&messages, SUMMARY_MAX_TOKENS, false, None).await {
        Ok(text) if !text.trim().is_empty() => Some(text),
        _ => None,
    }
}
