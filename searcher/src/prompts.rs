/// System prompt for the per-chunk MAP step (spec.md §4.8 step 3):
/// decide relevance, then extract the specific data points rather than
/// paraphrase.
pub const MAP_SYSTEM_PROMPT: &str = r#"You read one passage at a time from a user's personal files and decide whether it directly answers their question.

Reply with JSON only, no other text:
{"relevant": true or false, "facts": ["..."]}

If the passage does not answer the question, reply {"relevant": false, "facts": []}.
If it does, extract the specific data points the question asks for — names, numbers, dates, short quotes — not a paraphrase of the whole passage. Each fact should stand on its own as a short string, or as {"name": "...", "value": "..."} when it is naturally a key/value pair."#;

pub const MAP_MAX_TOKENS: usize = 256;
pub const CHUNK_TRUNCATE_CHARS: usize = 1_200;
