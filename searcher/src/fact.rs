use serde_json::Value;

/// Facts grouped by source name, insertion-ordered (spec.md §4.8 step 4:
/// "the deduplicated, insertion-ordered list of source filenames").
#[derive(Debug, Default)]
pub struct FactGroups {
    order: Vec<String>,
    facts: Vec<(String, Vec<String>)>,
}

impl FactGroups {
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn push(&mut self, source: &str, fact: String) {
        if let Some((_, facts)) = self.facts.iter_mut().find(|(name, _)| name == source) {
            facts.push(fact);
            return;
        }
        self.order.push(source.to_string());
        self.facts.push((source.to_string(), vec![fact]));
    }

    pub fn sources(&self) -> Vec<String> {
        self.order.clone()
    }

    /// `From <source>:` blocks, in insertion order.
    pub fn format(&self) -> String {
        self.order
            .iter()
            .filter_map(|source| {
                let facts = self
                    .facts
                    .iter()
                    .find(|(name, _)| name == source)
                    .map(|(_, facts)| facts)?;
                let lines: Vec<String> = facts.iter().map(|fact| format!("  - {fact}")).collect();
                Some(format!("From {source}:\n{}", lines.join("\n")))
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Max facts kept per chunk (spec.md §4.8 step 4).
pub const MAX_FACTS_PER_CHUNK: usize = 10;

/// Normalize one raw fact value from a MAP reply into a display string.
/// Bare strings shorter than 3 characters are dropped; `{name, value}`
/// objects become `"name: value"`; anything else is dropped rather than
/// passed through unexamined.
fn normalize_fact(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (s.chars().count() >= 3).then(|| s.to_string())
        }
        Value::Object(map) => {
            let name = map.get("name").and_then(Value::as_str)?;
            let fact_value = map.get("value")?;
            let value_str = match fact_value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Some(format!("{name}: {value_str}"))
        }
        _ => None,
    }
}

/// Parse a MAP-step reply value into up to `MAX_FACTS_PER_CHUNK`
/// normalized facts. Returns an empty vec for an irrelevant chunk, a
/// missing `facts` array, or a reply that failed to parse at all.
pub fn facts_from_reply(reply: &Value) -> Vec<String> {
    let relevant = reply.get("relevant").and_then(Value::as_bool).unwrap_or(false);
    if !relevant {
        return Vec::new();
    }
    let Some(facts) = reply.get("facts").and_then(Value::as_array) else {
        return Vec::new();
    };
    facts
        .iter()
        .filter_map(normalize_fact)
        .take(MAX_FACTS_PER_CHUNK)
        .collect()
}
