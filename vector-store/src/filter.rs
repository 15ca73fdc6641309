use crate::types::Metadata;
use std::collections::HashMap;

/// A single metadata filter clause. Only `contains` exists today
/// (spec.md §4.3: `field → {contains: substr}`, case-insensitive) but
/// this stays an enum so new operators don't need a signature change.
#[derive(Debug, Clone)]
pub enum FilterOp {
    Contains(String),
}

#[derive(Debug, Clone, Default)]
pub struct MetadataFilters(pub HashMap<String, FilterOp>);

impl MetadataFilters {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    pub fn contains(mut self, field: impl Into<String>, substr: impl Into<String>) -> Self {
        self.0.insert(field.into(), FilterOp::Contains(substr.into()));
        self
    }

    pub fn matches(&self, metadata: &Metadata) -> bool {
        self.0.iter().all(|(field, op)| match op {
            FilterOp::Contains(substr) => metadata
                .field(field)
                .map(|value| value.to_lowercase().contains(&substr.to_lowercase()))
                .unwrap_or(false),
        })
    }
}
