//! Event-name and tag filtering

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::Payload;

/// Tag selection for one event name: `"*"` or a list of tags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagSelector {
    Tags(Vec<String>),
    Wildcard(String),
}

impl TagSelector {
    /// Whether the selector is well formed (`"*"` is the only wildcard)
    pub fn is_valid(&self) -> bool {
        match self {
            TagSelector::Wildcard(w) => w == "*",
            TagSelector::Tags(_) => true,
        }
    }
}

/// Which events a reporter persists
///
/// An empty filter accepts everything. Otherwise the event name must be
/// listed; a tag list additionally requires the payload's `tags` array to
/// share at least one tag (an empty list behaves like `"*"`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventFilter(HashMap<String, TagSelector>);

impl EventFilter {
    /// Filter that accepts every event
    pub fn all() -> Self {
        Self::default()
    }

    /// Add or replace the selector for `name`
    pub fn with(mut self, name: impl Into<String>, selector: TagSelector) -> Self {
        self.0.insert(name.into(), selector);
        self
    }

    /// Event names whose selector is malformed
    pub fn invalid_entries(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .0
            .iter()
            .filter(|(_, selector)| !selector.is_valid())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether an event should be persisted
    pub fn matches(&self, name: &str, payload: &Payload) -> bool {
        if self.0.is_empty() {
            return true;
        }

        match self.0.get(name) {
            None => false,
            Some(TagSelector::Wildcard(_)) => true,
            Some(TagSelector::Tags(wanted)) if wanted.is_empty() => true,
            Some(TagSelector::Tags(wanted)) => match payload.get("tags") {
                Some(Payload::Array(tags)) => tags
                    .iter()
                    .filter_map(Payload::as_str)
                    .any(|tag| wanted.iter().any(|w| w == tag)),
                _ => false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_filter_accepts_everything() {
        assert!(EventFilter::all().matches("anything", &Payload::Null));
    }

    #[test]
    fn test_wildcard_and_tags() {
        let filter: EventFilter =
            serde_json::from_value(json!({"request": "*", "log": ["error", "warn"]})).unwrap();

        assert!(filter.matches("request", &Payload::Null));
        assert!(!filter.matches("ops", &Payload::Null));

        let tagged = Payload::from(json!({"tags": ["db", "error"], "data": "x"}));
        let untagged = Payload::from(json!({"tags": ["debug"]}));
        assert!(filter.matches("log", &tagged));
        assert!(!filter.matches("log", &untagged));
        assert!(!filter.matches("log", &Payload::from(json!({"data": 1}))));
    }

    #[test]
    fn test_invalid_wildcard_is_reported() {
        let filter = EventFilter::all()
            .with("request", TagSelector::Wildcard("all".to_string()))
            .with("log", TagSelector::Wildcard("*".to_string()));
        assert_eq!(filter.invalid_entries(), vec!["request".to_string()]);
    }
}
