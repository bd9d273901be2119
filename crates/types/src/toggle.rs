//! Drill-down toggle history.

use serde::{Deserialize, Serialize};

/// Insertion-ordered set of toggle-element ids tracking which drill-down
/// groups are currently expanded.
///
/// Flipping an id already present removes it; flipping a new id appends it.
/// The whole history is sent with every drill-down export so the backend
/// re-renders the document with the same groups open.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToggleHistory(Vec<String>);

impl ToggleHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggles an element id in or out of the history. The flip is its own
    /// inverse: applying it twice restores the original set.
    pub fn flip(&mut self, toggle_element_id: &str) {
        match self.0.iter().position(|id| id == toggle_element_id) {
            Some(at) => {
                self.0.remove(at);
            }
            None => self.0.push(toggle_element_id.to_string()),
        }
    }

    pub fn contains(&self, toggle_element_id: &str) -> bool {
        self.0.iter().any(|id| id == toggle_element_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flip_appends_then_removes() {
        let mut history = ToggleHistory::new();
        history.flip("g1");
        history.flip("g2");
        assert!(history.contains("g1"));
        assert_eq!(history.len(), 2);

        history.flip("g1");
        assert!(!history.contains("g1"));
        assert!(history.contains("g2"));
    }

    #[test]
    fn test_flip_is_its_own_inverse() {
        let mut history = ToggleHistory::new();
        history.flip("a");
        history.flip("b");
        let snapshot = history.clone();

        history.flip("c");
        history.flip("c");
        assert_eq!(history, snapshot);
    }

    #[test]
    fn test_preserves_insertion_order() {
        let mut history = ToggleHistory::new();
        history.flip("first");
        history.flip("second");
        history.flip("third");
        history.flip("second");
        let order: Vec<&str> = history.iter().collect();
        assert_eq!(order, vec!["first", "third"]);
    }

    #[test]
    fn test_serializes_as_plain_array() {
        let mut history = ToggleHistory::new();
        history.flip("g1");
        history.flip("g2");
        let json = serde_json::to_value(&history).unwrap();
        assert_eq!(json, serde_json::json!(["g1", "g2"]));
    }
}
