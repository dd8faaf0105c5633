//! Page content: field values plus per-section visibility.
//!
//! On the wire a page's content is one flat JSON object. Section visibility
//! lives under the reserved [`SECTION_VISIBILITY_KEY`] object; older records
//! stored it as `${sectionId}Visible` booleans next to the fields. Those are
//! folded into the visibility map by [`PageContent::load`], and only for
//! sections the page actually registers.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use smol_str::SmolStr;

use crate::registry::sections_for_page;

pub const SECTION_VISIBILITY_KEY: &str = "sectionVisibility";
const LEGACY_VISIBLE_SUFFIX: &str = "Visible";

#[derive(Debug, Clone, Default)]
pub struct PageContent {
    fields: Map<String, Value>,
    section_visibility: BTreeMap<SmolStr, bool>,
}

impl PageContent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read content as-is. Anything other than a JSON object is treated as
    /// empty content.
    pub fn from_value(value: Value) -> Self {
        Self::read(value, |_| false)
    }

    /// Read a stored record of `page`, migrating legacy `${sectionId}Visible`
    /// booleans for the page's registered sections. Other `*Visible` keys
    /// stay ordinary fields.
    pub fn load(page: &str, value: Value) -> Self {
        let sections = sections_for_page(page);
        Self::read(value, |id| sections.iter().any(|s| s.id == id))
    }

    fn read(value: Value, is_section: impl Fn(&str) -> bool) -> Self {
        let Value::Object(map) = value else {
            return Self::default();
        };
        let mut content = Self::default();
        let mut explicit = None;
        for (key, value) in map {
            if key == SECTION_VISIBILITY_KEY {
                explicit = Some(value);
                continue;
            }
            match (legacy_section_id(&key).filter(|id| is_section(*id)), &value) {
                (Some(section), Value::Bool(visible)) => {
                    content.section_visibility.insert(section.into(), *visible);
                }
                _ => {
                    content.fields.insert(key, value);
                }
            }
        }
        // The explicit map wins over legacy flags for the same section.
        if let Some(Value::Object(map)) = explicit {
            for (section, visible) in map {
                if let Value::Bool(visible) = visible {
                    content.section_visibility.insert(section.into(), visible);
                }
            }
        }
        content
    }

    pub fn to_value(&self) -> Value {
        let mut map = self.fields.clone();
        if !self.section_visibility.is_empty() {
            let visibility = self
                .section_visibility
                .iter()
                .map(|(id, visible)| (id.to_string(), Value::Bool(*visible)))
                .collect();
            map.insert(SECTION_VISIBILITY_KEY.to_string(), Value::Object(visibility));
        }
        Value::Object(map)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Get a string field, or `""` when absent or not a string.
    pub fn text(&self, key: &str) -> &str {
        self.fields.get(key).and_then(Value::as_str).unwrap_or("")
    }

    /// Set a field value. The reserved visibility key is routed into the
    /// visibility map instead of the fields.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        if key == SECTION_VISIBILITY_KEY {
            if let Value::Object(map) = value {
                self.section_visibility = map
                    .into_iter()
                    .filter_map(|(id, v)| v.as_bool().map(|b| (SmolStr::from(id), b)))
                    .collect();
            }
            return;
        }
        self.fields.insert(key, value);
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn section_visibility(&self) -> &BTreeMap<SmolStr, bool> {
        &self.section_visibility
    }

    /// Sections are visible unless explicitly hidden.
    pub fn is_section_visible(&self, section_id: &str) -> bool {
        self.section_visibility
            .get(section_id)
            .copied()
            .unwrap_or(true)
    }

    pub fn set_section_visible(&mut self, section_id: &str, visible: bool) {
        self.section_visibility.insert(section_id.into(), visible);
    }

    /// Fill gaps from `defaults`. Keys already present here win, including
    /// visibility entries.
    pub fn with_defaults(mut self, defaults: &PageContent) -> Self {
        for (key, value) in &defaults.fields {
            if !self.fields.contains_key(key) {
                self.fields.insert(key.clone(), value.clone());
            }
        }
        for (id, visible) in &defaults.section_visibility {
            self.section_visibility.entry(id.clone()).or_insert(*visible);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.section_visibility.is_empty()
    }
}

/// An explicit `true` and an absent entry both mean visible, so only hidden
/// sections take part in equality.
impl PartialEq for PageContent {
    fn eq(&self, other: &Self) -> bool {
        let hidden = |c: &PageContent| {
            c.section_visibility
                .iter()
                .filter(|(_, visible)| !**visible)
                .map(|(id, _)| id.clone())
                .collect::<Vec<_>>()
        };
        self.fields == other.fields && hidden(self) == hidden(other)
    }
}

fn legacy_section_id(key: &str) -> Option<&str> {
    key.strip_suffix(LEGACY_VISIBLE_SUFFIX)
        .filter(|id| !id.is_empty())
}

impl From<Value> for PageContent {
    fn from(value: Value) -> Self {
        Self::from_value(value)
    }
}

impl From<PageContent> for Value {
    fn from(content: PageContent) -> Self {
        content.to_value()
    }
}

impl Serialize for PageContent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PageContent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_legacy_visibility_keys_migrate() {
        let content = PageContent::load("about", json!({
            "heroTitle": "Hi",
            "heroVisible": false,
            "statsVisible": true,
        }));
        assert!(!content.is_section_visible("hero"));
        assert!(content.is_section_visible("stats"));
        assert!(content.get("heroVisible").is_none());
        assert_eq!(content.text("heroTitle"), "Hi");
    }

    #[test]
    fn test_explicit_visibility_wins_over_legacy() {
        let content = PageContent::load("about", json!({
            "heroVisible": false,
            "sectionVisibility": { "hero": true },
        }));
        assert!(content.is_section_visible("hero"));
    }

    #[test]
    fn test_unregistered_visible_flag_stays_a_field() {
        let content = PageContent::load("about", json!({
            "autoplayVisible": false,
            "heroVisible": false,
        }));
        assert_eq!(content.get("autoplayVisible"), Some(&json!(false)));
        assert!(content.is_section_visible("autoplay"));
        assert!(!content.is_section_visible("hero"));

        // Plain reads never migrate.
        let content = PageContent::from_value(json!({ "heroVisible": false }));
        assert_eq!(content.get("heroVisible"), Some(&json!(false)));
        assert!(content.section_visibility().is_empty());
    }

    #[test]
    fn test_non_bool_visible_suffix_stays_a_field() {
        let content = PageContent::from_value(json!({ "logoVisible": "sometimes" }));
        assert_eq!(content.text("logoVisible"), "sometimes");
        assert!(content.section_visibility().is_empty());
    }

    #[test]
    fn test_to_value_writes_reserved_key() {
        let mut content = PageContent::new();
        content.set("title", json!("x"));
        content.set_section_visible("cta", false);
        assert_eq!(
            content.to_value(),
            json!({ "title": "x", "sectionVisibility": { "cta": false } })
        );
        assert_eq!(PageContent::new().to_value(), json!({}));
    }

    #[test]
    fn test_non_object_is_empty() {
        assert!(PageContent::from_value(Value::Null).is_empty());
        assert!(PageContent::from_value(json!([1, 2])).is_empty());
    }

    #[test]
    fn test_with_defaults_keeps_stored_values() {
        let stored = PageContent::from_value(json!({ "a": "stored", "sectionVisibility": { "x": false } }));
        let defaults = PageContent::from_value(json!({ "a": "default", "b": "default" }));
        let merged = stored.with_defaults(&defaults);
        assert_eq!(merged.text("a"), "stored");
        assert_eq!(merged.text("b"), "default");
        assert!(!merged.is_section_visible("x"));
    }

    #[test]
    fn test_explicit_visible_equals_absent() {
        let mut a = PageContent::new();
        a.set_section_visible("hero", true);
        assert_eq!(a, PageContent::new());
        a.set_section_visible("hero", false);
        assert_ne!(a, PageContent::new());
    }

    #[test]
    fn test_equality_ignores_key_order() {
        let a = PageContent::from_value(json!({ "a": 1, "b": 2 }));
        let b = PageContent::from_value(json!({ "b": 2, "a": 1 }));
        assert_eq!(a, b);
    }
}
