//! The [`Record`] trait: the little a controller needs to know about a row.

use agentos_api::types::Row;
use serde_json::Value;

/// Filter keys that trigger free-text matching instead of field equality.
pub const SEARCH_KEYS: &[&str] = &["search", "q"];

/// A backend row as seen by the controller: opaque beyond its identifier
/// and the fields used for column rendering and local filtering.
pub trait Record: Clone + Send + Sync + 'static {
    /// Stable identifier.
    fn id(&self) -> &str;

    /// Display text of a field, if present.
    fn field(&self, key: &str) -> Option<String>;

    /// Local filter predicate used by client-side filtering.
    ///
    /// Defaults to case-insensitive equality on the named field.
    fn matches(&self, key: &str, value: &str) -> bool {
        self.field(key)
            .is_some_and(|v| v.eq_ignore_ascii_case(value))
    }
}

impl Record for Row {
    fn id(&self) -> &str {
        Row::id(self)
    }

    fn field(&self, key: &str) -> Option<String> {
        self.text(key)
    }

    fn matches(&self, key: &str, value: &str) -> bool {
        if SEARCH_KEYS.contains(&key) {
            let needle = value.to_lowercase();
            return self.fields().values().any(|v| match v {
                Value::String(s) => s.to_lowercase().contains(&needle),
                Value::Number(n) => n.to_string().contains(&needle),
                _ => false,
            });
        }
        self.text(key)
            .is_some_and(|v| v.eq_ignore_ascii_case(value))
    }
}
