//! Opaque backend record used by generic list views.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Stable identifier of a row, always carried as a string.
pub type RowID = String;

/// Keys probed for the record identifier, in order.
const ID_KEYS: &[&str] = &["id", "_id", "uuid", "key"];

/// A backend-defined record. Only the identifier is interpreted; every other
/// field is kept verbatim for column rendering.
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    id: RowID,
    fields: Map<String, Value>,
}

impl Row {
    /// Builds a row from a JSON object, extracting its identifier.
    pub fn from_map(fields: Map<String, Value>) -> Result<Self, String> {
        let id = ID_KEYS
            .iter()
            .find_map(|key| match fields.get(*key) {
                Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            })
            .ok_or_else(|| format!("record has none of the id fields {:?}", ID_KEYS))?;
        Ok(Self { id, fields })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Display text for a field: strings as-is, scalars formatted, null as `None`.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.fields.get(key)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(n.to_string()),
            other => Some(other.to_string()),
        }
    }

    pub fn set(&mut self, key: &str, value: Value) {
        self.fields.insert(key.to_string(), value);
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let fields = Map::<String, Value>::deserialize(deserializer)?;
        Row::from_map(fields).map_err(serde::de::Error::custom)
    }
}

impl Serialize for Row {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.fields.serialize(serializer)
    }
}
