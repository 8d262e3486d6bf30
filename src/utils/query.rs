// ============================================================================
// QUERY PARAMS - list-friendly query string serialization
// ============================================================================
// Arrays repeat the key without indices (`tags=a&tags=b`), which is what the
// backend's list parsing expects. Nested objects use bracket keys.
// ============================================================================

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds params from any serializable struct or map.
    ///
    /// Non-object values (numbers, strings at the top level) have no key to
    /// attach to and produce no params.
    pub fn from_serializable<T: Serialize>(params: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::from_value(&serde_json::to_value(params)?))
    }

    pub fn from_value(value: &Value) -> Self {
        let mut params = Self::new();
        if let Value::Object(map) = value {
            for (key, value) in map {
                params.append_value(key, value);
            }
        }
        params
    }

    pub fn push(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.pairs.push((key.into(), value.to_string()));
        self
    }

    /// Repeats `key` once per value
    pub fn push_all<I, V>(mut self, key: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: ToString,
    {
        self.pairs
            .extend(values.into_iter().map(|v| (key.to_string(), v.to_string())));
        self
    }

    fn append_value(&mut self, key: &str, value: &Value) {
        match value {
            Value::Null => self.pairs.push((key.to_string(), String::new())),
            Value::Bool(b) => self.pairs.push((key.to_string(), b.to_string())),
            Value::Number(n) => self.pairs.push((key.to_string(), n.to_string())),
            Value::String(s) => self.pairs.push((key.to_string(), s.clone())),
            Value::Array(items) => {
                for item in items {
                    self.append_value(key, item);
                }
            }
            Value::Object(map) => {
                for (child, value) in map {
                    self.append_value(&format!("{}[{}]", key, child), value);
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Percent-encoded `k=v&k=v`, without the leading `?`
    pub fn to_query_string(&self) -> String {
        encode_pairs(&self.pairs)
    }
}

pub fn encode_pairs(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}
