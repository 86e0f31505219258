use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::path::is_truthy;

/// Declared contexts in declaration order, each with its enabled flag.
///
/// Flags are normalised to `bool` once, when the raw settings value is
/// parsed; filtering never re-inspects the original values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextDeclarations {
    entries: IndexMap<String, bool>,
}

impl ContextDeclarations {
    /// Parse a raw settings value.
    ///
    /// A mapping yields one entry per key with its truthiness as the flag.
    /// `null` and anything that is not a mapping yield no declarations.
    pub fn from_value(raw: &Value) -> Self {
        match raw {
            Value::Object(map) => map
                .iter()
                .map(|(name, flag)| (name.clone(), is_truthy(flag)))
                .collect(),
            Value::Null => Self::default(),
            other => {
                tracing::warn!(kind = kind_of(other), "context declarations are not a mapping; ignoring");
                Self::default()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.entries.get(name).copied().unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Only the enabled entries, order preserved.
    pub fn enabled(&self) -> Self {
        self.iter()
            .filter(|(_, enabled)| *enabled)
            .map(|(name, enabled)| (name.to_string(), enabled))
            .collect()
    }
}

impl FromIterator<(String, bool)> for ContextDeclarations {
    fn from_iter<I: IntoIterator<Item = (String, bool)>>(iter: I) -> Self {
        Self { entries: iter.into_iter().collect() }
    }
}

pub(crate) fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn loose_flags_normalised() {
        let decl = ContextDeclarations::from_value(&json!({
            "shop": true,
            "crm": 1,
            "legacy": "0",
            "beta": "",
            "ops": "yes",
            "off": false,
        }));
        assert_eq!(decl.len(), 6);
        let binding = decl.enabled();
        let enabled: Vec<&str> = binding.names().collect();
        assert_eq!(enabled, vec!["shop", "crm", "ops"]);
        assert!(decl.contains("legacy"));
        assert!(!decl.is_enabled("legacy"));
    }

    #[test]
    fn non_mapping_is_empty() {
        assert!(ContextDeclarations::from_value(&json!(null)).is_empty());
        assert!(ContextDeclarations::from_value(&json!(["a", "b"])).is_empty());
        assert!(ContextDeclarations::from_value(&json!("shop")).is_empty());
    }
}
