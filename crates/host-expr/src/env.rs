//! Variable bindings for evaluation.

use crate::error::{EvalError, EvalResult};
use crate::value::Value;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

/// Names visible to an evaluated expression.
///
/// Evaluation takes a stack of `Bindings` layers; a name resolves in the
/// first layer that defines it, and builtins are consulted last.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    vars: FxHashMap<SmolStr, Value>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<SmolStr>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<SmolStr>, value: impl Into<Value>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Copy every binding of `other` into `self`, overwriting on conflict.
    pub fn extend(&mut self, other: &Bindings) {
        self.vars
            .extend(other.vars.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    /// Bindings from a JSON object; each member becomes a variable.
    pub fn from_json(json: serde_json::Value) -> EvalResult<Self> {
        match json {
            serde_json::Value::Object(members) => Ok(members
                .into_iter()
                .map(|(name, value)| (SmolStr::from(name), Value::from(value)))
                .collect()),
            other => Err(EvalError::type_error(format!(
                "bindings must be a JSON object, not {}",
                json_type_name(&other)
            ))),
        }
    }
}

fn json_type_name(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

impl<K: Into<SmolStr>> FromIterator<(K, Value)> for Bindings {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json() {
        let bindings = Bindings::from_json(json!({"n": 3, "names": ["a", "b"]})).unwrap();
        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings.get("n"), Some(&Value::Int(3)));
        assert_eq!(
            bindings.get("names"),
            Some(&Value::List(vec![Value::str("a"), Value::str("b")]))
        );
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        let err = Bindings::from_json(json!([1, 2])).unwrap_err();
        assert_eq!(err.message, "bindings must be a JSON object, not an array");
    }

    #[test]
    fn test_extend_overwrites() {
        let mut base = Bindings::new().with("a", 1i64).with("b", 2i64);
        base.extend(&Bindings::new().with("b", "two"));
        assert_eq!(base.get("a"), Some(&Value::Int(1)));
        assert_eq!(base.get("b"), Some(&Value::str("two")));
    }
}
