//! Runtime values.

use crate::ast::{format_float, quote_str};
use crate::error::{EvalError, EvalResult};
use indexmap::IndexMap;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use smol_str::SmolStr;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Signature of a native function.
pub type NativeFn = dyn Fn(CallArgs) -> EvalResult<Value> + Send + Sync;

/// A callable value.
#[derive(Clone)]
pub struct Function {
    name: SmolStr,
    call: Arc<NativeFn>,
}

impl Function {
    pub fn new<F>(name: impl Into<SmolStr>, call: F) -> Self
    where
        F: Fn(CallArgs) -> EvalResult<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            call: Arc::new(call),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, args: CallArgs) -> EvalResult<Value> {
        (self.call)(args)
    }

    fn same(&self, other: &Function) -> bool {
        Arc::as_ptr(&self.call) as *const () == Arc::as_ptr(&other.call) as *const ()
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<function {}>", self.name)
    }
}

/// Arguments passed to a [`Function`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    pub positional: Vec<Value>,
    pub keywords: IndexMap<SmolStr, Value>,
}

impl CallArgs {
    pub fn positional(values: Vec<Value>) -> Self {
        Self {
            positional: values,
            keywords: IndexMap::new(),
        }
    }

    pub fn with_keyword(mut self, name: impl Into<SmolStr>, value: Value) -> Self {
        self.keywords.insert(name.into(), value);
        self
    }

    /// Fail unless the positional count is within `min..=max`.
    pub fn check_positional(&self, func: &str, min: usize, max: usize) -> EvalResult<()> {
        let n = self.positional.len();
        if n < min || n > max {
            let expected = if min == max {
                format!("{}", min)
            } else {
                format!("{} to {}", min, max)
            };
            return Err(EvalError::type_error(format!(
                "{}() takes {} positional arguments but {} were given",
                func, expected, n
            )));
        }
        Ok(())
    }

    /// Remove a keyword argument, failing on any others left behind by
    /// [`finish_keywords`](Self::finish_keywords).
    pub fn take_keyword(&mut self, name: &str) -> Option<Value> {
        self.keywords.shift_remove(name)
    }

    pub fn finish_keywords(&self, func: &str) -> EvalResult<()> {
        match self.keywords.keys().next() {
            Some(name) => Err(EvalError::type_error(format!(
                "{}() got an unexpected keyword argument '{}'",
                func, name
            ))),
            None => Ok(()),
        }
    }
}

/// A named collection of members, reached with attribute syntax.
#[derive(Debug, Clone, PartialEq)]
pub struct Namespace {
    name: SmolStr,
    members: IndexMap<SmolStr, Value>,
}

impl Namespace {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            members: IndexMap::new(),
        }
    }

    /// A namespace whose members are component constructors, one per name.
    pub fn with_constructors<'n>(
        name: impl Into<SmolStr>,
        components: impl IntoIterator<Item = &'n str>,
    ) -> Self {
        let mut namespace = Self::new(name);
        for component in components {
            let constructor = constructor(namespace.name.clone(), component);
            namespace.insert(component, constructor);
        }
        namespace
    }

    pub fn with(mut self, name: impl Into<SmolStr>, value: Value) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<SmolStr>, value: Value) {
        self.members.insert(name.into(), value);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, member: &str) -> Option<&Value> {
        self.members.get(member)
    }

    pub fn members(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.members.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// A component instance: a type name and its properties.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub namespace: SmolStr,
    pub name: SmolStr,
    pub props: IndexMap<SmolStr, Value>,
}

impl Component {
    pub fn new(namespace: impl Into<SmolStr>, name: impl Into<SmolStr>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            props: IndexMap::new(),
        }
    }

    pub fn with_prop(mut self, name: impl Into<SmolStr>, value: Value) -> Self {
        self.props.insert(name.into(), value);
        self
    }

    /// `namespace.Name`, or just `Name` when the namespace is empty.
    pub fn qualified_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.to_string()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    pub fn prop(&self, name: &str) -> Option<&Value> {
        self.props.get(name)
    }

    pub fn children(&self) -> Option<&Value> {
        self.prop("children")
    }
}

/// A function building a [`Component`] of the given type from keyword
/// arguments. A single positional argument is taken as `children`.
pub fn constructor(namespace: impl Into<SmolStr>, name: &str) -> Value {
    let namespace = namespace.into();
    let component_name = SmolStr::new(name);
    let func_name = component_name.clone();
    Value::Function(Function::new(func_name, move |args: CallArgs| {
        args.check_positional(&component_name, 0, 1)?;
        let mut component = Component::new(namespace.clone(), component_name.clone());
        if let Some(children) = args.positional.into_iter().next() {
            if args.keywords.contains_key("children") {
                return Err(EvalError::type_error(format!(
                    "{}() got multiple values for argument 'children'",
                    component_name
                )));
            }
            component.props.insert("children".into(), children);
        }
        component.props.extend(args.keywords);
        Ok(Value::Component(Arc::new(component)))
    }))
}

/// A hashable value, usable as a dict key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    None,
    Bool(bool),
    Int(i64),
    Str(SmolStr),
    Tuple(Vec<Key>),
}

impl Key {
    pub fn to_value(&self) -> Value {
        match self {
            Key::None => Value::None,
            Key::Bool(b) => Value::Bool(*b),
            Key::Int(i) => Value::Int(*i),
            Key::Str(s) => Value::Str(s.clone()),
            Key::Tuple(items) => Value::Tuple(items.iter().map(Key::to_value).collect()),
        }
    }

    pub fn from_value(value: &Value) -> EvalResult<Key> {
        Ok(match value {
            Value::None => Key::None,
            Value::Bool(b) => Key::Bool(*b),
            Value::Int(i) => Key::Int(*i),
            Value::Float(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => Key::Int(*f as i64),
            Value::Str(s) => Key::Str(s.clone()),
            Value::Tuple(items) => {
                Key::Tuple(items.iter().map(Key::from_value).collect::<EvalResult<_>>()?)
            }
            other => {
                return Err(EvalError::type_error(format!(
                    "unhashable type: '{}'",
                    other.type_name()
                )))
            }
        })
    }

    /// Text used when the key becomes a JSON object key.
    fn json_key(&self) -> String {
        match self {
            Key::Str(s) => s.to_string(),
            other => other.to_value().repr(),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_value().repr())
    }
}

#[derive(Debug, Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(SmolStr),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Dict(IndexMap<Key, Value>),
    Function(Function),
    Namespace(Arc<Namespace>),
    Component(Arc<Component>),
}

impl Value {
    pub fn str(s: impl Into<SmolStr>) -> Self {
        Value::Str(s.into())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Dict(_) => "dict",
            Value::Function(_) => "function",
            Value::Namespace(_) => "module",
            Value::Component(_) => "component",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) | Value::Tuple(items) => !items.is_empty(),
            Value::Dict(entries) => !entries.is_empty(),
            Value::Function(_) | Value::Namespace(_) | Value::Component(_) => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Bool(b) => Some(*b as i64),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            Value::Bool(b) => Some(*b as i64 as f64),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_component(&self) -> Option<&Component> {
        match self {
            Value::Component(c) => Some(c),
            _ => None,
        }
    }

    /// The items produced by iterating over this value.
    pub fn iterate(&self) -> EvalResult<Vec<Value>> {
        match self {
            Value::List(items) | Value::Tuple(items) => Ok(items.clone()),
            Value::Str(s) => Ok(s.chars().map(|c| Value::Str(c.to_string().into())).collect()),
            Value::Dict(entries) => Ok(entries.keys().map(Key::to_value).collect()),
            other => Err(EvalError::type_error(format!(
                "'{}' object is not iterable",
                other.type_name()
            ))),
        }
    }

    /// Python `==`: numbers compare across `bool`, `int` and `float`.
    pub fn py_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.py_eq(y))
            }
            (Value::Dict(a), Value::Dict(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.get(k).map_or(false, |other| v.py_eq(other)))
            }
            (Value::Function(a), Value::Function(b)) => a.same(b),
            (Value::Namespace(a), Value::Namespace(b)) => Arc::ptr_eq(a, b),
            (Value::Component(a), Value::Component(b)) => a == b,
            (a, b) => match (a.as_number(), b.as_number()) {
                (Some(x), Some(y)) => x.numeric_eq(y),
                _ => false,
            },
        }
    }

    /// Python ordering for `<` and friends, `None` when the types do not
    /// compare.
    pub fn py_cmp(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
                for (x, y) in a.iter().zip(b) {
                    if !x.py_eq(y) {
                        return x.py_cmp(y);
                    }
                }
                Some(a.len().cmp(&b.len()))
            }
            (a, b) => match (a.as_number(), b.as_number()) {
                (Some(Number::Int(x)), Some(Number::Int(y))) => Some(x.cmp(&y)),
                (Some(x), Some(y)) => x.to_f64().partial_cmp(&y.to_f64()),
                _ => None,
            },
        }
    }

    pub(crate) fn as_number(&self) -> Option<Number> {
        match self {
            Value::Bool(b) => Some(Number::Int(*b as i64)),
            Value::Int(i) => Some(Number::Int(*i)),
            Value::Float(f) => Some(Number::Float(*f)),
            _ => None,
        }
    }

    /// Python `repr()`.
    pub fn repr(&self) -> String {
        match self {
            Value::Str(s) => quote_str(s),
            other => other.to_string(),
        }
    }
}

/// Numeric view of `bool`, `int` and `float` values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub(crate) fn to_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    /// Equality across the numeric tower: ints compare exactly, any pair
    /// involving a float compares as floats.
    pub(crate) fn numeric_eq(self, other: Number) -> bool {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a == b,
            (a, b) => a.to_f64() == b.to_f64(),
        }
    }
}

impl PartialEq for Value {
    /// Structural equality; functions compare by identity.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Dict(a), Value::Dict(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a.same(b),
            (Value::Namespace(a), Value::Namespace(b)) => a == b,
            (Value::Component(a), Value::Component(b)) => a == b,
            _ => false,
        }
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        f.write_str(&item.repr())?;
    }
    Ok(())
}

/// Python `str()`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => f.write_str("None"),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => f.write_str(&format_float(*x)),
            Value::Str(s) => f.write_str(s),
            Value::List(items) => {
                f.write_str("[")?;
                write_items(f, items)?;
                f.write_str("]")
            }
            Value::Tuple(items) => {
                f.write_str("(")?;
                write_items(f, items)?;
                if items.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
            Value::Dict(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", key, value.repr())?;
                }
                f.write_str("}")
            }
            Value::Function(func) => write!(f, "<function {}>", func.name),
            Value::Namespace(ns) => write!(f, "<module '{}'>", ns.name),
            Value::Component(component) => {
                write!(f, "{}(", component.qualified_name())?;
                for (i, (name, value)) in component.props.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}={}", name, value.repr())?;
                }
                f.write_str(")")
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::None => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Str(s) => serializer.serialize_str(s),
            Value::List(items) | Value::Tuple(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Dict(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(&key.json_key(), value)?;
                }
                map.end()
            }
            Value::Function(func) => {
                serializer.serialize_str(&format!("<function {}>", func.name))
            }
            Value::Namespace(ns) => serializer.serialize_str(&format!("<module '{}'>", ns.name)),
            Value::Component(component) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", &component.qualified_name())?;
                map.serialize_entry("props", &component.props)?;
                map.end()
            }
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::None,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Str(s.into()),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(entries) => Value::Dict(
                entries
                    .into_iter()
                    .map(|(k, v)| (Key::Str(k.into()), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s.into())
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<Namespace> for Value {
    fn from(ns: Namespace) -> Self {
        Value::Namespace(Arc::new(ns))
    }
}

impl From<Function> for Value {
    fn from(func: Function) -> Self {
        Value::Function(func)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_str_and_repr() {
        let value = Value::List(vec![
            Value::Int(1),
            Value::Float(2.0),
            Value::str("x"),
            Value::None,
            Value::Tuple(vec![Value::Bool(true)]),
        ]);
        assert_eq!(value.to_string(), "[1, 2.0, 'x', None, (True,)]");
        assert_eq!(Value::str("x").to_string(), "x");
        assert_eq!(Value::str("x").repr(), "'x'");
    }

    #[test]
    fn test_numeric_equality_across_types() {
        assert!(Value::Int(1).py_eq(&Value::Float(1.0)));
        assert!(Value::Bool(true).py_eq(&Value::Int(1)));
        assert!(!Value::Int(1).py_eq(&Value::str("1")));
        assert_ne!(Value::Int(1), Value::Float(1.0));
        assert_eq!(
            Value::Int(2).py_cmp(&Value::Float(2.5)),
            Some(Ordering::Less)
        );
        assert_eq!(Value::str("a").py_cmp(&Value::Int(1)), None);
    }

    #[test]
    fn test_constructor_builds_component() {
        let Value::Function(div) = constructor("html", "Div") else {
            panic!("constructor is not a function");
        };
        let args = CallArgs::positional(vec![Value::str("hi")])
            .with_keyword("id", Value::str("main"));
        let value = div.call(args).unwrap();
        let component = value.as_component().unwrap();
        assert_eq!(component.qualified_name(), "html.Div");
        assert_eq!(component.children(), Some(&Value::str("hi")));
        assert_eq!(value.to_string(), "html.Div(children='hi', id='main')");
    }

    #[test]
    fn test_constructor_rejects_double_children() {
        let Value::Function(div) = constructor("html", "Div") else {
            panic!("constructor is not a function");
        };
        let args = CallArgs::positional(vec![Value::str("a")])
            .with_keyword("children", Value::str("b"));
        assert!(div.call(args).is_err());
    }

    #[test]
    fn test_serialize_component() {
        let component = Component::new("html", "Div")
            .with_prop("children", Value::List(vec![Value::str("hi")]))
            .with_prop("style", {
                let mut style = IndexMap::new();
                style.insert(Key::Str("width".into()), Value::Int(3));
                Value::Dict(style)
            });
        let json = serde_json::to_value(Value::Component(Arc::new(component))).unwrap();
        assert_eq!(
            json,
            json!({
                "type": "html.Div",
                "props": {"children": ["hi"], "style": {"width": 3}}
            })
        );
    }

    #[test]
    fn test_from_json() {
        let value = Value::from(json!({"a": [1, 2.5, null, "s"], "b": true}));
        let mut expected = IndexMap::new();
        expected.insert(
            Key::Str("a".into()),
            Value::List(vec![
                Value::Int(1),
                Value::Float(2.5),
                Value::None,
                Value::str("s"),
            ]),
        );
        expected.insert(Key::Str("b".into()), Value::Bool(true));
        assert_eq!(value, Value::Dict(expected));
    }

    #[test]
    fn test_unhashable_key() {
        let err = Key::from_value(&Value::List(vec![])).unwrap_err();
        assert_eq!(err.message, "unhashable type: 'list'");
    }
}
