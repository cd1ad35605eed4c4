//! Methods of builtin types, returned as bound functions by attribute access.

use crate::builtins::expect_int;
use crate::error::{EvalError, EvalResult};
use crate::value::{CallArgs, Function, Key, Value};
use smol_str::SmolStr;

/// Look up `receiver.name` for `str`, `dict` and `list` receivers.
pub fn bound_method(receiver: &Value, name: &str) -> Option<Value> {
    let known = match receiver {
        Value::Str(_) => matches!(
            name,
            "upper"
                | "lower"
                | "strip"
                | "lstrip"
                | "rstrip"
                | "title"
                | "capitalize"
                | "join"
                | "replace"
                | "split"
                | "startswith"
                | "endswith"
                | "count"
                | "find"
        ),
        Value::Dict(_) => matches!(name, "get" | "keys" | "values" | "items"),
        Value::List(_) | Value::Tuple(_) => matches!(name, "index" | "count"),
        _ => false,
    };
    if !known {
        return None;
    }
    let receiver = receiver.clone();
    let method = SmolStr::new(name);
    Some(Value::Function(Function::new(
        name,
        move |args: CallArgs| match &receiver {
            Value::Str(s) => str_method(s, &method, args),
            Value::Dict(_) => dict_method(&receiver, &method, args),
            _ => sequence_method(&receiver, &method, args),
        },
    )))
}

fn str_arg(value: &Value, method: &str) -> EvalResult<SmolStr> {
    match value {
        Value::Str(s) => Ok(s.clone()),
        other => Err(EvalError::type_error(format!(
            "{}() argument must be str, not {}",
            method,
            other.type_name()
        ))),
    }
}

/// Optional `chars` argument of the strip family.
fn strip_chars(args: &CallArgs, method: &str) -> EvalResult<Option<Vec<char>>> {
    args.check_positional(method, 0, 1)?;
    match args.positional.first() {
        None | Some(Value::None) => Ok(None),
        Some(value) => Ok(Some(str_arg(value, method)?.chars().collect())),
    }
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

fn str_method(s: &str, method: &str, args: CallArgs) -> EvalResult<Value> {
    args.finish_keywords(method)?;
    let text = match method {
        "upper" | "lower" | "title" | "capitalize" => {
            args.check_positional(method, 0, 0)?;
            match method {
                "upper" => s.to_uppercase(),
                "lower" => s.to_lowercase(),
                "title" => title_case(s),
                _ => {
                    let mut chars = s.chars();
                    match chars.next() {
                        Some(first) => {
                            let mut out: String = first.to_uppercase().collect();
                            out.push_str(&chars.as_str().to_lowercase());
                            out
                        }
                        None => String::new(),
                    }
                }
            }
        }
        "strip" | "lstrip" | "rstrip" => {
            let chars = strip_chars(&args, method)?;
            let matches = |c: char| match &chars {
                Some(set) => set.contains(&c),
                None => c.is_whitespace(),
            };
            let trimmed = match method {
                "strip" => s.trim_matches(matches),
                "lstrip" => s.trim_start_matches(matches),
                _ => s.trim_end_matches(matches),
            };
            trimmed.to_string()
        }
        "join" => {
            args.check_positional(method, 1, 1)?;
            let parts = args.positional[0]
                .iterate()?
                .iter()
                .map(|part| match part {
                    Value::Str(p) => Ok(p.clone()),
                    other => Err(EvalError::type_error(format!(
                        "sequence item: expected str instance, {} found",
                        other.type_name()
                    ))),
                })
                .collect::<EvalResult<Vec<_>>>()?;
            parts.join(s)
        }
        "replace" => {
            args.check_positional(method, 2, 2)?;
            let old = str_arg(&args.positional[0], method)?;
            let new = str_arg(&args.positional[1], method)?;
            s.replace(old.as_str(), &new)
        }
        "split" => {
            args.check_positional(method, 0, 1)?;
            let parts: Vec<Value> = match args.positional.first() {
                None | Some(Value::None) => s.split_whitespace().map(Value::from).collect(),
                Some(sep) => {
                    let sep = str_arg(sep, method)?;
                    if sep.is_empty() {
                        return Err(EvalError::value_error("empty separator"));
                    }
                    s.split(sep.as_str()).map(Value::from).collect()
                }
            };
            return Ok(Value::List(parts));
        }
        "startswith" | "endswith" | "count" | "find" => {
            args.check_positional(method, 1, 1)?;
            let needle = str_arg(&args.positional[0], method)?;
            return Ok(match method {
                "startswith" => Value::Bool(s.starts_with(needle.as_str())),
                "endswith" => Value::Bool(s.ends_with(needle.as_str())),
                "count" if needle.is_empty() => Value::Int(s.chars().count() as i64 + 1),
                "count" => Value::Int(s.matches(needle.as_str()).count() as i64),
                _ => Value::Int(
                    s.find(needle.as_str())
                        .map_or(-1, |byte| s[..byte].chars().count() as i64),
                ),
            });
        }
        _ => return Err(no_attribute("str", method)),
    };
    Ok(Value::str(text))
}

fn dict_method(receiver: &Value, method: &str, mut args: CallArgs) -> EvalResult<Value> {
    let Value::Dict(entries) = receiver else {
        return Err(no_attribute(receiver.type_name(), method));
    };
    if method == "get" {
        args.finish_keywords(method)?;
        args.check_positional(method, 1, 2)?;
        let key = Key::from_value(&args.positional[0])?;
        return Ok(match entries.get(&key) {
            Some(value) => value.clone(),
            None => args.positional.drain(..).nth(1).unwrap_or(Value::None),
        });
    }
    args.finish_keywords(method)?;
    args.check_positional(method, 0, 0)?;
    Ok(Value::List(match method {
        "keys" => entries.keys().map(Key::to_value).collect(),
        "values" => entries.values().cloned().collect(),
        "items" => entries
            .iter()
            .map(|(k, v)| Value::Tuple(vec![k.to_value(), v.clone()]))
            .collect(),
        _ => return Err(no_attribute("dict", method)),
    }))
}

fn sequence_method(receiver: &Value, method: &str, args: CallArgs) -> EvalResult<Value> {
    let (Value::List(items) | Value::Tuple(items)) = receiver else {
        return Err(no_attribute(receiver.type_name(), method));
    };
    args.finish_keywords(method)?;
    args.check_positional(method, 1, 1)?;
    let needle = &args.positional[0];
    match method {
        "count" => Ok(Value::Int(
            items.iter().filter(|v| v.py_eq(needle)).count() as i64,
        )),
        "index" => items
            .iter()
            .position(|v| v.py_eq(needle))
            .map(|i| Value::Int(i as i64))
            .ok_or_else(|| {
                EvalError::value_error(format!(
                    "{} is not in {}",
                    needle.repr(),
                    receiver.type_name()
                ))
            }),
        _ => Err(no_attribute(receiver.type_name(), method)),
    }
}

pub(crate) fn no_attribute(type_name: &str, attr: &str) -> EvalError {
    EvalError::attribute_error(format!(
        "'{}' object has no attribute '{}'",
        type_name, attr
    ))
}

/// Resolve a possibly negative sequence index against `len`.
pub(crate) fn normalize_index(index: &Value, len: usize, type_name: &str) -> EvalResult<usize> {
    let i = expect_int(index, &format!("{} indices", type_name))?;
    let adjusted = if i < 0 { i + len as i64 } else { i };
    if adjusted < 0 || adjusted >= len as i64 {
        return Err(EvalError::index_error(format!(
            "{} index out of range",
            type_name
        )));
    }
    Ok(adjusted as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn call(receiver: Value, name: &str, positional: Vec<Value>) -> EvalResult<Value> {
        let Some(Value::Function(f)) = bound_method(&receiver, name) else {
            panic!("no method {name}");
        };
        f.call(CallArgs::positional(positional))
    }

    #[test]
    fn test_str_methods() {
        let s = Value::str("  hello world  ");
        assert_eq!(call(s.clone(), "strip", vec![]).unwrap(), Value::str("hello world"));
        assert_eq!(
            call(Value::str("hello wORLD"), "title", vec![]).unwrap(),
            Value::str("Hello World")
        );
        assert_eq!(
            call(Value::str(", "), "join", vec![Value::List(vec![
                Value::str("a"),
                Value::str("b")
            ])])
            .unwrap(),
            Value::str("a, b")
        );
        assert_eq!(
            call(Value::str("a-b-c"), "split", vec![Value::str("-")])
                .unwrap()
                .to_string(),
            "['a', 'b', 'c']"
        );
        assert_eq!(
            call(Value::str("xxhixx"), "strip", vec![Value::str("x")]).unwrap(),
            Value::str("hi")
        );
        assert_eq!(
            call(Value::str("héllo"), "find", vec![Value::str("l")]).unwrap(),
            Value::Int(2)
        );
    }

    #[test]
    fn test_join_rejects_non_strings() {
        let err = call(Value::str(""), "join", vec![Value::List(vec![Value::Int(1)])])
            .unwrap_err();
        assert_eq!(err.message, "sequence item: expected str instance, int found");
    }

    #[test]
    fn test_dict_methods() {
        let dict = Value::from(serde_json::json!({"a": 1}));
        assert_eq!(call(dict.clone(), "get", vec![Value::str("a")]).unwrap(), Value::Int(1));
        assert_eq!(
            call(dict.clone(), "get", vec![Value::str("b"), Value::Int(0)]).unwrap(),
            Value::Int(0)
        );
        assert_eq!(call(dict.clone(), "get", vec![Value::str("b")]).unwrap(), Value::None);
        assert_eq!(call(dict, "items", vec![]).unwrap().to_string(), "[('a', 1)]");
    }

    #[test]
    fn test_unknown_method() {
        assert!(bound_method(&Value::Int(1), "upper").is_none());
        assert!(bound_method(&Value::str("a"), "nope").is_none());
    }

    #[test]
    fn test_normalize_index() {
        assert_eq!(normalize_index(&Value::Int(-1), 3, "list").unwrap(), 2);
        let err = normalize_index(&Value::Int(3), 3, "list").unwrap_err();
        assert_eq!(err.message, "list index out of range");
    }
}
