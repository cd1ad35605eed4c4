//! Builtin functions, visible when no binding layer shadows them.

use crate::ast::BinOp;
use crate::error::{EvalError, EvalResult};
use crate::ops;
use crate::value::{CallArgs, Function, Key, Value};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use std::cmp::Ordering;

/// Longest list `range()` will materialize.
const MAX_RANGE_LEN: i64 = 1 << 24;

static BUILTINS: Lazy<FxHashMap<&'static str, Value>> = Lazy::new(|| {
    let table: [(&'static str, fn(CallArgs) -> EvalResult<Value>); 22] = [
        ("range", range),
        ("len", len),
        ("str", str_),
        ("repr", repr),
        ("int", int),
        ("float", float),
        ("bool", bool_),
        ("list", list),
        ("tuple", tuple),
        ("dict", dict),
        ("abs", abs),
        ("min", min),
        ("max", max),
        ("sum", sum),
        ("sorted", sorted),
        ("reversed", reversed),
        ("enumerate", enumerate),
        ("zip", zip),
        ("chr", chr),
        ("ord", ord),
        ("any", any),
        ("all", all),
    ];
    table
        .into_iter()
        .map(|(name, f)| (name, Value::Function(Function::new(name, f))))
        .collect()
});

pub fn lookup(name: &str) -> Option<&'static Value> {
    BUILTINS.get(name)
}

pub fn names() -> impl Iterator<Item = &'static str> {
    BUILTINS.keys().copied()
}

fn single(args: &mut CallArgs, func: &str) -> EvalResult<Value> {
    args.finish_keywords(func)?;
    args.check_positional(func, 1, 1)?;
    Ok(args.positional.remove(0))
}

pub(crate) fn expect_int(value: &Value, what: &str) -> EvalResult<i64> {
    value.as_int().ok_or_else(|| {
        EvalError::type_error(format!(
            "{} must be an integer, not '{}'",
            what,
            value.type_name()
        ))
    })
}

fn range(args: CallArgs) -> EvalResult<Value> {
    args.finish_keywords("range")?;
    args.check_positional("range", 1, 3)?;
    let ints = args
        .positional
        .iter()
        .map(|v| expect_int(v, "range() argument"))
        .collect::<EvalResult<Vec<_>>>()?;
    let (start, stop, step) = match ints[..] {
        [stop] => (0, stop, 1),
        [start, stop] => (start, stop, 1),
        [start, stop, step] => (start, stop, step),
        _ => return Err(EvalError::type_error("range expected 1 to 3 arguments")),
    };
    if step == 0 {
        return Err(EvalError::value_error("range() arg 3 must not be zero"));
    }
    let (start, stop, step) = (i128::from(start), i128::from(stop), i128::from(step));
    let span = if step > 0 { stop - start } else { start - stop };
    let count = if span <= 0 {
        0
    } else {
        (span - 1) / step.abs() + 1
    };
    if count > i128::from(MAX_RANGE_LEN) {
        return Err(EvalError::overflow("range() result is too large"));
    }
    // Every element lies between start and stop, so it fits in an i64.
    Ok(Value::List(
        (0..count)
            .map(|i| Value::Int((start + i * step) as i64))
            .collect(),
    ))
}

fn len(mut args: CallArgs) -> EvalResult<Value> {
    let value = single(&mut args, "len")?;
    let n = match &value {
        Value::Str(s) => s.chars().count(),
        Value::List(items) | Value::Tuple(items) => items.len(),
        Value::Dict(entries) => entries.len(),
        other => {
            return Err(EvalError::type_error(format!(
                "object of type '{}' has no len()",
                other.type_name()
            )))
        }
    };
    Ok(Value::Int(n as i64))
}

fn str_(args: CallArgs) -> EvalResult<Value> {
    args.finish_keywords("str")?;
    args.check_positional("str", 0, 1)?;
    Ok(match args.positional.first() {
        Some(value) => Value::str(value.to_string()),
        None => Value::str(""),
    })
}

fn repr(mut args: CallArgs) -> EvalResult<Value> {
    Ok(Value::str(single(&mut args, "repr")?.repr()))
}

fn int(args: CallArgs) -> EvalResult<Value> {
    args.finish_keywords("int")?;
    args.check_positional("int", 0, 1)?;
    let Some(value) = args.positional.first() else {
        return Ok(Value::Int(0));
    };
    match value {
        Value::Int(i) => Ok(Value::Int(*i)),
        Value::Bool(b) => Ok(Value::Int(*b as i64)),
        Value::Float(f) if f.is_nan() => Err(EvalError::value_error(
            "cannot convert float NaN to integer",
        )),
        Value::Float(f) if f.is_infinite() || f.abs() >= 9.2e18 => Err(EvalError::overflow(
            "float too large to convert to int",
        )),
        Value::Float(f) => Ok(Value::Int(f.trunc() as i64)),
        Value::Str(s) => {
            let digits: String = s.trim().chars().filter(|&c| c != '_').collect();
            digits.parse().map(Value::Int).map_err(|_| {
                EvalError::value_error(format!(
                    "invalid literal for int() with base 10: {}",
                    value.repr()
                ))
            })
        }
        other => Err(EvalError::type_error(format!(
            "int() argument must be a string or a number, not '{}'",
            other.type_name()
        ))),
    }
}

fn float(args: CallArgs) -> EvalResult<Value> {
    args.finish_keywords("float")?;
    args.check_positional("float", 0, 1)?;
    let Some(value) = args.positional.first() else {
        return Ok(Value::Float(0.0));
    };
    if let Some(f) = value.as_float() {
        return Ok(Value::Float(f));
    }
    match value {
        Value::Str(s) => s.trim().parse().map(Value::Float).map_err(|_| {
            EvalError::value_error(format!(
                "could not convert string to float: {}",
                value.repr()
            ))
        }),
        other => Err(EvalError::type_error(format!(
            "float() argument must be a string or a number, not '{}'",
            other.type_name()
        ))),
    }
}

fn bool_(args: CallArgs) -> EvalResult<Value> {
    args.finish_keywords("bool")?;
    args.check_positional("bool", 0, 1)?;
    Ok(Value::Bool(
        args.positional.first().map_or(false, Value::is_truthy),
    ))
}

fn list(args: CallArgs) -> EvalResult<Value> {
    args.finish_keywords("list")?;
    args.check_positional("list", 0, 1)?;
    match args.positional.first() {
        Some(value) => Ok(Value::List(value.iterate()?)),
        None => Ok(Value::List(Vec::new())),
    }
}

fn tuple(args: CallArgs) -> EvalResult<Value> {
    args.finish_keywords("tuple")?;
    args.check_positional("tuple", 0, 1)?;
    match args.positional.first() {
        Some(value) => Ok(Value::Tuple(value.iterate()?)),
        None => Ok(Value::Tuple(Vec::new())),
    }
}

fn dict(mut args: CallArgs) -> EvalResult<Value> {
    args.check_positional("dict", 0, 1)?;
    let mut entries = IndexMap::new();
    match args.positional.first() {
        Some(Value::Dict(source)) => entries.extend(source.clone()),
        Some(pairs) => {
            for pair in pairs.iterate()? {
                let items = pair.iterate()?;
                let [key, value] = <[Value; 2]>::try_from(items).map_err(|items| {
                    EvalError::value_error(format!(
                        "dictionary update sequence element has length {}; 2 is required",
                        items.len()
                    ))
                })?;
                entries.insert(Key::from_value(&key)?, value);
            }
        }
        None => {}
    }
    for (name, value) in args.keywords.drain(..) {
        entries.insert(Key::Str(name), value);
    }
    Ok(Value::Dict(entries))
}

fn abs(mut args: CallArgs) -> EvalResult<Value> {
    match single(&mut args, "abs")? {
        Value::Int(i) => i
            .checked_abs()
            .map(Value::Int)
            .ok_or_else(|| EvalError::overflow("integer overflow")),
        Value::Bool(b) => Ok(Value::Int(b as i64)),
        Value::Float(f) => Ok(Value::Float(f.abs())),
        other => Err(EvalError::type_error(format!(
            "bad operand type for abs(): '{}'",
            other.type_name()
        ))),
    }
}

/// Items for `min`/`max`: one iterable argument, or the arguments themselves.
fn extreme(mut args: CallArgs, func: &str, wanted: Ordering) -> EvalResult<Value> {
    args.finish_keywords(func)?;
    if args.positional.is_empty() {
        return Err(EvalError::type_error(format!(
            "{} expected at least 1 argument, got 0",
            func
        )));
    }
    let items = if args.positional.len() == 1 {
        args.positional[0].iterate()?
    } else {
        std::mem::take(&mut args.positional)
    };
    let mut items = items.into_iter();
    let Some(mut best) = items.next() else {
        return Err(EvalError::value_error(format!(
            "{}() arg is an empty sequence",
            func
        )));
    };
    for item in items {
        if order(&item, &best)? == wanted {
            best = item;
        }
    }
    Ok(best)
}

fn order(a: &Value, b: &Value) -> EvalResult<Ordering> {
    a.py_cmp(b).ok_or_else(|| {
        EvalError::type_error(format!(
            "'<' not supported between instances of '{}' and '{}'",
            a.type_name(),
            b.type_name()
        ))
    })
}

fn min(args: CallArgs) -> EvalResult<Value> {
    extreme(args, "min", Ordering::Less)
}

fn max(args: CallArgs) -> EvalResult<Value> {
    extreme(args, "max", Ordering::Greater)
}

fn sum(mut args: CallArgs) -> EvalResult<Value> {
    let start = args.take_keyword("start");
    args.finish_keywords("sum")?;
    args.check_positional("sum", 1, 2)?;
    let mut total = match (args.positional.get(1), start) {
        (Some(_), Some(_)) => {
            return Err(EvalError::type_error(
                "sum() got multiple values for argument 'start'",
            ))
        }
        (Some(start), None) => start.clone(),
        (None, Some(start)) => start,
        (None, None) => Value::Int(0),
    };
    if matches!(total, Value::Str(_)) {
        return Err(EvalError::type_error(
            "sum() can't sum strings [use ''.join(seq) instead]",
        ));
    }
    for item in args.positional[0].iterate()? {
        total = ops::binary(BinOp::Add, &total, &item)?;
    }
    Ok(total)
}

fn sorted(mut args: CallArgs) -> EvalResult<Value> {
    let reverse = args
        .take_keyword("reverse")
        .map_or(false, |v| v.is_truthy());
    let mut items = single(&mut args, "sorted")?.iterate()?;
    let mut failure = None;
    items.sort_by(|a, b| {
        let (a, b) = if reverse { (b, a) } else { (a, b) };
        order(a, b).unwrap_or_else(|err| {
            failure.get_or_insert(err);
            Ordering::Equal
        })
    });
    match failure {
        Some(err) => Err(err),
        None => Ok(Value::List(items)),
    }
}

fn reversed(mut args: CallArgs) -> EvalResult<Value> {
    let mut items = single(&mut args, "reversed")?.iterate()?;
    items.reverse();
    Ok(Value::List(items))
}

fn enumerate(mut args: CallArgs) -> EvalResult<Value> {
    let start = match args.take_keyword("start") {
        Some(value) => expect_int(&value, "enumerate() start")?,
        None => 0,
    };
    let items = single(&mut args, "enumerate")?.iterate()?;
    let mut index = start;
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        out.push(Value::Tuple(vec![Value::Int(index), item]));
        index = index
            .checked_add(1)
            .ok_or_else(|| EvalError::overflow("integer overflow"))?;
    }
    Ok(Value::List(out))
}

fn zip(args: CallArgs) -> EvalResult<Value> {
    args.finish_keywords("zip")?;
    let columns = args
        .positional
        .iter()
        .map(Value::iterate)
        .collect::<EvalResult<Vec<_>>>()?;
    let rows = columns.iter().map(Vec::len).min().unwrap_or(0);
    Ok(Value::List(
        (0..rows)
            .map(|i| Value::Tuple(columns.iter().map(|c| c[i].clone()).collect()))
            .collect(),
    ))
}

fn chr(mut args: CallArgs) -> EvalResult<Value> {
    let code = expect_int(&single(&mut args, "chr")?, "chr() argument")?;
    u32::try_from(code)
        .ok()
        .and_then(char::from_u32)
        .map(|c| Value::str(c.to_string()))
        .ok_or_else(|| EvalError::value_error("chr() arg not in range(0x110000)"))
}

fn ord(mut args: CallArgs) -> EvalResult<Value> {
    let value = single(&mut args, "ord")?;
    let Value::Str(s) = &value else {
        return Err(EvalError::type_error(format!(
            "ord() expected string of length 1, but {} found",
            value.type_name()
        )));
    };
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(Value::Int(c as i64)),
        _ => Err(EvalError::type_error(format!(
            "ord() expected a character, but string of length {} found",
            s.chars().count()
        ))),
    }
}

fn any(mut args: CallArgs) -> EvalResult<Value> {
    let items = single(&mut args, "any")?.iterate()?;
    Ok(Value::Bool(items.iter().any(Value::is_truthy)))
}

fn all(mut args: CallArgs) -> EvalResult<Value> {
    let items = single(&mut args, "all")?.iterate()?;
    Ok(Value::Bool(items.iter().all(Value::is_truthy)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn call(name: &str, positional: Vec<Value>) -> EvalResult<Value> {
        let Some(Value::Function(f)) = lookup(name) else {
            panic!("no builtin {name}");
        };
        f.call(CallArgs::positional(positional))
    }

    fn ints(values: &[i64]) -> Value {
        Value::List(values.iter().copied().map(Value::Int).collect())
    }

    #[test]
    fn test_range() {
        assert_eq!(call("range", vec![Value::Int(3)]).unwrap(), ints(&[0, 1, 2]));
        assert_eq!(
            call("range", vec![Value::Int(5), Value::Int(0), Value::Int(-2)]).unwrap(),
            ints(&[5, 3, 1])
        );
        assert_eq!(
            call("range", vec![Value::Int(2), Value::Int(2)]).unwrap(),
            ints(&[])
        );
        assert!(call("range", vec![Value::Int(0), Value::Int(1), Value::Int(0)]).is_err());
        assert!(call("range", vec![Value::Int(i64::MAX)]).is_err());
        assert_eq!(
            call("range", vec![Value::Int(-2), Value::Int(i64::MAX), Value::Int(i64::MAX)])
                .unwrap(),
            ints(&[-2, i64::MAX - 2])
        );
        assert_eq!(
            call("range", vec![Value::Int(i64::MAX), Value::Int(i64::MIN), Value::Int(i64::MIN)])
                .unwrap(),
            ints(&[i64::MAX, -1])
        );
    }

    #[test]
    fn test_conversions() {
        assert_eq!(call("int", vec![Value::str(" 42 ")]).unwrap(), Value::Int(42));
        assert_eq!(call("int", vec![Value::Float(-2.7)]).unwrap(), Value::Int(-2));
        assert_eq!(call("str", vec![Value::Float(3.0)]).unwrap(), Value::str("3.0"));
        assert_eq!(call("repr", vec![Value::str("a")]).unwrap(), Value::str("'a'"));
        let err = call("int", vec![Value::str("x")]).unwrap_err();
        assert_eq!(err.message, "invalid literal for int() with base 10: 'x'");
    }

    #[test]
    fn test_min_max_sum() {
        assert_eq!(call("max", vec![ints(&[3, 9, 2])]).unwrap(), Value::Int(9));
        assert_eq!(
            call("min", vec![Value::Int(3), Value::Float(1.5)]).unwrap(),
            Value::Float(1.5)
        );
        assert_eq!(call("sum", vec![ints(&[1, 2, 3])]).unwrap(), Value::Int(6));
        assert!(call("max", vec![ints(&[])]).is_err());
    }

    #[test]
    fn test_sorted_reverse_and_errors() {
        let Some(Value::Function(sorted)) = lookup("sorted") else {
            panic!("no sorted");
        };
        let args = CallArgs::positional(vec![ints(&[2, 3, 1])])
            .with_keyword("reverse", Value::Bool(true));
        assert_eq!(sorted.call(args).unwrap(), ints(&[3, 2, 1]));
        let mixed = Value::List(vec![Value::Int(1), Value::str("a")]);
        assert!(call("sorted", vec![mixed]).is_err());
    }

    #[test]
    fn test_enumerate_zip() {
        assert_eq!(
            call("enumerate", vec![Value::str("ab")]).unwrap().to_string(),
            "[(0, 'a'), (1, 'b')]"
        );
        assert_eq!(
            call("zip", vec![ints(&[1, 2, 3]), Value::str("xy")])
                .unwrap()
                .to_string(),
            "[(1, 'x'), (2, 'y')]"
        );
    }

    #[test]
    fn test_chr_ord() {
        assert_eq!(call("chr", vec![Value::Int(65)]).unwrap(), Value::str("A"));
        assert_eq!(call("ord", vec![Value::str("A")]).unwrap(), Value::Int(65));
        assert!(call("ord", vec![Value::str("AB")]).is_err());
    }

    #[test]
    fn test_unknown_keyword() {
        let Some(Value::Function(len)) = lookup("len") else {
            panic!("no len");
        };
        let args = CallArgs::positional(vec![Value::str("a")]).with_keyword("x", Value::None);
        let err = len.call(args).unwrap_err();
        assert_eq!(err.message, "len() got an unexpected keyword argument 'x'");
    }
}
