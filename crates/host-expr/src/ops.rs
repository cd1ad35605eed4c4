//! Operator semantics.

use crate::ast::{BinOp, CmpOp, UnaryOp};
use crate::error::{EvalError, EvalResult};
use crate::value::{Key, Number, Value};
use std::cmp::Ordering;

/// Longest string or sequence a repetition may build.
const MAX_REPEAT_LEN: usize = 1 << 24;

pub fn binary(op: BinOp, left: &Value, right: &Value) -> EvalResult<Value> {
    match (op, left, right) {
        (BinOp::Add, Value::Str(a), Value::Str(b)) => {
            let mut joined = String::with_capacity(a.len() + b.len());
            joined.push_str(a);
            joined.push_str(b);
            return Ok(Value::Str(joined.into()));
        }
        (BinOp::Add, Value::List(a), Value::List(b)) => {
            return Ok(Value::List(a.iter().chain(b).cloned().collect()));
        }
        (BinOp::Add, Value::Tuple(a), Value::Tuple(b)) => {
            return Ok(Value::Tuple(a.iter().chain(b).cloned().collect()));
        }
        (BinOp::Mul, Value::Str(s), count) | (BinOp::Mul, count, Value::Str(s))
            if count.as_int().is_some() =>
        {
            let n = repeat_count(s.len(), count)?;
            return Ok(Value::Str(s.repeat(n).into()));
        }
        (BinOp::Mul, Value::List(items), count) | (BinOp::Mul, count, Value::List(items))
            if count.as_int().is_some() =>
        {
            let n = repeat_count(items.len(), count)?;
            return Ok(Value::List(repeat_items(items, n)));
        }
        (BinOp::Mul, Value::Tuple(items), count) | (BinOp::Mul, count, Value::Tuple(items))
            if count.as_int().is_some() =>
        {
            let n = repeat_count(items.len(), count)?;
            return Ok(Value::Tuple(repeat_items(items, n)));
        }
        _ => {}
    }

    match (left.as_number(), right.as_number()) {
        (Some(Number::Int(a)), Some(Number::Int(b))) => int_op(op, a, b),
        (Some(a), Some(b)) => float_op(op, a.to_f64(), b.to_f64()),
        _ => Err(EvalError::type_error(format!(
            "unsupported operand type(s) for {}: '{}' and '{}'",
            op.as_str(),
            left.type_name(),
            right.type_name()
        ))),
    }
}

fn repeat_count(len: usize, count: &Value) -> EvalResult<usize> {
    let n = usize::try_from(count.as_int().unwrap_or(0).max(0))
        .map_err(|_| EvalError::overflow("repeat count is too large"))?;
    match len.checked_mul(n) {
        Some(total) if total <= MAX_REPEAT_LEN => Ok(n),
        _ => Err(EvalError::overflow("repeated sequence is too long")),
    }
}

fn repeat_items(items: &[Value], n: usize) -> Vec<Value> {
    let mut out = Vec::with_capacity(items.len() * n);
    for _ in 0..n {
        out.extend_from_slice(items);
    }
    out
}

fn overflow() -> EvalError {
    EvalError::overflow("integer overflow")
}

fn int_op(op: BinOp, a: i64, b: i64) -> EvalResult<Value> {
    let result = match op {
        BinOp::Add => a.checked_add(b).ok_or_else(overflow)?,
        BinOp::Sub => a.checked_sub(b).ok_or_else(overflow)?,
        BinOp::Mul => a.checked_mul(b).ok_or_else(overflow)?,
        BinOp::Div => return float_op(op, a as f64, b as f64),
        BinOp::FloorDiv => {
            if b == 0 {
                return Err(EvalError::zero_division(
                    "integer division or modulo by zero",
                ));
            }
            let q = a.checked_div(b).ok_or_else(overflow)?;
            if a % b != 0 && ((a < 0) != (b < 0)) {
                q - 1
            } else {
                q
            }
        }
        BinOp::Mod => {
            if b == 0 {
                return Err(EvalError::zero_division(
                    "integer division or modulo by zero",
                ));
            }
            let r = a.checked_rem(b).ok_or_else(overflow)?;
            if r != 0 && ((r < 0) != (b < 0)) {
                r + b
            } else {
                r
            }
        }
        BinOp::Pow => {
            if b < 0 {
                return float_op(op, a as f64, b as f64);
            }
            let exp = u32::try_from(b).map_err(|_| overflow())?;
            a.checked_pow(exp).ok_or_else(overflow)?
        }
    };
    Ok(Value::Int(result))
}

fn float_op(op: BinOp, a: f64, b: f64) -> EvalResult<Value> {
    let result = match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div => {
            if b == 0.0 {
                return Err(EvalError::zero_division("division by zero"));
            }
            a / b
        }
        BinOp::FloorDiv => {
            if b == 0.0 {
                return Err(EvalError::zero_division("float floor division by zero"));
            }
            (a / b).floor()
        }
        BinOp::Mod => {
            if b == 0.0 {
                return Err(EvalError::zero_division("float modulo"));
            }
            let r = a % b;
            if r != 0.0 && ((r < 0.0) != (b < 0.0)) {
                r + b
            } else {
                r
            }
        }
        BinOp::Pow => {
            if a == 0.0 && b < 0.0 {
                return Err(EvalError::zero_division(
                    "0.0 cannot be raised to a negative power",
                ));
            }
            a.powf(b)
        }
    };
    Ok(Value::Float(result))
}

pub fn unary(op: UnaryOp, operand: &Value) -> EvalResult<Value> {
    match (op, operand.as_number()) {
        (UnaryOp::Not, _) => Ok(Value::Bool(!operand.is_truthy())),
        (UnaryOp::Neg, Some(Number::Int(i))) => {
            Ok(Value::Int(i.checked_neg().ok_or_else(overflow)?))
        }
        (UnaryOp::Neg, Some(Number::Float(f))) => Ok(Value::Float(-f)),
        (UnaryOp::Pos, Some(Number::Int(i))) => Ok(Value::Int(i)),
        (UnaryOp::Pos, Some(Number::Float(f))) => Ok(Value::Float(f)),
        (UnaryOp::Neg | UnaryOp::Pos, None) => Err(EvalError::type_error(format!(
            "bad operand type for unary {}: '{}'",
            if op == UnaryOp::Neg { "-" } else { "+" },
            operand.type_name()
        ))),
    }
}

pub fn compare(op: CmpOp, left: &Value, right: &Value) -> EvalResult<bool> {
    let ordering = |left: &Value, right: &Value| -> EvalResult<Option<Ordering>> {
        if let (Some(a), Some(b)) = (left.as_number(), right.as_number()) {
            return Ok(match (a, b) {
                (Number::Int(a), Number::Int(b)) => Some(a.cmp(&b)),
                (a, b) => a.to_f64().partial_cmp(&b.to_f64()),
            });
        }
        match left.py_cmp(right) {
            Some(ordering) => Ok(Some(ordering)),
            None => Err(EvalError::type_error(format!(
                "'{}' not supported between instances of '{}' and '{}'",
                op.as_str(),
                left.type_name(),
                right.type_name()
            ))),
        }
    };

    Ok(match op {
        CmpOp::Eq => left.py_eq(right),
        CmpOp::NotEq => !left.py_eq(right),
        CmpOp::Lt => ordering(left, right)? == Some(Ordering::Less),
        CmpOp::LtE => matches!(
            ordering(left, right)?,
            Some(Ordering::Less | Ordering::Equal)
        ),
        CmpOp::Gt => ordering(left, right)? == Some(Ordering::Greater),
        CmpOp::GtE => matches!(
            ordering(left, right)?,
            Some(Ordering::Greater | Ordering::Equal)
        ),
        CmpOp::In => contains(right, left)?,
        CmpOp::NotIn => !contains(right, left)?,
        CmpOp::Is => identical(left, right),
        CmpOp::IsNot => !identical(left, right),
    })
}

/// Python `item in container`.
pub fn contains(container: &Value, item: &Value) -> EvalResult<bool> {
    match container {
        Value::Str(haystack) => match item {
            Value::Str(needle) => Ok(haystack.contains(needle.as_str())),
            other => Err(EvalError::type_error(format!(
                "'in <string>' requires string as left operand, not {}",
                other.type_name()
            ))),
        },
        Value::List(items) | Value::Tuple(items) => Ok(items.iter().any(|v| v.py_eq(item))),
        Value::Dict(entries) => Ok(entries.contains_key(&Key::from_value(item)?)),
        other => Err(EvalError::type_error(format!(
            "argument of type '{}' is not iterable",
            other.type_name()
        ))),
    }
}

fn identical(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::None, Value::None) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Int(a), Value::Int(b)) => a == b,
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::Function(_), Value::Function(_))
        | (Value::Namespace(_), Value::Namespace(_))
        | (Value::Component(_), Value::Component(_)) => left.py_eq(right),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvalErrorKind;

    fn int(i: i64) -> Value {
        Value::Int(i)
    }

    #[test]
    fn test_floor_division_and_modulo_follow_sign_of_divisor() {
        assert_eq!(binary(BinOp::FloorDiv, &int(-7), &int(2)).unwrap(), int(-4));
        assert_eq!(binary(BinOp::Mod, &int(-7), &int(2)).unwrap(), int(1));
        assert_eq!(binary(BinOp::Mod, &int(7), &int(-2)).unwrap(), int(-1));
        assert_eq!(
            binary(BinOp::Mod, &Value::Float(-7.5), &int(2)).unwrap(),
            Value::Float(0.5)
        );
    }

    #[test]
    fn test_true_division_is_float() {
        assert_eq!(binary(BinOp::Div, &int(7), &int(2)).unwrap(), Value::Float(3.5));
        let err = binary(BinOp::Div, &int(1), &int(0)).unwrap_err();
        assert_eq!(err.kind, EvalErrorKind::ZeroDivision);
    }

    #[test]
    fn test_overflow_is_reported() {
        let err = binary(BinOp::Mul, &int(i64::MAX), &int(2)).unwrap_err();
        assert_eq!(err.kind, EvalErrorKind::Overflow);
        assert_eq!(binary(BinOp::Pow, &int(2), &int(-1)).unwrap(), Value::Float(0.5));
    }

    #[test]
    fn test_sequence_operators() {
        assert_eq!(
            binary(BinOp::Add, &Value::str("ab"), &Value::str("c")).unwrap(),
            Value::str("abc")
        );
        assert_eq!(
            binary(BinOp::Mul, &int(2), &Value::List(vec![int(1)])).unwrap(),
            Value::List(vec![int(1), int(1)])
        );
        assert_eq!(
            binary(BinOp::Mul, &Value::str("ab"), &int(-3)).unwrap(),
            Value::str("")
        );
        let err = binary(BinOp::Add, &Value::str("a"), &int(1)).unwrap_err();
        assert_eq!(
            err.message,
            "unsupported operand type(s) for +: 'str' and 'int'"
        );
    }

    #[test]
    fn test_comparisons() {
        assert!(compare(CmpOp::Lt, &int(1), &Value::Float(1.5)).unwrap());
        assert!(compare(CmpOp::In, &Value::str("b"), &Value::str("abc")).unwrap());
        assert!(compare(CmpOp::NotIn, &int(4), &Value::List(vec![int(1)])).unwrap());
        assert!(compare(CmpOp::Is, &Value::None, &Value::None).unwrap());
        assert!(compare(CmpOp::Lt, &Value::str("a"), &int(1)).is_err());
        assert!(!compare(CmpOp::Lt, &Value::Float(f64::NAN), &int(1)).unwrap());
    }
}
