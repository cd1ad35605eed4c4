//! Tree-walking evaluator.

use crate::ast::{Argument, BoolOp, Comprehension, Constant, Expr, Target};
use crate::builtins;
use crate::env::Bindings;
use crate::error::{EvalError, EvalResult};
use crate::methods::{bound_method, no_attribute, normalize_index};
use crate::ops;
use crate::value::{CallArgs, Key, Value};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

/// Evaluate `expr` with a single layer of bindings.
pub fn evaluate(expr: &Expr, bindings: &Bindings) -> EvalResult<Value> {
    evaluate_layered(expr, &[bindings])
}

/// Evaluate `expr` against a stack of binding layers. Names resolve in the
/// first layer that defines them, then in the builtins.
pub fn evaluate_layered(expr: &Expr, layers: &[&Bindings]) -> EvalResult<Value> {
    Evaluator {
        layers,
        frames: Vec::new(),
    }
    .eval(expr)
}

struct Evaluator<'a> {
    layers: &'a [&'a Bindings],
    /// Comprehension scopes, innermost last.
    frames: Vec<FxHashMap<SmolStr, Value>>,
}

impl<'a> Evaluator<'a> {
    fn lookup(&self, name: &str) -> EvalResult<Value> {
        if let Some(value) = self.frames.iter().rev().find_map(|frame| frame.get(name)) {
            return Ok(value.clone());
        }
        if let Some(value) = self.layers.iter().find_map(|layer| layer.get(name)) {
            return Ok(value.clone());
        }
        builtins::lookup(name)
            .cloned()
            .ok_or_else(|| EvalError::name_error(name))
    }

    fn eval(&mut self, expr: &Expr) -> EvalResult<Value> {
        match expr {
            Expr::Constant(constant) => Ok(match constant {
                Constant::None => Value::None,
                Constant::Bool(b) => Value::Bool(*b),
                Constant::Int(i) => Value::Int(*i),
                Constant::Float(f) => Value::Float(*f),
                Constant::Str(s) => Value::Str(s.clone()),
            }),
            Expr::Name(name) => self.lookup(name),
            Expr::List(items) => Ok(Value::List(self.eval_all(items)?)),
            Expr::Tuple(items) => Ok(Value::Tuple(self.eval_all(items)?)),
            Expr::Dict(entries) => {
                let mut dict = IndexMap::with_capacity(entries.len());
                for (key, value) in entries {
                    let key = Key::from_value(&self.eval(key)?)?;
                    dict.insert(key, self.eval(value)?);
                }
                Ok(Value::Dict(dict))
            }
            Expr::Attribute { value, attr } => {
                let value = self.eval(value)?;
                get_attribute(&value, attr)
            }
            Expr::Subscript { value, index } => {
                let value = self.eval(value)?;
                if let Expr::Slice { lower, upper, step } = index.as_ref() {
                    let lower = self.eval_slice_bound(lower.as_deref())?;
                    let upper = self.eval_slice_bound(upper.as_deref())?;
                    let step = self.eval_slice_bound(step.as_deref())?;
                    return slice(&value, lower, upper, step);
                }
                let index = self.eval(index)?;
                subscript(&value, &index)
            }
            Expr::Slice { .. } => Err(EvalError::type_error(
                "slice syntax is only valid inside a subscript",
            )),
            Expr::Call { func, args } => {
                let func = self.eval(func)?;
                let args = self.eval_arguments(args)?;
                match func {
                    Value::Function(f) => f.call(args),
                    other => Err(EvalError::type_error(format!(
                        "'{}' object is not callable",
                        other.type_name()
                    ))),
                }
            }
            Expr::BinOp { op, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                ops::binary(*op, &left, &right)
            }
            Expr::UnaryOp { op, operand } => {
                let operand = self.eval(operand)?;
                ops::unary(*op, &operand)
            }
            Expr::BoolOp { op, left, right } => {
                let left = self.eval(left)?;
                match (op, left.is_truthy()) {
                    (BoolOp::And, false) | (BoolOp::Or, true) => Ok(left),
                    _ => self.eval(right),
                }
            }
            Expr::Compare { left, comparisons } => {
                let mut left = self.eval(left)?;
                for (op, right) in comparisons {
                    let right = self.eval(right)?;
                    if !ops::compare(*op, &left, &right)? {
                        return Ok(Value::Bool(false));
                    }
                    left = right;
                }
                Ok(Value::Bool(true))
            }
            Expr::IfExp { test, body, orelse } => {
                if self.eval(test)?.is_truthy() {
                    self.eval(body)
                } else {
                    self.eval(orelse)
                }
            }
            Expr::ListComp {
                element,
                generators,
            }
            | Expr::GeneratorExp {
                element,
                generators,
            } => {
                let mut out = Vec::new();
                self.comprehension(generators, &mut |ev| {
                    out.push(ev.eval(element)?);
                    Ok(())
                })?;
                Ok(Value::List(out))
            }
            Expr::DictComp {
                key,
                value,
                generators,
            } => {
                let mut out = IndexMap::new();
                self.comprehension(generators, &mut |ev| {
                    let k = Key::from_value(&ev.eval(key)?)?;
                    out.insert(k, ev.eval(value)?);
                    Ok(())
                })?;
                Ok(Value::Dict(out))
            }
        }
    }

    fn eval_all(&mut self, items: &[Expr]) -> EvalResult<Vec<Value>> {
        items.iter().map(|item| self.eval(item)).collect()
    }

    fn eval_slice_bound(&mut self, bound: Option<&Expr>) -> EvalResult<Option<i64>> {
        let Some(bound) = bound else {
            return Ok(None);
        };
        match self.eval(bound)? {
            Value::None => Ok(None),
            value => builtins::expect_int(&value, "slice indices").map(Some),
        }
    }

    fn eval_arguments(&mut self, args: &[Argument]) -> EvalResult<CallArgs> {
        let mut call = CallArgs::default();
        for arg in args {
            match arg {
                Argument::Positional(e) => call.positional.push(self.eval(e)?),
                Argument::Unpack(e) => call.positional.extend(self.eval(e)?.iterate()?),
                Argument::Keyword(name, e) => {
                    let value = self.eval(e)?;
                    insert_keyword(&mut call, name.clone(), value)?;
                }
                Argument::UnpackKeywords(e) => match self.eval(e)? {
                    Value::Dict(entries) => {
                        for (key, value) in entries {
                            let Key::Str(name) = key else {
                                return Err(EvalError::type_error("keywords must be strings"));
                            };
                            insert_keyword(&mut call, name, value)?;
                        }
                    }
                    other => {
                        return Err(EvalError::type_error(format!(
                            "argument after ** must be a mapping, not {}",
                            other.type_name()
                        )))
                    }
                },
            }
        }
        Ok(call)
    }

    /// Run the nested loops of a comprehension in a fresh scope, calling
    /// `emit` once per surviving iteration.
    fn comprehension(
        &mut self,
        generators: &[Comprehension],
        emit: &mut dyn FnMut(&mut Self) -> EvalResult<()>,
    ) -> EvalResult<()> {
        self.frames.push(FxHashMap::default());
        let result = self.run_generators(generators, emit);
        self.frames.pop();
        result
    }

    fn run_generators(
        &mut self,
        generators: &[Comprehension],
        emit: &mut dyn FnMut(&mut Self) -> EvalResult<()>,
    ) -> EvalResult<()> {
        let Some((first, rest)) = generators.split_first() else {
            return emit(self);
        };
        for item in self.eval(&first.iter)?.iterate()? {
            self.bind(&first.target, item)?;
            let mut keep = true;
            for cond in &first.ifs {
                if !self.eval(cond)?.is_truthy() {
                    keep = false;
                    break;
                }
            }
            if keep {
                self.run_generators(rest, emit)?;
            }
        }
        Ok(())
    }

    fn bind(&mut self, target: &Target, value: Value) -> EvalResult<()> {
        match target {
            Target::Name(name) => {
                if let Some(frame) = self.frames.last_mut() {
                    frame.insert(name.clone(), value);
                }
                Ok(())
            }
            Target::Tuple(targets) => {
                let items = value.iterate()?;
                if items.len() != targets.len() {
                    return Err(EvalError::value_error(if items.len() < targets.len() {
                        format!(
                            "not enough values to unpack (expected {}, got {})",
                            targets.len(),
                            items.len()
                        )
                    } else {
                        format!("too many values to unpack (expected {})", targets.len())
                    }));
                }
                for (target, item) in targets.iter().zip(items) {
                    self.bind(target, item)?;
                }
                Ok(())
            }
        }
    }
}

fn insert_keyword(call: &mut CallArgs, name: SmolStr, value: Value) -> EvalResult<()> {
    if call.keywords.contains_key(&name) {
        return Err(EvalError::type_error(format!(
            "got multiple values for keyword argument '{}'",
            name
        )));
    }
    call.keywords.insert(name, value);
    Ok(())
}

fn get_attribute(value: &Value, attr: &str) -> EvalResult<Value> {
    match value {
        Value::Namespace(ns) => ns.get(attr).cloned().ok_or_else(|| {
            EvalError::attribute_error(format!(
                "module '{}' has no attribute '{}'",
                ns.name(),
                attr
            ))
        }),
        Value::Component(component) => component
            .prop(attr)
            .cloned()
            .ok_or_else(|| no_attribute(&component.name, attr)),
        other => bound_method(other, attr).ok_or_else(|| no_attribute(other.type_name(), attr)),
    }
}

fn subscript(value: &Value, index: &Value) -> EvalResult<Value> {
    match value {
        Value::List(items) | Value::Tuple(items) => {
            let i = normalize_index(index, items.len(), value.type_name())?;
            Ok(items[i].clone())
        }
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let i = normalize_index(index, chars.len(), "string")?;
            Ok(Value::str(chars[i].to_string()))
        }
        Value::Dict(entries) => {
            let key = Key::from_value(index)?;
            entries
                .get(&key)
                .cloned()
                .ok_or_else(|| EvalError::key_error(&key))
        }
        other => Err(EvalError::type_error(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

/// Positions selected by `[lower:upper:step]` on a sequence of `len` items.
fn slice_positions(
    len: usize,
    lower: Option<i64>,
    upper: Option<i64>,
    step: Option<i64>,
) -> EvalResult<Vec<usize>> {
    let len = len as i64;
    let step = step.unwrap_or(1);
    if step == 0 {
        return Err(EvalError::value_error("slice step cannot be zero"));
    }
    let adjust = |i: i64, low: i64, high: i64| {
        let i = if i < 0 { i + len } else { i };
        i.clamp(low, high)
    };
    let mut positions = Vec::new();
    if step > 0 {
        let start = lower.map_or(0, |i| adjust(i, 0, len));
        let stop = upper.map_or(len, |i| adjust(i, 0, len));
        let mut i = start;
        while i < stop {
            positions.push(i as usize);
            match i.checked_add(step) {
                Some(next) => i = next,
                None => break,
            }
        }
    } else {
        let start = lower.map_or(len - 1, |i| adjust(i, -1, len - 1));
        let stop = upper.map_or(-1, |i| adjust(i, -1, len - 1));
        let mut i = start;
        while i > stop {
            positions.push(i as usize);
            match i.checked_add(step) {
                Some(next) => i = next,
                None => break,
            }
        }
    }
    Ok(positions)
}

fn slice(
    value: &Value,
    lower: Option<i64>,
    upper: Option<i64>,
    step: Option<i64>,
) -> EvalResult<Value> {
    match value {
        Value::List(items) | Value::Tuple(items) => {
            let picked = slice_positions(items.len(), lower, upper, step)?
                .into_iter()
                .map(|i| items[i].clone())
                .collect();
            Ok(match value {
                Value::Tuple(_) => Value::Tuple(picked),
                _ => Value::List(picked),
            })
        }
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let picked: String = slice_positions(chars.len(), lower, upper, step)?
                .into_iter()
                .map(|i| chars[i])
                .collect();
            Ok(Value::str(picked))
        }
        other => Err(EvalError::type_error(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvalErrorKind;
    use crate::parser::parse_expression;
    use crate::value::{constructor, Namespace};
    use pretty_assertions::assert_eq;

    fn eval_with(source: &str, bindings: &Bindings) -> EvalResult<Value> {
        evaluate(&parse_expression(source).unwrap(), bindings)
    }

    fn eval(source: &str) -> Value {
        eval_with(source, &Bindings::new()).unwrap()
    }

    #[test]
    fn test_arithmetic_and_logic() {
        assert_eq!(eval("1 + 2 * 3 - 4 // 3"), Value::Int(6));
        assert_eq!(eval("2 ** 10"), Value::Int(1024));
        assert_eq!(eval("0 or 'x'"), Value::str("x"));
        assert_eq!(eval("[] and 1"), Value::List(vec![]));
        assert_eq!(eval("1 < 2 < 3 > 2"), Value::Bool(true));
        assert_eq!(eval("1 < 2 > 3"), Value::Bool(false));
        assert_eq!(eval("'yes' if 2 in [1, 2] else 'no'"), Value::str("yes"));
    }

    #[test]
    fn test_int_and_float_compare_equal() {
        assert_eq!(eval("1 == 1.0"), Value::Bool(true));
        assert_eq!(eval("1 != 1.0"), Value::Bool(false));
        assert_eq!(eval("True == 1.0"), Value::Bool(true));
        assert_eq!(eval("2.0 in [1, 2, 3]"), Value::Bool(true));
        assert_eq!(eval("(1, 2.0) == (1.0, 2)"), Value::Bool(true));
        assert_eq!(eval("[1, 2.5] < [1.0, 3]"), Value::Bool(true));
        assert_eq!(eval("1 == 1.5"), Value::Bool(false));
    }

    #[test]
    fn test_short_circuit_skips_errors() {
        assert_eq!(eval("True or undefined_name"), Value::Bool(true));
        assert_eq!(eval("False and 1 / 0"), Value::Bool(false));
    }

    #[test]
    fn test_comprehensions() {
        assert_eq!(
            eval("[x * y for x in range(1, 3) for y in [10, 100] if y > x * 10]").to_string(),
            "[100, 200]"
        );
        assert_eq!(
            eval("{k: v for k, v in [('a', 1), ('b', 2)]}").to_string(),
            "{'a': 1, 'b': 2}"
        );
        assert_eq!(eval("sum(x for x in range(5))"), Value::Int(10));
    }

    #[test]
    fn test_comprehension_scope_does_not_leak() {
        let err = eval_with("[x for x in [1]] + [x]", &Bindings::new()).unwrap_err();
        assert_eq!(err.kind, EvalErrorKind::NameError);
        assert_eq!(err.message, "name 'x' is not defined");
    }

    #[test]
    fn test_subscripts_and_slices() {
        assert_eq!(eval("[1, 2, 3][-1]"), Value::Int(3));
        assert_eq!(eval("'hello'[1:4]"), Value::str("ell"));
        assert_eq!(eval("[0, 1, 2, 3, 4][::-2]").to_string(), "[4, 2, 0]");
        assert_eq!(eval("(1, 2, 3)[1:]").to_string(), "(2, 3)");
        assert_eq!(eval("[1, 2, 3][1::9223372036854775807]").to_string(), "[2]");
        assert_eq!(eval("[1, 2, 3][::-9223372036854775807]").to_string(), "[3]");
        assert_eq!(eval("'abc'[::-9223372036854775807 - 1]"), Value::str("c"));
        assert_eq!(eval("{'a': 1}['a']"), Value::Int(1));
        let err = eval_with("{'a': 1}['b']", &Bindings::new()).unwrap_err();
        assert_eq!(err.kind, EvalErrorKind::KeyError);
        assert_eq!(err.message, "'b'");
    }

    #[test]
    fn test_calls_with_unpacking() {
        let bindings = Bindings::new()
            .with("args", Value::List(vec![Value::Int(3), Value::Int(1)]))
            .with("opts", Value::from(serde_json::json!({"reverse": true})));
        assert_eq!(
            eval_with("sorted(args[::-1], **opts)", &bindings)
                .unwrap()
                .to_string(),
            "[3, 1]"
        );
        assert_eq!(
            eval_with("max(*args)", &bindings).unwrap(),
            Value::Int(3)
        );
    }

    #[test]
    fn test_namespace_components() {
        let html = Namespace::with_constructors("html", ["Div", "Span"]);
        let bindings = Bindings::new().with("html", html);
        let value = eval_with(
            "html.Div(children=[html.Span(children='a')], id='x').children[0].children",
            &bindings,
        )
        .unwrap();
        assert_eq!(value, Value::str("a"));

        let err = eval_with("html.Nope", &bindings).unwrap_err();
        assert_eq!(err.kind, EvalErrorKind::AttributeError);
        assert_eq!(err.message, "module 'html' has no attribute 'Nope'");
    }

    #[test]
    fn test_layers_shadow_in_order() {
        let explicit = Bindings::new().with("x", 1i64);
        let ambient = Bindings::new().with("x", 2i64).with("y", 3i64);
        let expr = parse_expression("x + y").unwrap();
        assert_eq!(
            evaluate_layered(&expr, &[&explicit, &ambient]).unwrap(),
            Value::Int(4)
        );
        let shadowing = Bindings::new().with("len", constructor("", "len"));
        let value = evaluate(&parse_expression("len()").unwrap(), &shadowing).unwrap();
        assert_eq!(value.to_string(), "len()");
    }

    #[test]
    fn test_unpack_errors() {
        let err = eval_with("[a for a, b in [(1, 2, 3)]]", &Bindings::new()).unwrap_err();
        assert_eq!(err.message, "too many values to unpack (expected 2)");
        let err = eval_with("f(a=1, **{'a': 2})", &Bindings::new().with("f", constructor("", "f")))
            .unwrap_err();
        assert_eq!(err.message, "got multiple values for keyword argument 'a'");
    }

    #[test]
    fn test_not_callable() {
        let err = eval_with("(1)(2)", &Bindings::new()).unwrap_err();
        assert_eq!(err.message, "'int' object is not callable");
    }
}
