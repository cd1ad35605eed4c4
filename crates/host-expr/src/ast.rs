//! Expression trees.
//!
//! [`Expr`] is produced by the [parser](crate::parser) and also built
//! directly by code generators, which is why it carries a few convenience
//! constructors. Its `Display` output is host source that parses back to an
//! equal tree: binary operations are always parenthesised.

use smol_str::SmolStr;
use std::fmt::{self, Write};

#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(SmolStr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

impl BinOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::FloorDiv => "//",
            BinOp::Mod => "%",
            BinOp::Pow => "**",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Pos,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoolOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    In,
    NotIn,
    Is,
    IsNot,
}

impl CmpOp {
    pub fn as_str(self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::NotEq => "!=",
            CmpOp::Lt => "<",
            CmpOp::LtE => "<=",
            CmpOp::Gt => ">",
            CmpOp::GtE => ">=",
            CmpOp::In => "in",
            CmpOp::NotIn => "not in",
            CmpOp::Is => "is",
            CmpOp::IsNot => "is not",
        }
    }
}

/// One argument in a call.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Positional(Expr),
    Keyword(SmolStr, Expr),
    /// `*iterable`
    Unpack(Expr),
    /// `**mapping`
    UnpackKeywords(Expr),
}

/// Assignment target of a comprehension `for` clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Name(SmolStr),
    Tuple(Vec<Target>),
}

/// `for target in iter if cond...`
#[derive(Debug, Clone, PartialEq)]
pub struct Comprehension {
    pub target: Target,
    pub iter: Expr,
    pub ifs: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Constant(Constant),
    Name(SmolStr),
    List(Vec<Expr>),
    Tuple(Vec<Expr>),
    Dict(Vec<(Expr, Expr)>),
    Attribute {
        value: Box<Expr>,
        attr: SmolStr,
    },
    Subscript {
        value: Box<Expr>,
        index: Box<Expr>,
    },
    /// `lower:upper:step`, only valid as a subscript index.
    Slice {
        lower: Option<Box<Expr>>,
        upper: Option<Box<Expr>>,
        step: Option<Box<Expr>>,
    },
    Call {
        func: Box<Expr>,
        args: Vec<Argument>,
    },
    BinOp {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    UnaryOp {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    BoolOp {
        op: BoolOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `left op1 c1 op2 c2 ...`
    Compare {
        left: Box<Expr>,
        comparisons: Vec<(CmpOp, Expr)>,
    },
    IfExp {
        test: Box<Expr>,
        body: Box<Expr>,
        orelse: Box<Expr>,
    },
    ListComp {
        element: Box<Expr>,
        generators: Vec<Comprehension>,
    },
    /// Evaluated eagerly, like a list comprehension.
    GeneratorExp {
        element: Box<Expr>,
        generators: Vec<Comprehension>,
    },
    DictComp {
        key: Box<Expr>,
        value: Box<Expr>,
        generators: Vec<Comprehension>,
    },
}

impl Expr {
    pub fn name(name: impl Into<SmolStr>) -> Self {
        Expr::Name(name.into())
    }

    pub fn str(value: impl Into<SmolStr>) -> Self {
        Expr::Constant(Constant::Str(value.into()))
    }

    pub fn attr(self, attr: impl Into<SmolStr>) -> Self {
        Expr::Attribute {
            value: Box::new(self),
            attr: attr.into(),
        }
    }

    pub fn call(self, args: Vec<Argument>) -> Self {
        Expr::Call {
            func: Box::new(self),
            args,
        }
    }

    pub fn binary(op: BinOp, left: Expr, right: Expr) -> Self {
        Expr::BinOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Replace every `Name` node for which `replace` returns an expression.
    /// Replacements are not visited again.
    pub fn replace_names<F>(&mut self, replace: &mut F)
    where
        F: FnMut(&str) -> Option<Expr>,
    {
        if let Expr::Name(name) = self {
            if let Some(replacement) = replace(name) {
                *self = replacement;
            }
            return;
        }
        self.for_each_child_mut(&mut |child| child.replace_names(replace));
    }

    fn for_each_child_mut(&mut self, f: &mut dyn FnMut(&mut Expr)) {
        match self {
            Expr::Constant(_) | Expr::Name(_) => {}
            Expr::List(items) | Expr::Tuple(items) => items.iter_mut().for_each(f),
            Expr::Dict(entries) => {
                for (key, value) in entries {
                    f(key);
                    f(value);
                }
            }
            Expr::Attribute { value, .. } => f(value),
            Expr::Subscript { value, index } => {
                f(value);
                f(index);
            }
            Expr::Slice { lower, upper, step } => {
                for part in [lower, upper, step].into_iter().flatten() {
                    f(part);
                }
            }
            Expr::Call { func, args } => {
                f(func);
                for arg in args {
                    match arg {
                        Argument::Positional(e)
                        | Argument::Keyword(_, e)
                        | Argument::Unpack(e)
                        | Argument::UnpackKeywords(e) => f(e),
                    }
                }
            }
            Expr::BinOp { left, right, .. } | Expr::BoolOp { left, right, .. } => {
                f(left);
                f(right);
            }
            Expr::UnaryOp { operand, .. } => f(operand),
            Expr::Compare { left, comparisons } => {
                f(left);
                for (_, e) in comparisons {
                    f(e);
                }
            }
            Expr::IfExp { test, body, orelse } => {
                f(test);
                f(body);
                f(orelse);
            }
            Expr::ListComp {
                element,
                generators,
            }
            | Expr::GeneratorExp {
                element,
                generators,
            } => {
                f(element);
                for_each_generator_mut(generators, f);
            }
            Expr::DictComp {
                key,
                value,
                generators,
            } => {
                f(key);
                f(value);
                for_each_generator_mut(generators, f);
            }
        }
    }
}

fn for_each_generator_mut(generators: &mut [Comprehension], f: &mut dyn FnMut(&mut Expr)) {
    for generator in generators {
        f(&mut generator.iter);
        generator.ifs.iter_mut().for_each(&mut *f);
    }
}

/// Python `repr` of a string: single quotes unless the text contains a
/// single quote and no double quote.
pub fn quote_str(text: &str) -> String {
    let quote = if text.contains('\'') && !text.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(text.len() + 2);
    out.push(quote);
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// Python `repr` of a float.
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value.is_infinite() {
        let text = if value > 0.0 { "inf" } else { "-inf" };
        text.to_string()
    } else if value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::None => f.write_str("None"),
            Constant::Bool(true) => f.write_str("True"),
            Constant::Bool(false) => f.write_str("False"),
            Constant::Int(value) => write!(f, "{}", value),
            Constant::Float(value) => f.write_str(&format_float(*value)),
            Constant::Str(value) => f.write_str(&quote_str(value)),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Name(name) => f.write_str(name),
            Target::Tuple(items) => {
                f.write_str("(")?;
                write_joined(f, items)?;
                if items.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
        }
    }
}

impl fmt::Display for Comprehension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, " for {} in {}", self.target, self.iter)?;
        for cond in &self.ifs {
            write!(f, " if {}", cond)?;
        }
        Ok(())
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Positional(e) => write!(f, "{}", e),
            Argument::Keyword(name, e) => write!(f, "{}={}", name, e),
            Argument::Unpack(e) => write!(f, "*{}", e),
            Argument::UnpackKeywords(e) => write!(f, "**{}", e),
        }
    }
}

fn write_joined<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

fn write_generators(f: &mut fmt::Formatter<'_>, generators: &[Comprehension]) -> fmt::Result {
    generators.iter().try_for_each(|g| write!(f, "{}", g))
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Constant(c) => write!(f, "{}", c),
            Expr::Name(name) => f.write_str(name),
            Expr::List(items) => {
                f.write_str("[")?;
                write_joined(f, items)?;
                f.write_str("]")
            }
            Expr::Tuple(items) => {
                f.write_str("(")?;
                write_joined(f, items)?;
                if items.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
            Expr::Dict(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                f.write_str("}")
            }
            Expr::Attribute { value, attr } => write!(f, "{}.{}", value, attr),
            Expr::Subscript { value, index } => match index.as_ref() {
                Expr::Tuple(items) if !items.is_empty() => {
                    write!(f, "{}[", value)?;
                    write_joined(f, items)?;
                    if items.len() == 1 {
                        f.write_str(",")?;
                    }
                    f.write_str("]")
                }
                index => write!(f, "{}[{}]", value, index),
            },
            Expr::Slice { lower, upper, step } => {
                if let Some(lower) = lower {
                    write!(f, "{}", lower)?;
                }
                f.write_str(":")?;
                if let Some(upper) = upper {
                    write!(f, "{}", upper)?;
                }
                if let Some(step) = step {
                    write!(f, ":{}", step)?;
                }
                Ok(())
            }
            Expr::Call { func, args } => {
                write!(f, "{}(", func)?;
                write_joined(f, args)?;
                f.write_str(")")
            }
            Expr::BinOp { op, left, right } => {
                write!(f, "({} {} {})", left, op.as_str(), right)
            }
            Expr::UnaryOp { op, operand } => match op {
                UnaryOp::Neg => write!(f, "(-{})", operand),
                UnaryOp::Pos => write!(f, "(+{})", operand),
                UnaryOp::Not => write!(f, "(not {})", operand),
            },
            Expr::BoolOp { op, left, right } => {
                let op = match op {
                    BoolOp::And => "and",
                    BoolOp::Or => "or",
                };
                write!(f, "({} {} {})", left, op, right)
            }
            Expr::Compare { left, comparisons } => {
                write!(f, "({}", left)?;
                for (op, right) in comparisons {
                    write!(f, " {} {}", op.as_str(), right)?;
                }
                f.write_str(")")
            }
            Expr::IfExp { test, body, orelse } => {
                write!(f, "({} if {} else {})", body, test, orelse)
            }
            Expr::ListComp {
                element,
                generators,
            } => {
                write!(f, "[{}", element)?;
                write_generators(f, generators)?;
                f.write_str("]")
            }
            Expr::GeneratorExp {
                element,
                generators,
            } => {
                write!(f, "({}", element)?;
                write_generators(f, generators)?;
                f.write_str(")")
            }
            Expr::DictComp {
                key,
                value,
                generators,
            } => {
                write!(f, "{{{}: {}", key, value)?;
                write_generators(f, generators)?;
                f.write_str("}")
            }
        }
    }
}
