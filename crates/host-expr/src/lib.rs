//! A small Python-like expression language.
//!
//! Templates embed expressions in this language. The crate provides the
//! pieces a template compiler needs: a [parser](parse_expression) that
//! reports byte offsets for syntax errors, an [`Expr`] tree that generated
//! code can be built from and printed back as source, and an evaluator over
//! dynamically typed [`Value`]s with layered [`Bindings`].
//!
//! ```
//! use host_expr::{evaluate, parse_expression, Bindings, Value};
//!
//! let expr = parse_expression("[n * 2 for n in range(count)]").unwrap();
//! let bindings = Bindings::new().with("count", 3i64);
//! let value = evaluate(&expr, &bindings).unwrap();
//! assert_eq!(value.to_string(), "[0, 2, 4]");
//! ```

pub mod ast;
pub mod builtins;
pub mod env;
pub mod error;
pub mod eval;
mod methods;
mod ops;
pub mod parser;
pub mod token;
pub mod value;

pub use ast::{Argument, BinOp, BoolOp, CmpOp, Comprehension, Constant, Expr, Target, UnaryOp};
pub use env::Bindings;
pub use error::{EvalError, EvalErrorKind, EvalResult, SyntaxError};
pub use eval::{evaluate, evaluate_layered};
pub use parser::parse_expression;
pub use value::{constructor, CallArgs, Component, Function, Key, Namespace, Value};
