//! Compile HTML-like templates with embedded expressions into component
//! trees.
//!
//! ```text
//! let template = htexpr::compile(r#"<div class="row">{[Li(children=x) for x in xs]}</div>"#)?;
//! let tree = template.evaluate(&bindings)?;
//! ```
//!
//! Compilation resolves every tag to a constructor and every attribute to an
//! argument name, and splices embedded expressions into a single host
//! expression. The result can be evaluated any number of times against
//! different [`Bindings`]. Compilation is pure, so [`TemplateCache`] can
//! share the work across call sites and threads.

pub mod cache;
pub mod config;
pub mod error;
pub mod options;
pub mod template;

pub use cache::{CacheStats, TemplateCache};
pub use config::{MappingConfig, ProviderConfig};
pub use error::Error;
pub use options::CompileOptions;
pub use template::CompiledTemplate;

pub use host_expr::{
    constructor, Bindings, Component, EvalError, EvalErrorKind, EvalResult, Namespace, Value,
};
pub use htexpr_compiler::{
    mappings, AttributeMapper, Resolution, TagProvider, TagResolver, TagTable,
};

use std::time::Instant;
use tracing::debug;

/// Compile `template` with the default Dash mappings.
pub fn compile(template: &str) -> Result<CompiledTemplate, Error> {
    compile_with(template, &CompileOptions::default())
}

/// Compile `template`, resolving tags and attributes through `options`.
pub fn compile_with(template: &str, options: &CompileOptions) -> Result<CompiledTemplate, Error> {
    let start = Instant::now();

    let document = htexpr_parser::parse(template).map_err(|e| Error::parse(e, template))?;
    let root = htexpr_compiler::simplify(template, &document)
        .map_err(|e| Error::parse(e, template))?;
    let fragment = htexpr_compiler::lower(template, &root, options.resolver(), options.mapper())
        .map_err(|e| Error::compile(e, template))?;

    debug!(
        len = template.len(),
        root = %root.tag,
        elapsed_us = start.elapsed().as_micros() as u64,
        "compiled template"
    );
    Ok(CompiledTemplate::new(fragment.into_expr()))
}
