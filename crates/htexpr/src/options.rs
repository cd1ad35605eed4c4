//! Compilation options.

use htexpr_compiler::{AttributeMapper, TagResolver};
use once_cell::sync::Lazy;
use std::sync::Arc;

static DASH_RESOLVER: Lazy<Arc<TagResolver>> = Lazy::new(|| Arc::new(TagResolver::dash()));
static DASH_ATTRIBUTES: Lazy<Arc<AttributeMapper>> =
    Lazy::new(|| Arc::new(AttributeMapper::dash()));

/// How tags and attributes of a template are resolved.
///
/// The default uses [`TagResolver::dash`] and [`AttributeMapper::dash`].
/// Defaults share one resolver and one mapper per process, so templates
/// compiled with default options share cache entries.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    tag_resolver: Arc<TagResolver>,
    attribute_mapper: Arc<AttributeMapper>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            tag_resolver: Arc::clone(&DASH_RESOLVER),
            attribute_mapper: Arc::clone(&DASH_ATTRIBUTES),
        }
    }
}

impl CompileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tag_resolver(mut self, resolver: impl Into<Arc<TagResolver>>) -> Self {
        self.tag_resolver = resolver.into();
        self
    }

    pub fn attribute_mapper(mut self, mapper: impl Into<Arc<AttributeMapper>>) -> Self {
        self.attribute_mapper = mapper.into();
        self
    }

    pub fn resolver(&self) -> &TagResolver {
        &self.tag_resolver
    }

    pub fn mapper(&self) -> &AttributeMapper {
        &self.attribute_mapper
    }
}
