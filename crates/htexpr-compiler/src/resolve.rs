//! Tag resolution and attribute renaming.
//!
//! A [`TagResolver`] asks an ordered list of [`TagProvider`]s where the
//! constructor for a tag lives; the first answer wins. An
//! [`AttributeMapper`] renames attributes to argument names. Both carry an
//! identity used as part of template cache keys: a clone keeps it, any
//! change assigns a fresh one.

use crate::error::{CompileError, CompileResult};
use host_expr::Expr;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use source_map::Span;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Where the constructor for a tag is found: `namespace.name`, or a bare
/// `name` when there is no namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    #[serde(default)]
    pub namespace: Option<SmolStr>,
    pub name: SmolStr,
}

impl Resolution {
    pub fn new(namespace: Option<SmolStr>, name: impl Into<SmolStr>) -> Self {
        Self {
            namespace,
            name: name.into(),
        }
    }

    pub fn qualified(namespace: impl Into<SmolStr>, name: impl Into<SmolStr>) -> Self {
        Self::new(Some(namespace.into()), name)
    }

    pub fn bare(name: impl Into<SmolStr>) -> Self {
        Self::new(None, name)
    }

    /// The expression naming the constructor.
    pub fn callee(&self) -> Expr {
        match &self.namespace {
            Some(namespace) => Expr::name(namespace.clone()).attr(self.name.clone()),
            None => Expr::name(self.name.clone()),
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(namespace) => write!(f, "{}.{}", namespace, self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// One link of a resolver chain. Returns `None` to pass the tag on.
pub trait TagProvider: Send + Sync {
    fn resolve(&self, tag: &str) -> Option<Resolution>;
}

impl<F> TagProvider for F
where
    F: Fn(&str) -> Option<Resolution> + Send + Sync,
{
    fn resolve(&self, tag: &str) -> Option<Resolution> {
        self(tag)
    }
}

/// A provider backed by an explicit tag table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagTable {
    tags: FxHashMap<SmolStr, Resolution>,
}

impl TagTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, tag: impl Into<SmolStr>, resolution: Resolution) -> Self {
        self.insert(tag, resolution);
        self
    }

    pub fn insert(&mut self, tag: impl Into<SmolStr>, resolution: Resolution) {
        self.tags.insert(tag.into(), resolution);
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl TagProvider for TagTable {
    fn resolve(&self, tag: &str) -> Option<Resolution> {
        self.tags.get(tag).cloned()
    }
}

impl<K: Into<SmolStr>> FromIterator<(K, Resolution)> for TagTable {
    fn from_iter<I: IntoIterator<Item = (K, Resolution)>>(iter: I) -> Self {
        Self {
            tags: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// An ordered chain of [`TagProvider`]s.
#[derive(Clone)]
pub struct TagResolver {
    id: u64,
    providers: Vec<Arc<dyn TagProvider>>,
}

impl TagResolver {
    /// A resolver with no providers; it rejects every tag.
    pub fn new() -> Self {
        Self {
            id: next_id(),
            providers: Vec::new(),
        }
    }

    pub fn with_provider(mut self, provider: impl TagProvider + 'static) -> Self {
        self.push(provider);
        self
    }

    /// Append a provider to the end of the chain.
    pub fn push(&mut self, provider: impl TagProvider + 'static) {
        self.providers.push(Arc::new(provider));
        self.id = next_id();
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// The first provider answer for `tag`, if any.
    pub fn try_resolve(&self, tag: &str) -> Option<Resolution> {
        self.providers.iter().find_map(|p| p.resolve(tag))
    }

    /// Resolve `tag`, reporting the element at `span` when every provider
    /// declines.
    pub fn resolve(&self, tag: &str, span: Span) -> CompileResult<Resolution> {
        self.try_resolve(tag)
            .ok_or_else(|| CompileError::unknown_tag(tag, span))
    }
}

impl Default for TagResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TagResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TagResolver")
            .field("id", &self.id)
            .field("providers", &self.providers.len())
            .finish()
    }
}

/// Renames attributes to constructor argument names. Names without an entry
/// pass through.
#[derive(Debug, Clone)]
pub struct AttributeMapper {
    id: u64,
    names: FxHashMap<SmolStr, SmolStr>,
}

impl AttributeMapper {
    /// A mapper that renames nothing.
    pub fn new() -> Self {
        Self {
            id: next_id(),
            names: FxHashMap::default(),
        }
    }

    pub fn with(mut self, attribute: impl Into<SmolStr>, argument: impl Into<SmolStr>) -> Self {
        self.insert(attribute, argument);
        self
    }

    pub fn insert(&mut self, attribute: impl Into<SmolStr>, argument: impl Into<SmolStr>) {
        self.names.insert(attribute.into(), argument.into());
        self.id = next_id();
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// The argument name for `attribute`, or `default` if it has no entry.
    pub fn get<'a>(&'a self, attribute: &str, default: &'a str) -> &'a str {
        self.names
            .get(attribute)
            .map(SmolStr::as_str)
            .unwrap_or(default)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for AttributeMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Into<SmolStr>, V: Into<SmolStr>> FromIterator<(K, V)> for AttributeMapper {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut mapper = Self::new();
        for (attribute, argument) in iter {
            mapper.insert(attribute, argument);
        }
        mapper
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompileErrorCode;
    use pretty_assertions::assert_eq;

    fn bar(tag: &str) -> Option<Resolution> {
        tag.contains("bar").then(|| Resolution::qualified("bar", tag))
    }

    fn table() -> TagTable {
        TagTable::new().with("foo", Resolution::qualified("foo", "xyzzy"))
    }

    #[test]
    fn test_first_provider_wins() {
        let resolver = TagResolver::new().with_provider(bar).with_provider(table());
        assert_eq!(
            resolver.try_resolve("foo"),
            Some(Resolution::qualified("foo", "xyzzy"))
        );
        assert_eq!(
            resolver.try_resolve("baric"),
            Some(Resolution::qualified("bar", "baric"))
        );

        let reversed = TagResolver::new().with_provider(table()).with_provider(bar);
        assert_eq!(
            reversed.try_resolve("foo"),
            Some(Resolution::qualified("foo", "xyzzy"))
        );
        assert_eq!(
            reversed.try_resolve("baric"),
            Some(Resolution::qualified("bar", "baric"))
        );
    }

    #[test]
    fn test_all_declining_is_an_error() {
        let resolver = TagResolver::new().with_provider(bar).with_provider(table());
        let err = resolver.resolve("none", Span::new(0, 7)).unwrap_err();
        assert_eq!(err.code, CompileErrorCode::UnknownTag);
        assert_eq!(err.message, "no resolver for tag: none");
        assert_eq!(err.span, Span::new(0, 7));
        assert!(TagResolver::new().try_resolve("div").is_none());
    }

    #[test]
    fn test_closure_provider() {
        let resolver =
            TagResolver::new().with_provider(|tag: &str| Some(Resolution::qualified("foo", tag)));
        assert_eq!(
            resolver.try_resolve("xyzzy"),
            Some(Resolution::qualified("foo", "xyzzy"))
        );
    }

    #[test]
    fn test_identity() {
        let resolver = TagResolver::new().with_provider(bar);
        let clone = resolver.clone();
        assert_eq!(resolver.id(), clone.id());
        assert_ne!(TagResolver::new().id(), TagResolver::new().id());

        let mut changed = clone.clone();
        changed.push(table());
        assert_ne!(changed.id(), clone.id());

        let mapper = AttributeMapper::new();
        assert_eq!(mapper.clone().id(), mapper.id());
        assert_ne!(mapper.clone().with("a", "b").id(), mapper.id());
    }

    #[test]
    fn test_attribute_mapper() {
        let mapper: AttributeMapper = [("class", "className")].into_iter().collect();
        assert_eq!(mapper.get("class", "class"), "className");
        assert_eq!(mapper.get("id", "id"), "id");
        assert_eq!(mapper.len(), 1);
    }

    #[test]
    fn test_callee() {
        assert_eq!(
            Resolution::qualified("html", "Div").callee().to_string(),
            "html.Div"
        );
        assert_eq!(Resolution::bare("H1").callee().to_string(), "H1");
        assert_eq!(Resolution::bare("H1").to_string(), "H1");
    }

    #[test]
    fn test_table_from_json() {
        let table: TagTable = serde_json::from_value(serde_json::json!({
            "card": {"namespace": "ui", "name": "Card"},
            "x": {"name": "X"}
        }))
        .unwrap();
        assert_eq!(table.resolve("card"), Some(Resolution::qualified("ui", "Card")));
        assert_eq!(table.resolve("x"), Some(Resolution::bare("X")));
        assert_eq!(table.resolve("y"), None);
    }
}
