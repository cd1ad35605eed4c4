//! A cache of compiled templates.

use crate::error::Error;
use crate::options::CompileOptions;
use crate::template::CompiledTemplate;
use once_cell::sync::OnceCell;
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::trace;

type Slot = Arc<OnceCell<Result<Arc<CompiledTemplate>, Error>>>;

/// Template text plus the identities of the resolver and mapper used.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    text: Box<str>,
    resolver: u64,
    mapper: u64,
}

/// Compiled templates keyed by template text, tag resolver and attribute
/// mapper.
///
/// Each key is compiled at most once, even when several threads ask for it
/// at the same time: the first caller compiles while the others wait for
/// its result. Failures are cached like successes.
#[derive(Debug, Default)]
pub struct TemplateCache {
    slots: Mutex<FxHashMap<CacheKey, Slot>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Lookup counters of a [`TemplateCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Lookups answered by an existing or in-flight compilation.
    pub hits: u64,
    /// Lookups that compiled.
    pub misses: u64,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, FxHashMap<CacheKey, Slot>> {
        self.slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The compiled form of `template` under `options`, compiling it on
    /// first use.
    pub fn get_or_compile(
        &self,
        template: &str,
        options: &CompileOptions,
    ) -> Result<Arc<CompiledTemplate>, Error> {
        let key = CacheKey {
            text: template.into(),
            resolver: options.resolver().id(),
            mapper: options.mapper().id(),
        };
        let slot = Arc::clone(self.slots().entry(key).or_default());

        let mut compiled_here = false;
        let result = slot.get_or_init(|| {
            compiled_here = true;
            crate::compile_with(template, options).map(Arc::new)
        });
        if compiled_here {
            self.misses.fetch_add(1, Ordering::Relaxed);
            trace!(len = template.len(), "template cache miss");
        } else {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(len = template.len(), "template cache hit");
        }
        result.clone()
    }

    /// [`get_or_compile`](Self::get_or_compile) with default options.
    pub fn get(&self, template: &str) -> Result<Arc<CompiledTemplate>, Error> {
        self.get_or_compile(template, &CompileOptions::default())
    }

    pub fn len(&self) -> usize {
        self.slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots().is_empty()
    }

    pub fn clear(&self) {
        self.slots().clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use htexpr_compiler::TagResolver;

    #[test]
    fn test_same_key_compiles_once() {
        let cache = TemplateCache::new();
        let first = cache.get("<div>{x}</div>").unwrap();
        let second = cache.get("<div>{x}</div>").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1 });
    }

    #[test]
    fn test_key_includes_resolver_identity() {
        let cache = TemplateCache::new();
        let title = CompileOptions::new().tag_resolver(TagResolver::title_case(None));
        let dash = cache.get("<div/>").unwrap();
        let bare = cache.get_or_compile("<div/>", &title).unwrap();
        assert!(!Arc::ptr_eq(&dash, &bare));
        assert_eq!(dash.source(), "html.Div(children=[])");
        assert_eq!(bare.source(), "Div(children=[])");
        assert_eq!(cache.len(), 2);

        let again = cache.get_or_compile("<div/>", &title.clone()).unwrap();
        assert!(Arc::ptr_eq(&bare, &again));
    }

    #[test]
    fn test_failures_are_cached() {
        let cache = TemplateCache::new();
        let first = cache.get("<a>x</b>").unwrap_err();
        let second = cache.get("<a>x</b>").unwrap_err();
        assert_eq!(first, second);
        assert_eq!(cache.stats().misses, 1);

        cache.clear();
        assert!(cache.is_empty());
    }
}
