use htexpr::{
    compile, Bindings, CacheStats, CompileOptions, CompiledTemplate, MappingConfig, Namespace,
    TemplateCache,
};
use pretty_assertions::assert_eq;
use rayon::prelude::*;
use std::sync::Arc;

const TEMPLATE: &str = r#"<div class="row">[(<span>{n * i}</span>) for i in range(3)]</div>"#;

fn html() -> Namespace {
    Namespace::with_constructors("html", ["Div", "Span"])
}

#[test]
fn compiled_templates_are_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<CompiledTemplate>();
    assert_send_sync::<TemplateCache>();
    assert_send_sync::<CompileOptions>();
}

#[test]
fn concurrent_first_use_compiles_once() {
    let cache = TemplateCache::new();
    let templates: Vec<Arc<CompiledTemplate>> = (0..64)
        .into_par_iter()
        .map(|_| cache.get(TEMPLATE).unwrap())
        .collect();

    assert!(templates.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.stats(), CacheStats { hits: 63, misses: 1 });
}

#[test]
fn concurrent_evaluation_with_independent_bindings() {
    let template = compile(TEMPLATE).unwrap();
    let rendered: Vec<String> = (0..32i64)
        .into_par_iter()
        .map(|n| {
            let bindings = Bindings::new().with("html", html()).with("n", n);
            template.evaluate(&bindings).unwrap().to_string()
        })
        .collect();

    for (n, tree) in rendered.iter().enumerate() {
        let n = n as i64;
        assert_eq!(
            tree,
            &format!(
                "html.Div(children=[html.Span(children=[0]), html.Span(children=[{}]), \
                 html.Span(children=[{}])], className='row')",
                n,
                2 * n
            )
        );
    }
}

#[test]
fn options_from_config_share_cache_entries() {
    let options = MappingConfig::from_json_str(r#"{"resolvers": [{"provider": "title_case"}]}"#)
        .unwrap()
        .into_options();
    let cache = TemplateCache::new();

    let first = cache.get_or_compile("<card/>", &options).unwrap();
    let second = cache.get_or_compile("<card/>", &options.clone()).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.source(), "Card(children=[])");

    let err = cache.get("<card/>").unwrap_err();
    assert_eq!(err.code(), "unknown-tag");
    assert_eq!(cache.len(), 2);
}
