use htexpr::{
    compile, compile_with, constructor, Bindings, CompileOptions, EvalErrorKind, Namespace,
    Resolution, TagResolver, Value,
};
use pretty_assertions::assert_eq;
use serde_json::json;

/// Title-cased bare constructors, as if `H1`, `Div` and `Span` were plain
/// functions in scope.
fn bare_options() -> CompileOptions {
    CompileOptions::new().tag_resolver(TagResolver::title_case(None))
}

fn bare_bindings() -> Bindings {
    Bindings::new()
        .with("H1", constructor("", "H1"))
        .with("Div", constructor("", "Div"))
        .with("Span", constructor("", "Span"))
        .with("foo", "one")
        .with("bar", 2i64)
}

fn run(template: &str) -> Value {
    compile_with(template, &bare_options())
        .unwrap_or_else(|e| panic!("{template:?} failed to compile: {e}"))
        .evaluate(&bare_bindings())
        .unwrap_or_else(|e| panic!("{template:?} failed to evaluate: {e}"))
}

#[test]
fn expression_child() {
    assert_eq!(
        run(r#"<h1 id="header">{foo*bar}</h1>"#).to_string(),
        "H1(children=['oneone'], id='header')"
    );
}

#[test]
fn nested_elements_with_literal_text() {
    let template = r#"
             <div class="c">
              <span id={foo} class="foo">
                10x: { "x" * 10 }
              </span>
            </div>
        "#;
    assert_eq!(
        run(template).to_string(),
        "Div(children=[Span(children=['10x: ', 'xxxxxxxxxx'], id='one', className='foo')], \
         className='c')"
    );
}

#[test]
fn list_expression_child() {
    assert_eq!(
        run("<div>[ Span(x=i) for i in range(3) ]</div>").to_string(),
        "Div(children=[Span(x=0), Span(x=1), Span(x=2)])"
    );
}

#[test]
fn element_inside_expression() {
    assert_eq!(
        run("<div>{(<span id={'spam'}/>)}</div>").to_string(),
        "Div(children=[Span(children=[], id='spam')])"
    );
}

#[test]
fn two_elements_inside_comprehension() {
    let template = "<div>[ (<span x={i} />) if i%2==0 else (<h1 x={i} />)
                      for i in range(3) ]</div>";
    assert_eq!(
        run(template).to_string(),
        "Div(children=[Span(children=[], x=0), H1(children=[], x=1), Span(children=[], x=2)])"
    );
}

#[test]
fn element_as_call_argument_and_after_keyword() {
    assert_eq!(
        run("<div>{Div(<span/>)}</div>").to_string(),
        "Div(children=[Div(children=Span(children=[]))])"
    );
    assert_eq!(
        run("<div>{None if 0 else(<span/>)}</div>").to_string(),
        "Div(children=[Span(children=[])])"
    );
    assert_eq!(
        run("<div>{not(<span/>)}</div>").to_string(),
        "Div(children=[False])"
    );
}

#[test]
fn int_and_float_compare_equal() {
    assert_eq!(
        run("<div>{1 == 1.0}{2.0 in [1, 2]}</div>").to_string(),
        "Div(children=[True, True])"
    );
}

#[test]
fn huge_slice_step() {
    assert_eq!(
        run("<div>{[1, 2, 3][1::9223372036854775807]}</div>").to_string(),
        "Div(children=[[2]])"
    );
}

#[test]
fn broken_nested_element_is_a_parse_error() {
    let err = compile("<div>{(<a>x</b>)}</div>").unwrap_err();
    assert!(err.is_parse(), "{err}");
    assert_eq!(err.code(), "mismatched-tag");
}

#[test]
fn deeply_nested_elements() {
    assert_eq!(
        run("<div>{(<span>one {(<h1>two</h1>) or 1/0} three</span>)}</div>").to_string(),
        "Div(children=[Span(children=['one ', H1(children=['two']), ' three'])])"
    );
}

#[test]
fn list_and_dict_attributes() {
    let lists = run("<div a1={[i**2 for i in range(3)]} a2=[i**2 for i in range(3)] />");
    assert_eq!(
        serde_json::to_value(&lists).unwrap(),
        json!({"type": "Div", "props": {"children": [], "a1": [0, 1, 4], "a2": [0, 1, 4]}})
    );

    let dicts = run("<div a1={{'a': 1, 'b': 2}} a2={'a': 1, 'b': 2} />");
    assert_eq!(
        serde_json::to_value(&dicts).unwrap(),
        json!({
            "type": "Div",
            "props": {"children": [], "a1": {"a": 1, "b": 2}, "a2": {"a": 1, "b": 2}}
        })
    );
}

#[test]
fn element_on_its_own_lines() {
    let template = "
                <div>{
                  (<span />)
                }</div>
            ";
    assert_eq!(
        run(template).to_string(),
        "Div(children=[Span(children=[])])"
    );
}

#[test]
fn missing_binding_is_a_name_error() {
    let template =
        compile("<div>[(<span>{i}</span>) for i in range(10) if i not in removed]</div>").unwrap();
    let bindings = Bindings::new()
        .with("html", Namespace::with_constructors("html", ["Div", "Span"]));

    let err = template.evaluate(&bindings).unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::NameError);
    assert_eq!(err.message, "name 'removed' is not defined");

    let with_removed = bindings.with("removed", Value::from(json!([0, 1, 2, 3, 5, 6, 7, 9])));
    assert_eq!(
        template.evaluate(&with_removed).unwrap().to_string(),
        "html.Div(children=[html.Span(children=[4]), html.Span(children=[8])])"
    );
}

#[test]
fn custom_tag_provider() {
    let resolver = TagResolver::new().with_provider(|tag: &str| match tag {
        "a" => Some(Resolution::bare("tag_anchor")),
        "b" => Some(Resolution::qualified("Html", "tag_bold")),
        _ => None,
    });
    let options = CompileOptions::new().tag_resolver(resolver);
    let template = compile_with(r#"<a foo="bar"><b>x</b></a>"#, &options).unwrap();

    let bindings = Bindings::new()
        .with("tag_anchor", constructor("", "tag_anchor"))
        .with("Html", Namespace::with_constructors("Html", ["tag_bold"]));
    assert_eq!(
        template.evaluate(&bindings).unwrap().to_string(),
        "tag_anchor(children=[Html.tag_bold(children=['x'])], foo='bar')"
    );

    let err = compile_with("<a><i/></a>", &options).unwrap_err();
    assert_eq!(err.code(), "unknown-tag");
    assert_eq!(err.message(), "no resolver for tag: i");
}

#[test]
fn evaluation_is_repeatable() {
    let template = compile_with("<div>{foo * bar}<span/></div>", &bare_options()).unwrap();
    let bindings = bare_bindings();
    let first = template.evaluate(&bindings).unwrap();
    let second = template.evaluate(&bindings).unwrap();
    assert_eq!(first.to_string(), second.to_string());
    assert_eq!(first.to_string(), "Div(children=['oneone', Span(children=[])])");
}

#[test]
fn explicit_bindings_shadow_ambient_ones() {
    let template = compile_with("<h1>{foo} {bar}</h1>", &bare_options()).unwrap();
    let explicit = Bindings::new().with("foo", "explicit");
    assert_eq!(
        template
            .evaluate_layered(&bare_bindings(), &explicit)
            .unwrap()
            .to_string(),
        "H1(children=['explicit', ' ', 2])"
    );
}

#[test]
fn bindings_from_json() {
    let template = compile(r#"<ul>[(<li>{item["name"]}</li>) for item in items]</ul>"#).unwrap();
    let mut bindings =
        Bindings::from_json(json!({"items": [{"name": "a"}, {"name": "b"}]})).unwrap();
    bindings.insert("html", Namespace::with_constructors("html", ["Ul", "Li"]));
    let tree = template.evaluate(&bindings).unwrap();
    assert_eq!(
        serde_json::to_value(&tree).unwrap(),
        json!({
            "type": "html.Ul",
            "props": {"children": [
                {"type": "html.Li", "props": {"children": ["a"]}},
                {"type": "html.Li", "props": {"children": ["b"]}}
            ]}
        })
    );
}

#[test]
fn well_formed_templates_compile() {
    for template in [
        r#"<div id="asdf" />"#,
        "<span class='qwerty'></span>",
        r#"<div><div id="asdf" /></div>"#,
        r#"<div id={"asdf"} />"#,
        r#"<div id="}" />"#,
        r#"<div id={1+2+3<">"+4>5} />"#,
        "<ul>[1, 2, 3]</ul>",
    ] {
        if let Err(e) = compile(template) {
            panic!("{template:?}: {e}");
        }
    }
}

#[test]
fn malformed_templates_are_parse_errors() {
    for template in [
        "{}",
        "foo",
        r#"<div id="asdf} />"#,
        r#"<div><div id="asdf" /></span>"#,
        r#"<div id={"asdf}" />"#,
        r#"<div id={1+2+3<">"}+4>5} />"#,
        "<ul>[1, 2, 3]",
        "<a>x</b>",
    ] {
        match compile(template) {
            Ok(_) => panic!("{template:?} compiled"),
            Err(e) => assert!(e.is_parse(), "{template:?}: {e}"),
        }
    }
}
