//! Built-in tag providers for Dash component libraries, and the default
//! attribute renames.
//!
//! [`TagResolver::dash`] expects `dash_html_components` bound as `html`,
//! `dash_core_components` as `dcc` and `dash_table` as `dash_table`.
//! HTML tags may be written in any case; the other libraries need the exact
//! component name. [`TagResolver::dbc_and_dash`] puts
//! `dash_bootstrap_components` (as `dbc`) in front, so a tag such as `Nav`
//! resolves to `dbc.Nav` while `nav` still reaches `html.Nav`.

use crate::resolve::{AttributeMapper, Resolution, TagResolver};
use once_cell::sync::Lazy;
use rustc_hash::FxHashSet;
use smol_str::SmolStr;

static HTML_ELEMENTS: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    [
        "A", "Abbr", "Acronym", "Address", "Area", "Article", "Aside", "Audio", "B", "Base",
        "Basefont", "Bdi", "Bdo", "Big", "Blink", "Blockquote", "Br", "Button", "Canvas",
        "Caption", "Center", "Cite", "Code", "Col", "Colgroup", "Command", "Content", "Data",
        "Datalist", "Dd", "Del", "Details", "Dfn", "Dialog", "Div", "Dl", "Dt", "Element", "Em",
        "Embed", "Fieldset", "Figcaption", "Figure", "Font", "Footer", "Form", "Frame",
        "Frameset", "H1", "H2", "H3", "H4", "H5", "H6", "Header", "Hgroup", "Hr", "I", "Iframe",
        "Img", "Ins", "Isindex", "Kbd", "Keygen", "Label", "Legend", "Li", "Link", "Listing",
        "Main", "Map", "Mark", "Marquee", "Meta", "Meter", "Multicol", "Nav", "Nextid", "Nobr",
        "Noscript", "Object", "Ol", "Optgroup", "Option", "Output", "P", "Param", "Picture",
        "Plaintext", "Pre", "Progress", "Q", "Rb", "Rp", "Rt", "Rtc", "Ruby", "S", "Samp",
        "Script", "Section", "Select", "Shadow", "Slot", "Small", "Source", "Spacer", "Span",
        "Strike", "Strong", "Sub", "Summary", "Sup", "Table", "Tbody", "Td", "Template",
        "Textarea", "Tfoot", "Th", "Thead", "Time", "Title", "Tr", "Track", "U", "Ul", "Var",
        "Video", "Wbr", "Xmp",
    ]
    .into_iter()
    .collect()
});

static DCC_COMPONENTS: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    [
        "Checklist",
        "ConfirmDialog",
        "ConfirmDialogProvider",
        "DatePickerRange",
        "DatePickerSingle",
        "Dropdown",
        "Graph",
        "Input",
        "Interval",
        "Link",
        "Loading",
        "Location",
        "LogoutButton",
        "Markdown",
        "RadioItems",
        "RangeSlider",
        "Slider",
        "Store",
        "SyntaxHighlighter",
        "Tab",
        "Tabs",
        "Textarea",
        "Upload",
    ]
    .into_iter()
    .collect()
});

static DBC_COMPONENTS: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    [
        "Alert", "Badge", "Button", "ButtonGroup", "Card", "CardBody", "CardColumns", "CardDeck",
        "CardFooter", "CardGroup", "CardHeader", "CardImg", "CardImgOverlay", "CardLink",
        "CardSubtitle", "CardText", "CardTitle", "Checkbox", "Checklist", "Col", "Collapse",
        "Container", "DatePickerRange", "DatePickerSingle", "DropdownMenu", "DropdownMenuItem",
        "Fade", "Form", "FormFeedback", "FormGroup", "FormText", "Input", "InputGroup",
        "InputGroupAddon", "InputGroupText", "Jumbotron", "Label", "ListGroup", "ListGroupItem",
        "ListGroupItemHeading", "ListGroupItemText", "Modal", "ModalBody", "ModalFooter",
        "ModalHeader", "Nav", "NavItem", "NavLink", "Navbar", "NavbarBrand", "NavbarSimple",
        "NavbarToggler", "Popover", "PopoverBody", "PopoverHeader", "Progress", "RadioButton",
        "RadioItems", "Row", "Select", "Spinner", "Tab", "Table", "Tabs", "Textarea", "Toast",
        "Tooltip",
    ]
    .into_iter()
    .collect()
});

/// Attribute renames applied by default: HTML attribute spellings to the
/// argument names Dash components take.
pub const DEFAULT_ATTRIBUTES: [(&str, &str); 9] = [
    ("class", "className"),
    ("accesskey", "accessKey"),
    ("hreflang", "hrefLang"),
    ("contenteditable", "contentEditable"),
    ("tabindex", "tabIndex"),
    ("colspan", "colSpan"),
    ("rowspan", "rowSpan"),
    ("spellcheck", "spellCheck"),
    ("for", "htmlFor"),
];

/// Upper-case the first letter of every run of letters and lower-case the
/// rest, so `h1` becomes `H1` and `data-LIST` becomes `Data-List`.
pub fn title_case_name(tag: &str) -> String {
    let mut out = String::with_capacity(tag.len());
    let mut in_word = false;
    for c in tag.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

/// HTML elements in any letter case, from `module`. `Map` and `Object`
/// become `MapEl` and `ObjectEl`.
pub fn html(module: &str) -> impl Fn(&str) -> Option<Resolution> + Send + Sync {
    let module = SmolStr::new(module);
    move |tag: &str| {
        let title = title_case_name(tag);
        if !HTML_ELEMENTS.contains(title.as_str()) {
            return None;
        }
        let name = match title.as_str() {
            "Map" | "Object" => format!("{}El", title),
            _ => title,
        };
        Some(Resolution::qualified(module.clone(), name))
    }
}

/// Dash core components by exact name, from `module`.
pub fn dcc(module: &str) -> impl Fn(&str) -> Option<Resolution> + Send + Sync {
    exact(SmolStr::new(module), &DCC_COMPONENTS)
}

/// `DataTable` from `module`.
pub fn datatable(module: &str) -> impl Fn(&str) -> Option<Resolution> + Send + Sync {
    let module = SmolStr::new(module);
    move |tag: &str| (tag == "DataTable").then(|| Resolution::qualified(module.clone(), tag))
}

/// Dash bootstrap components by exact name, from `module`.
pub fn dbc(module: &str) -> impl Fn(&str) -> Option<Resolution> + Send + Sync {
    exact(SmolStr::new(module), &DBC_COMPONENTS)
}

fn exact(
    module: SmolStr,
    names: &'static Lazy<FxHashSet<&'static str>>,
) -> impl Fn(&str) -> Option<Resolution> + Send + Sync {
    move |tag: &str| {
        names
            .contains(tag)
            .then(|| Resolution::qualified(module.clone(), tag))
    }
}

/// Every tag, title-cased, in `namespace` (or bare when `None`).
pub fn title_case(
    namespace: Option<SmolStr>,
) -> impl Fn(&str) -> Option<Resolution> + Send + Sync {
    move |tag: &str| Some(Resolution::new(namespace.clone(), title_case_name(tag)))
}

impl TagResolver {
    /// `html`, `dcc` and `dash_table`, in that order.
    pub fn dash() -> Self {
        TagResolver::new()
            .with_provider(html("html"))
            .with_provider(dcc("dcc"))
            .with_provider(datatable("dash_table"))
    }

    /// `dbc` in front of [`TagResolver::dash`].
    pub fn dbc_and_dash() -> Self {
        TagResolver::new()
            .with_provider(dbc("dbc"))
            .with_provider(html("html"))
            .with_provider(dcc("dcc"))
            .with_provider(datatable("dash_table"))
    }

    /// A single [`title_case`] provider.
    pub fn title_case(namespace: Option<SmolStr>) -> Self {
        TagResolver::new().with_provider(title_case(namespace))
    }
}

impl AttributeMapper {
    /// The [`DEFAULT_ATTRIBUTES`] table.
    pub fn dash() -> Self {
        DEFAULT_ATTRIBUTES.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lookup(resolver: &TagResolver, tag: &str) -> Option<(String, String)> {
        resolver.try_resolve(tag).map(|r| {
            (
                r.namespace.map(|n| n.to_string()).unwrap_or_default(),
                r.name.to_string(),
            )
        })
    }

    fn pair(namespace: &str, name: &str) -> Option<(String, String)> {
        Some((namespace.to_string(), name.to_string()))
    }

    #[test]
    fn test_dash_chain() {
        let dash = TagResolver::dash();
        assert_eq!(lookup(&dash, "a"), pair("html", "A"));
        assert_eq!(lookup(&dash, "Nav"), pair("html", "Nav"));
        assert_eq!(lookup(&dash, "CENTER"), pair("html", "Center"));
        assert_eq!(lookup(&dash, "object"), pair("html", "ObjectEl"));
        assert_eq!(lookup(&dash, "map"), pair("html", "MapEl"));
        assert_eq!(lookup(&dash, "DatePickerSingle"), pair("dcc", "DatePickerSingle"));
        assert_eq!(lookup(&dash, "DataTable"), pair("dash_table", "DataTable"));
        assert_eq!(lookup(&dash, "no-such-element"), None);
        assert_eq!(lookup(&dash, "datepickersingle"), None);
    }

    #[test]
    fn test_dbc_shadows_html_only_in_title_case() {
        let dbc = TagResolver::dbc_and_dash();
        assert_eq!(lookup(&dbc, "a"), pair("html", "A"));
        assert_eq!(lookup(&dbc, "Nav"), pair("dbc", "Nav"));
        assert_eq!(lookup(&dbc, "nav"), pair("html", "Nav"));
    }

    #[test]
    fn test_custom_module_names() {
        let resolver = TagResolver::new()
            .with_provider(html("H"))
            .with_provider(dcc("C"));
        assert_eq!(lookup(&resolver, "a"), pair("H", "A"));
        assert_eq!(lookup(&resolver, "object"), pair("H", "ObjectEl"));
        assert_eq!(lookup(&resolver, "DatePickerSingle"), pair("C", "DatePickerSingle"));
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case_name("h1"), "H1");
        assert_eq!(title_case_name("dIV"), "Div");
        assert_eq!(title_case_name("data-LIST"), "Data-List");
        assert_eq!(title_case_name("a1b"), "A1B");
        let resolver = TagResolver::title_case(None);
        assert_eq!(resolver.try_resolve("span"), Some(Resolution::bare("Span")));
    }

    #[test]
    fn test_default_attributes() {
        let mapper = AttributeMapper::dash();
        assert_eq!(mapper.len(), DEFAULT_ATTRIBUTES.len());
        assert_eq!(mapper.get("class", "class"), "className");
        assert_eq!(mapper.get("for", "for"), "htmlFor");
        assert_eq!(mapper.get("id", "id"), "id");
    }
}
