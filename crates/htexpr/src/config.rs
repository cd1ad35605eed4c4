//! Declarative mapping configuration.
//!
//! ```json
//! {
//!   "resolvers": [
//!     { "provider": "dbc" },
//!     { "provider": "html", "module": "h" },
//!     { "provider": "table", "tags": { "card": { "namespace": "ui", "name": "Card" } } }
//!   ],
//!   "attributes": { "data_id": "dataId" },
//!   "default_attributes": true
//! }
//! ```

use crate::options::CompileOptions;
use htexpr_compiler::{mappings, AttributeMapper, TagResolver, TagTable, DEFAULT_ATTRIBUTES};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

fn html_module() -> SmolStr {
    SmolStr::new_static("html")
}

fn dcc_module() -> SmolStr {
    SmolStr::new_static("dcc")
}

fn dash_table_module() -> SmolStr {
    SmolStr::new_static("dash_table")
}

fn dbc_module() -> SmolStr {
    SmolStr::new_static("dbc")
}

fn default_true() -> bool {
    true
}

/// One link of a configured resolver chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "snake_case")]
pub enum ProviderConfig {
    Html {
        #[serde(default = "html_module")]
        module: SmolStr,
    },
    Dcc {
        #[serde(default = "dcc_module")]
        module: SmolStr,
    },
    DashTable {
        #[serde(default = "dash_table_module")]
        module: SmolStr,
    },
    Dbc {
        #[serde(default = "dbc_module")]
        module: SmolStr,
    },
    TitleCase {
        #[serde(default)]
        namespace: Option<SmolStr>,
    },
    Table { tags: TagTable },
}

impl ProviderConfig {
    fn push_onto(&self, resolver: &mut TagResolver) {
        match self {
            ProviderConfig::Html { module } => resolver.push(mappings::html(module)),
            ProviderConfig::Dcc { module } => resolver.push(mappings::dcc(module)),
            ProviderConfig::DashTable { module } => resolver.push(mappings::datatable(module)),
            ProviderConfig::Dbc { module } => resolver.push(mappings::dbc(module)),
            ProviderConfig::TitleCase { namespace } => {
                resolver.push(mappings::title_case(namespace.clone()))
            }
            ProviderConfig::Table { tags } => resolver.push(tags.clone()),
        }
    }
}

/// Tag resolver chain and attribute renames, loadable from JSON.
///
/// An empty `resolvers` list means the built-in Dash chain
/// ([`TagResolver::dash`]). Entries in `attributes` override the default
/// table when both name the same attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingConfig {
    #[serde(default)]
    pub resolvers: Vec<ProviderConfig>,
    #[serde(default)]
    pub attributes: IndexMap<SmolStr, SmolStr>,
    #[serde(default = "default_true")]
    pub default_attributes: bool,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            resolvers: Vec::new(),
            attributes: IndexMap::new(),
            default_attributes: true,
        }
    }
}

impl MappingConfig {
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn tag_resolver(&self) -> TagResolver {
        if self.resolvers.is_empty() {
            return TagResolver::dash();
        }
        let mut resolver = TagResolver::new();
        for provider in &self.resolvers {
            provider.push_onto(&mut resolver);
        }
        resolver
    }

    pub fn attribute_mapper(&self) -> AttributeMapper {
        let defaults: &[(&str, &str)] = if self.default_attributes {
            &DEFAULT_ATTRIBUTES[..]
        } else {
            &[]
        };
        defaults
            .iter()
            .map(|&(attribute, argument)| (SmolStr::new(attribute), SmolStr::new(argument)))
            .chain(
                self.attributes
                    .iter()
                    .map(|(attribute, argument)| (attribute.clone(), argument.clone())),
            )
            .collect()
    }

    /// Build a resolver and mapper once, for use across many compilations.
    pub fn into_options(self) -> CompileOptions {
        CompileOptions::new()
            .tag_resolver(self.tag_resolver())
            .attribute_mapper(self.attribute_mapper())
    }
}
