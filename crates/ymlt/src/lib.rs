//! # ymlt - templated yaml
//!
//! YAML documents whose string values reference other values of the same document.
//!
//! ```yaml
//! name: world
//! greeting: 'hello {{t "name"}}'
//! shout: '{{upper (t "greeting")}}'
//! ```
//!
//! resolves to
//!
//! ```yaml
//! name: world
//! greeting: hello world
//! shout: HELLO WORLD
//! ```
//!
//! ## Introduction for developers
//!
//! Read this to understand how `ymlt` works internally.
//!
//! ### Loading
//!
//! see [loader]
//!
//! Text is parsed with the event parser of [yaml_rust2] into a [Document]: an arena where every mapping, sequence
//! and scalar gets a [document::NodeId]. Everything after loading talks about nodes by id, never by content, so two
//! leaves with the same text stay two leaves. Scalars keep their raw text together with an inferred type.
//! Aliases are expanded into copies.
//!
//! ### Defaults
//!
//! see [merge_defaults]
//!
//! A second document can supply values for keys the first one does not define. Nested mappings are merged, anything
//! else already present in the document wins.
//!
//! ### Templates
//!
//! see [template]
//!
//! Every non-empty scalar value (never a mapping key) is a template for [handlebars]. On top of the caller's
//! [template::FunctionTable] two helpers are bound:
//!
//! | **helper**    | **returns**                                         |
//! |---------------|-----------------------------------------------------|
//! | `t "path"`    | text of the first scalar matching `path`            |
//! | `tt "path"`   | texts of all scalars matching `path` (as a list)    |
//!
//! Paths are a JSONPath-like dialect, see [path].
//!
//! ### Dependencies
//!
//! see [dependencies::DependencyGraph]
//!
//! We don't know which values a template reads until it runs. So every template is run once with `t`/`tt` replaced by
//! recording helpers (a dry run). The recorded paths are resolved against the document and give us, per leaf, the
//! leaves that have to be final before it.
//!
//! Lookups in a branch the dry run did not take (`t` returns `""` there) are not seen.
//!
//! ### Evaluation
//!
//! see [resolve::Evaluator]
//!
//! Leaves are walked in document order. Before a leaf is rendered all its dependencies are rendered, using an
//! explicit stack. Reaching a leaf that is still on that stack is a cycle and aborts with the chain of fields
//! involved. Rendered text replaces the leaf's text. Quoted values stay strings, only plain values are typed again.
//!
//! ### Output
//!
//! The resolved document is turned into a [value::Value] which in turn gets serialized via [serde].
//!
pub mod defaults;
pub mod dependencies;
pub mod document;
pub mod error;
pub mod loader;
pub mod path;
pub mod resolve;
pub mod template;
pub mod value;
mod visit;

pub use defaults::merge_defaults;
pub use document::Document;
pub use error::{Error, ResolveError};
pub use resolve::resolve;

use template::FunctionTable;
use value::Value;

/// Everything applied to a document besides its own content
#[derive(Debug, Default, Clone)]
pub struct Config {
    pub defaults: Option<Document>,
    pub functions: FunctionTable,
}

/// Merge the configured defaults (if any), then resolve all templates
pub fn apply(document: &mut Document, config: &Config) -> Result<(), ResolveError> {
    if let Some(defaults) = &config.defaults {
        merge_defaults(document, defaults)?;
    }
    resolve(document, &config.functions)
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    #[default]
    Yaml,
}

/// Load every document of `text`, [apply] `config` to each and serialize the results
///
/// YAML output separates documents with `---`, JSON output writes one pretty printed document after another.
pub fn render_str(text: &str, config: &Config, format: OutputFormat) -> Result<String, Error> {
    let mut rendered = vec![];

    for (index, mut document) in loader::parse_stream(text)?.into_iter().enumerate() {
        apply(&mut document, config)?;
        tracing::debug!(index, "document resolved");

        let value = Value::from(&document);
        rendered.push(match format {
            OutputFormat::Yaml => serde_yaml::to_string(&value)?,
            OutputFormat::Json => serde_json::to_string_pretty(&value)? + "\n",
        });
    }

    Ok(match format {
        OutputFormat::Yaml => rendered.join("---\n"),
        OutputFormat::Json => rendered.concat(),
    })
}
