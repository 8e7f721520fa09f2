//! template execution
//!
//! Scalars are rendered with [handlebars]. Two helpers are bound on top of the caller's [FunctionTable]:
//!
//! - `t "path"` returns the text of the first scalar matching `path`
//! - `tt "path"` returns the texts of all scalars matching `path` (document order)
//!
//! ```yaml
//! name: world
//! greeting: 'hello {{t "name"}}'
//! all: '{{join (tt "items[*]") ", "}}'
//! ```
//!
//! [dry_run] binds recording versions of `t` and `tt` instead. They only remember which paths were requested and
//! return `""` / `[]`, so the whole template (conditionals, loops, custom functions) runs without needing any other
//! field to be resolved first.
mod functions;
mod helpers;

pub use functions::{standard, FunctionError, FunctionTable, TemplateFunction};

use crate::document::{Document, NodeId, NodeKind};
use crate::error::ResolveError;
use crate::path::YamlPath;
use handlebars::Handlebars;
use helpers::{FunctionHelper, LookupHelper, RecordingHelper};
use std::sync::{Mutex, PoisonError};

/// Helper name of the single match lookup
pub const SINGLE_LOOKUP: &str = "t";
/// Helper name of the all matches lookup
pub const MULTI_LOOKUP: &str = "tt";

const TEMPLATE_NAME: &str = "ymlt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// first match wins
    Single,
    /// every match, in document order
    All,
}

impl Lookup {
    pub fn helper_name(self) -> &'static str {
        match self {
            Lookup::Single => SINGLE_LOOKUP,
            Lookup::All => MULTI_LOOKUP,
        }
    }

    /// Nodes a lookup of `path` reads
    ///
    /// Fails if nothing matches or if a node that would be read is not a scalar.
    pub fn resolve(self, document: &Document, path: &str) -> Result<Vec<NodeId>, ResolveError> {
        let mut nodes = YamlPath::parse(path)?.find(document);

        if nodes.is_empty() {
            return Err(ResolveError::PathNotFound {
                path: path.to_string(),
            });
        }

        if self == Lookup::Single {
            nodes.truncate(1);
        }

        if nodes
            .iter()
            .any(|node| document.kind(*node) != NodeKind::Scalar)
        {
            return Err(ResolveError::NonScalarReference {
                path: path.to_string(),
            });
        }

        Ok(nodes)
    }
}

/// Paths a template requested, each list in call order
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Lookups {
    pub single: Vec<String>,
    pub multi: Vec<String>,
}

/// Only text containing `{{` is handed to the template engine
pub fn is_template(text: &str) -> bool {
    text.contains("{{")
}

/// Render `text` with `t`/`tt` reading from `document` as it is right now
pub fn execute(
    text: &str,
    document: &Document,
    functions: &FunctionTable,
) -> Result<String, ResolveError> {
    functions.check_reserved()?;
    if !is_template(text) {
        return Ok(text.to_string());
    }

    let failure = Mutex::new(None);
    let mut registry = registry(functions);
    for lookup in [Lookup::Single, Lookup::All] {
        registry.register_helper(
            lookup.helper_name(),
            Box::new(LookupHelper::new(document, lookup, &failure)),
        );
    }

    render(&mut registry, text, &failure)
}

/// Run `text` once with recording lookups and report which paths it asked for
pub fn dry_run(text: &str, functions: &FunctionTable) -> Result<Lookups, ResolveError> {
    functions.check_reserved()?;
    if !is_template(text) {
        return Ok(Lookups::default());
    }

    let failure = Mutex::new(None);
    let recorded = Mutex::new(Lookups::default());
    let mut registry = registry(functions);
    for lookup in [Lookup::Single, Lookup::All] {
        registry.register_helper(
            lookup.helper_name(),
            Box::new(RecordingHelper::new(lookup, &recorded)),
        );
    }

    render(&mut registry, text, &failure)?;
    drop(registry);

    Ok(recorded.into_inner().unwrap_or_else(PoisonError::into_inner))
}

fn registry<'reg>(functions: &FunctionTable) -> Handlebars<'reg> {
    let mut registry = Handlebars::new();
    registry.register_escape_fn(handlebars::no_escape);
    registry.set_strict_mode(true);

    for (name, function) in functions.iter() {
        registry.register_helper(name, Box::new(FunctionHelper::new(function.clone())));
    }

    registry
}

fn render(
    registry: &mut Handlebars<'_>,
    text: &str,
    failure: &Mutex<Option<ResolveError>>,
) -> Result<String, ResolveError> {
    registry
        .register_template_string(TEMPLATE_NAME, text)
        .map_err(ResolveError::TemplateSyntax)?;

    registry.render(TEMPLATE_NAME, &text).map_err(|error| {
        // a lookup failure keeps its own kind instead of a generic render error
        failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .unwrap_or(ResolveError::TemplateExecution(error))
    })
}
