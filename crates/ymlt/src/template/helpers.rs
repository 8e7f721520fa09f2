//! handlebars helpers backing `t`, `tt` and the caller's functions
use super::{Lookup, Lookups, TemplateFunction};
use crate::document::Document;
use crate::error::ResolveError;
use handlebars::{
    Context, Handlebars, Helper, HelperDef, RenderContext, RenderError, RenderErrorReason,
    ScopedJson,
};
use serde_json::Value as Json;
use std::sync::{Arc, Mutex, PoisonError};

fn path_argument(h: &Helper<'_>) -> Result<String, RenderError> {
    match h.params().as_slice() {
        [path] => path.value().as_str().map(str::to_string).ok_or_else(|| {
            RenderErrorReason::Other(format!("'{}' expects a path string", h.name())).into()
        }),
        _ => Err(RenderErrorReason::Other(format!(
            "'{}' expects exactly one argument",
            h.name()
        ))
        .into()),
    }
}

/// `t` / `tt` reading the live document
#[derive(derive_new::new)]
pub(crate) struct LookupHelper<'a> {
    document: &'a Document,
    lookup: Lookup,
    failure: &'a Mutex<Option<ResolveError>>,
}

impl HelperDef for LookupHelper<'_> {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'rc>, RenderError> {
        let path = path_argument(h)?;

        let nodes = match self.lookup.resolve(self.document, &path) {
            Ok(nodes) => nodes,
            Err(error) => {
                let message = error.to_string();
                self.failure
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .get_or_insert(error);
                return Err(RenderErrorReason::Other(message).into());
            }
        };

        let mut texts = nodes.into_iter().map(|node| {
            Json::String(self.document.scalar_text(node).unwrap_or_default().to_string())
        });

        let value = match self.lookup {
            Lookup::Single => texts.next().unwrap_or(Json::Null),
            Lookup::All => Json::Array(texts.collect()),
        };

        tracing::trace!(%path, ?value, "lookup");
        Ok(ScopedJson::Derived(value))
    }
}

/// `t` / `tt` that only record their path
#[derive(derive_new::new)]
pub(crate) struct RecordingHelper<'a> {
    lookup: Lookup,
    recorded: &'a Mutex<Lookups>,
}

impl HelperDef for RecordingHelper<'_> {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'rc>, RenderError> {
        let path = path_argument(h)?;
        let mut recorded = self.recorded.lock().unwrap_or_else(PoisonError::into_inner);

        let placeholder = match self.lookup {
            Lookup::Single => {
                recorded.single.push(path);
                Json::String(String::new())
            }
            Lookup::All => {
                recorded.multi.push(path);
                Json::Array(vec![])
            }
        };

        Ok(ScopedJson::Derived(placeholder))
    }
}

/// A caller supplied function
#[derive(derive_new::new)]
pub(crate) struct FunctionHelper {
    function: Arc<TemplateFunction>,
}

impl HelperDef for FunctionHelper {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'rc>, RenderError> {
        let args: Vec<Json> = h.params().iter().map(|param| param.value().clone()).collect();

        (self.function)(&args)
            .map(ScopedJson::Derived)
            .map_err(|error| RenderErrorReason::Other(format!("{}: {error}", h.name())).into())
    }
}
