//! caller supplied template functions
use super::{MULTI_LOOKUP, SINGLE_LOOKUP};
use crate::error::ResolveError;
use indexmap::IndexMap;
use serde_json::Value as Json;
use std::sync::Arc;

/// Signature of a template function: positional arguments in, one value out
pub type TemplateFunction = dyn Fn(&[Json]) -> Result<Json, FunctionError> + Send + Sync;

/// Error raised by a template function, aborts rendering
#[derive(thiserror::Error, Debug)]
#[error("{0}")]
pub struct FunctionError(String);

impl FunctionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Helpers that come with handlebars, a function may not replace them
const BUILTIN_HELPERS: &[&str] = &[
    "if", "unless", "each", "with", "lookup", "raw", "log", "eq", "ne", "gt", "gte", "lt", "lte", "and", "or",
    "not", "len",
];

/// Named functions made available to templates
///
/// `t`, `tt` and the handlebars built-in helpers (`if`, `each`, `eq`, ...) are reserved. A table containing any of
/// them is rejected when it is bound.
#[derive(Clone, Default)]
pub struct FunctionTable {
    functions: IndexMap<String, Arc<TemplateFunction>>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a function, returns the replaced one
    pub fn insert<F>(&mut self, name: impl Into<String>, function: F) -> Option<Arc<TemplateFunction>>
    where
        F: Fn(&[Json]) -> Result<Json, FunctionError> + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Arc::new(function))
    }

    pub fn with<F>(mut self, name: impl Into<String>, function: F) -> Self
    where
        F: Fn(&[Json]) -> Result<Json, FunctionError> + Send + Sync + 'static,
    {
        self.insert(name, function);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &Arc<TemplateFunction>)> {
        self.functions
            .iter()
            .map(|(name, function)| (name.as_str(), function))
    }

    pub fn check_reserved(&self) -> Result<(), ResolveError> {
        let reserved_names = [SINGLE_LOOKUP, MULTI_LOOKUP]
            .into_iter()
            .chain(BUILTIN_HELPERS.iter().copied());
        for reserved in reserved_names {
            if self.contains(reserved) {
                return Err(ResolveError::ReservedNameConflict(reserved.to_string()));
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for FunctionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.functions.keys()).finish()
    }
}

fn text(value: &Json) -> String {
    match value {
        Json::String(s) => s.clone(),
        Json::Null => String::new(),
        other => other.to_string(),
    }
}

fn argument<'a>(args: &'a [Json], index: usize, function: &str) -> Result<&'a Json, FunctionError> {
    args.get(index)
        .ok_or_else(|| FunctionError::new(format!("{function}: missing argument {}", index + 1)))
}

fn map_text(
    args: &[Json],
    function: &'static str,
    map: impl Fn(&str) -> String,
) -> Result<Json, FunctionError> {
    Ok(Json::String(map(&text(argument(args, 0, function)?))))
}

/// Functions used by the command line tool
///
/// - `join list [separator]` (separator defaults to `,`)
/// - `upper text`, `lower text`, `trim text`
/// - `default value fallback` (fallback when value is empty or null)
pub fn standard() -> FunctionTable {
    FunctionTable::new()
        .with("join", |args: &[Json]| {
            let separator = args.get(1).map(text).unwrap_or_else(|| ",".to_string());
            match argument(args, 0, "join")? {
                Json::Array(items) => Ok(Json::String(
                    items.iter().map(text).collect::<Vec<_>>().join(&separator),
                )),
                other => Ok(Json::String(text(other))),
            }
        })
        .with("upper", |args: &[Json]| map_text(args, "upper", str::to_uppercase))
        .with("lower", |args: &[Json]| map_text(args, "lower", str::to_lowercase))
        .with("trim", |args: &[Json]| map_text(args, "trim", |s| s.trim().to_string()))
        .with("default", |args: &[Json]| {
            let value = argument(args, 0, "default")?;
            let empty = match value {
                Json::Null => true,
                Json::String(s) => s.is_empty(),
                Json::Array(items) => items.is_empty(),
                _ => false,
            };
            if empty {
                argument(args, 1, "default").cloned()
            } else {
                Ok(value.clone())
            }
        })
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn call(table: &FunctionTable, name: &str, args: &[Json]) -> Result<Json, FunctionError> {
        let (_, function) = table.iter().find(|(n, _)| *n == name).unwrap();
        function(args)
    }

    #[test]
    fn standard_functions() {
        let table = standard();
        assert_eq!(call(&table, "join", &[json!(["a", "b"])]).unwrap(), json!("a,b"));
        assert_eq!(call(&table, "join", &[json!(["a", 1]), json!(" ")]).unwrap(), json!("a 1"));
        assert_eq!(call(&table, "upper", &[json!("abc")]).unwrap(), json!("ABC"));
        assert_eq!(call(&table, "trim", &[json!("  x ")]).unwrap(), json!("x"));
        assert_eq!(call(&table, "default", &[json!(""), json!("fb")]).unwrap(), json!("fb"));
        assert_eq!(call(&table, "default", &[json!("v"), json!("fb")]).unwrap(), json!("v"));
        assert!(call(&table, "lower", &[]).is_err());
    }

    #[test]
    fn builtin_helpers_cannot_be_replaced() {
        for name in ["if", "each", "eq", "len"] {
            let table = FunctionTable::new().with(name, |_: &[Json]| Ok(Json::Null));
            let error = table.check_reserved().unwrap_err();
            assert!(matches!(error, ResolveError::ReservedNameConflict(n) if n == name));
        }
    }

    #[test]
    fn standard_table_has_no_reserved_names() {
        assert!(standard().check_reserved().is_ok());
        let registry = standard();
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, vec!["join", "upper", "lower", "trim", "default"]);
    }
}
