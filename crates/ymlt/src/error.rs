//! errors raised while merging defaults and resolving templates

/// Anything that aborts a resolution pass
///
/// The document may be partially rewritten when one of these is returned and must be discarded.
#[derive(thiserror::Error, Debug)]
pub enum ResolveError {
    #[error("invalid path '{path}': {message}")]
    PathSyntax { path: String, message: String },

    #[error("no matches found for path: {path}")]
    PathNotFound { path: String },

    #[error("this path does not reference a raw value: {path}")]
    NonScalarReference { path: String },

    #[error("function '{0}' is reserved and not allowed in the function table")]
    ReservedNameConflict(String),

    #[error("invalid template syntax")]
    TemplateSyntax(#[source] handlebars::TemplateError),

    #[error("template execution failed")]
    TemplateExecution(#[source] handlebars::RenderError),

    #[error("detected cyclic use of template field {at} ({})", chain.join(" -> "))]
    CyclicReference { at: String, chain: Vec<String> },

    #[error("cannot merge defaults: {0} is not a mapping")]
    NotAMapping(&'static str),

    #[error("failed to resolve {leaf}")]
    Leaf {
        leaf: String,
        #[source]
        source: Box<ResolveError>,
    },
}

impl ResolveError {
    /// Strips [ResolveError::Leaf] context
    pub fn root_cause(&self) -> &ResolveError {
        match self {
            ResolveError::Leaf { source, .. } => source.root_cause(),
            other => other,
        }
    }

    pub(crate) fn in_leaf(self, leaf: String) -> Self {
        match self {
            // already carries its location
            ResolveError::Leaf { .. } | ResolveError::CyclicReference { .. } => self,
            source => ResolveError::Leaf {
                leaf,
                source: Box::new(source),
            },
        }
    }
}

/// Errors of the end-to-end text api ([crate::render_str])
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Unable to load yaml")]
    Load(#[from] crate::loader::LoadError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("Unable to write yaml")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Unable to write json")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn root_cause_unwraps_nested_leaves() {
        let error = ResolveError::PathNotFound {
            path: "missing".into(),
        }
        .in_leaf("$.b".into())
        .in_leaf("$.a".into());

        let ResolveError::Leaf { leaf, .. } = &error else {
            panic!("expected leaf context");
        };
        assert_eq!(leaf, "$.b");
        assert!(matches!(
            error.root_cause(),
            ResolveError::PathNotFound { path } if path == "missing"
        ));
    }
}
