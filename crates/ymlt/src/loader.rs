//! loading yaml text into [Document]s
//!
//! Builds the arena directly from the `yaml-rust2` event stream. Scalars keep their raw text; quoting and explicit
//! tags only decide the [ScalarType].
//!
//! Aliases are expanded into deep copies of the anchored node, so each occurrence is its own node.
use crate::document::{Document, NodeData, NodeId, Scalar, ScalarStyle};
use crate::value::ScalarType;
use std::collections::HashMap;
use std::path::Path;
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser};
use yaml_rust2::scanner::{Marker, TScalarStyle};

/// Parse the first document of `text`
pub fn parse_str(text: &str) -> Result<Document, LoadError> {
    parse_stream(text)?
        .into_iter()
        .next()
        .ok_or(LoadError::NoDocument)
}

/// Parse every document of a (possibly multi-document) stream
pub fn parse_stream(text: &str) -> Result<Vec<Document>, LoadError> {
    let mut parser = Parser::new_from_str(text);
    let mut builder = DocumentBuilder::default();

    parser.load(&mut builder, true)?;

    if let Some(error) = builder.error {
        return Err(error);
    }

    tracing::trace!(documents = builder.documents.len(), "stream parsed");
    Ok(builder.documents)
}

/// Read and parse the first document of a file
///
/// A file without any document (empty, only comments) gives an empty [Document].
pub fn load_file(file_path: &Path) -> Result<Document, LoadError> {
    tracing::info!(path=%file_path.display(), "loading file");

    let file_contents = std::fs::read_to_string(file_path)?;
    Ok(parse_stream(&file_contents)?
        .into_iter()
        .next()
        .unwrap_or_default())
}

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("No yaml document found")]
    NoDocument,
    #[error("IO error")]
    IoError(#[from] std::io::Error),
    #[error("Unable to parse yaml")]
    YamlParseFailed(#[from] yaml_rust2::ScanError),
    #[error("Unknown or recursive alias at line {line}")]
    UnknownAlias { line: usize },
}

#[derive(Default)]
struct DocumentBuilder {
    documents: Vec<Document>,
    current: Document,
    /// open collections and the anchor they register once closed
    open: Vec<(NodeId, usize)>,
    anchors: HashMap<usize, NodeId>,
    error: Option<LoadError>,
}

impl DocumentBuilder {
    fn parent(&self) -> NodeId {
        self.open
            .last()
            .map(|(node, _)| *node)
            .unwrap_or_else(|| self.current.root())
    }

    fn anchor(&mut self, anchor: usize, node: NodeId) {
        // 0 means "no anchor"
        if anchor > 0 {
            self.anchors.insert(anchor, node);
        }
    }

    fn close(&mut self) {
        if let Some((node, anchor)) = self.open.pop() {
            self.anchor(anchor, node);
        }
    }
}

impl MarkedEventReceiver for DocumentBuilder {
    fn on_event(&mut self, ev: Event, marker: Marker) {
        if self.error.is_some() {
            return;
        }

        match ev {
            Event::Nothing | Event::StreamStart | Event::StreamEnd => {}

            Event::DocumentStart => {
                self.current = Document::new();
                self.open.clear();
                self.anchors.clear();
            }
            Event::DocumentEnd => {
                self.documents.push(std::mem::take(&mut self.current));
            }

            Event::Scalar(value, style, anchor, tag) => {
                let explicit = tag.and_then(|tag| ScalarType::from_tag(&tag.suffix));
                let (ty, style) = match (explicit, style) {
                    (Some(ty), _) => (ty, ScalarStyle::Tagged),
                    (None, TScalarStyle::Plain) => (ScalarType::infer(&value), ScalarStyle::Plain),
                    (None, _) => (ScalarType::Str, ScalarStyle::Quoted),
                };

                let parent = self.parent();
                let node = self
                    .current
                    .push(parent, NodeData::Scalar(Scalar::new(value, ty, style)));
                self.anchor(anchor, node);
            }

            Event::SequenceStart(anchor, _tag) => {
                let parent = self.parent();
                let node = self.current.push(parent, NodeData::Sequence);
                self.open.push((node, anchor));
            }
            Event::MappingStart(anchor, _tag) => {
                let parent = self.parent();
                let node = self.current.push(parent, NodeData::Mapping);
                self.open.push((node, anchor));
            }
            Event::SequenceEnd | Event::MappingEnd => self.close(),

            Event::Alias(anchor) => {
                let Some(anchored) = self.anchors.get(&anchor).copied() else {
                    tracing::debug!(anchor, "alias without closed anchor");
                    self.error = Some(LoadError::UnknownAlias {
                        line: marker.line(),
                    });
                    return;
                };

                let parent = self.parent();
                self.current.duplicate(parent, anchored);
            }
        }
    }
}

/// Utility macro to create a [Document]
///
/// ```
/// # use ymlt::yaml_document;
/// let document = yaml_document!("attribute: 42");
/// assert!(document.content().is_some());
/// ```
///
/// # Panic
/// Panics on invalid input
///
/// ```should_panic
/// # use ymlt::yaml_document;
/// yaml_document!("not: [valid");
/// ```
#[macro_export]
macro_rules! yaml_document {
    { $expr:expr } => {
        $crate::loader::parse_str($expr).expect("document must parse")
    };
}
