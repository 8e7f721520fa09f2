//! arena backed yaml document tree
//!
//! Every node gets a [NodeId] when it is inserted. Ids are stable (nodes are never removed) and identify a position
//! in the tree, not its content: two scalars with the same text are two different nodes.
//!
//! Node `0` is always the document node. Its single child, if any, is the [Document::content].
use crate::value::ScalarType;

/// Stable handle of a node inside one [Document]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Mapping,
    Sequence,
    Scalar,
}

/// How a scalar was written, decides whether its type follows its text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarStyle {
    /// unquoted and untagged, typed by its text
    Plain,
    /// quoted or block scalar, always a string
    Quoted,
    /// explicit `!!type` tag
    Tagged,
}

/// A terminal value: raw text plus its type tag
#[derive(Debug, Clone, PartialEq, derive_new::new)]
pub struct Scalar {
    pub text: String,
    pub ty: ScalarType,
    pub style: ScalarStyle,
}

impl Scalar {
    /// Plain (unquoted, untagged) scalar
    pub fn plain(text: impl Into<String>) -> Self {
        let text = text.into();
        let ty = ScalarType::infer(&text);
        Self::new(text, ty, ScalarStyle::Plain)
    }

    /// Quoted scalar, a string whatever its text
    pub fn quoted(text: impl Into<String>) -> Self {
        Self::new(text.into(), ScalarType::Str, ScalarStyle::Quoted)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Document,
    /// children alternate key, value, key, value, ...
    Mapping,
    Sequence,
    Scalar(Scalar),
}

impl NodeData {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeData::Document => NodeKind::Document,
            NodeData::Mapping => NodeKind::Mapping,
            NodeData::Sequence => NodeKind::Sequence,
            NodeData::Scalar(_) => NodeKind::Scalar,
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document (document node without content)
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                data: NodeData::Document,
                parent: None,
                children: vec![],
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// The top level node below the document node
    pub fn content(&self) -> Option<NodeId> {
        self.nodes[0].children.first().copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content().is_none()
    }

    pub fn data(&self, node: NodeId) -> &NodeData {
        &self.nodes[node.0].data
    }

    pub fn kind(&self, node: NodeId) -> NodeKind {
        self.data(node).kind()
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    /// Key/value pairs of a mapping node (empty for any other kind)
    pub fn entries(&self, node: NodeId) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        let children: &[NodeId] = match self.kind(node) {
            NodeKind::Mapping => self.children(node),
            _ => &[],
        };

        children.chunks_exact(2).map(|pair| (pair[0], pair[1]))
    }

    /// Value of the first entry whose key is the scalar `key`
    pub fn get(&self, mapping: NodeId, key: &str) -> Option<NodeId> {
        self.entries(mapping)
            .find(|(k, _)| self.scalar_text(*k) == Some(key))
            .map(|(_, value)| value)
    }

    pub fn scalar(&self, node: NodeId) -> Option<&Scalar> {
        match self.data(node) {
            NodeData::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    pub fn scalar_text(&self, node: NodeId) -> Option<&str> {
        self.scalar(node).map(|scalar| scalar.text.as_str())
    }

    /// Replace the text of a scalar
    ///
    /// Quoted and tagged scalars keep their type. A plain scalar is typed again when its text actually changes.
    /// Returns `false` if `node` is not a scalar.
    pub fn set_scalar_text(&mut self, node: NodeId, text: String) -> bool {
        let NodeData::Scalar(scalar) = &mut self.nodes[node.0].data else {
            return false;
        };

        if scalar.text != text {
            if scalar.style == ScalarStyle::Plain {
                scalar.ty = ScalarType::infer(&text);
            }
            scalar.text = text;
        }
        true
    }

    /// Whether `node` is in key position of its parent mapping
    pub fn is_key(&self, node: NodeId) -> bool {
        self.position(node)
            .is_some_and(|(parent, index)| self.kind(parent) == NodeKind::Mapping && index % 2 == 0)
    }

    fn position(&self, node: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.parent(node)?;
        let index = self.children(parent).iter().position(|c| *c == node)?;
        Some((parent, index))
    }

    /// Append a new node as last child of `parent`
    pub fn push(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            data,
            parent: Some(parent),
            children: vec![],
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Deep copy `node` of `source` (may be another document) as last child of `parent`
    pub fn import(&mut self, parent: NodeId, source: &Document, node: NodeId) -> NodeId {
        let subtree = source.subtree(node);
        self.graft(parent, subtree)
    }

    /// Deep copy a node of this document as last child of `parent`
    pub fn duplicate(&mut self, parent: NodeId, node: NodeId) -> NodeId {
        let subtree = self.subtree(node);
        self.graft(parent, subtree)
    }

    /// Pre-order listing of a subtree, parents as indices into the listing
    fn subtree(&self, node: NodeId) -> Vec<(NodeData, Option<usize>)> {
        let mut listing = vec![];
        let mut stack = vec![(node, None)];

        while let Some((current, parent)) = stack.pop() {
            let index = listing.len();
            listing.push((self.data(current).clone(), parent));
            for child in self.children(current).iter().rev() {
                stack.push((*child, Some(index)));
            }
        }

        listing
    }

    fn graft(&mut self, parent: NodeId, subtree: Vec<(NodeData, Option<usize>)>) -> NodeId {
        let mut ids: Vec<NodeId> = Vec::with_capacity(subtree.len());
        for (data, local_parent) in subtree {
            let parent = local_parent.map(|index| ids[index]).unwrap_or(parent);
            ids.push(self.push(parent, data));
        }
        ids[0]
    }

    /// Human readable position such as `$.servers[0].name`
    pub fn location(&self, node: NodeId) -> String {
        let mut parts = vec![];
        let mut current = node;

        while let Some((parent, index)) = self.position(current) {
            match self.kind(parent) {
                NodeKind::Mapping if index % 2 == 1 => {
                    let key = self.children(parent)[index - 1];
                    parts.push(match self.scalar_text(key) {
                        Some(key) if is_simple_key(key) => format!(".{key}"),
                        Some(key) => format!("['{}']", key.replace('\'', "\\'")),
                        None => "[?]".to_string(),
                    });
                }
                NodeKind::Mapping => parts.push(format!("<key {}>", index / 2)),
                NodeKind::Sequence => parts.push(format!("[{index}]")),
                _ => {}
            }
            current = parent;
        }

        parts.reverse();
        format!("${}", parts.concat())
    }

    /// Evaluate a path expression against this document
    pub fn query(&self, path: &str) -> Result<Vec<NodeId>, crate::ResolveError> {
        Ok(crate::path::YamlPath::parse(path)?.find(self))
    }
}

fn is_simple_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> (Document, NodeId, NodeId) {
        let mut document = Document::new();
        let root = document.root();
        let mapping = document.push(root, NodeData::Mapping);
        document.push(mapping, NodeData::Scalar(Scalar::plain("servers")));
        let servers = document.push(mapping, NodeData::Sequence);
        let server = document.push(servers, NodeData::Mapping);
        document.push(server, NodeData::Scalar(Scalar::plain("name")));
        let name = document.push(server, NodeData::Scalar(Scalar::plain("alpha")));
        (document, mapping, name)
    }

    #[test]
    fn location() {
        let (document, _, name) = sample();
        assert_eq!(document.location(name), "$.servers[0].name");
        assert_eq!(document.location(document.root()), "$");
    }

    #[test]
    fn keys_are_detected() {
        let (document, mapping, name) = sample();
        let key = document.children(mapping)[0];
        assert!(document.is_key(key));
        assert!(!document.is_key(name));
    }

    #[test]
    fn import_copies_subtree_in_order() {
        let (source, mapping, _) = sample();
        let mut target = Document::new();
        let root = target.root();
        let copy = target.import(root, &source, mapping);

        assert_eq!(target.content(), Some(copy));
        assert_eq!(target.len(), source.len());
        let servers = target.get(copy, "servers").unwrap();
        let server = target.children(servers)[0];
        let name = target.get(server, "name").unwrap();
        assert_eq!(target.scalar_text(name), Some("alpha"));
        assert_eq!(target.location(name), "$.servers[0].name");
    }

    #[test]
    fn plain_scalars_are_retyped_on_change() {
        let mut document = Document::new();
        let root = document.root();
        let node = document.push(root, NodeData::Scalar(Scalar::plain("a{{x}}")));
        assert_eq!(document.scalar(node).unwrap().ty, ScalarType::Str);

        document.set_scalar_text(node, "9090".into());
        assert_eq!(document.scalar(node).unwrap().ty, ScalarType::Int);
    }

    #[test]
    fn quoted_and_tagged_scalars_keep_their_type() {
        let mut document = Document::new();
        let root = document.root();
        let sequence = document.push(root, NodeData::Sequence);
        let quoted = document.push(sequence, NodeData::Scalar(Scalar::quoted("{{x}}")));
        let tagged = document.push(
            sequence,
            NodeData::Scalar(Scalar::new("1".into(), ScalarType::Float, ScalarStyle::Tagged)),
        );

        for (text, ty) in [("8080", ScalarType::Str), ("", ScalarType::Str), ("true", ScalarType::Str)] {
            document.set_scalar_text(quoted, text.into());
            assert_eq!(document.scalar(quoted).unwrap().ty, ty, "{text:?}");
        }

        document.set_scalar_text(tagged, "2".into());
        assert_eq!(document.scalar(tagged).unwrap().ty, ScalarType::Float);
    }
}
