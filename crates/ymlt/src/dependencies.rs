//! which leaves have to be resolved before which
use crate::document::{Document, NodeId, NodeKind};
use crate::error::ResolveError;
use crate::template::{self, FunctionTable, Lookup};
use crate::visit::VisitValues;
use indexmap::IndexMap;

/// Leaves `template_text` reads, found with a dry run of the template
///
/// Targets of `t` come first (only the first match of each path), then targets of `tt` (all matches), each group in
/// call order.
pub fn dependencies_of(
    template_text: &str,
    document: &Document,
    functions: &FunctionTable,
) -> Result<Vec<NodeId>, ResolveError> {
    let lookups = template::dry_run(template_text, functions)?;

    let single = lookups.single.iter().map(|path| (Lookup::Single, path));
    let multi = lookups.multi.iter().map(|path| (Lookup::All, path));

    let mut nodes = vec![];
    for (lookup, path) in single.chain(multi) {
        nodes.extend(lookup.resolve(document, path)?);
    }

    Ok(nodes)
}

/// Every non-empty scalar value of a document and the leaves it depends on
///
/// Iterates in document order. Keys and the document node are never part of the graph.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    edges: IndexMap<NodeId, Vec<NodeId>>,
}

impl DependencyGraph {
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn build(document: &Document, functions: &FunctionTable) -> Result<Self, ResolveError> {
        let mut leaves = vec![];
        document.visit_values(&mut |document: &Document, node: NodeId| {
            if document.kind(node) == NodeKind::Scalar
                && document.scalar_text(node).is_some_and(|text| !text.is_empty())
            {
                leaves.push(node);
            }
        });

        let mut edges = IndexMap::with_capacity(leaves.len());
        for leaf in leaves {
            let text = document.scalar_text(leaf).unwrap_or_default();
            let dependencies = dependencies_of(text, document, functions)
                .map_err(|e| e.in_leaf(document.location(leaf)))?;

            if !dependencies.is_empty() {
                tracing::trace!(
                    leaf = %document.location(leaf),
                    dependencies = ?dependencies.iter().map(|d| document.location(*d)).collect::<Vec<_>>(),
                    "dependencies found"
                );
            }
            edges.insert(leaf, dependencies);
        }

        Ok(Self { edges })
    }

    pub fn contains(&self, leaf: NodeId) -> bool {
        self.edges.contains_key(&leaf)
    }

    /// Dependencies of `leaf` (empty for leaves outside the graph)
    pub fn dependencies(&self, leaf: NodeId) -> &[NodeId] {
        self.edges.get(&leaf).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn leaves(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.edges.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::yaml_document;
    use pretty_assertions::assert_eq;

    fn dependency_texts(template_text: &str, yaml: &str) -> Result<Vec<String>, ResolveError> {
        let document = yaml_document!(yaml);
        let nodes = dependencies_of(template_text, &document, &FunctionTable::new())?;
        Ok(nodes
            .into_iter()
            .map(|node| document.scalar_text(node).unwrap().to_string())
            .collect())
    }

    #[test]
    fn basic_dependency() {
        let nodes = dependency_texts(r#"{{t "root.key"}}"#, "root: { key: value1 }").unwrap();
        assert_eq!(nodes, vec!["value1"]);
    }

    #[test]
    fn invalid_ref() {
        let error = dependency_texts(r#"{{t "root"}}"#, "root: { key: value1 }").unwrap_err();
        assert!(matches!(error, ResolveError::NonScalarReference { .. }));
    }

    #[test]
    fn multiple_dependencies() {
        let nodes = dependency_texts(
            r#"{{tt "root.items[*]"}} {{t "root.key"}}"#,
            "root: { key: value1, items: [item1, item2] }",
        )
        .unwrap();
        assert_eq!(nodes, vec!["value1", "item1", "item2"]);
    }

    #[test]
    fn mixed_matches() {
        let yaml = "a: [x, {k: v}]";
        assert_eq!(dependency_texts(r#"{{t "a[*]"}}"#, yaml).unwrap(), vec!["x"]);

        let error = dependency_texts(r#"{{tt "a[*]"}}"#, yaml).unwrap_err();
        assert!(matches!(error, ResolveError::NonScalarReference { .. }));
    }

    #[test]
    fn missing_path() {
        let error = dependency_texts(r#"{{t "root.missing"}}"#, "root: { key: value1 }").unwrap_err();
        assert!(matches!(error, ResolveError::PathNotFound { .. }));
    }

    #[test]
    fn bad_path_syntax() {
        let error = dependency_texts(r#"{{t "root["}}"#, "root: { key: value1 }").unwrap_err();
        assert!(matches!(error, ResolveError::PathSyntax { .. }));
    }

    #[test]
    fn lookups_inside_untaken_branches_are_ignored() {
        let nodes = dependency_texts(
            r#"{{#if (t "a")}}{{t "b"}}{{else}}{{t "c"}}{{/if}}"#,
            "a: x\nb: y\nc: z",
        )
        .unwrap();
        assert_eq!(nodes, vec!["x", "z"]);
    }

    #[test]
    fn graph_skips_keys_and_empty_values() {
        let document = yaml_document!("'{{t \"b\"}}': ''\nb: '{{t \"c[0]\"}}'\nc: [x, {d: y}]");
        let graph = DependencyGraph::build(&document, &FunctionTable::new()).unwrap();

        let leaves: Vec<_> = graph.leaves().map(|leaf| document.location(leaf)).collect();
        assert_eq!(leaves, vec!["$.b", "$.c[0]", "$.c[1].d"]);

        let b = document.query("b").unwrap()[0];
        let c = document.query("c[0]").unwrap()[0];
        assert_eq!(graph.dependencies(b), &[c]);
        assert!(graph.dependencies(c).is_empty());
    }

    #[test]
    fn graph_reports_failing_leaf() {
        let document = yaml_document!("a: fine\nb: '{{t \"nope\"}}'");
        let error = DependencyGraph::build(&document, &FunctionTable::new()).unwrap_err();
        assert!(matches!(&error, ResolveError::Leaf { leaf, .. } if leaf == "$.b"));
        assert!(matches!(error.root_cause(), ResolveError::PathNotFound { .. }));
    }
}
