//! evaluation of all templated leaves of a document
//!
//! Every leaf of the [DependencyGraph] is evaluated exactly once, after all the leaves it depends on. The walk uses
//! an explicit stack instead of recursion. Every leaf on that stack is "resolving"; reaching one of them again means
//! the references form a cycle, no matter where the walk started.
use crate::dependencies::DependencyGraph;
use crate::document::{Document, NodeId};
use crate::error::ResolveError;
use crate::template::{self, FunctionTable};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// on the active stack
    Resolving,
    /// final value committed
    Done,
}

/// Resolve every template of `document` in place
///
/// On error the document may be partially rewritten and must not be used.
#[tracing::instrument(level = "debug", skip_all)]
pub fn resolve(document: &mut Document, functions: &FunctionTable) -> Result<(), ResolveError> {
    functions.check_reserved()?;

    let graph = DependencyGraph::build(document, functions)?;
    tracing::debug!(leaves = graph.len(), "dependency graph built");

    Evaluator::new(&graph).run(document, functions)
}

/// Dependency ordered, memoized walk over a [DependencyGraph]
pub struct Evaluator<'g> {
    graph: &'g DependencyGraph,
    states: HashMap<NodeId, State>,
}

impl<'g> Evaluator<'g> {
    pub fn new(graph: &'g DependencyGraph) -> Self {
        Self {
            graph,
            states: HashMap::with_capacity(graph.len()),
        }
    }

    /// Evaluate all leaves of the graph, in graph order
    pub fn run(mut self, document: &mut Document, functions: &FunctionTable) -> Result<(), ResolveError> {
        let graph = self.graph;
        for leaf in graph.leaves() {
            self.evaluate(leaf, document, functions)?;
        }
        Ok(())
    }

    /// Evaluate `start` and, first, everything it depends on
    pub fn evaluate(
        &mut self,
        start: NodeId,
        document: &mut Document,
        functions: &FunctionTable,
    ) -> Result<(), ResolveError> {
        if !self.graph.contains(start) || self.states.contains_key(&start) {
            return Ok(());
        }

        // (leaf, index of the next dependency to look at)
        let mut stack = vec![(start, 0usize)];
        self.states.insert(start, State::Resolving);

        while let Some((leaf, next)) = stack.last_mut() {
            let leaf = *leaf;
            let dependency = self.graph.dependencies(leaf).get(*next).copied();
            *next += 1;

            let Some(dependency) = dependency else {
                // all dependencies are final
                self.commit(leaf, document, functions)?;
                stack.pop();
                continue;
            };

            if !self.graph.contains(dependency) {
                // empty scalar, nothing to evaluate
                continue;
            }

            match self.states.get(&dependency) {
                Some(State::Done) => {}
                Some(State::Resolving) => {
                    let chain = stack
                        .iter()
                        .map(|(node, _)| *node)
                        .skip_while(|node| *node != dependency)
                        .chain(std::iter::once(dependency))
                        .map(|node| document.location(node))
                        .collect();

                    return Err(ResolveError::CyclicReference {
                        at: document.location(dependency),
                        chain,
                    });
                }
                None => {
                    tracing::trace!(
                        leaf = %document.location(leaf),
                        dependency = %document.location(dependency),
                        "descending"
                    );
                    self.states.insert(dependency, State::Resolving);
                    stack.push((dependency, 0));
                }
            }
        }

        Ok(())
    }

    fn commit(
        &mut self,
        leaf: NodeId,
        document: &mut Document,
        functions: &FunctionTable,
    ) -> Result<(), ResolveError> {
        let text = document.scalar_text(leaf).unwrap_or_default();
        let rendered = template::execute(text, document, functions)
            .map_err(|e| e.in_leaf(document.location(leaf)))?;

        tracing::debug!(leaf = %document.location(leaf), value = %rendered, "evaluated");
        document.set_scalar_text(leaf, rendered);
        self.states.insert(leaf, State::Done);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::yaml_document;
    use crate::value::Value;
    use pretty_assertions::assert_eq;
    use serde_json::Value as Json;

    fn resolved(yaml: &str) -> Document {
        let mut document = yaml_document!(yaml);
        resolve(&mut document, &FunctionTable::new()).expect("must resolve");
        document
    }

    fn text<'d>(document: &'d Document, path: &str) -> &'d str {
        let node = document.query(path).unwrap()[0];
        document.scalar_text(node).unwrap()
    }

    #[test]
    fn simple_replace() {
        let document = resolved("root: hello world\nreplace_me: '{{t \"root\"}}'");
        assert_eq!(text(&document, "replace_me"), "hello world");
        assert_eq!(text(&document, "root"), "hello world");
    }

    #[test]
    fn chained_in_any_declaration_order() {
        for yaml in [
            "root: hello\nmid: '{{t \"root\"}}'\nleaf: '{{t \"mid\"}}'",
            "leaf: '{{t \"mid\"}}'\nmid: '{{t \"root\"}}'\nroot: hello",
            "mid: '{{t \"root\"}}'\nleaf: '{{t \"mid\"}}'\nroot: hello",
        ] {
            let document = resolved(yaml);
            for key in ["root", "mid", "leaf"] {
                assert_eq!(text(&document, key), "hello", "{yaml}");
            }
        }
    }

    #[test]
    fn starting_point_does_not_change_the_result() {
        let yaml = "a: '{{t \"b\"}}-{{t \"c\"}}'\nb: '{{t \"c\"}}!'\nc: x\nd: '{{t \"a\"}}'";
        let functions = FunctionTable::new();

        let mut forward = yaml_document!(yaml);
        resolve(&mut forward, &functions).unwrap();

        let mut backward = yaml_document!(yaml);
        let graph = DependencyGraph::build(&backward, &functions).unwrap();
        let leaves: Vec<_> = graph.leaves().collect();
        let mut evaluator = Evaluator::new(&graph);
        for leaf in leaves.into_iter().rev() {
            evaluator.evaluate(leaf, &mut backward, &functions).unwrap();
        }

        assert_eq!(Value::from(&forward), Value::from(&backward));
        assert_eq!(text(&forward, "d"), "x!-x");
    }

    #[test]
    fn two_node_cycle() {
        let mut document = yaml_document!("a: '{{t \"b\"}}'\nb: '{{t \"a\"}}'");
        let error = resolve(&mut document, &FunctionTable::new()).unwrap_err();
        let ResolveError::CyclicReference { chain, .. } = &error else {
            panic!("expected a cycle, got {error:?}");
        };
        assert_eq!(*chain, vec!["$.a", "$.b", "$.a"]);
    }

    #[test]
    fn self_reference() {
        let mut document = yaml_document!("a: '{{t \"a\"}}'");
        let error = resolve(&mut document, &FunctionTable::new()).unwrap_err();
        assert!(matches!(error, ResolveError::CyclicReference { at, .. } if at == "$.a"));
    }

    #[test]
    fn cycle_not_through_the_starting_leaf() {
        // a -> b -> c -> b
        let mut document =
            yaml_document!("a: '{{t \"b\"}}'\nb: '{{t \"c\"}}'\nc: '{{t \"b\"}}'");
        let error = resolve(&mut document, &FunctionTable::new()).unwrap_err();
        let ResolveError::CyclicReference { at, chain } = &error else {
            panic!("expected a cycle, got {error:?}");
        };
        assert_eq!(at, "$.b");
        assert_eq!(*chain, vec!["$.b", "$.c", "$.b"]);
    }

    #[test]
    fn multi_match() {
        let mut document = yaml_document!("items: [a, b]\nall: '{{joined (tt \"items[*]\")}}'");
        let functions = FunctionTable::new().with("joined", |args: &[Json]| {
            let items = args.first().and_then(Json::as_array).cloned().unwrap_or_default();
            let items: Vec<_> = items.iter().filter_map(Json::as_str).collect();
            Ok(Json::String(items.join(",")))
        });

        resolve(&mut document, &functions).unwrap();
        assert_eq!(text(&document, "all"), "a,b");
    }

    #[test]
    fn multi_match_waits_for_templated_items() {
        let document = resolved("x: 1\nitems: ['{{t \"x\"}}', b]\nall: '{{#each (tt \"items[*]\")}}{{this}};{{/each}}'");
        assert_eq!(text(&document, "all"), "1;b;");
    }

    #[test]
    fn missing_path() {
        let mut document = yaml_document!("x: '{{t \"nonexistent\"}}'");
        let error = resolve(&mut document, &FunctionTable::new()).unwrap_err();
        assert!(matches!(
            error.root_cause(),
            ResolveError::PathNotFound { path } if path == "nonexistent"
        ));
    }

    #[test]
    fn idempotent() {
        let first = resolved("a: plain\nb: '{{t \"a\"}}'\nport: '8080'\nn: 1.50");
        let once = Value::from(&first);

        let mut second = first.clone();
        resolve(&mut second, &FunctionTable::new()).unwrap();
        assert_eq!(Value::from(&second), once);
    }

    #[test]
    fn equal_texts_are_distinct_leaves() {
        let document = resolved("a: same\nb: same\nc: '{{t \"b\"}}'\nd: '{{t \"b\"}}'");
        assert_eq!(text(&document, "c"), "same");
        assert_eq!(text(&document, "d"), "same");
    }

    #[test]
    fn keys_and_empty_values_are_untouched() {
        let document = resolved("'{{t \"v\"}}': ''\nv: x\ne: ''");
        let content = document.content().unwrap();
        let (key, value) = document.entries(content).next().unwrap();
        assert_eq!(document.scalar_text(key), Some("{{t \"v\"}}"));
        assert_eq!(document.scalar_text(value), Some(""));
    }

    #[test]
    fn quoted_templates_stay_strings() {
        let document = resolved(
            "e: ''\nx: '{{t \"e\"}}'\nq: '8080'\nc: '{{t \"q\"}}'\nf: 'true'\ng: '{{t \"f\"}}'\nbase: 1\nh: '{{t \"base\"}}'",
        );
        let rendered = serde_yaml::to_string(&Value::from(&document)).unwrap();
        assert_eq!(
            rendered,
            "e: ''\nx: ''\nq: '8080'\nc: '8080'\nf: 'true'\ng: 'true'\nbase: 1\nh: '1'\n"
        );
    }

    #[test]
    fn plain_templates_are_retyped() {
        let document = resolved("zero: 0\nn: 1{{t \"zero\"}}");
        let n = document.query("n").unwrap()[0];
        assert_eq!(text(&document, "n"), "10");
        assert_eq!(document.scalar(n).unwrap().ty, crate::value::ScalarType::Int);
    }

    #[test]
    fn reserved_function_names() {
        let mut document = yaml_document!("a: b");
        let functions = FunctionTable::new().with("tt", |_: &[Json]| Ok(Json::Null));
        let error = resolve(&mut document, &functions).unwrap_err();
        assert!(matches!(error, ResolveError::ReservedNameConflict(name) if name == "tt"));
    }
}
