use super::Visit;
use crate::document::{Document, NodeKind, NodeId};

/// Depth-first walk over value positions
///
/// Parents are visited before their children, children in document order. Mapping keys are skipped: they name
/// values but are never values themselves. Uses an explicit stack, so deep documents do not exhaust the call stack.
pub trait VisitValues {
    /// Visit `node` and every value below it
    fn visit_values_from(&self, node: NodeId, visitor: &mut dyn Visit);

    /// Visit every value of the document, except the document node itself
    fn visit_values(&self, visitor: &mut dyn Visit);
}

impl VisitValues for Document {
    fn visit_values_from(&self, node: NodeId, visitor: &mut dyn Visit) {
        let mut stack = vec![node];

        while let Some(current) = stack.pop() {
            if self.kind(current) != NodeKind::Document {
                visitor.visit(self, current);
            }

            let children = self.children(current);
            match self.kind(current) {
                NodeKind::Mapping => stack.extend(children.iter().skip(1).step_by(2).rev()),
                _ => stack.extend(children.iter().rev()),
            }
        }
    }

    fn visit_values(&self, visitor: &mut dyn Visit) {
        self.visit_values_from(self.root(), visitor);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::yaml_document;
    use pretty_assertions::assert_eq;

    #[test]
    fn pre_order_without_keys() {
        let document = yaml_document!("a: 1\nb: [2, {c: 3}]\nd: 4");

        let mut seen = vec![];
        document.visit_values(&mut |document: &Document, node: NodeId| {
            seen.push(document.location(node));
        });

        assert_eq!(
            seen,
            vec!["$", "$.a", "$.b", "$.b[0]", "$.b[1]", "$.b[1].c", "$.d"]
        );
    }
}
