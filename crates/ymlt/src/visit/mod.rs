//! visitor pattern helpers
mod visit_values;
pub use visit_values::VisitValues;

use crate::document::{Document, NodeId};

/// Visitor that is shown nodes of a document
pub trait Visit {
    fn visit(&mut self, document: &Document, node: NodeId);
}

// blanket impl for FnMut
impl<F> Visit for F
where
    F: FnMut(&Document, NodeId),
{
    fn visit(&mut self, document: &Document, node: NodeId) {
        self(document, node)
    }
}
