//! filling in missing values from a defaults document
use crate::document::{Document, NodeId, NodeKind};
use crate::error::ResolveError;

/// Copy every entry of `defaults` whose key is missing in `document`
///
/// New entries are appended after the existing ones. When both sides have the same key and both values are mappings
/// they are merged the same way, otherwise the document's value wins. Existing nodes are never removed or
/// reordered. Empty defaults change nothing.
pub fn merge_defaults(document: &mut Document, defaults: &Document) -> Result<(), ResolveError> {
    if defaults.is_empty() {
        return Ok(());
    }

    let Some(target) = mapping_content(document) else {
        return Err(ResolveError::NotAMapping("document"));
    };
    let Some(source) = mapping_content(defaults) else {
        return Err(ResolveError::NotAMapping("defaults"));
    };

    let mut pending = vec![(target, source)];
    while let Some((target, source)) = pending.pop() {
        let default_entries: Vec<_> = defaults.entries(source).collect();

        for (default_key, default_value) in default_entries {
            let key_text = defaults.scalar_text(default_key);
            let existing = document
                .entries(target)
                .find(|(key, _)| key_text.is_some() && document.scalar_text(*key) == key_text)
                .map(|(_, value)| value);

            match existing {
                Some(value) => {
                    if document.kind(value) == NodeKind::Mapping
                        && defaults.kind(default_value) == NodeKind::Mapping
                    {
                        pending.push((value, default_value));
                    }
                }
                None => {
                    tracing::debug!(
                        key = %defaults.location(default_value),
                        "adding default"
                    );
                    document.import(target, defaults, default_key);
                    document.import(target, defaults, default_value);
                }
            }
        }
    }

    Ok(())
}

/// The top level mapping, looking through the document node
fn mapping_content(document: &Document) -> Option<NodeId> {
    document
        .content()
        .filter(|content| document.kind(*content) == NodeKind::Mapping)
}
