//! Tree filters: node-rewrite units applied over the document tree.
//!
//! Each submodule implements exactly one rewrite concern.
//!
//! ## Data Flow
//!
//! ```text
//! doc ──▶ image ──▶ embed ──▶ emphasis ──▶ doc'
//!        (upload)  (iframes)  (bionic)
//! ```
//!
//! 1. [`image`]    — replace local image references with hosted URLs
//! 2. [`embed`]    — replace known-host links with embeddable iframes
//! 3. [`emphasis`] — re-flow plain text through the text-emphasis service
//!
//! [`apply`] runs an ordered list of filters, one full traversal each, the
//! output of one feeding the next. The order above is the order the CLI
//! uses; later filters see the rewritten tree, not the original.

pub mod embed;
pub mod emphasis;
pub mod image;

use crate::ast::{self, Doc, Tag};
use crate::error::PostError;
use serde_json::{Map, Value};

/// What a filter wants done with the node it was shown.
#[derive(Debug)]
pub enum Rewrite {
    /// Leave the node as it is. The only valid answer for unrecognized kinds.
    Keep,
    /// Substitute a single node.
    Replace(Value),
    /// Substitute a sequence of sibling nodes.
    Splice(Vec<Value>),
    /// Drop the node.
    Delete,
}

/// A node-rewrite unit.
///
/// The traversal shows the filter every tagged node, depth-first, parent
/// before children, siblings in document order. Replacement nodes are
/// traversed child-first too, but the filter is never re-consulted on a node
/// it just produced. Filters must not depend on any other filter having run.
pub trait TreeFilter {
    /// Decide the fate of one node.
    ///
    /// `content` is the node's `c` payload (absent for leaf kinds),
    /// `format` the target serialization format, `meta` the document's
    /// metadata block.
    fn rewrite(
        &mut self,
        tag: Tag,
        content: Option<&Value>,
        format: &str,
        meta: &Map<String, Value>,
    ) -> Result<Rewrite, PostError>;
}

/// Walk one value, consulting the filter on every tagged node in a sequence.
///
/// Mirrors the traversal the external parser's ecosystem defines: the filter
/// fires for array elements carrying a type tag; objects and scalars pass
/// through structurally.
pub fn walk(
    value: Value,
    filter: &mut dyn TreeFilter,
    format: &str,
    meta: &Map<String, Value>,
) -> Result<Value, PostError> {
    match value {
        Value::Array(items) => Ok(Value::Array(walk_nodes(items, filter, format, meta)?)),
        Value::Object(map) => {
            let mut out = Map::new();
            for (key, v) in map {
                out.insert(key, walk(v, filter, format, meta)?);
            }
            Ok(Value::Object(out))
        }
        scalar => Ok(scalar),
    }
}

/// Walk a sequence of sibling nodes, applying the filter to each tagged one.
pub fn walk_nodes(
    items: Vec<Value>,
    filter: &mut dyn TreeFilter,
    format: &str,
    meta: &Map<String, Value>,
) -> Result<Vec<Value>, PostError> {
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let decision = match ast::tag_of(&item) {
            Some(tag) => filter.rewrite(Tag::parse(tag), ast::content_of(&item), format, meta)?,
            None => Rewrite::Keep,
        };
        match decision {
            Rewrite::Keep => out.push(walk(item, filter, format, meta)?),
            Rewrite::Replace(node) => out.push(walk(node, filter, format, meta)?),
            Rewrite::Splice(nodes) => {
                for node in nodes {
                    out.push(walk(node, filter, format, meta)?);
                }
            }
            Rewrite::Delete => {}
        }
    }
    Ok(out)
}

/// Apply an ordered list of filters to a document.
///
/// Each filter gets a complete traversal of the current tree — metadata
/// block included — and its output becomes the next filter's input. Valid
/// with an empty filter list (the document passes through untouched).
pub fn apply(
    mut doc: Doc,
    filters: &mut [Box<dyn TreeFilter + '_>],
    format: &str,
) -> Result<Doc, PostError> {
    for filter in filters.iter_mut() {
        let meta_ctx = doc.meta.clone();

        let mut meta = Map::new();
        for (key, v) in std::mem::take(&mut doc.meta) {
            meta.insert(key, walk(v, filter.as_mut(), format, &meta_ctx)?);
        }
        doc.meta = meta;

        doc.blocks = walk_nodes(
            std::mem::take(&mut doc.blocks),
            filter.as_mut(),
            format,
            &meta_ctx,
        )?;
    }
    Ok(doc)
}
