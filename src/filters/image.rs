//! Image rewrite: local image references become hosted URLs.
//!
//! For every image node whose target is a local path, the filter resolves
//! the path against the source document's directory, opens the file, and
//! pushes it through the configured [`ImageStore`]. The node keeps its
//! attributes, alt text, and title; only the target changes. A reference to
//! a file that cannot be opened aborts the pipeline — a post must never be
//! published with an image silently missing.

use crate::ast::Tag;
use crate::error::PostError;
use crate::filters::{Rewrite, TreeFilter};
use crate::store::ImageStore;
use serde_json::{json, Map, Value};
use std::fs::File;
use std::path::PathBuf;
use tracing::info;

/// Rewrites image targets through an upload backend.
pub struct ImageFilter<S: ImageStore> {
    store: S,
    base_dir: PathBuf,
}

impl<S: ImageStore> ImageFilter<S> {
    /// `base_dir` is the directory of the source document; relative image
    /// targets resolve against it.
    pub fn new(store: S, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            base_dir: base_dir.into(),
        }
    }
}

fn is_remote(target: &str) -> bool {
    target.starts_with("http://") || target.starts_with("https://")
}

impl<S: ImageStore> TreeFilter for ImageFilter<S> {
    fn rewrite(
        &mut self,
        tag: Tag,
        content: Option<&Value>,
        _format: &str,
        _meta: &Map<String, Value>,
    ) -> Result<Rewrite, PostError> {
        if tag != Tag::Image {
            return Ok(Rewrite::Keep);
        }
        // c = [attr, alt-inlines, [target, title]]
        let Some(target) = content
            .and_then(|c| c.get(2))
            .and_then(|t| t.get(0))
            .and_then(Value::as_str)
        else {
            return Ok(Rewrite::Keep);
        };
        if is_remote(target) {
            return Ok(Rewrite::Keep);
        }

        let path = self.base_dir.join(target);
        let mut file = File::open(&path).map_err(|_| PostError::ImageNotFound {
            path: path.clone(),
        })?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(target)
            .to_string();

        let uploaded = self.store.upload(&name, &mut file)?;
        info!(target, url = %uploaded.url, "rewrote image reference");

        let mut rewritten = content.cloned().unwrap_or(Value::Null);
        if let Some(slot) = rewritten.get_mut(2).and_then(|t| t.get_mut(0)) {
            *slot = Value::String(uploaded.url);
        }
        Ok(Rewrite::Replace(json!({"t": "Image", "c": rewritten})))
    }
}
