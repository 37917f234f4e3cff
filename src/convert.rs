//! Document pipeline: a Markdown file in, a normalized post record out.
//!
//! Five stages, strictly sequential:
//!
//! ```text
//! Parse ─▶ ExtractTitleAndMetadata ─▶ Filter ─▶ Serialize ─▶ BuildRecord
//! ```
//!
//! Every stage completes before the next starts, and every failure is
//! fatal — the pipeline never retries and a failed run produces no record.
//! The one graceful-degradation path (emphasis-service rate limiting) lives
//! entirely inside its filter and never reaches this level.

use crate::bionic::BionicClient;
use crate::error::PostError;
use crate::filters::{
    self, embed::EmbedFilter, emphasis::EmphasisFilter, image::ImageFilter, TreeFilter,
};
use crate::pipeline::{extract, pandoc};
use crate::post::Post;
use crate::store::StoreClient;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// The serialization format the filters target and the serializer emits.
pub const OUTPUT_FORMAT: &str = "gfm";

/// Convert a Markdown document into a post record.
///
/// This is the primary entry point for the library. `filters_list` may be
/// empty; when present, each filter runs as a complete tree traversal in
/// the given order. See [`standard_filters`] for the usual lineup.
///
/// # Errors
/// Any structural violation (no leading level-1 heading, no `id` in the
/// front matter), pandoc failure, missing referenced image, or upload
/// failure aborts the run; see [`PostError`].
pub fn markdown_to_post(
    file: impl AsRef<Path>,
    filters_list: &mut [Box<dyn TreeFilter + '_>],
) -> Result<Post, PostError> {
    let file = file.as_ref();
    let start = Instant::now();
    info!("processing {}", file.display());

    // ── Step 1: Parse ────────────────────────────────────────────────────
    let mut doc = pandoc::markdown_to_ast(file)?;

    // ── Step 2: Extract title and metadata ───────────────────────────────
    let title = extract::take_title(&mut doc)?;
    let meta = extract::metadata(&doc.meta)?;
    debug!(%title, id = %meta.id, "extracted record identity");

    // ── Step 3: Filter ───────────────────────────────────────────────────
    let doc = filters::apply(doc, filters_list, OUTPUT_FORMAT)?;

    // ── Step 4: Serialize ────────────────────────────────────────────────
    let body = pandoc::ast_to_markdown(&doc)?;

    // ── Step 5: Build the record ─────────────────────────────────────────
    let (created, updated) = file_times(file)?;

    info!(
        id = %meta.id,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "document processed"
    );

    Ok(Post {
        id: meta.id,
        title,
        created,
        updated,
        body,
        published: false,
        cover: meta.cover,
        tags: meta.tags,
    })
}

/// The usual filter lineup, in the order the rewrites compose: images are
/// uploaded first, then link embedding and text emphasis observe the
/// rewritten tree.
pub fn standard_filters(
    store: StoreClient,
    base_dir: &Path,
    embeds: bool,
    emphasis: Option<BionicClient>,
) -> Vec<Box<dyn TreeFilter>> {
    let mut list: Vec<Box<dyn TreeFilter>> = vec![Box::new(ImageFilter::new(store, base_dir))];
    if embeds {
        list.push(Box::new(EmbedFilter));
    }
    if let Some(client) = emphasis {
        list.push(Box::new(EmphasisFilter::new(client)));
    }
    list
}

/// Creation and modification timestamps from file-system metadata.
///
/// Platforms without a birth time fall back to the modification time.
fn file_times(path: &Path) -> Result<(DateTime<Utc>, DateTime<Utc>), PostError> {
    let meta = fs::metadata(path).map_err(|e| PostError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let modified = meta.modified().map_err(|e| PostError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let created = meta.created().unwrap_or(modified);
    Ok((created.into(), modified.into()))
}
