//! # md2post
//!
//! Publish Markdown documents as normalized blog posts.
//!
//! ## What it does
//!
//! An authored Markdown file goes through pandoc into a structured document
//! tree, gets rewritten node-by-node — local image references replaced with
//! hosted URLs, known-site links turned into embeddable widgets, prose
//! optionally re-flowed through a text-emphasis service — and comes back
//! out of pandoc as the post body, paired with the title and identity
//! pulled from the document itself.
//!
//! ## Pipeline Overview
//!
//! ```text
//! document.md
//!  │
//!  ├─ 1. Parse      pandoc -f gfm -t json (subprocess)
//!  ├─ 2. Extract    leading H1 → title, front matter → id/cover/tags
//!  ├─ 3. Filter     image upload / link embeds / text emphasis
//!  ├─ 4. Serialize  pandoc -f json -t gfm (subprocess)
//!  └─ 5. Record     title + body + fs timestamps + id → Post
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use md2post::{markdown_to_post, standard_filters, ContentStore, StoreClient};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = StoreClient::Content(ContentStore::new(
//!         "media",
//!         "https://api.thoughtbank.app/images",
//!     ));
//!     let mut filters = standard_filters(store, Path::new("."), true, None);
//!     let post = markdown_to_post("drafts/editors.md", &mut filters)?;
//!     println!("{} ({} bytes)", post.title, post.body.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Upload backends
//!
//! | Backend | Dedup | Credentials |
//! |---------|-------|-------------|
//! | [`ContentStore`] | by content digest | none (local directory) |
//! | [`ImgurClient`]  | none | `IMGUR_CLIENT_ID` |
//! | [`ImgbbClient`]  | none | `IMGBB_API_KEY` |
//! | [`BucketStore`]  | checksum probe | `BUCKET_ENDPOINT` / `BUCKET_NAME` / `BUCKET_TOKEN` |
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `md2post` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! md2post = { version = "0.3", default-features = false }
//! ```
//!
//! pandoc must be installed and on `PATH`; it is invoked as a subprocess
//! for both directions of the tree conversion.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod ast;
pub mod bionic;
pub mod config;
pub mod convert;
pub mod db;
pub mod error;
pub mod filters;
pub mod pipeline;
pub mod post;
pub mod store;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use bionic::{BionicClient, Emphasize};
pub use config::Settings;
pub use convert::{markdown_to_post, standard_filters, OUTPUT_FORMAT};
pub use db::{DirStore, PostStore};
pub use error::{EmphasisError, PostError, StoreError};
pub use filters::{Rewrite, TreeFilter};
pub use post::{new_post_id, scaffold, Metadata, Post};
pub use store::{
    BucketStore, ContentStore, ImageStore, ImgbbClient, ImgurClient, StoreClient, UploadRef,
};
