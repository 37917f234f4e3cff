//! Error types for the md2post library.
//!
//! Three error types reflect three distinct failure surfaces:
//!
//! * [`PostError`] — **Fatal**: the pipeline run cannot produce a post
//!   (structural invariant broken, pandoc failed, a referenced image is
//!   missing, an upload backend failed). Returned from the top-level
//!   `markdown_to_post` entry point; a failed run yields no post record.
//!
//! * [`StoreError`] — upload-backend failures, nested inside
//!   [`PostError::Store`]. `Transport` and `Envelope` are deliberately
//!   separate variants so callers can tell "service unreachable" apart from
//!   "service contract changed".
//!
//! * [`EmphasisError`] — text-emphasis service failures. `RateLimited` is
//!   the one non-fatal signal in the whole crate: the emphasis filter
//!   converts it into "leave this node alone" and it never propagates
//!   further. Every other variant is promoted to a fatal [`PostError`].

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the md2post library.
#[derive(Debug, Error)]
pub enum PostError {
    // ── Structural errors ─────────────────────────────────────────────────
    /// The document's first block is not a level-1 heading.
    #[error("no title: the document must start with a level-1 heading")]
    NoTitle,

    /// The metadata block has no usable `id` field.
    #[error("no id: the front matter must carry a non-empty `id` field")]
    NoId,

    // ── External-process errors ───────────────────────────────────────────
    /// pandoc could not be started at all.
    #[error("failed to run pandoc: {source}\nIs pandoc installed and on PATH?")]
    PandocSpawn {
        #[source]
        source: std::io::Error,
    },

    /// pandoc exited non-zero; `detail` is its stderr, verbatim.
    #[error("pandoc failed: {detail}")]
    Pandoc { detail: String },

    /// pandoc exited zero but its output did not parse as a document tree.
    #[error("malformed document tree from pandoc: {detail}")]
    AstParse { detail: String },

    // ── Filter errors ─────────────────────────────────────────────────────
    /// The document references a local image that cannot be opened.
    #[error("referenced image not found: '{path}'")]
    ImageNotFound { path: PathBuf },

    /// An upload backend failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The text-emphasis service failed in a non-recoverable way.
    ///
    /// [`EmphasisError::RateLimited`] never reaches this variant — the
    /// emphasis filter absorbs it.
    #[error("text-emphasis service failed: {0}")]
    Emphasis(EmphasisError),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// A file-system operation on the source document failed.
    #[error("i/o error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Upload-backend failures.
///
/// `Transport` and `Envelope` stay distinct per the store contract: a
/// network failure and an unrecognized response shape call for different
/// operator reactions.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Network or protocol failure talking to the backend.
    #[error("upload transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend replied, but not with the documented envelope.
    #[error("unexpected response from upload backend: {detail}")]
    Envelope { detail: String },

    /// The envelope parsed and the backend reported failure.
    #[error("upload rejected by backend (status {status})")]
    Rejected { status: i64 },

    /// Reading the byte stream or the local object store failed.
    #[error("store i/o failure: {0}")]
    Io(#[from] std::io::Error),
}

/// Text-emphasis service failures.
#[derive(Debug, Error)]
pub enum EmphasisError {
    /// HTTP 429 from the service. Recoverable: the filter skips the node.
    #[error("rate limited")]
    RateLimited,

    /// Network or protocol failure.
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service response did not contain the expected fragment.
    #[error("malformed service response: {detail}")]
    Malformed { detail: String },
}
