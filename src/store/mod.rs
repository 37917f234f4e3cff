//! Checksum store clients: interchangeable image-upload backends.
//!
//! Every backend satisfies the same two-method capability, [`ImageStore`]:
//! push a byte stream, get back a public reference; remove a previously
//! uploaded object. What differs is the dedup story:
//!
//! | Backend | Digest | Dedup |
//! |---------|--------|-------|
//! | [`content::ContentStore`] | 128-bit BLAKE3 prefix | lookup before write |
//! | [`imgur::ImgurClient`]    | local only            | none — every call uploads |
//! | [`imgbb::ImgbbClient`]    | local only            | none — every call uploads |
//! | [`bucket::BucketStore`]   | SHA-256               | integrity probe, skip on match |
//!
//! Backends are plain structs owning an HTTP client and their credentials;
//! [`StoreClient`] is the closed enum the CLI selects from.

pub mod bucket;
pub mod content;
pub mod imgbb;
pub mod imgur;

use crate::error::StoreError;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

pub use bucket::BucketStore;
pub use content::ContentStore;
pub use imgbb::ImgbbClient;
pub use imgur::ImgurClient;

/// A seekable byte stream. Uploads hash the stream and hand it back with the
/// read position where they found it.
pub trait ReadSeek: Read + Seek {}
impl<T: Read + Seek> ReadSeek for T {}

/// The outcome of an upload: a content digest paired with the public URL.
///
/// For a fixed backend and fixed content bytes the digest is deterministic,
/// and on the dedup-capable backends the URL is stable across repeated
/// uploads of identical content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRef {
    /// Hex content digest (backend-specific algorithm).
    pub digest: String,
    /// Publicly resolvable location of the object.
    pub url: String,
}

/// The upload/remove capability every backend implements.
pub trait ImageStore {
    /// Upload a byte stream under the given file name, returning its
    /// public reference. Deduplicating backends may skip the physical
    /// upload and return the existing reference.
    fn upload(&mut self, name: &str, file: &mut dyn ReadSeek) -> Result<UploadRef, StoreError>;

    /// Remove the object previously uploaded for this local file.
    ///
    /// Backends without a removal API treat this as a no-op.
    fn remove(&mut self, path: &Path) -> Result<(), StoreError>;
}

/// The closed set of configured backends.
pub enum StoreClient {
    Content(ContentStore),
    Imgur(ImgurClient),
    Imgbb(ImgbbClient),
    Bucket(BucketStore),
}

impl ImageStore for StoreClient {
    fn upload(&mut self, name: &str, file: &mut dyn ReadSeek) -> Result<UploadRef, StoreError> {
        match self {
            StoreClient::Content(s) => s.upload(name, file),
            StoreClient::Imgur(s) => s.upload(name, file),
            StoreClient::Imgbb(s) => s.upload(name, file),
            StoreClient::Bucket(s) => s.upload(name, file),
        }
    }

    fn remove(&mut self, path: &Path) -> Result<(), StoreError> {
        match self {
            StoreClient::Content(s) => s.remove(path),
            StoreClient::Imgur(s) => s.remove(path),
            StoreClient::Imgbb(s) => s.remove(path),
            StoreClient::Bucket(s) => s.remove(path),
        }
    }
}

// ── Shared stream plumbing ───────────────────────────────────────────────

/// Feed the stream through `update` in chunks, then seek back to where the
/// caller's read position was.
pub(crate) fn for_each_chunk(
    file: &mut dyn ReadSeek,
    mut update: impl FnMut(&[u8]),
) -> std::io::Result<()> {
    let start = file.stream_position()?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        update(&buf[..n]);
    }
    file.seek(SeekFrom::Start(start))?;
    Ok(())
}

/// Drain the stream from its current position.
pub(crate) fn read_all(file: &mut dyn ReadSeek) -> std::io::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok(bytes)
}

/// Content type from the file extension; the stores attach it as object
/// metadata so the serving side gets the header right.
pub(crate) fn content_type_for(name: &str) -> &'static str {
    match Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("avif") => "image/avif",
        _ => "application/octet-stream",
    }
}
