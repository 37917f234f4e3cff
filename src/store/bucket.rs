//! The verified remote bucket store: integrity-checked, idempotent uploads.
//!
//! Objects are keyed by the file's base name inside a bucket behind an
//! HTTP gateway. Before uploading, the store probes the object's stored
//! checksum attribute:
//!
//! * probe returns 404 — the object is absent; a normal precondition, upload.
//! * checksum attribute present and equal to the freshly computed SHA-256 —
//!   the upload is skipped entirely and the existing reference returned.
//! * attribute missing or different — the object is stale or was written
//!   without integrity metadata; overwrite it and attach the new checksum.
//!
//! Any other probe failure (transport error, 5xx) propagates: an erroring
//! backend must never be mistaken for "absent".

use crate::error::StoreError;
use crate::store::{content_type_for, for_each_chunk, read_all, ImageStore, ReadSeek, UploadRef};
use reqwest::blocking::Client;
use reqwest::{StatusCode, Url};
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::debug;

/// The object-metadata header carrying the content checksum.
const CHECKSUM_HEADER: &str = "x-amz-meta-sha256";

/// Whether the probe result calls for a fresh upload.
///
/// Only an exact checksum match allows the skip; `None` covers both the
/// absent object and a present object with no checksum attribute.
fn needs_upload(existing: Option<&str>, digest: &str) -> bool {
    existing != Some(digest)
}

/// Client for a bucket behind a token-authorized HTTP gateway.
pub struct BucketStore {
    http: Client,
    endpoint: Url,
    bucket: String,
    token: String,
}

impl BucketStore {
    pub fn new(endpoint: Url, bucket: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            endpoint,
            bucket: bucket.into(),
            token: token.into(),
        }
    }

    /// `<endpoint>/<bucket>/<key>`, with the key percent-encoded.
    fn object_url(&self, key: &str) -> Url {
        let mut url = self.endpoint.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(&self.bucket).push(key);
        }
        url
    }

    /// SHA-256 of the stream, hex-encoded; seeks back afterwards.
    fn digest(file: &mut dyn ReadSeek) -> Result<String, StoreError> {
        let mut hasher = Sha256::new();
        for_each_chunk(file, |chunk| hasher.update(chunk))?;
        Ok(hex::encode(hasher.finalize()))
    }

    /// The checksum attribute currently stored for `key`, if the object
    /// exists and carries one.
    fn stored_checksum(&self, url: Url) -> Result<Option<String>, StoreError> {
        let resp = self.http.head(url).bearer_auth(&self.token).send()?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resp = resp.error_for_status()?;
        Ok(resp
            .headers()
            .get(CHECKSUM_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string))
    }
}

impl ImageStore for BucketStore {
    fn upload(&mut self, name: &str, file: &mut dyn ReadSeek) -> Result<UploadRef, StoreError> {
        let key = Path::new(name)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(name);
        let url = self.object_url(key);
        let digest = Self::digest(file)?;

        let existing = self.stored_checksum(url.clone())?;
        if !needs_upload(existing.as_deref(), &digest) {
            debug!(%key, "checksum match, skipping upload");
            return Ok(UploadRef {
                digest,
                url: url.to_string(),
            });
        }

        let bytes = read_all(file)?;
        self.http
            .put(url.clone())
            .bearer_auth(&self.token)
            .header(CHECKSUM_HEADER, &digest)
            .header("Content-Type", content_type_for(name))
            .body(bytes)
            .send()?
            .error_for_status()?;

        debug!(%key, stale = existing.is_some(), "uploaded object");
        Ok(UploadRef {
            digest,
            url: url.to_string(),
        })
    }

    fn remove(&mut self, path: &Path) -> Result<(), StoreError> {
        let key = path.file_name().and_then(|n| n.to_str()).ok_or_else(|| {
            StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("no file name in '{}'", path.display()),
            ))
        })?;

        let resp = self
            .http
            .delete(self.object_url(key))
            .bearer_auth(&self.token)
            .send()?;
        // Deleting an already-gone object is idempotent.
        if resp.status() != StatusCode::NOT_FOUND {
            resp.error_for_status()?;
        }
        debug!(%key, "removed object");
        Ok(())
    }
}
