//! Account-scoped remote host, variant A: raw multipart upload.
//!
//! Uploads go to a fixed endpoint as a multipart `image` part, authorized by
//! a client id. Every call creates a new remote object — the service offers
//! no content lookup, so there is no dedup to be had. The digest in the
//! returned [`UploadRef`] is computed locally.

use crate::error::StoreError;
use crate::store::{content_type_for, read_all, ImageStore, ReadSeek, UploadRef};
use reqwest::blocking::{multipart, Client};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

const UPLOAD_URL: &str = "https://api.imgur.com/3/upload";

#[derive(Debug, Deserialize)]
struct ImgurData {
    link: String,
    deletehash: String,
}

#[derive(Debug, Deserialize)]
struct ImgurEnvelope {
    data: ImgurData,
    success: bool,
    status: i64,
}

/// Parse the documented response envelope. Any other shape is an
/// [`StoreError::Envelope`]; a parsed envelope with `success == false` is a
/// [`StoreError::Rejected`].
fn parse_envelope(body: &str) -> Result<ImgurData, StoreError> {
    let envelope: ImgurEnvelope = serde_json::from_str(body).map_err(|e| StoreError::Envelope {
        detail: e.to_string(),
    })?;
    if !envelope.success {
        return Err(StoreError::Rejected {
            status: envelope.status,
        });
    }
    Ok(envelope.data)
}

/// Client for the multipart image host.
pub struct ImgurClient {
    http: Client,
    client_id: String,
}

impl ImgurClient {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            client_id: client_id.into(),
        }
    }
}

impl ImageStore for ImgurClient {
    fn upload(&mut self, name: &str, file: &mut dyn ReadSeek) -> Result<UploadRef, StoreError> {
        let bytes = read_all(file)?;
        let digest = hex::encode(&blake3::hash(&bytes).as_bytes()[..16]);

        let part = multipart::Part::bytes(bytes)
            .file_name(name.to_string())
            .mime_str(content_type_for(name))?;
        let form = multipart::Form::new().part("image", part);

        let body = self
            .http
            .post(UPLOAD_URL)
            .header("Authorization", format!("Client-ID {}", self.client_id))
            .multipart(form)
            .send()?
            .text()?;

        let data = parse_envelope(&body)?;
        debug!(link = %data.link, deletehash = %data.deletehash, "uploaded image");

        Ok(UploadRef {
            digest,
            url: data.link,
        })
    }

    /// The host only deletes via per-object deletehashes, which the pipeline
    /// does not persist; removal is a no-op here.
    fn remove(&mut self, _path: &Path) -> Result<(), StoreError> {
        Ok(())
    }
}
