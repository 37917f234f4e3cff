//! Account-scoped remote host, variant B: base64 form upload.
//!
//! Same idea as the multipart host but a different wire shape: the image
//! travels base64-encoded in a form field, and the API key rides in the
//! query string. No dedup; the digest in the returned [`UploadRef`] is
//! computed locally.

use crate::error::StoreError;
use crate::store::{read_all, ImageStore, ReadSeek, UploadRef};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

const UPLOAD_URL: &str = "https://api.imgbb.com/1/upload";

#[derive(Debug, Deserialize)]
struct ImgbbData {
    id: String,
    url: String,
    delete_url: String,
}

#[derive(Debug, Deserialize)]
struct ImgbbEnvelope {
    data: ImgbbData,
    success: bool,
    status: i64,
}

fn parse_envelope(body: &str) -> Result<ImgbbData, StoreError> {
    let envelope: ImgbbEnvelope = serde_json::from_str(body).map_err(|e| StoreError::Envelope {
        detail: e.to_string(),
    })?;
    if !envelope.success {
        return Err(StoreError::Rejected {
            status: envelope.status,
        });
    }
    Ok(envelope.data)
}

/// Client for the base64 form image host.
pub struct ImgbbClient {
    http: Client,
    api_key: String,
}

impl ImgbbClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            api_key: api_key.into(),
        }
    }
}

impl ImageStore for ImgbbClient {
    fn upload(&mut self, _name: &str, file: &mut dyn ReadSeek) -> Result<UploadRef, StoreError> {
        let bytes = read_all(file)?;
        let digest = hex::encode(&blake3::hash(&bytes).as_bytes()[..16]);

        let body = self
            .http
            .post(UPLOAD_URL)
            .query(&[("key", self.api_key.as_str())])
            .form(&[("image", STANDARD.encode(&bytes))])
            .send()?
            .text()?;

        let data = parse_envelope(&body)?;
        debug!(id = %data.id, url = %data.url, delete_url = %data.delete_url, "uploaded image");

        Ok(UploadRef {
            digest,
            url: data.url,
        })
    }

    /// Deletion is only exposed through per-object delete URLs the pipeline
    /// does not persist; removal is a no-op here.
    fn remove(&mut self, _path: &Path) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_success() {
        let body = r#"{
            "data": {
                "id": "x9y8z7",
                "url": "https://i.example.org/x9y8z7.png",
                "delete_url": "https://example.org/x9y8z7/deadbeef"
            },
            "success": true,
            "status": 200
        }"#;
        let data = parse_envelope(body).unwrap();
        assert_eq!(data.url, "https://i.example.org/x9y8z7.png");
        assert_eq!(data.id, "x9y8z7");
    }

    #[test]
    fn envelope_failure_is_rejected() {
        let body = r#"{
            "data": {"id": "", "url": "", "delete_url": ""},
            "success": false,
            "status": 400
        }"#;
        match parse_envelope(body) {
            Err(StoreError::Rejected { status: 400 }) => {}
            other => panic!("expected Rejected(400), got {other:?}"),
        }
    }

    #[test]
    fn truncated_body_is_envelope_error() {
        match parse_envelope(r#"{"data": {"id": "x""#) {
            Err(StoreError::Envelope { .. }) => {}
            other => panic!("expected Envelope error, got {other:?}"),
        }
    }
}
