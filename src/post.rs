//! Post and metadata records, plus the new-post scaffold.

use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The record extracted from a document's metadata block.
///
/// `id` is the storage key and is mandatory; everything else is optional.
/// Unrecognized front-matter fields ride along in `extra` so authors can
/// attach whatever their site templates consume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, flatten)]
    pub extra: Map<String, Value>,
}

/// The pipeline's output: one normalized post, keyed by `_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub body: String,
    #[serde(default)]
    pub published: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// A fresh post identifier: 12 random bytes, hex-encoded.
pub fn new_post_id() -> String {
    let mut bytes = [0u8; 12];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// The starting document for a new post: front matter with a generated id,
/// and the title as the mandatory opening heading.
pub fn scaffold(title: &str) -> String {
    format!("---\nid: {}\n---\n\n# {}\n", new_post_id(), title)
}
