//! Settings: credentials and endpoints, loaded once at process start.
//!
//! One explicit struct, constructed in `main` and passed by reference into
//! whatever needs it — core logic never reads ambient environment state.
//! A `.env` file is honored as a convenience for local use; real
//! environment variables win.

use std::env;
use std::path::PathBuf;

/// Everything the CLI needs to wire up backends and services.
///
/// All backend credentials are optional; selecting a backend whose
/// credentials are missing is reported at selection time, not here.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory the post store writes `<id>.json` documents into.
    pub data_dir: PathBuf,
    /// Root directory of the content-addressed image store.
    pub media_dir: PathBuf,
    /// Public URL prefix the content store builds references from.
    pub media_base_url: String,
    /// Client id for the multipart image host.
    pub imgur_client_id: Option<String>,
    /// API key for the base64 form image host.
    pub imgbb_api_key: Option<String>,
    /// Bucket gateway endpoint, e.g. `https://storage.example.net`.
    pub bucket_endpoint: Option<String>,
    /// Bucket name at the gateway.
    pub bucket_name: Option<String>,
    /// Bearer token for the bucket gateway.
    pub bucket_token: Option<String>,
    /// API key for the text-emphasis service.
    pub bionic_api_key: Option<String>,
}

impl Settings {
    /// Load settings from `.env` (if present) and the environment.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self {
            data_dir: env::var("MD2POST_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("posts")),
            media_dir: env::var("MD2POST_MEDIA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("media")),
            media_base_url: env::var("MD2POST_MEDIA_URL")
                .unwrap_or_else(|_| "https://api.thoughtbank.app/images".to_string()),
            imgur_client_id: non_empty("IMGUR_CLIENT_ID"),
            imgbb_api_key: non_empty("IMGBB_API_KEY"),
            bucket_endpoint: non_empty("BUCKET_ENDPOINT"),
            bucket_name: non_empty("BUCKET_NAME"),
            bucket_token: non_empty("BUCKET_TOKEN"),
            bionic_api_key: non_empty("BIONIC_API_KEY"),
        }
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}
