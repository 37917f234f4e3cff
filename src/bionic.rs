//! Client for the bionic-reading text-emphasis service.
//!
//! The service takes a run of plain text and returns an HTML fragment with
//! fixation emphasis applied. Its response is a full fragment wrapped in a
//! `bionic-reader-container` element and littered with comments and inline
//! styles; [`clean_fragment`] reduces it to the bare inner markup the
//! serializer can carry as a raw node.
//!
//! HTTP 429 is surfaced as [`EmphasisError::RateLimited`] — the one failure
//! the emphasis filter tolerates by leaving the node untouched.

use crate::error::EmphasisError;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::blocking::Client;
use reqwest::StatusCode;

const CONVERT_URL: &str = "https://bionic-reading1.p.rapidapi.com/convert";
const API_HOST: &str = "bionic-reading1.p.rapidapi.com";

/// The text-emphasis capability, seam for stubbing in tests.
pub trait Emphasize {
    /// Re-flow a run of plain text into an emphasized markup fragment.
    fn emphasize(&mut self, text: &str) -> Result<String, EmphasisError>;
}

/// Client for the hosted emphasis API.
pub struct BionicClient {
    http: Client,
    api_key: String,
}

impl BionicClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            api_key: api_key.into(),
        }
    }
}

impl Emphasize for BionicClient {
    fn emphasize(&mut self, text: &str) -> Result<String, EmphasisError> {
        let resp = self
            .http
            .post(CONVERT_URL)
            .header("X-RapidAPI-Host", API_HOST)
            .header("X-RapidAPI-Key", &self.api_key)
            .form(&[
                ("content", text),
                ("response_type", "html"),
                ("request_type", "html"),
                ("fixation", "1"),
                ("saccade", "10"),
            ])
            .send()?;

        if resp.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(EmphasisError::RateLimited);
        }
        let body = resp.error_for_status()?.text()?;
        clean_fragment(&body)
    }
}

// ── Response cleanup ─────────────────────────────────────────────────────

static RE_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static RE_STYLE_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\s+style\s*=\s*("[^"]*"|'[^']*')"#).unwrap());

/// Strip comments and inline styles, then extract the inner markup of the
/// reader container. A response without the container is malformed.
fn clean_fragment(html: &str) -> Result<String, EmphasisError> {
    let html = RE_COMMENT.replace_all(html, "");
    let html = RE_STYLE_ATTR.replace_all(&html, "");
    let inner = container_inner(&html).ok_or_else(|| EmphasisError::Malformed {
        detail: "no bionic-reader-container element in response".into(),
    })?;
    Ok(inner.trim().to_string())
}

/// The inner HTML of the `<div class="…bionic-reader-container…">` element,
/// found by counting div nesting (the fragment contains nested divs).
fn container_inner(html: &str) -> Option<&str> {
    let marker = html.find("bionic-reader-container")?;
    let open_start = html[..marker].rfind("<div")?;
    let content_start = open_start + html[open_start..].find('>')? + 1;

    let mut depth = 1usize;
    let mut pos = content_start;
    loop {
        let close = pos + html[pos..].find("</div>")?;
        let open = html[pos..].find("<div").map(|o| pos + o);
        match open {
            Some(open) if open < close => {
                depth += 1;
                pos = open + 4;
            }
            _ => {
                depth -= 1;
                if depth == 0 {
                    return Some(&html[content_start..close]);
                }
                pos = close + 6;
            }
        }
    }
}
