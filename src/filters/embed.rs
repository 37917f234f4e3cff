//! Embed rewrite: links to known hosts become inline widgets.
//!
//! A fixed table maps host names to handlers; each handler turns the link
//! URL into an iframe fragment carried as a raw inline. Anything the table
//! does not list — and any recognized-host link whose shape the handler
//! cannot use — passes through unchanged. Extending coverage means adding a
//! host to the table, never pattern-matching on URLs.

use crate::ast::{self, Tag};
use crate::error::PostError;
use crate::filters::{Rewrite, TreeFilter};
use reqwest::Url;
use serde_json::{Map, Value};
use tracing::debug;

type Handler = fn(&Url) -> Option<String>;

/// The closed set of recognized hosts.
fn handler_for(host: &str) -> Option<Handler> {
    match host {
        "www.youtube.com" => Some(youtube),
        "codepen.io" => Some(codepen),
        "replit.com" => Some(replit),
        _ => None,
    }
}

/// `watch?v=<id>` → fixed-dimension player iframe.
fn youtube(url: &Url) -> Option<String> {
    let video = url
        .query_pairs()
        .find(|(k, _)| k == "v")
        .map(|(_, v)| v.into_owned())?;
    Some(format!(
        "<iframe width=\"560\" height=\"315\" \
         src=\"https://www.youtube.com/embed/{video}\" \
         title=\"YouTube video player\" \
         allow=\"accelerometer; autoplay; clipboard-write; encrypted-media; \
         gyroscope; picture-in-picture; fullscreen\" \
         frameBorder=\"0\"></iframe>"
    ))
}

/// `/pen/` → `/embed/`, canned "html and result" tab selection.
fn codepen(url: &Url) -> Option<String> {
    if !url.path().contains("/pen/") {
        return None;
    }
    let mut url = url.clone();
    let path = url.path().replace("/pen/", "/embed/");
    url.set_path(&path);
    url.set_query(Some("default-tab=html%2Cresult"));
    Some(format!(
        "<iframe width=\"100%\" height=\"300\" frameBorder=\"0\" \
         loading=\"lazy\" allow=\"fullscreen\" src=\"{url}\"></iframe>"
    ))
}

/// Full-width runner iframe with the embed flag forced on.
fn replit(url: &Url) -> Option<String> {
    let mut url = url.clone();
    url.set_query(Some("embed=true"));
    Some(format!(
        "<iframe width=\"100%\" height=\"500\" frameBorder=\"0\" src=\"{url}\"></iframe>"
    ))
}

/// Rewrites links to recognized hosts into embeddable iframes.
pub struct EmbedFilter;

impl TreeFilter for EmbedFilter {
    fn rewrite(
        &mut self,
        tag: Tag,
        content: Option<&Value>,
        _format: &str,
        _meta: &Map<String, Value>,
    ) -> Result<Rewrite, PostError> {
        if tag != Tag::Link {
            return Ok(Rewrite::Keep);
        }
        // c = [attr, text-inlines, [target, title]]
        let Some(target) = content
            .and_then(|c| c.get(2))
            .and_then(|t| t.get(0))
            .and_then(Value::as_str)
        else {
            return Ok(Rewrite::Keep);
        };
        let Ok(url) = Url::parse(target) else {
            return Ok(Rewrite::Keep);
        };
        let Some(handler) = url.host_str().and_then(handler_for) else {
            return Ok(Rewrite::Keep);
        };

        match handler(&url) {
            Some(iframe) => {
                debug!(target, "embedded link");
                Ok(Rewrite::Replace(ast::raw_inline("html", &iframe)))
            }
            // Recognized host, unusable link shape — leave it be.
            None => Ok(Rewrite::Keep),
        }
    }
}
