//! Text-emphasis rewrite: plain prose re-flowed through the emphasis service.
//!
//! Paragraph content is split into runs of textual tokens (words, spaces,
//! soft breaks) separated by structural tokens (inline code, emphasis marks,
//! links…). Each textual run makes one service call and collapses into a
//! single raw-HTML inline; structural tokens pass through untouched, so
//! their own formatting survives. A leading space on a run stays outside
//! the call — the service would swallow it.
//!
//! Rate limiting is the tolerated failure: the node under rewrite is kept
//! exactly as it was and the traversal moves on. Anything else the service
//! does wrong is fatal.

use crate::ast::{self, Tag};
use crate::bionic::Emphasize;
use crate::error::{EmphasisError, PostError};
use crate::filters::{Rewrite, TreeFilter};
use serde_json::{Map, Value};
use tracing::warn;

/// Re-flows plain blocks and paragraph prose through an [`Emphasize`] client.
pub struct EmphasisFilter<C: Emphasize> {
    client: C,
}

impl<C: Emphasize> EmphasisFilter<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// One service call; `Ok(None)` means rate-limited — caller keeps the node.
    fn convert(&mut self, text: &str) -> Result<Option<String>, PostError> {
        match self.client.emphasize(text) {
            Ok(html) => Ok(Some(html)),
            Err(EmphasisError::RateLimited) => {
                warn!("emphasis service rate-limited, leaving node unchanged");
                Ok(None)
            }
            Err(e) => Err(PostError::Emphasis(e)),
        }
    }

    fn rewrite_plain(&mut self, content: &Value) -> Result<Rewrite, PostError> {
        let text = ast::stringify(content);
        match self.convert(&text)? {
            Some(html) => Ok(Rewrite::Replace(ast::raw_block("html", &html))),
            None => Ok(Rewrite::Keep),
        }
    }

    fn rewrite_para(&mut self, content: &Value) -> Result<Rewrite, PostError> {
        let Some(inlines) = content.as_array() else {
            return Ok(Rewrite::Keep);
        };

        let mut result: Vec<Value> = Vec::with_capacity(inlines.len());
        let mut idx = 0;
        while idx < inlines.len() {
            if !is_textual(&inlines[idx]) {
                result.push(inlines[idx].clone());
                idx += 1;
                continue;
            }

            let start = idx;
            while idx < inlines.len() && is_textual(&inlines[idx]) {
                idx += 1;
            }
            let mut run = &inlines[start..idx];

            // A run that starts with a space keeps it outside the call.
            if ast::tag_of(&run[0]).map(Tag::parse) == Some(Tag::Space) {
                result.push(run[0].clone());
                run = &run[1..];
            }
            if run.is_empty() {
                continue;
            }

            let text = ast::stringify(&Value::Array(run.to_vec()));
            match self.convert(&text)? {
                Some(html) => result.push(ast::raw_inline("html", &html)),
                // Rate limited: the whole paragraph stays as it was.
                None => return Ok(Rewrite::Keep),
            }
        }

        Ok(Rewrite::Replace(ast::para(result)))
    }
}

fn is_textual(value: &Value) -> bool {
    matches!(
        ast::tag_of(value).map(Tag::parse),
        Some(Tag::Str | Tag::Space | Tag::SoftBreak)
    )
}

impl<C: Emphasize> TreeFilter for EmphasisFilter<C> {
    fn rewrite(
        &mut self,
        tag: Tag,
        content: Option<&Value>,
        _format: &str,
        _meta: &Map<String, Value>,
    ) -> Result<Rewrite, PostError> {
        let Some(content) = content else {
            return Ok(Rewrite::Keep);
        };
        match tag {
            Tag::Plain => self.rewrite_plain(content),
            Tag::Para => self.rewrite_para(content),
            _ => Ok(Rewrite::Keep),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Wraps the text so call boundaries are visible in assertions.
    struct Marker;
    impl Emphasize for Marker {
        fn emphasize(&mut self, text: &str) -> Result<String, EmphasisError> {
            Ok(format!("<b>{text}</b>"))
        }
    }

    struct AlwaysLimited;
    impl Emphasize for AlwaysLimited {
        fn emphasize(&mut self, _text: &str) -> Result<String, EmphasisError> {
            Err(EmphasisError::RateLimited)
        }
    }

    struct Broken;
    impl Emphasize for Broken {
        fn emphasize(&mut self, _text: &str) -> Result<String, EmphasisError> {
            Err(EmphasisError::Malformed {
                detail: "gibberish".into(),
            })
        }
    }

    fn mixed_para() -> Value {
        json!({"t": "Para", "c": [
            {"t": "Str", "c": "Take"},
            {"t": "Space"},
            {"t": "Str", "c": "care"},
            {"t": "Code", "c": [["", [], []], "rm -rf"]},
            {"t": "Space"},
            {"t": "Str", "c": "now"},
        ]})
    }

    fn apply<C: Emphasize>(client: C, node: &Value) -> Result<Rewrite, PostError> {
        let meta = Map::new();
        let tag = Tag::parse(ast::tag_of(node).unwrap());
        EmphasisFilter::new(client).rewrite(tag, ast::content_of(node), "gfm", &meta)
    }

    #[test]
    fn para_runs_convert_around_structural_tokens() {
        match apply(Marker, &mixed_para()).unwrap() {
            Rewrite::Replace(node) => {
                let inlines = node["c"].as_array().unwrap();
                assert_eq!(inlines.len(), 4);
                assert_eq!(inlines[0]["c"][1], "<b>Take care</b>");
                assert_eq!(inlines[1]["t"], "Code");
                // The space between code and the next run survives verbatim.
                assert_eq!(inlines[2]["t"], "Space");
                assert_eq!(inlines[3]["c"][1], "<b>now</b>");
            }
            other => panic!("expected Replace, got {other:?}"),
        }
    }

    #[test]
    fn plain_block_converts_whole() {
        let plain = json!({"t": "Plain", "c": [
            {"t": "Str", "c": "short"},
            {"t": "Space"},
            {"t": "Str", "c": "caption"},
        ]});
        match apply(Marker, &plain).unwrap() {
            Rewrite::Replace(node) => {
                assert_eq!(node["t"], "RawBlock");
                assert_eq!(node["c"][0], "html");
                assert_eq!(node["c"][1], "<b>short caption</b>");
            }
            other => panic!("expected Replace, got {other:?}"),
        }
    }

    #[test]
    fn rate_limit_leaves_paragraph_untouched() {
        assert!(matches!(
            apply(AlwaysLimited, &mixed_para()).unwrap(),
            Rewrite::Keep
        ));
    }

    #[test]
    fn rate_limit_leaves_plain_untouched() {
        let plain = json!({"t": "Plain", "c": [{"t": "Str", "c": "x"}]});
        assert!(matches!(
            apply(AlwaysLimited, &plain).unwrap(),
            Rewrite::Keep
        ));
    }

    #[test]
    fn other_service_failures_are_fatal() {
        match apply(Broken, &mixed_para()) {
            Err(PostError::Emphasis(EmphasisError::Malformed { .. })) => {}
            other => panic!("expected fatal emphasis error, got {other:?}"),
        }
    }

    #[test]
    fn unrecognized_kinds_pass_through() {
        let meta = Map::new();
        let mut filter = EmphasisFilter::new(Marker);
        assert!(matches!(
            filter
                .rewrite(Tag::Header, Some(&json!([1])), "gfm", &meta)
                .unwrap(),
            Rewrite::Keep
        ));
    }
}
