//! The pandoc document tree.
//!
//! pandoc's JSON output is a recursive structure of tagged nodes:
//! `{"t": "Para", "c": [...]}`. The tree is kept as raw [`serde_json::Value`]
//! so it round-trips through the serializer byte-for-byte for every node kind
//! pandoc can emit, including ones this crate never looks at. Typed access
//! happens at the edges: [`Tag`] classifies the node kinds the filters
//! recognize (everything else is [`Tag::Other`]), and the constructor
//! functions build the few node shapes the filters emit.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// A parsed document: the shape of pandoc's `-t json` output.
///
/// Created once per source file by the external parser, rewritten by the
/// filter pipeline, consumed once by the external serializer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doc {
    /// Carried verbatim; the serializer rejects trees without it.
    #[serde(rename = "pandoc-api-version")]
    pub api_version: Value,
    /// The metadata block (front matter), keyed by field name.
    pub meta: Map<String, Value>,
    /// Block-level nodes in document order.
    pub blocks: Vec<Value>,
}

/// Node kinds the crate recognizes, plus a catch-all.
///
/// Filters match on `Tag` and must treat [`Tag::Other`] as "not mine".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Header,
    Para,
    Plain,
    Str,
    Space,
    SoftBreak,
    LineBreak,
    Code,
    Math,
    Image,
    Link,
    RawInline,
    RawBlock,
    MetaString,
    /// Any node kind not listed above.
    Other,
}

impl Tag {
    /// Classify a pandoc type tag.
    pub fn parse(tag: &str) -> Self {
        match tag {
            "Header" => Self::Header,
            "Para" => Self::Para,
            "Plain" => Self::Plain,
            "Str" => Self::Str,
            "Space" => Self::Space,
            "SoftBreak" => Self::SoftBreak,
            "LineBreak" => Self::LineBreak,
            "Code" => Self::Code,
            "Math" => Self::Math,
            "Image" => Self::Image,
            "Link" => Self::Link,
            "RawInline" => Self::RawInline,
            "RawBlock" => Self::RawBlock,
            "MetaString" => Self::MetaString,
            _ => Self::Other,
        }
    }
}

// ── Node accessors ───────────────────────────────────────────────────────

/// The `t` tag of a node, if it is one.
pub fn tag_of(value: &Value) -> Option<&str> {
    value.get("t")?.as_str()
}

/// The `c` payload of a node. Leaf kinds (`Space`, `SoftBreak`) have none.
pub fn content_of(value: &Value) -> Option<&Value> {
    value.get("c")
}

// ── Node constructors ────────────────────────────────────────────────────

/// A `Str` inline.
pub fn str_node(text: &str) -> Value {
    json!({"t": "Str", "c": text})
}

/// A raw inline fragment the serializer passes through verbatim for the
/// given output format.
pub fn raw_inline(format: &str, text: &str) -> Value {
    json!({"t": "RawInline", "c": [format, text]})
}

/// A raw block, verbatim for the given output format.
pub fn raw_block(format: &str, text: &str) -> Value {
    json!({"t": "RawBlock", "c": [format, text]})
}

/// A paragraph from a list of inlines.
pub fn para(inlines: Vec<Value>) -> Value {
    json!({"t": "Para", "c": inlines})
}

// ── Text flattening ──────────────────────────────────────────────────────

/// Flatten a subtree into plain text.
///
/// `Str` and `MetaString` contribute their text, `Code` and `Math` their
/// payload, and `Space`/`SoftBreak`/`LineBreak` a single space each, in
/// document order. Everything else contributes only through its children.
pub fn stringify(value: &Value) -> String {
    let mut out = String::new();
    collect_text(value, &mut out);
    out
}

fn collect_text(value: &Value, out: &mut String) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_text(item, out);
            }
        }
        Value::Object(map) => {
            if let Some(tag) = map.get("t").and_then(Value::as_str) {
                match Tag::parse(tag) {
                    Tag::Str | Tag::MetaString => {
                        if let Some(s) = map.get("c").and_then(Value::as_str) {
                            out.push_str(s);
                        }
                        return;
                    }
                    Tag::Code | Tag::Math => {
                        // c = [attr-or-mathtype, text]
                        if let Some(s) =
                            map.get("c").and_then(|c| c.get(1)).and_then(Value::as_str)
                        {
                            out.push_str(s);
                        }
                        return;
                    }
                    Tag::Space | Tag::SoftBreak | Tag::LineBreak => {
                        out.push(' ');
                        return;
                    }
                    _ => {}
                }
            }
            for v in map.values() {
                collect_text(v, out);
            }
        }
        _ => {}
    }
}

// ── Image collection ─────────────────────────────────────────────────────

/// Every image target URL in the document, in traversal order.
///
/// Used by the deletion workflow, which re-walks the *unfiltered* tree to
/// find the local files whose uploads should be removed.
pub fn image_targets(doc: &Doc) -> Vec<String> {
    let mut targets = Vec::new();
    for block in &doc.blocks {
        collect_image_targets(block, &mut targets);
    }
    targets
}

fn collect_image_targets(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_image_targets(item, out);
            }
        }
        Value::Object(map) => {
            if map.get("t").and_then(Value::as_str) == Some("Image") {
                // c = [attr, alt-inlines, [target, title]]
                if let Some(target) = map
                    .get("c")
                    .and_then(|c| c.get(2))
                    .and_then(|t| t.get(0))
                    .and_then(Value::as_str)
                {
                    out.push(target.to_string());
                }
            }
            for v in map.values() {
                collect_image_targets(v, out);
            }
        }
        _ => {}
    }
}
