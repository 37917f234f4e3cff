//! Title and metadata extraction.
//!
//! Two structural invariants gate every pipeline run: the document must
//! open with a level-1 heading (it becomes the post title and leaves the
//! block sequence), and the metadata block must carry a non-empty `id`
//! (it becomes the storage key). Violating either is a hard error — there
//! is no default title and no generated fallback id.

use crate::ast::{self, Doc};
use crate::error::PostError;
use crate::post::Metadata;
use serde_json::{Map, Value};

/// Pop the leading level-1 heading off the block sequence and flatten it
/// into the title string.
pub fn take_title(doc: &mut Doc) -> Result<String, PostError> {
    let first = doc.blocks.first().ok_or(PostError::NoTitle)?;

    let level = ast::content_of(first)
        .and_then(|c| c.get(0))
        .and_then(Value::as_i64);
    if ast::tag_of(first) != Some("Header") || level != Some(1) {
        return Err(PostError::NoTitle);
    }

    let heading = doc.blocks.remove(0);
    Ok(ast::stringify(&heading))
}

/// Build the metadata record from the document's metadata block.
pub fn metadata(meta: &Map<String, Value>) -> Result<Metadata, PostError> {
    let id = meta.get("id").map(ast::stringify).unwrap_or_default();
    if id.is_empty() {
        return Err(PostError::NoId);
    }

    let cover = meta
        .get("cover")
        .map(ast::stringify)
        .filter(|s| !s.is_empty());
    let tags = meta.get("tags").map(string_list).unwrap_or_default();

    let extra: Map<String, Value> = meta
        .iter()
        .filter(|(k, _)| !matches!(k.as_str(), "id" | "cover" | "tags"))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    Ok(Metadata {
        id,
        cover,
        tags,
        extra,
    })
}

/// Flatten a metadata list into its items' text; a scalar value becomes a
/// one-element list.
fn string_list(value: &Value) -> Vec<String> {
    let items = match ast::tag_of(value) {
        Some("MetaList") => ast::content_of(value).and_then(Value::as_array),
        _ => None,
    };
    match items {
        Some(items) => items
            .iter()
            .map(ast::stringify)
            .filter(|s| !s.is_empty())
            .collect(),
        None => {
            let s = ast::stringify(value);
            if s.is_empty() {
                Vec::new()
            } else {
                vec![s]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc_with_first_block(block: Value) -> Doc {
        Doc {
            api_version: json!([1, 23, 1]),
            meta: Map::new(),
            blocks: vec![
                block,
                json!({"t": "Para", "c": [{"t": "Str", "c": "body"}]}),
            ],
        }
    }

    fn h(level: i64, text: &str) -> Value {
        json!({"t": "Header", "c": [
            level,
            ["", [], []],
            [{"t": "Str", "c": text.split(' ').next().unwrap()},
             {"t": "Space"},
             {"t": "Str", "c": text.split(' ').nth(1).unwrap_or("")}],
        ]})
    }

    fn meta_inlines(text: &str) -> Value {
        json!({"t": "MetaInlines", "c": [{"t": "Str", "c": text}]})
    }

    #[test]
    fn level_one_heading_becomes_the_title() {
        let mut doc = doc_with_first_block(h(1, "Hello World"));
        let title = take_title(&mut doc).unwrap();
        assert_eq!(title, "Hello World");
        // The heading left the block sequence.
        assert_eq!(doc.blocks.len(), 1);
        assert_eq!(ast::tag_of(&doc.blocks[0]), Some("Para"));
    }

    #[test]
    fn level_two_heading_is_no_title() {
        let mut doc = doc_with_first_block(h(2, "Hello World"));
        assert!(matches!(take_title(&mut doc), Err(PostError::NoTitle)));
        assert_eq!(doc.blocks.len(), 2, "nothing removed on failure");
    }

    #[test]
    fn non_heading_first_block_is_no_title() {
        let mut doc =
            doc_with_first_block(json!({"t": "Para", "c": [{"t": "Str", "c": "x"}]}));
        assert!(matches!(take_title(&mut doc), Err(PostError::NoTitle)));
    }

    #[test]
    fn empty_document_is_no_title() {
        let mut doc = Doc {
            api_version: json!([1, 23, 1]),
            meta: Map::new(),
            blocks: vec![],
        };
        assert!(matches!(take_title(&mut doc), Err(PostError::NoTitle)));
    }

    #[test]
    fn id_is_required() {
        let meta = Map::new();
        assert!(matches!(metadata(&meta), Err(PostError::NoId)));
    }

    #[test]
    fn empty_id_is_no_id() {
        let mut meta = Map::new();
        meta.insert("id".into(), json!({"t": "MetaInlines", "c": []}));
        assert!(matches!(metadata(&meta), Err(PostError::NoId)));
    }

    #[test]
    fn id_is_flattened_text() {
        let mut meta = Map::new();
        meta.insert("id".into(), meta_inlines("abc123"));
        assert_eq!(metadata(&meta).unwrap().id, "abc123");
    }

    #[test]
    fn optional_fields_and_extras_are_carried() {
        let mut meta = Map::new();
        meta.insert("id".into(), meta_inlines("abc123"));
        meta.insert("cover".into(), meta_inlines("img/cover.png"));
        meta.insert(
            "tags".into(),
            json!({"t": "MetaList", "c": [
                {"t": "MetaInlines", "c": [{"t": "Str", "c": "rust"}]},
                {"t": "MetaInlines", "c": [{"t": "Str", "c": "blog"}]},
            ]}),
        );
        meta.insert("draft_round".into(), json!({"t": "MetaString", "c": "2"}));

        let record = metadata(&meta).unwrap();
        assert_eq!(record.cover.as_deref(), Some("img/cover.png"));
        assert_eq!(record.tags, vec!["rust", "blog"]);
        assert!(record.extra.contains_key("draft_round"));
        assert!(!record.extra.contains_key("id"));
    }

    #[test]
    fn scalar_tags_become_a_single_tag() {
        let mut meta = Map::new();
        meta.insert("id".into(), meta_inlines("abc123"));
        meta.insert("tags".into(), meta_inlines("solo"));
        assert_eq!(metadata(&meta).unwrap().tags, vec!["solo"]);
    }
}
