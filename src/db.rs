//! Post persistence boundary.
//!
//! The pipeline does not own storage; it hands finished records to a
//! [`PostStore`] keyed by post id. [`DirStore`] is the bundled
//! implementation — a directory of `<id>.json` documents — enough to run
//! the CLI end-to-end; a database-backed store slots in behind the same
//! trait.

use crate::post::Post;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The consumed persistence interface: upsert, partial update, delete,
/// all keyed by the post identifier.
pub trait PostStore {
    /// Insert or replace the record stored under `post.id`.
    fn replace(&mut self, post: &Post) -> io::Result<()>;

    /// Update only the published flag of an existing record.
    fn set_published(&mut self, id: &str, published: bool) -> io::Result<()>;

    /// Delete the record under `id`. Deleting a missing record succeeds.
    fn delete(&mut self, id: &str) -> io::Result<()>;
}

/// A directory of JSON documents, one per post.
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    /// Open (creating if needed) the store directory.
    pub fn open(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Ids come from author-controlled front matter; refuse anything that
    /// would escape the store directory.
    fn document_path(&self, id: &str) -> io::Result<PathBuf> {
        if id.is_empty()
            || id.contains(['/', '\\'])
            || id == "."
            || id == ".."
            || Path::new(id).components().count() != 1
        {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid post id: '{id}'"),
            ));
        }
        Ok(self.root.join(format!("{id}.json")))
    }

    fn write_document(&self, path: &Path, value: &impl serde::Serialize) -> io::Result<()> {
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(value)?)?;
        fs::rename(&tmp, path)
    }
}

impl PostStore for DirStore {
    fn replace(&mut self, post: &Post) -> io::Result<()> {
        let path = self.document_path(&post.id)?;
        self.write_document(&path, post)?;
        debug!(id = %post.id, "stored post");
        Ok(())
    }

    fn set_published(&mut self, id: &str, published: bool) -> io::Result<()> {
        let path = self.document_path(id)?;
        let mut doc: serde_json::Value = serde_json::from_slice(&fs::read(&path)?)?;
        doc["published"] = serde_json::Value::Bool(published);
        self.write_document(&path, &doc)?;
        debug!(%id, published, "updated published flag");
        Ok(())
    }

    fn delete(&mut self, id: &str) -> io::Result<()> {
        let path = self.document_path(id)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(%id, "deleted post");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    fn sample(id: &str) -> Post {
        Post {
            id: id.into(),
            title: "T".into(),
            created: Utc::now(),
            updated: Utc::now(),
            body: "body\n".into(),
            published: false,
            cover: None,
            tags: vec!["t".into()],
        }
    }

    #[test]
    fn replace_then_read_back() {
        let dir = TempDir::new().unwrap();
        let mut store = DirStore::open(dir.path()).unwrap();
        store.replace(&sample("abc123")).unwrap();

        let raw = fs::read(dir.path().join("abc123.json")).unwrap();
        let doc: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(doc["_id"], "abc123");
        assert_eq!(doc["published"], false);
    }

    #[test]
    fn replace_is_an_upsert() {
        let dir = TempDir::new().unwrap();
        let mut store = DirStore::open(dir.path()).unwrap();
        store.replace(&sample("abc123")).unwrap();

        let mut updated = sample("abc123");
        updated.title = "T2".into();
        store.replace(&updated).unwrap();

        let doc: serde_json::Value =
            serde_json::from_slice(&fs::read(dir.path().join("abc123.json")).unwrap()).unwrap();
        assert_eq!(doc["title"], "T2");
    }

    #[test]
    fn set_published_touches_only_the_flag() {
        let dir = TempDir::new().unwrap();
        let mut store = DirStore::open(dir.path()).unwrap();
        store.replace(&sample("abc123")).unwrap();

        store.set_published("abc123", true).unwrap();

        let doc: serde_json::Value =
            serde_json::from_slice(&fs::read(dir.path().join("abc123.json")).unwrap()).unwrap();
        assert_eq!(doc["published"], true);
        assert_eq!(doc["title"], "T");
    }

    #[test]
    fn delete_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let mut store = DirStore::open(dir.path()).unwrap();
        store.replace(&sample("abc123")).unwrap();

        store.delete("abc123").unwrap();
        store.delete("abc123").unwrap();
        assert!(!dir.path().join("abc123.json").exists());
    }

    #[test]
    fn hostile_ids_are_rejected() {
        let dir = TempDir::new().unwrap();
        let mut store = DirStore::open(dir.path()).unwrap();
        for id in ["../escape", "a/b", "", ".."] {
            assert!(store.delete(id).is_err(), "id {id:?} should be rejected");
        }
    }
}
