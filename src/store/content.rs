//! The hash-lookup object store: content-addressed, deduplicating.
//!
//! Objects live in a local store directory, one subdirectory per content
//! digest, holding the image bytes plus a `meta.json` sidecar. An upload
//! first hashes the stream (seeking back afterwards) and only writes when no
//! object with that digest exists — at most one physical copy per unique
//! content, however many documents reference it. The public reference is
//! `<base_url>/<digest>/`, served by whatever fronts the store directory.

use crate::error::StoreError;
use crate::store::{content_type_for, for_each_chunk, read_all, ImageStore, ReadSeek, UploadRef};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Sidecar metadata written next to each stored object.
#[derive(Debug, Serialize, Deserialize)]
struct ObjectMeta {
    digest: String,
    filename: String,
    content_type: String,
}

/// Content-addressed store rooted at a local directory.
pub struct ContentStore {
    root: PathBuf,
    base_url: String,
}

impl ContentStore {
    /// `root` is the object directory; `base_url` the public prefix
    /// references are built from.
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
        }
    }

    /// 128-bit content digest: the first 16 bytes of BLAKE3, hex-encoded.
    /// Leaves the stream position where it found it.
    fn digest(file: &mut dyn ReadSeek) -> Result<String, StoreError> {
        let mut hasher = blake3::Hasher::new();
        for_each_chunk(file, |chunk| {
            hasher.update(chunk);
        })?;
        Ok(hex::encode(&hasher.finalize().as_bytes()[..16]))
    }

    fn object_url(&self, digest: &str) -> String {
        format!("{}/{}/", self.base_url.trim_end_matches('/'), digest)
    }
}

impl ImageStore for ContentStore {
    fn upload(&mut self, name: &str, file: &mut dyn ReadSeek) -> Result<UploadRef, StoreError> {
        let digest = Self::digest(file)?;
        let object_dir = self.root.join(&digest);

        if object_dir.is_dir() {
            debug!(%digest, "object already stored, reusing reference");
            return Ok(UploadRef {
                url: self.object_url(&digest),
                digest,
            });
        }

        let filename = Path::new(name)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(name)
            .to_string();
        let bytes = read_all(file)?;

        // Stage into a temp directory and rename, so a crash mid-write never
        // leaves a half-populated digest directory that later uploads would
        // mistake for the real object.
        let staging = self.root.join(format!(".tmp-{digest}"));
        fs::create_dir_all(&staging)?;
        fs::write(staging.join(&filename), &bytes)?;
        let meta = ObjectMeta {
            digest: digest.clone(),
            filename,
            content_type: content_type_for(name).to_string(),
        };
        fs::write(
            staging.join("meta.json"),
            serde_json::to_vec_pretty(&meta).map_err(std::io::Error::from)?,
        )?;
        fs::rename(&staging, &object_dir)?;

        debug!(%digest, bytes = bytes.len(), "stored new object");
        Ok(UploadRef {
            url: self.object_url(&digest),
            digest,
        })
    }

    fn remove(&mut self, path: &Path) -> Result<(), StoreError> {
        let mut file = fs::File::open(path)?;
        let digest = Self::digest(&mut file)?;
        let object_dir = self.root.join(&digest);
        if object_dir.is_dir() {
            fs::remove_dir_all(&object_dir)?;
            debug!(%digest, "removed object");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Seek, SeekFrom};
    use tempfile::TempDir;

    fn store(root: &TempDir) -> ContentStore {
        ContentStore::new(root.path(), "https://img.example.net/images")
    }

    fn object_dirs(root: &TempDir) -> usize {
        fs::read_dir(root.path()).unwrap().count()
    }

    #[test]
    fn identical_content_uploads_once() {
        let root = TempDir::new().unwrap();
        let mut s = store(&root);

        let first = s
            .upload("cat.png", &mut Cursor::new(b"pixels".to_vec()))
            .unwrap();
        // Same bytes under a different name still dedup to the same object.
        let second = s
            .upload("copy-of-cat.png", &mut Cursor::new(b"pixels".to_vec()))
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(object_dirs(&root), 1, "one physical copy");
        assert!(first.url.starts_with("https://img.example.net/images/"));
        assert!(first.url.ends_with('/'));
    }

    #[test]
    fn distinct_content_never_collides() {
        let root = TempDir::new().unwrap();
        let mut s = store(&root);

        let a = s.upload("a.png", &mut Cursor::new(b"aaa".to_vec())).unwrap();
        let b = s.upload("b.png", &mut Cursor::new(b"bbb".to_vec())).unwrap();

        assert_ne!(a.digest, b.digest);
        assert_ne!(a.url, b.url);
        assert_eq!(object_dirs(&root), 2);
    }

    #[test]
    fn dedup_hit_leaves_stream_position_alone() {
        let root = TempDir::new().unwrap();
        let mut s = store(&root);
        s.upload("cat.png", &mut Cursor::new(b"pixels".to_vec()))
            .unwrap();

        let mut cur = Cursor::new(b"pixels".to_vec());
        cur.seek(SeekFrom::Start(0)).unwrap();
        s.upload("cat.png", &mut cur).unwrap();
        assert_eq!(cur.stream_position().unwrap(), 0);
    }

    #[test]
    fn sidecar_records_content_type() {
        let root = TempDir::new().unwrap();
        let mut s = store(&root);
        let re = s
            .upload("cat.png", &mut Cursor::new(b"pixels".to_vec()))
            .unwrap();

        let sidecar = root.path().join(&re.digest).join("meta.json");
        let meta: ObjectMeta =
            serde_json::from_slice(&fs::read(sidecar).unwrap()).unwrap();
        assert_eq!(meta.content_type, "image/png");
        assert_eq!(meta.filename, "cat.png");
        assert_eq!(meta.digest, re.digest);
    }

    #[test]
    fn remove_deletes_the_object() {
        let root = TempDir::new().unwrap();
        let mut s = store(&root);
        s.upload("cat.png", &mut Cursor::new(b"pixels".to_vec()))
            .unwrap();

        // remove() hashes the local file to find the object.
        let local = TempDir::new().unwrap();
        let local_file = local.path().join("cat.png");
        fs::write(&local_file, b"pixels").unwrap();

        s.remove(&local_file).unwrap();
        assert_eq!(object_dirs(&root), 0);
    }
}
