//! FileDocumentStore - one JSON file per document under `<root>/<bucket>/`.
//!
//! Bucket names and ids come from the feed, so both are encoded into a
//! single path component before touching the filesystem.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use tokio::fs;

use crate::domain::{PostSnapshot, ReplySnapshot};
use crate::error::StoreError;
use crate::ports::DocumentStore;

/// Encode `raw` as one file-name component.
///
/// Alphanumerics, `-` and `_` pass through, `.` too unless it is the first
/// character; everything else (including `%`) becomes `%XX` per UTF-8 byte.
/// Distinct inputs always give distinct names.
pub fn path_component(raw: &str) -> String {
    if raw.is_empty() {
        return "%".to_string();
    }
    let mut out = String::with_capacity(raw.len());
    for (i, c) in raw.chars().enumerate() {
        let keep = c.is_alphanumeric() || c == '-' || c == '_' || (c == '.' && i > 0);
        if keep {
            out.push(c);
        } else {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                let _ = write!(out, "%{byte:02X}");
            }
        }
    }
    out
}

pub struct FileDocumentStore {
    root: PathBuf,
}

impl FileDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn bucket_dir(&self, bucket: &str) -> PathBuf {
        self.root.join(path_component(bucket))
    }

    /// Where the document `id` of `bucket` is stored. Always inside the root.
    pub fn document_path(&self, bucket: &str, id: &str) -> PathBuf {
        self.bucket_dir(bucket)
            .join(format!("{}.json", path_component(id)))
    }

    /// Write `doc` atomically. Returns `true` if the file did not exist.
    async fn upsert<T: Serialize>(&self, bucket: &str, id: &str, doc: &T) -> Result<bool, StoreError> {
        let dir = self.bucket_dir(bucket);
        fs::create_dir_all(&dir).await?;

        let path = self.document_path(bucket, id);
        let existed = fs::try_exists(&path).await?;
        let bytes = serde_json::to_vec_pretty(doc)?;

        // unique temp file per write, renamed over the target
        let tmp = tempfile::Builder::new()
            .prefix(".")
            .suffix(".tmp")
            .tempfile_in(&dir)?
            .into_temp_path();
        fs::write(&tmp, bytes).await?;
        persist(tmp, &path)?;

        Ok(!existed)
    }
}

fn persist(tmp: tempfile::TempPath, path: &Path) -> Result<(), StoreError> {
    tmp.persist(path).map_err(|e| StoreError::Io(e.error))
}

#[async_trait]
impl DocumentStore for FileDocumentStore {
    async fn save_post(&self, post: &PostSnapshot) -> Result<bool, StoreError> {
        self.upsert(&post.bucket(), post.id.as_str(), post).await
    }

    async fn save_reply(&self, reply: &ReplySnapshot) -> Result<(), StoreError> {
        self.upsert(&reply.bucket(), reply.id.as_str(), reply).await?;
        Ok(())
    }
}
