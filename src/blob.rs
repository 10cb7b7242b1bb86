//! In-memory registry of encoded results, addressed by `blob:` handles.
//!
//! A result stays registered until it is revoked; dropping the
//! [`ConversionResult`](crate::ConversionResult) does not release it.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub const BLOB_SCHEME: &str = "blob:";
const BLOB_PREFIX: &str = "blob:sprite-gif/";

/// Immutable byte payload with an optional MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    data: Arc<[u8]>,
    mime: Option<String>,
}

impl Blob {
    pub fn new(data: impl Into<Arc<[u8]>>, mime: Option<&str>) -> Self {
        Self {
            data: data.into(),
            mime: mime.map(str::to_owned),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn mime(&self) -> Option<&str> {
        self.mime.as_deref()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// String handle of a registered [`Blob`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobUrl(String);

impl BlobUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlobUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for BlobUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Shared, thread-safe blob registry. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct BlobStore {
    entries: Arc<Mutex<HashMap<String, Blob>>>,
}

impl BlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `blob` under a fresh handle.
    pub fn insert(&self, blob: Blob) -> BlobUrl {
        let url = format!("{}{}", BLOB_PREFIX, uuid::Uuid::new_v4());
        log::debug!("Registered {} ({} bytes)", url, blob.len());
        self.entries.lock().insert(url.clone(), blob);
        BlobUrl(url)
    }

    pub fn get(&self, url: &str) -> Option<Blob> {
        self.entries.lock().get(url).cloned()
    }

    /// Release a handle. Returns `false` if it was unknown or already revoked.
    pub fn revoke(&self, url: &BlobUrl) -> bool {
        let removed = self.entries.lock().remove(url.as_str()).is_some();
        if removed {
            log::debug!("Revoked {}", url);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
