//! Static asset lookup shared by every runtime.
//!
//! Adapters install an [`AssetHandle`] into request extensions; the static-file handler resolves
//! the request path through it and falls through to the 404 handler when nothing matches.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::ShimError;
use crate::mime;

pub const INDEX_FILE: &str = "index.html";

/// A resolved static file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Asset {
    pub bytes: Bytes,
    pub content_type: &'static str,
}

impl Asset {
    /// Build an asset, deriving the content type from `path`.
    pub fn for_path(path: &str, bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: mime::content_type_for(path),
        }
    }
}

/// Object-safe interface for asset backends (filesystem, worker asset bindings, ...).
#[async_trait(?Send)]
pub trait AssetSource: Send + Sync {
    /// Resolve a normalised relative path such as `css/site.css`. `Ok(None)` means not found.
    async fn fetch(&self, path: &str) -> Result<Option<Asset>, ShimError>;
}

#[derive(Clone)]
pub struct AssetHandle {
    source: Arc<dyn AssetSource>,
}

impl fmt::Debug for AssetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetHandle").finish_non_exhaustive()
    }
}

impl AssetHandle {
    pub fn new(source: Arc<dyn AssetSource>) -> Self {
        Self { source }
    }

    pub fn with_source<S>(source: S) -> Self
    where
        S: AssetSource + 'static,
    {
        Self::new(Arc::new(source))
    }

    /// Look up the asset for a request path. Unsafe or malformed paths resolve to `None`.
    pub async fn lookup(&self, request_path: &str) -> Result<Option<Asset>, ShimError> {
        match normalize_asset_path(request_path) {
            Some(path) => self.source.fetch(&path).await,
            None => Ok(None),
        }
    }
}

/// Map a request path onto a relative asset path.
///
/// Directory paths (ending in `/`) resolve to their `index.html`. Paths containing `..`, `.`,
/// empty interior segments or backslashes are rejected.
pub fn normalize_asset_path(request_path: &str) -> Option<String> {
    let trimmed = request_path.strip_prefix('/').unwrap_or(request_path);
    let mut path = trimmed.to_string();
    if path.is_empty() || path.ends_with('/') {
        path.push_str(INDEX_FILE);
    }

    let safe = path.split('/').all(|segment| {
        !segment.is_empty() && segment != "." && segment != ".." && !segment.contains('\\')
    });
    safe.then_some(path)
}
