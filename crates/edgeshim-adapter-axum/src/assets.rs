use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use async_trait::async_trait;

use edgeshim_core::assets::{Asset, AssetSource};
use edgeshim_core::error::ShimError;

/// Serves static files from a directory on disk. Lookups never leave the root, even through
/// symlinks.
#[derive(Clone, Debug)]
pub struct DirAssetSource {
    root: PathBuf,
}

impl DirAssetSource {
    /// Resolve `root` once; fails when the directory does not exist.
    pub fn new(root: impl AsRef<Path>) -> anyhow::Result<Self> {
        let root = root.as_ref();
        let root = root
            .canonicalize()
            .with_context(|| format!("static root {} is not accessible", root.display()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait(?Send)]
impl AssetSource for DirAssetSource {
    async fn fetch(&self, path: &str) -> Result<Option<Asset>, ShimError> {
        let candidate = match tokio::fs::canonicalize(self.root.join(path)).await {
            Ok(candidate) => candidate,
            Err(err) if is_missing(&err) => return Ok(None),
            Err(err) => return Err(ShimError::internal(err)),
        };

        if !candidate.starts_with(&self.root) {
            log::warn!("refusing asset outside static root: {}", candidate.display());
            return Ok(None);
        }

        let metadata = tokio::fs::metadata(&candidate)
            .await
            .map_err(ShimError::internal)?;
        if !metadata.is_file() {
            return Ok(None);
        }

        match tokio::fs::read(&candidate).await {
            Ok(bytes) => Ok(Some(Asset::for_path(path, bytes))),
            Err(err) if is_missing(&err) => Ok(None),
            Err(err) => Err(ShimError::internal(err)),
        }
    }
}

fn is_missing(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}
