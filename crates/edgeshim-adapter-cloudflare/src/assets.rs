use async_trait::async_trait;

use edgeshim_core::assets::{Asset, AssetSource};
use edgeshim_core::error::ShimError;
use worker::{Env, Fetcher};

/// Binding name of the Workers static-assets directory in `wrangler.toml`.
pub const DEFAULT_ASSETS_BINDING: &str = "ASSETS";

const ASSET_ORIGIN: &str = "https://assets.local";

/// Static files served through the Workers assets binding.
pub struct CloudflareAssetSource {
    fetcher: Fetcher,
}

impl CloudflareAssetSource {
    pub fn from_env(env: &Env, binding: &str) -> Result<Self, ShimError> {
        let fetcher = env.assets(binding).map_err(|err| {
            ShimError::internal(anyhow::anyhow!("failed to open assets binding {binding}: {err}"))
        })?;
        Ok(Self { fetcher })
    }
}

#[async_trait(?Send)]
impl AssetSource for CloudflareAssetSource {
    async fn fetch(&self, path: &str) -> Result<Option<Asset>, ShimError> {
        let url = format!("{ASSET_ORIGIN}/{path}");
        let mut response = self
            .fetcher
            .fetch(url, None)
            .await
            .map_err(|err| ShimError::internal(anyhow::anyhow!("asset fetch failed: {err}")))?;

        match response.status_code() {
            200..=299 => {
                let bytes = response.bytes().await.map_err(|err| {
                    ShimError::internal(anyhow::anyhow!("asset body read failed: {err}"))
                })?;
                Ok(Some(Asset::for_path(path, bytes)))
            }
            404 => Ok(None),
            status => {
                log::warn!("assets binding answered {status} for {path}");
                Ok(None)
            }
        }
    }
}
