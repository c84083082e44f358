//! Adapter helpers for Cloudflare Workers.

#[cfg(all(feature = "cloudflare", target_arch = "wasm32"))]
mod assets;
#[cfg(all(feature = "cloudflare", target_arch = "wasm32"))]
mod request;
#[cfg(all(feature = "cloudflare", target_arch = "wasm32"))]
mod response;

#[cfg(all(feature = "cloudflare", target_arch = "wasm32"))]
pub use assets::{CloudflareAssetSource, DEFAULT_ASSETS_BINDING};
#[cfg(all(feature = "cloudflare", target_arch = "wasm32"))]
pub use request::{dispatch, dispatch_with_assets, into_core_request};
#[cfg(all(feature = "cloudflare", target_arch = "wasm32"))]
pub use response::from_core_response;

/// Workers forward `console` output themselves; there is no logger to install.
pub fn init_logger() -> Result<(), log::SetLoggerError> {
    Ok(())
}

#[cfg(all(feature = "cloudflare", target_arch = "wasm32"))]
pub async fn run_app<A: edgeshim_core::app::Hooks>(
    req: worker::Request,
    env: worker::Env,
    _ctx: worker::Context,
) -> Result<worker::Response, worker::Error> {
    init_logger().map_err(|err| worker::Error::RustError(err.to_string()))?;
    let app = A::build_app();
    dispatch(&app, req, env).await
}
