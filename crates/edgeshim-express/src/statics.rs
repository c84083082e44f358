use edgeshim_core::body::Body;
use edgeshim_core::context::RequestContext;
use edgeshim_core::error::ShimError;
use edgeshim_core::http::{
    header::{CONTENT_LENGTH, CONTENT_TYPE},
    HeaderValue, Response, StatusCode,
};

/// Serve the static asset for the request path through the installed [`AssetHandle`].
///
/// Misses, a missing handle and backend failures all fall through to the 404 response.
///
/// [`AssetHandle`]: edgeshim_core::assets::AssetHandle
pub async fn serve_static(ctx: RequestContext) -> Result<Response, ShimError> {
    let path = ctx.request().uri().path().to_string();
    let Some(assets) = ctx.asset_handle() else {
        log::debug!("no asset source installed; {path} falls through");
        return Err(ShimError::not_found(path));
    };

    let asset = match assets.lookup(&path).await {
        Ok(Some(asset)) => asset,
        Ok(None) => return Err(ShimError::not_found(path)),
        Err(err) => {
            log::warn!("asset lookup for {path} failed: {err}");
            return Err(ShimError::not_found(path));
        }
    };

    let length = asset.bytes.len();
    let mut response = Response::new(Body::from_bytes(asset.bytes));
    *response.status_mut() = StatusCode::OK;
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(asset.content_type));
    headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
    Ok(response)
}

pub async fn not_found(ctx: RequestContext) -> Result<Response, ShimError> {
    Err(ShimError::not_found(ctx.request().uri().path()))
}
