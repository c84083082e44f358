use edgeshim_core::app::App;
use edgeshim_core::assets::AssetHandle;
use edgeshim_core::body::Body;
use edgeshim_core::error::ShimError;
use edgeshim_core::http::{request_builder, Method as CoreMethod, Request, Uri};
use worker::{Env, Error as WorkerError, Method, Request as CfRequest, Response as CfResponse};

use crate::assets::{CloudflareAssetSource, DEFAULT_ASSETS_BINDING};
use crate::response::from_core_response;

/// Convert a Worker request into a core request. The body is read eagerly.
pub async fn into_core_request(mut req: CfRequest) -> Result<Request, ShimError> {
    let method = into_core_method(req.method());
    let url = req
        .url()
        .map_err(|err| ShimError::bad_request(format!("invalid URL: {err}")))?;
    let uri: Uri = url
        .as_str()
        .parse()
        .map_err(|err| ShimError::bad_request(format!("invalid URI: {err}")))?;

    let mut builder = request_builder().method(method).uri(uri);
    for (name, value) in req.headers().entries() {
        builder = builder.header(name.as_str(), value);
    }

    let bytes = req
        .bytes()
        .await
        .map_err(|err| ShimError::internal(anyhow::anyhow!("failed to read body: {err}")))?;

    builder
        .body(Body::from(bytes))
        .map_err(ShimError::internal)
}

pub async fn dispatch(app: &App, req: CfRequest, env: Env) -> Result<CfResponse, WorkerError> {
    dispatch_with_assets(app, req, env, DEFAULT_ASSETS_BINDING).await
}

/// Dispatch with a custom static-assets binding name. A missing binding disables static files.
pub async fn dispatch_with_assets(
    app: &App,
    req: CfRequest,
    env: Env,
    assets_binding: &str,
) -> Result<CfResponse, WorkerError> {
    let assets = match CloudflareAssetSource::from_env(&env, assets_binding) {
        Ok(source) => Some(AssetHandle::with_source(source)),
        Err(err) => {
            log::debug!("static assets unavailable: {err}");
            None
        }
    };

    let mut core_request = into_core_request(req).await.map_err(shim_error_to_worker)?;
    if let Some(handle) = assets {
        core_request.extensions_mut().insert(handle);
    }

    let response = app.router().oneshot(core_request).await;
    from_core_response(response).map_err(shim_error_to_worker)
}

fn shim_error_to_worker(err: ShimError) -> WorkerError {
    WorkerError::RustError(err.to_string())
}

fn into_core_method(method: Method) -> CoreMethod {
    CoreMethod::from_bytes(method.as_ref().as_bytes()).unwrap_or(CoreMethod::GET)
}
