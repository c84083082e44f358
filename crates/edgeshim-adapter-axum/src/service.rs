use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Body as AxumBody;
use axum::http::{Request, Response};
use http::StatusCode;
use tokio::{runtime::Handle, task};
use tower::Service;

use edgeshim_core::assets::AssetHandle;
use edgeshim_core::router::RouterService;

use crate::request::into_core_request;
use crate::response::into_axum_response;

/// Tower service that runs the core router behind Axum/Hyper.
#[derive(Clone)]
pub struct EdgeShimAxumService {
    router: RouterService,
    assets: Option<AssetHandle>,
}

impl EdgeShimAxumService {
    pub fn new(router: RouterService) -> Self {
        Self {
            router,
            assets: None,
        }
    }

    /// Install an asset source into every request so the static-file route can resolve files.
    #[must_use]
    pub fn with_assets(mut self, handle: AssetHandle) -> Self {
        self.assets = Some(handle);
        self
    }
}

impl Service<Request<AxumBody>> for EdgeShimAxumService {
    type Response = Response<AxumBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<AxumBody>) -> Self::Future {
        let router = self.router.clone();
        let assets = self.assets.clone();
        Box::pin(async move {
            let mut core_request = match into_core_request(request).await {
                Ok(req) => req,
                Err(err) => {
                    log::error!("failed to convert request: {err:#}");
                    let mut response = Response::new(AxumBody::from(err.to_string()));
                    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                    return Ok(response);
                }
            };

            if let Some(handle) = assets {
                core_request.extensions_mut().insert(handle);
            }

            // The core router futures are not `Send`; drive them on this worker thread.
            let core_response = task::block_in_place(move || {
                Handle::current().block_on(router.oneshot(core_request))
            });
            Ok(into_axum_response(core_response))
        })
    }
}
