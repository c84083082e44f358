use std::collections::HashMap;
use std::sync::Arc;

use matchit::Router as PathRouter;
use percent_encoding::percent_decode_str;
use tower_service::Service;

use crate::body::Body;
use crate::context::RequestContext;
use crate::error::ShimError;
use crate::handler::{BoxHandler, DynHandler, IntoHandler};
use crate::http::{HandlerFuture, Method, Request, Response};
use crate::middleware::{BoxMiddleware, Middleware, Next};
use crate::params::PathParams;
use crate::response::IntoResponse;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteInfo {
    method: Method,
    path: String,
}

impl RouteInfo {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

#[derive(Default)]
pub struct RouterBuilder {
    routes: HashMap<Method, PathRouter<BoxHandler>>,
    middlewares: Vec<BoxMiddleware>,
    route_info: Vec<RouteInfo>,
    fallback: Option<BoxHandler>,
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route, panicking on a duplicate definition.
    pub fn route<H>(mut self, path: &str, method: Method, handler: H) -> Self
    where
        H: IntoHandler,
    {
        self.try_route(path, method, handler)
            .unwrap_or_else(|err| panic!("{err}"));
        self
    }

    /// Register a route, reporting conflicts instead of panicking. The first registration for a
    /// method and path stays in place.
    pub fn try_route<H>(&mut self, path: &str, method: Method, handler: H) -> Result<(), ShimError>
    where
        H: IntoHandler,
    {
        let router = self.routes.entry(method.clone()).or_default();
        router
            .insert(path, handler.into_handler())
            .map_err(|_| ShimError::route_conflict(method.as_str(), path))?;
        self.route_info.push(RouteInfo::new(method, path));
        Ok(())
    }

    pub fn get<H>(self, path: &str, handler: H) -> Self
    where
        H: IntoHandler,
    {
        self.route(path, Method::GET, handler)
    }

    pub fn post<H>(self, path: &str, handler: H) -> Self
    where
        H: IntoHandler,
    {
        self.route(path, Method::POST, handler)
    }

    /// Handler invoked for requests that match no route.
    pub fn fallback<H>(mut self, handler: H) -> Self
    where
        H: IntoHandler,
    {
        self.fallback = Some(handler.into_handler());
        self
    }

    pub fn middleware<M>(mut self, middleware: M) -> Self
    where
        M: Middleware,
    {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    pub fn build(self) -> RouterService {
        RouterService {
            inner: Arc::new(RouterInner {
                routes: self.routes,
                middlewares: self.middlewares,
                route_index: self.route_info,
                fallback: self.fallback,
            }),
        }
    }
}

#[derive(Clone)]
pub struct RouterService {
    inner: Arc<RouterInner>,
}

impl RouterService {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// Registered routes in registration order.
    pub fn routes(&self) -> &[RouteInfo] {
        &self.inner.route_index
    }

    /// Dispatch a request, rendering any error into its response form.
    pub async fn oneshot(&self, request: Request) -> Response {
        match self.inner.dispatch(request).await {
            Ok(response) => response,
            Err(err) => err.into_response(),
        }
    }
}

struct RouterInner {
    routes: HashMap<Method, PathRouter<BoxHandler>>,
    middlewares: Vec<BoxMiddleware>,
    route_index: Vec<RouteInfo>,
    fallback: Option<BoxHandler>,
}

struct RouteMatch<'a> {
    handler: &'a dyn DynHandler,
    params: PathParams,
    strip_body: bool,
}

impl RouterInner {
    async fn dispatch(&self, request: Request) -> Result<Response, ShimError> {
        let path = request.uri().path().to_string();

        match self.find_route(request.method(), &path) {
            Some(matched) => {
                let ctx = RequestContext::new(request, matched.params);
                let next = Next::new(&self.middlewares, matched.handler);
                let mut response = next.run(ctx).await?;
                if matched.strip_body {
                    *response.body_mut() = Body::empty();
                }
                Ok(response)
            }
            None => match &self.fallback {
                Some(fallback) => {
                    let ctx = RequestContext::new(request, PathParams::default());
                    Next::new(&self.middlewares, fallback.as_ref()).run(ctx).await
                }
                None => Err(ShimError::not_found(path)),
            },
        }
    }

    fn find_route(&self, method: &Method, path: &str) -> Option<RouteMatch<'_>> {
        if let Some(matched) = self.lookup(method, path) {
            return Some(matched);
        }

        // HEAD is served by the GET route with the body discarded.
        if *method == Method::HEAD {
            return self.lookup(&Method::GET, path).map(|matched| RouteMatch {
                strip_body: true,
                ..matched
            });
        }

        None
    }

    fn lookup(&self, method: &Method, path: &str) -> Option<RouteMatch<'_>> {
        let router = self.routes.get(method)?;
        let matched = router.at(path).ok()?;
        let params = matched
            .params
            .iter()
            .map(|(k, v)| (k.to_string(), decode_param(v)))
            .collect();
        Some(RouteMatch {
            handler: matched.value.as_ref(),
            params,
            strip_body: false,
        })
    }
}

/// Percent-decode a captured segment, keeping the raw text when the bytes are not UTF-8.
fn decode_param(raw: &str) -> String {
    match percent_decode_str(raw).decode_utf8() {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw.to_string(),
    }
}

impl Service<Request> for RouterService {
    type Response = Response;
    type Error = ShimError;
    type Future = HandlerFuture;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move { inner.dispatch(request).await })
    }
}
