use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;

use edgeshim_core::context::RequestContext;
use edgeshim_core::error::ShimError;
use edgeshim_core::http::Response;
use edgeshim_core::router::RouterBuilder;
use edgeshim_core::settings::Settings;

use crate::operator::OperatorJson;
use crate::request::adapt_request;
use crate::response::ResponseBuilder;
use crate::route::{RouteContext, RouteDescriptor, RouteHandler};

pub const API_PREFIX: &str = "/api";

/// Translate a declared route path (`/users/:id`, `/files/*`) into router syntax under the API
/// prefix (`/api/users/{id}`, `/api/files/{*rest}`).
pub fn to_router_path(route_path: &str) -> String {
    let mut path = String::from(API_PREFIX);
    for segment in route_path.split('/').filter(|segment| !segment.is_empty()) {
        path.push('/');
        if let Some(name) = segment.strip_prefix(':') {
            path.push('{');
            path.push_str(name);
            path.push('}');
        } else if segment == "*" {
            path.push_str("{*rest}");
        } else {
            path.push_str(segment);
        }
    }
    if route_path.ends_with('/') {
        path.push('/');
    }
    path
}

/// Mount every complete descriptor onto `builder`.
///
/// Descriptors missing metadata or a handler are skipped. When two descriptors claim the same
/// method and path, the first one registered keeps it.
pub fn register_routes(
    builder: &mut RouterBuilder,
    routes: &Arc<[RouteDescriptor]>,
    settings: &Settings,
) {
    let operator: Arc<str> = Arc::from(settings.operator());

    for descriptor in routes.iter() {
        let (Some(meta), Some(handler)) = (descriptor.meta(), descriptor.handler()) else {
            log::warn!("skipping incomplete route descriptor: {descriptor:?}");
            continue;
        };

        let path = to_router_path(meta.route_path());
        for method in meta.methods() {
            let handler = Arc::clone(handler);
            let operator = Arc::clone(&operator);
            let route = move |ctx: RequestContext| {
                let handler = Arc::clone(&handler);
                let operator = Arc::clone(&operator);
                async move { run_route(handler, operator, ctx).await }
            };

            match builder.try_route(&path, method.clone(), route) {
                Ok(()) => log::info!("registering {} {}", method, path),
                Err(err) => log::warn!("skipping route: {err}"),
            }
        }
    }
}

async fn run_route(
    handler: Arc<dyn RouteHandler>,
    operator: Arc<str>,
    ctx: RequestContext,
) -> Result<Response, ShimError> {
    let method = ctx.request().method().clone();
    let path = ctx.request().uri().path().to_string();
    let req = adapt_request(ctx).await;
    let mut res = OperatorJson::new(ResponseBuilder::new(), operator.as_ref());

    let outcome = AssertUnwindSafe(handler.on_start(RouteContext {
        req: &req,
        res: &mut res,
    }))
    .catch_unwind()
    .await;

    let message = match outcome {
        Ok(Ok(())) => return Ok(res.into_inner().into_response()),
        Ok(Err(err)) => err.to_string(),
        Err(panic) => panic_message(panic.as_ref()),
    };
    log::error!("route handler failed method={method} path={path}: {message}");
    Err(ShimError::handler_failed(message))
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "route handler panicked".to_string()
    }
}
