use std::sync::Arc;

use edgeshim_core::context::RequestContext;
use edgeshim_core::error::ShimError;
use edgeshim_core::http::Method;
use edgeshim_core::middleware::RequestLogger;
use edgeshim_core::response::Json;
use edgeshim_core::router::RouterService;
use edgeshim_core::settings::Settings;

use crate::dispatch::{register_routes, API_PREFIX};
use crate::info::{api_info, ApiInfo};
use crate::route::RouteDescriptor;
use crate::statics::{not_found, serve_static};

/// Build the complete router: descriptor routes under `/api`, then `GET /api/info`, then
/// static files, then the plain-text 404 fallback.
pub fn mount(routes: Vec<RouteDescriptor>, settings: Arc<Settings>) -> RouterService {
    let routes: Arc<[RouteDescriptor]> = Arc::from(routes);
    let mut builder = RouterService::builder().middleware(RequestLogger);

    register_routes(&mut builder, &routes, &settings);

    let info = Arc::new(api_info(&routes));
    let info_path = format!("{API_PREFIX}/info");
    let info_handler = move |_ctx: RequestContext| {
        let info = Arc::clone(&info);
        async move { Ok::<Json<ApiInfo>, ShimError>(Json(ApiInfo::clone(&info))) }
    };
    if let Err(err) = builder.try_route(&info_path, Method::GET, info_handler) {
        log::warn!("route descriptor shadows the info endpoint: {err}");
    }

    builder
        .get("/", serve_static)
        .get("/{*path}", serve_static)
        .fallback(not_found)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::{RouteContext, RouteHandler, RouteMeta};
    use async_trait::async_trait;
    use edgeshim_core::body::Body;
    use edgeshim_core::http::{header::CONTENT_TYPE, request_builder, Response, StatusCode};
    use futures::executor::block_on;
    use serde_json::{json, Value};

    struct Ping;

    #[async_trait(?Send)]
    impl RouteHandler for Ping {
        async fn on_start(&self, ctx: RouteContext<'_>) -> anyhow::Result<()> {
            ctx.res.json(json!({ "status": true, "result": "pong" }));
            Ok(())
        }
    }

    fn app() -> RouterService {
        let routes = vec![RouteDescriptor::new(
            RouteMeta::new("/tools/ping").name("Ping").category("Tools"),
            Ping,
        )];
        mount(routes, Arc::new(Settings::default()))
    }

    fn get(service: &RouterService, uri: &str) -> Response {
        let request = request_builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .expect("request");
        block_on(service.oneshot(request))
    }

    fn json_of(response: &Response) -> Value {
        serde_json::from_slice(response.body().as_bytes().expect("buffered")).expect("json")
    }

    #[test]
    fn routes_use_default_operator() {
        let response = get(&app(), "http://localhost/api/tools/ping");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_of(&response),
            json!({ "status": true, "operator": "Created Using Rynn UI", "result": "pong" })
        );
    }

    #[test]
    fn info_lists_routes() {
        let response = get(&app(), "http://localhost/api/info");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(
            json_of(&response),
            json!({
                "categories": [{
                    "name": "Tools",
                    "items": [{ "name": "Ping", "path": "/api/tools/ping", "method": "get" }]
                }]
            })
        );
    }

    #[test]
    fn unmatched_paths_are_plain_404() {
        let service = app();
        for (method, uri) in [
            (Method::GET, "http://localhost/nothing/here"),
            (Method::GET, "http://localhost/"),
            (Method::POST, "http://localhost/api/tools/ping"),
        ] {
            let request = request_builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .expect("request");
            let response = block_on(service.oneshot(request));
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
            assert_eq!(response.body().as_bytes(), Some(&b"404 Not Found"[..]));
        }
    }

    #[test]
    fn descriptor_for_info_path_wins_over_info_endpoint() {
        let routes = vec![RouteDescriptor::new(RouteMeta::new("/info"), Ping)];
        let service = mount(routes, Arc::new(Settings::default()));
        let response = get(&service, "http://localhost/api/info");
        assert_eq!(json_of(&response)["result"], "pong");
    }
}
