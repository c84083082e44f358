use async_trait::async_trait;
use serde_json::json;

use edgeshim_core::http::StatusCode;
use edgeshim_express::{RouteContext, RouteDescriptor, RouteHandler, RouteMeta};

const CATEGORY: &str = "Inspect";

struct RequestInfo;

#[async_trait(?Send)]
impl RouteHandler for RequestInfo {
    async fn on_start(&self, ctx: RouteContext<'_>) -> anyhow::Result<()> {
        let req = ctx.req;
        ctx.res.json(json!({
            "status": true,
            "result": {
                "method": req.method().as_str(),
                "url": req.url(),
                "protocol": req.protocol(),
                "host": req.host(),
                "ip": req.ip(),
                "originalUrl": req.original_url(),
                "userAgent": req.get("user-agent"),
                "query": req.query(),
                "body": req.body(),
            }
        }));
        Ok(())
    }
}

pub fn request() -> RouteDescriptor {
    RouteDescriptor::new(
        RouteMeta::new("/inspect/request")
            .method("all")
            .name("Request")
            .description("Show the adapted request")
            .category(CATEGORY),
        RequestInfo,
    )
}

struct User;

#[async_trait(?Send)]
impl RouteHandler for User {
    async fn on_start(&self, ctx: RouteContext<'_>) -> anyhow::Result<()> {
        let id = ctx.req.param("id").unwrap_or_default();
        ctx.res.json(json!({ "status": true, "result": { "id": id } }));
        Ok(())
    }
}

pub fn user() -> RouteDescriptor {
    RouteDescriptor::new(
        RouteMeta::new("/inspect/users/:id")
            .name("User")
            .description("Echo a path parameter")
            .category(CATEGORY),
        User,
    )
}

struct Redirect;

#[async_trait(?Send)]
impl RouteHandler for Redirect {
    async fn on_start(&self, ctx: RouteContext<'_>) -> anyhow::Result<()> {
        let target = ctx.req.query_param("to").unwrap_or("/");
        if !is_local_path(target) {
            ctx.res
                .status(StatusCode::BAD_REQUEST)
                .json(json!({ "status": false, "message": "only relative targets are allowed" }));
            return Ok(());
        }
        ctx.res
            .write_head(StatusCode::FOUND, &[("location", target)])
            .end(None);
        Ok(())
    }
}

/// `//host` and `/\host` are protocol-relative in browsers.
fn is_local_path(target: &str) -> bool {
    target.starts_with('/') && !target[1..].starts_with(['/', '\\'])
}

pub fn redirect() -> RouteDescriptor {
    RouteDescriptor::new(
        RouteMeta::new("/inspect/redirect?to=")
            .name("Redirect")
            .description("Redirect to a relative path")
            .category(CATEGORY),
        Redirect,
    )
}
