use async_trait::async_trait;
use serde_json::json;

use edgeshim_core::http::StatusCode;
use edgeshim_express::{RouteContext, RouteDescriptor, RouteHandler, RouteMeta};

const CATEGORY: &str = "Tools";
const AUTHOR: &str = "EdgeShim Team";

fn meta(path: &str, name: &str, description: &str) -> RouteMeta {
    RouteMeta::new(path)
        .name(name)
        .description(description)
        .author(AUTHOR)
        .category(CATEGORY)
}

struct Ping;

#[async_trait(?Send)]
impl RouteHandler for Ping {
    async fn on_start(&self, ctx: RouteContext<'_>) -> anyhow::Result<()> {
        ctx.res.json(json!({ "status": true, "result": "pong" }));
        Ok(())
    }
}

pub fn ping() -> RouteDescriptor {
    RouteDescriptor::new(meta("/tools/ping", "Ping", "Health check"), Ping)
}

struct Echo;

#[async_trait(?Send)]
impl RouteHandler for Echo {
    async fn on_start(&self, ctx: RouteContext<'_>) -> anyhow::Result<()> {
        match ctx.req.query_param("text") {
            Some(text) if !text.is_empty() => {
                ctx.res.json(json!({ "status": true, "result": text }));
            }
            _ => {
                ctx.res
                    .status(StatusCode::BAD_REQUEST)
                    .json(json!({ "status": false, "message": "text is required" }));
            }
        }
        Ok(())
    }
}

pub fn echo() -> RouteDescriptor {
    RouteDescriptor::new(
        meta("/tools/echo?text=", "Echo", "Repeat the text query parameter"),
        Echo,
    )
}

struct Reverse;

#[async_trait(?Send)]
impl RouteHandler for Reverse {
    async fn on_start(&self, ctx: RouteContext<'_>) -> anyhow::Result<()> {
        let Some(text) = ctx.req.body_field("text").and_then(|value| value.as_str()) else {
            ctx.res
                .status(StatusCode::BAD_REQUEST)
                .json(json!({ "status": false, "message": "body field text is required" }));
            return Ok(());
        };

        let reversed: String = text.chars().rev().collect();
        ctx.res.json(json!({ "status": true, "result": reversed }));
        Ok(())
    }
}

pub fn reverse() -> RouteDescriptor {
    RouteDescriptor::new(
        meta("/tools/reverse", "Reverse", "Reverse the text field of a JSON or form body")
            .method("post"),
        Reverse,
    )
}

struct Divide;

#[async_trait(?Send)]
impl RouteHandler for Divide {
    async fn on_start(&self, ctx: RouteContext<'_>) -> anyhow::Result<()> {
        let operand = |name: &str| -> anyhow::Result<f64> {
            let raw = ctx
                .req
                .query_param(name)
                .ok_or_else(|| anyhow::anyhow!("missing operand {name}"))?;
            raw.parse()
                .map_err(|_| anyhow::anyhow!("operand {name} is not a number"))
        };

        let a = operand("a")?;
        let b = operand("b")?;
        if b == 0.0 {
            anyhow::bail!("division by zero");
        }
        ctx.res.json(json!({ "status": true, "result": a / b }));
        Ok(())
    }
}

pub fn divide() -> RouteDescriptor {
    RouteDescriptor::new(meta("/tools/divide?a=&b=", "Divide", "Divide a by b"), Divide)
}

struct Banner;

#[async_trait(?Send)]
impl RouteHandler for Banner {
    async fn on_start(&self, ctx: RouteContext<'_>) -> anyhow::Result<()> {
        let title = ctx.req.query_param("title").unwrap_or("EdgeShim");
        ctx.res
            .set_header("cache-control", "no-store")
            .send_text(&format!("<h1>{}</h1>", escape_html(title)));
        Ok(())
    }
}

pub fn banner() -> RouteDescriptor {
    RouteDescriptor::new(
        meta("/tools/banner?title=", "Banner", "Render a title as HTML"),
        Banner,
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
