use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use edgeshim_core::http::Method;

use crate::request::CompatRequest;
use crate::response::ResponseWriter;

const DEFAULT_METHOD: &str = "get";

/// Self-description of a route module, as listed by `/api/info`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteMeta {
    /// Path relative to the API prefix, e.g. `/tools/ping`. Anything after `?` is
    /// documentation only and is dropped when the route is registered.
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, rename = "desc", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl RouteMeta {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// The declared path up to, but not including, the first `?`.
    pub fn route_path(&self) -> &str {
        self.path
            .split_once('?')
            .map_or(self.path.as_str(), |(path, _)| path)
    }

    /// Path as advertised by `/api/info`, including any documentation query.
    pub fn advertised_path(&self) -> String {
        format!("{}{}", crate::dispatch::API_PREFIX, self.path)
    }

    /// The declared method string, or `get` when absent.
    pub fn method_label(&self) -> &str {
        self.method.as_deref().unwrap_or(DEFAULT_METHOD)
    }

    /// Methods this route is registered under. `all` expands to the common set; unknown names
    /// are skipped with a warning.
    pub fn methods(&self) -> Vec<Method> {
        let label = self.method_label().trim().to_ascii_lowercase();
        let method = match label.as_str() {
            "get" => Method::GET,
            "post" => Method::POST,
            "put" => Method::PUT,
            "delete" => Method::DELETE,
            "patch" => Method::PATCH,
            "options" => Method::OPTIONS,
            "head" => Method::HEAD,
            "all" => {
                return vec![
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::PATCH,
                    Method::OPTIONS,
                ]
            }
            other => {
                log::warn!("route {} declares unsupported method `{other}`", self.path);
                return Vec::new();
            }
        };
        vec![method]
    }
}

/// Per-request view handed to [`RouteHandler::on_start`].
pub struct RouteContext<'a> {
    pub req: &'a CompatRequest,
    pub res: &'a mut dyn ResponseWriter,
}

/// Entry point of a route module.
///
/// Returning an error (or panicking) turns the request into a `500` with body
/// `{"error": "<message>"}`.
#[async_trait(?Send)]
pub trait RouteHandler: Send + Sync {
    async fn on_start(&self, ctx: RouteContext<'_>) -> anyhow::Result<()>;
}

/// A route module: descriptor plus handler. Either half may be missing; only complete
/// descriptors are mounted, while any descriptor with metadata is listed by `/api/info`.
#[derive(Clone, Default)]
pub struct RouteDescriptor {
    meta: Option<RouteMeta>,
    handler: Option<Arc<dyn RouteHandler>>,
}

impl fmt::Debug for RouteDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDescriptor")
            .field("meta", &self.meta)
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}

impl RouteDescriptor {
    pub fn new<H>(meta: RouteMeta, handler: H) -> Self
    where
        H: RouteHandler + 'static,
    {
        Self {
            meta: Some(meta),
            handler: Some(Arc::new(handler)),
        }
    }

    pub fn meta_only(meta: RouteMeta) -> Self {
        Self {
            meta: Some(meta),
            handler: None,
        }
    }

    pub fn handler_only<H>(handler: H) -> Self
    where
        H: RouteHandler + 'static,
    {
        Self {
            meta: None,
            handler: Some(Arc::new(handler)),
        }
    }

    pub fn meta(&self) -> Option<&RouteMeta> {
        self.meta.as_ref()
    }

    pub fn handler(&self) -> Option<&Arc<dyn RouteHandler>> {
        self.handler.as_ref()
    }
}
