//! Express-style `(req, res)` handler contract on top of the EdgeShim router.
//!
//! Route modules describe themselves with a [`RouteMeta`] and implement [`RouteHandler`]. At
//! request time the native request is adapted into a [`CompatRequest`], the handler mutates a
//! [`ResponseWriter`], and the accumulated state is materialised into a single native response.

pub mod app;
pub mod dispatch;
pub mod info;
pub mod operator;
pub mod request;
pub mod response;
pub mod route;
pub mod statics;

pub use app::mount;
pub use dispatch::{register_routes, API_PREFIX};
pub use info::{api_info, ApiInfo};
pub use operator::OperatorJson;
pub use request::{adapt_request, CompatRequest};
pub use response::{ResponseBuilder, ResponseWriter};
pub use route::{RouteContext, RouteDescriptor, RouteHandler, RouteMeta};
