//! Runtime-neutral primitives shared by the EdgeShim adapters and the Express compatibility layer.

pub mod app;
pub mod assets;
pub mod body;
pub mod context;
pub mod error;
pub mod handler;
pub mod http;
pub mod middleware;
pub mod mime;
pub mod params;
pub mod response;
pub mod router;
pub mod settings;
