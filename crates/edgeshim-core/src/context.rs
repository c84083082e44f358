use std::net::SocketAddr;

use crate::assets::AssetHandle;
use crate::body::Body;
use crate::http::Request;
use crate::params::PathParams;

/// Peer address of the connection, recorded by runtime adapters that know it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClientAddr(pub SocketAddr);

/// Request context exposed to handlers and middleware.
pub struct RequestContext {
    request: Request,
    path_params: PathParams,
}

impl RequestContext {
    pub fn new(request: Request, params: PathParams) -> Self {
        Self {
            request,
            path_params: params,
        }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn request_mut(&mut self) -> &mut Request {
        &mut self.request
    }

    pub fn into_request(self) -> Request {
        self.request
    }

    pub fn into_parts(self) -> (Request, PathParams) {
        (self.request, self.path_params)
    }

    pub fn path_params(&self) -> &PathParams {
        &self.path_params
    }

    pub fn body(&self) -> &Body {
        self.request.body()
    }

    pub fn client_addr(&self) -> Option<SocketAddr> {
        self.request
            .extensions()
            .get::<ClientAddr>()
            .map(|ClientAddr(addr)| *addr)
    }

    /// Asset source installed by the runtime adapter, if any.
    pub fn asset_handle(&self) -> Option<AssetHandle> {
        self.request.extensions().get::<AssetHandle>().cloned()
    }
}
