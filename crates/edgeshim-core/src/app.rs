use crate::router::RouterService;

const DEFAULT_APP_NAME: &str = "EdgeShim App";

/// Named router service handed to a runtime adapter.
pub struct App {
    router: RouterService,
    name: String,
}

impl App {
    pub fn new(router: RouterService) -> Self {
        Self::with_name(router, DEFAULT_APP_NAME)
    }

    pub fn with_name<S>(router: RouterService, name: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            router,
            name: name.into(),
        }
    }

    pub fn router(&self) -> &RouterService {
        &self.router
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn into_router(self) -> RouterService {
        self.router
    }

    pub fn default_name() -> &'static str {
        DEFAULT_APP_NAME
    }
}

/// Implemented by application crates so adapters can construct them.
pub trait Hooks {
    /// Build the router service for the application.
    fn routes() -> RouterService;

    fn name() -> &'static str {
        App::default_name()
    }

    fn build_app() -> App
    where
        Self: Sized,
    {
        App::with_name(Self::routes(), Self::name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::Body;
    use crate::context::RequestContext;
    use crate::error::ShimError;
    use crate::http::{request_builder, Method, StatusCode};
    use futures::executor::block_on;

    struct TestHooks;

    impl Hooks for TestHooks {
        fn routes() -> RouterService {
            async fn handler(_ctx: RequestContext) -> Result<&'static str, ShimError> {
                Ok("ok")
            }
            RouterService::builder().get("/test", handler).build()
        }

        fn name() -> &'static str {
            "hooks-name"
        }
    }

    #[test]
    fn build_app_wires_routes_and_name() {
        let app = TestHooks::build_app();
        assert_eq!(app.name(), "hooks-name");

        let request = request_builder()
            .method(Method::GET)
            .uri("/test")
            .body(Body::empty())
            .expect("request");
        let response = block_on(app.router().oneshot(request));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body().as_bytes(), Some(&b"ok"[..]));
    }

    #[test]
    fn default_app_uses_constant_name() {
        let app = App::new(RouterService::builder().build());
        assert_eq!(app.name(), App::default_name());
        assert!(app.into_router().routes().is_empty());
    }
}
