use std::net::{SocketAddr, TcpListener as StdTcpListener};
use std::path::PathBuf;

use anyhow::Context;
use axum::Router;
use log::LevelFilter;
use simple_logger::SimpleLogger;
use tokio::runtime::Builder as RuntimeBuilder;
use tokio::signal;
use tower::{service_fn, Service};

use edgeshim_core::app::Hooks;
use edgeshim_core::assets::AssetHandle;
use edgeshim_core::router::RouterService;
use edgeshim_core::settings::{ServerSettings, Settings};

use crate::assets::DirAssetSource;
use crate::service::EdgeShimAxumService;

/// Configuration for the local dev server.
#[derive(Clone, Debug)]
pub struct AxumDevServerConfig {
    pub addr: SocketAddr,
    pub enable_ctrl_c: bool,
    /// Directory served for `GET /*`. No static files are served when unset.
    pub web_root: Option<PathBuf>,
}

impl Default for AxumDevServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8787)),
            enable_ctrl_c: true,
            web_root: Some(PathBuf::from("web")),
        }
    }
}

impl AxumDevServerConfig {
    /// Apply the `server` section of the settings over the defaults.
    pub fn from_settings(server: &ServerSettings) -> anyhow::Result<Self> {
        let mut config = Self::default();
        if let Some(addr) = server.addr.as_deref() {
            config.addr = addr
                .parse()
                .with_context(|| format!("invalid server address `{addr}`"))?;
        }
        if let Some(web_root) = server.web_root.as_deref() {
            config.web_root = Some(PathBuf::from(web_root));
        }
        Ok(config)
    }
}

/// Blocking dev server runner.
pub struct AxumDevServer {
    router: RouterService,
    config: AxumDevServerConfig,
}

impl AxumDevServer {
    pub fn new(router: RouterService) -> Self {
        Self {
            router,
            config: AxumDevServerConfig::default(),
        }
    }

    pub fn with_config(router: RouterService, config: AxumDevServerConfig) -> Self {
        Self { router, config }
    }

    pub fn run(self) -> anyhow::Result<()> {
        let runtime = RuntimeBuilder::new_multi_thread()
            .enable_all()
            .build()
            .context("failed to build tokio runtime")?;

        runtime.block_on(async move { self.run_async().await })
    }

    async fn run_async(self) -> anyhow::Result<()> {
        let addr = self.config.addr;
        let listener = StdTcpListener::bind(addr)
            .with_context(|| format!("failed to bind dev server to {addr}"))?;
        listener
            .set_nonblocking(true)
            .context("failed to set listener to non-blocking")?;
        let listener = tokio::net::TcpListener::from_std(listener)
            .context("failed to adopt std listener into tokio")?;

        log::info!("dev server listening on http://{addr}");
        self.run_with_listener(listener).await
    }

    /// Serve on an already-bound listener. `config.addr` is ignored.
    pub async fn run_with_listener(self, listener: tokio::net::TcpListener) -> anyhow::Result<()> {
        let AxumDevServer { router, config } = self;

        let mut service = EdgeShimAxumService::new(router);
        if let Some(web_root) = &config.web_root {
            match DirAssetSource::new(web_root) {
                Ok(source) => {
                    log::info!("serving static files from {}", source.root().display());
                    service = service.with_assets(AssetHandle::with_source(source));
                }
                Err(err) => log::warn!("static files disabled: {err:#}"),
            }
        }

        serve_with_listener(service, listener, config.enable_ctrl_c).await
    }
}

async fn serve_with_listener(
    service: EdgeShimAxumService,
    listener: tokio::net::TcpListener,
    enable_ctrl_c: bool,
) -> anyhow::Result<()> {
    let router = Router::new().fallback_service(service_fn(move |req| {
        let mut svc = service.clone();
        async move { svc.call(req).await }
    }));
    let make_service = router.into_make_service_with_connect_info::<SocketAddr>();

    let server = axum::serve(listener, make_service);
    if enable_ctrl_c {
        server
            .with_graceful_shutdown(async {
                let _ = signal::ctrl_c().await;
            })
            .await
            .context("axum server error")?;
    } else {
        server.await.context("axum server error")?;
    }

    Ok(())
}

/// Install the logger described by `settings`, then serve the application until Ctrl-C.
pub fn run_app<A: Hooks>(settings: &Settings, config: AxumDevServerConfig) -> anyhow::Result<()> {
    let level: LevelFilter = settings.logging.level_filter();
    SimpleLogger::new().with_level(level).init().ok();

    let app = A::build_app();
    log::info!("starting {}", app.name());
    AxumDevServer::with_config(app.into_router(), config).run()
}
