#[cfg(not(target_arch = "wasm32"))]
mod dev {
    use std::net::SocketAddr;
    use std::path::PathBuf;
    use std::sync::Arc;

    use anyhow::Context;
    use clap::Parser;

    use edgeshim_adapter_axum::{run_app, AxumDevServerConfig};
    use edgeshim_core::settings::SettingsLoader;
    use edgeshim_demo::DemoApp;

    /// Serve the demo routes and the `web/` directory locally.
    #[derive(Debug, Parser)]
    #[command(name = "edgeshim-demo", version, about)]
    struct Args {
        /// Settings file to use instead of the embedded `settings.json`.
        #[arg(long)]
        settings: Option<PathBuf>,
        /// Listen address, e.g. `0.0.0.0:8787`.
        #[arg(long)]
        addr: Option<SocketAddr>,
        /// Directory served for `GET /*`.
        #[arg(long)]
        web_root: Option<PathBuf>,
    }

    pub fn run() -> anyhow::Result<()> {
        let args = Args::parse();

        let settings = match &args.settings {
            Some(path) => {
                let settings = SettingsLoader::from_path(path)
                    .with_context(|| format!("failed to load {}", path.display()))?
                    .shared();
                edgeshim_demo::install_settings(Arc::clone(&settings));
                settings
            }
            None => edgeshim_demo::settings(),
        };

        let mut config = AxumDevServerConfig::from_settings(&settings.server)?;
        if let Some(addr) = args.addr {
            config.addr = addr;
        }
        if let Some(web_root) = args.web_root {
            config.web_root = Some(web_root);
        }

        run_app::<DemoApp>(&settings, config).context("dev server")
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(err) = dev::run() {
        eprintln!("edgeshim-demo failed: {err:#}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}
