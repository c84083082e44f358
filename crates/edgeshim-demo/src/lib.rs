#![cfg_attr(target_arch = "wasm32", no_main)]

//! Demo application: a handful of Express-style route modules mounted behind the shim.

use std::sync::{Arc, OnceLock};

use edgeshim_core::app::Hooks;
use edgeshim_core::router::RouterService;
use edgeshim_core::settings::{Settings, SettingsLoader};

pub mod routes;

const EMBEDDED_SETTINGS: &str = include_str!("../settings.json");

static SETTINGS: OnceLock<Arc<Settings>> = OnceLock::new();

/// Install process-wide settings. Returns `false` if settings were already initialised.
pub fn install_settings(settings: Arc<Settings>) -> bool {
    SETTINGS.set(settings).is_ok()
}

/// Active settings, loading the embedded `settings.json` on first use.
pub fn settings() -> Arc<Settings> {
    Arc::clone(SETTINGS.get_or_init(load_embedded_settings))
}

fn load_embedded_settings() -> Arc<Settings> {
    match SettingsLoader::load_from_str(EMBEDDED_SETTINGS) {
        Ok(loader) => loader.shared(),
        Err(err) => {
            log::warn!("embedded settings rejected, using defaults: {err}");
            Arc::new(Settings::default())
        }
    }
}

pub struct DemoApp;

impl Hooks for DemoApp {
    fn routes() -> RouterService {
        edgeshim_express::mount(routes::all(), settings())
    }

    fn name() -> &'static str {
        "EdgeShim Demo"
    }
}

#[cfg(target_arch = "wasm32")]
#[worker::event(fetch)]
pub async fn main(
    req: worker::Request,
    env: worker::Env,
    ctx: worker::Context,
) -> worker::Result<worker::Response> {
    edgeshim_adapter_cloudflare::run_app::<DemoApp>(req, env, ctx).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_settings_are_valid() {
        let loader = SettingsLoader::load_from_str(EMBEDDED_SETTINGS).expect("settings");
        assert_eq!(loader.settings().operator(), "Created Using Rynn UI");
        assert_eq!(loader.settings().server.web_root.as_deref(), Some("web"));
    }
}
