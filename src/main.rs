//! linkplot binary: `linkplot [settings.yaml]`.
//!
//! `RUST_LOG` controls verbosity and `LINKPLOT_URL` overrides the backend URL.

use linkplot::config::{ExplorerConfig, ExplorerSettings, URL_ENV};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut settings = match std::env::args().nth(1) {
        Some(path) => ExplorerSettings::from_yaml_file(&path).unwrap_or_else(|e| {
            log::error!("{e}; using default settings");
            ExplorerSettings::default()
        }),
        None => ExplorerSettings::default(),
    };
    settings.apply_url_override(std::env::var(URL_ENV).ok());

    let cfg = ExplorerConfig {
        title: "linkplot".to_string(),
        ..ExplorerConfig::with_settings(settings)
    };
    if let Err(e) = linkplot::run_explorer(cfg) {
        log::error!("{e}");
        std::process::exit(1);
    }
}
