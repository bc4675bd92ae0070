pub mod app;
pub mod catalog;
mod config;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod region;
pub mod selection;
pub mod session;
pub mod source;
pub mod storage;
pub mod viewport;
pub use config::{load_app_config, AppConfig, StartupArgs};
pub use error::{AppError, AppResult};

/// Entrypoint used by the binary.
pub fn run() -> AppResult<()> {
    logging::init();
    tracing::info!("starting region-selector");

    let config = load_app_config();
    let args = StartupArgs::from_env();
    tracing::debug!(?config, ?args, "resolved startup configuration");

    app::App::new(config, args).start()?;

    tracing::info!("region-selector exited");
    Ok(())
}
