use clap::Parser;

pub mod background;
pub mod cli;
pub mod config;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod placement;
pub mod render;
pub mod session;
pub mod storage;
pub mod template;
pub mod text;
pub use error::{AppError, AppResult};
pub use session::EditorSession;

/// Entrypoint used by the `certstamp` binary.
pub fn run() -> anyhow::Result<()> {
    logging::init();
    tracing::debug!("starting certstamp");
    cli::run(cli::Cli::parse())
}
