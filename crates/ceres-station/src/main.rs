use std::path::PathBuf;

use anyhow::Result;
use ceres_engine::device::GpuInit;
use ceres_engine::logging::{init_logging, LoggingConfig};
use ceres_engine::session::SessionConfig;
use ceres_engine::window::{Runtime, RuntimeConfig};

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let mut session = SessionConfig::default();
    if let Some(root) = std::env::args_os().nth(1) {
        session.asset_root = PathBuf::from(root);
    }
    log::info!("assets from {}", session.asset_root.display());

    Runtime::run(RuntimeConfig::default(), GpuInit::default(), session)
}
