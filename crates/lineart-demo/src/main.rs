//! Animated 3D line art: two scrolling grids, two pulsing floaty patterns and
//! a particle hairball, drawn through the engine's immediate-mode line API.

mod config;
mod demo;
mod error;
mod patterns;
mod rng;
mod trail;

use anyhow::{Context, Result};

use lineart_engine::logging::{init_logging, LoggingConfig};
use lineart_engine::window::Runtime;

use crate::config::DemoConfig;
use crate::demo::LinesDemo;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let config = DemoConfig::from_env().context("invalid demo configuration")?;
    log::info!(
        "trail capacity {}, seed {:#010x}, {}x MSAA requested",
        config.trail_capacity,
        config.seed,
        config.sample_count
    );

    let app = LinesDemo::new(&config).context("failed to set up the line demo")?;

    Runtime::run(config.runtime_config(), config.gpu_init(), app)
}
