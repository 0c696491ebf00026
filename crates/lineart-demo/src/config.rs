use winit::dpi::LogicalSize;

use lineart_engine::device::GpuInit;
use lineart_engine::window::RuntimeConfig;

use crate::error::ConfigError;
use crate::rng::XorShift32;
use crate::trail::{DEFAULT_CAPACITY, MAX_CAPACITY};

pub const ENV_TRAIL_CAPACITY: &str = "LINEART_TRAIL_CAPACITY";
pub const ENV_SEED: &str = "LINEART_SEED";
pub const ENV_SAMPLES: &str = "LINEART_SAMPLES";

/// Everything the demo needs before the window opens.
#[derive(Debug, Clone, PartialEq)]
pub struct DemoConfig {
    pub title: String,
    /// Initial window size in logical pixels.
    pub width: u32,
    pub height: u32,
    /// Requested MSAA samples. The GPU layer falls back to 1 when unsupported.
    pub sample_count: u32,
    pub trail_capacity: usize,
    pub seed: u32,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            title: "lineart".to_string(),
            width: 512,
            height: 512,
            sample_count: 4,
            trail_capacity: DEFAULT_CAPACITY,
            seed: XorShift32::DEFAULT_SEED,
        }
    }
}

impl DemoConfig {
    /// Defaults overridden by `LINEART_*` environment variables, validated.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(v) = lookup(ENV_TRAIL_CAPACITY) {
            cfg.trail_capacity = parse_usize(ENV_TRAIL_CAPACITY, &v)?;
        }
        if let Some(v) = lookup(ENV_SEED) {
            cfg.seed = parse_u32(ENV_SEED, &v)?;
        }
        if let Some(v) = lookup(ENV_SAMPLES) {
            cfg.sample_count = parse_u32(ENV_SAMPLES, &v)?;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.trail_capacity.is_power_of_two() || self.trail_capacity > MAX_CAPACITY {
            return Err(ConfigError::InvalidCapacity(self.trail_capacity));
        }
        if self.seed == 0 {
            return Err(ConfigError::ZeroSeed);
        }
        if !matches!(self.sample_count, 1 | 2 | 4 | 8 | 16) {
            return Err(ConfigError::InvalidSampleCount(self.sample_count));
        }
        Ok(())
    }

    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            title: self.title.clone(),
            initial_size: LogicalSize::new(self.width as f64, self.height as f64),
        }
    }

    pub fn gpu_init(&self) -> GpuInit {
        GpuInit::default().with_sample_count(self.sample_count)
    }
}

fn parse_usize(key: &'static str, raw: &str) -> Result<usize, ConfigError> {
    raw.trim().parse().map_err(|_| invalid(key, raw))
}

/// Decimal, or hexadecimal with a `0x` prefix.
fn parse_u32(key: &'static str, raw: &str) -> Result<u32, ConfigError> {
    let s = raw.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|_| invalid(key, raw))
}

fn invalid(key: &'static str, raw: &str) -> ConfigError {
    ConfigError::InvalidValue { key, value: raw.to_string() }
}
