use std::fmt;

/// Invalid demo configuration, detected before any window is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Trail capacity must be a power of two between 1 and 32768.
    InvalidCapacity(usize),
    /// A zero xorshift seed yields an all-zero sequence.
    ZeroSeed,
    /// Sample counts are limited to 1, 2, 4, 8 and 16.
    InvalidSampleCount(u32),
    /// An environment override could not be parsed.
    InvalidValue { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidCapacity(n) => {
                write!(f, "trail capacity {n} is not a power of two between 1 and 32768")
            }
            ConfigError::ZeroSeed => f.write_str("random seed must be non-zero"),
            ConfigError::InvalidSampleCount(n) => {
                write!(f, "sample count {n} is not one of 1, 2, 4, 8, 16")
            }
            ConfigError::InvalidValue { key, value } => {
                write!(f, "cannot parse {key}={value:?}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
