#![allow(missing_docs)]

use std::{error::Error, fmt, io, sync::Arc};

/// A [RewindConfig](crate::RewindConfig) that would produce nonsensical playback.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    NonPositiveWindow(f32),
    NonPositiveSpeed(f32),
    InvalidThreshold(f32),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NonPositiveWindow(seconds) => {
                write!(f, "recorded window must be positive, got {} s", seconds)
            }
            ConfigError::NonPositiveSpeed(speed) => {
                write!(f, "rewind speed must be positive, got {}", speed)
            }
            ConfigError::InvalidThreshold(threshold) => {
                write!(
                    f,
                    "average frames threshold must be a non-negative number, got {}",
                    threshold
                )
            }
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone)]
pub enum CurveError {
    IoError(Arc<io::Error>),
    JsonError(Arc<serde_json::Error>),
    NoKeys,
    NonFiniteKey { index: usize },
    UnsortedKey { index: usize },
    NonPositiveValue { index: usize, value: f32 },
}

impl fmt::Display for CurveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CurveError::IoError(error) => write!(f, "failed to read curve: {}", error),
            CurveError::JsonError(error) => write!(f, "failed to parse curve: {}", error),
            CurveError::NoKeys => write!(f, "speed curve has no keys"),
            CurveError::NonFiniteKey { index } => {
                write!(f, "speed curve key {} is not finite", index)
            }
            CurveError::UnsortedKey { index } => {
                write!(f, "speed curve key {} is earlier than the previous key", index)
            }
            CurveError::NonPositiveValue { index, value } => {
                write!(
                    f,
                    "speed curve key {} has non-positive speed {}",
                    index, value
                )
            }
        }
    }
}

impl Error for CurveError {}

impl From<io::Error> for CurveError {
    fn from(v: io::Error) -> Self {
        Self::IoError(Arc::new(v))
    }
}

impl From<serde_json::Error> for CurveError {
    fn from(v: serde_json::Error) -> Self {
        Self::JsonError(Arc::new(v))
    }
}

#[derive(Debug, Clone)]
pub enum SettingsError {
    IoError(Arc<io::Error>),
    JsonError(Arc<serde_json::Error>),
    ConfigError(ConfigError),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::IoError(error) => write!(f, "failed to read settings: {}", error),
            SettingsError::JsonError(error) => write!(f, "failed to parse settings: {}", error),
            SettingsError::ConfigError(error) => write!(f, "invalid settings: {}", error),
        }
    }
}

impl Error for SettingsError {}

impl From<io::Error> for SettingsError {
    fn from(v: io::Error) -> Self {
        Self::IoError(Arc::new(v))
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(v: serde_json::Error) -> Self {
        Self::JsonError(Arc::new(v))
    }
}

impl From<ConfigError> for SettingsError {
    fn from(v: ConfigError) -> Self {
        Self::ConfigError(v)
    }
}
