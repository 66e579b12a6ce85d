//! Injector configuration.
//!
//! Settings come from code, from `FERROUS_INJECT_*` environment variables or,
//! with the `config` feature, from JSON.

use std::env;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use crate::error::{DiError, DiResult};

/// Prefix of every environment variable read by [`InjectorConfig::from_env`].
pub const ENV_PREFIX: &str = "FERROUS_INJECT";

/// Default bound on the length of the dependency path.
pub const DEFAULT_MAX_DEPTH: usize = 1024;

/// Per-injector settings, fixed at construction.
///
/// ```rust
/// use ferrous_inject::InjectorConfig;
///
/// let config = InjectorConfig::default().with_strict_di(true).with_max_depth(64);
/// assert!(config.strict_di);
/// assert_eq!(config.max_depth, 64);
/// assert!(!config.trace_resolution);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct InjectorConfig {
    /// Reject callables that would need reflection
    pub strict_di: bool,
    /// Longest dependency path before resolution gives up
    pub max_depth: usize,
    /// Attach a [`crate::TracingObserver`] at build time
    pub trace_resolution: bool,
}

impl Default for InjectorConfig {
    fn default() -> Self {
        Self {
            strict_di: false,
            max_depth: DEFAULT_MAX_DEPTH,
            trace_resolution: false,
        }
    }
}

impl InjectorConfig {
    pub fn with_strict_di(mut self, strict_di: bool) -> Self {
        self.strict_di = strict_di;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_trace_resolution(mut self, trace_resolution: bool) -> Self {
        self.trace_resolution = trace_resolution;
        self
    }

    /// Defaults overridden by `FERROUS_INJECT_STRICT_DI`,
    /// `FERROUS_INJECT_MAX_DEPTH` and `FERROUS_INJECT_TRACE`.
    ///
    /// Unset variables keep their default; unparsable ones are an error.
    pub fn from_env() -> DiResult<Self> {
        let mut config = Self::default();
        if let Some(value) = env_value("STRICT_DI") {
            config.strict_di = value.as_bool("STRICT_DI")?;
        }
        if let Some(value) = env_value("MAX_DEPTH") {
            config.max_depth = value.as_usize("MAX_DEPTH")?;
        }
        if let Some(value) = env_value("TRACE") {
            config.trace_resolution = value.as_bool("TRACE")?;
        }
        Ok(config)
    }

    /// Parses a JSON object; missing fields keep their default.
    ///
    /// ```rust
    /// # #[cfg(feature = "config")]
    /// # {
    /// use ferrous_inject::InjectorConfig;
    ///
    /// let config = InjectorConfig::from_json(r#"{ "strict_di": true }"#).unwrap();
    /// assert!(config.strict_di);
    /// assert_eq!(config.max_depth, 1024);
    /// # }
    /// ```
    #[cfg(feature = "config")]
    pub fn from_json(json: &str) -> DiResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| DiError::custom(format!("invalid injector config: {}", e)))
    }
}

/// A raw environment value, typed by what it parses as.
#[derive(Debug, Clone, PartialEq)]
enum EnvValue {
    Integer(i64),
    Boolean(bool),
    String(String),
}

impl EnvValue {
    fn parse(raw: String) -> Self {
        let trimmed = raw.trim();
        if let Ok(int_val) = trimmed.parse::<i64>() {
            EnvValue::Integer(int_val)
        } else if let Ok(bool_val) = trimmed.to_ascii_lowercase().parse::<bool>() {
            EnvValue::Boolean(bool_val)
        } else {
            EnvValue::String(raw)
        }
    }

    fn as_bool(&self, key: &str) -> DiResult<bool> {
        match self {
            EnvValue::Boolean(b) => Ok(*b),
            EnvValue::Integer(0) => Ok(false),
            EnvValue::Integer(1) => Ok(true),
            EnvValue::String(s) if matches!(s.trim().to_ascii_lowercase().as_str(), "yes" | "on") => Ok(true),
            EnvValue::String(s) if matches!(s.trim().to_ascii_lowercase().as_str(), "no" | "off") => Ok(false),
            other => Err(invalid(key, "a boolean", other)),
        }
    }

    fn as_usize(&self, key: &str) -> DiResult<usize> {
        match self {
            EnvValue::Integer(i) if *i > 0 => Ok(*i as usize),
            other => Err(invalid(key, "a positive integer", other)),
        }
    }
}

fn env_value(key: &str) -> Option<EnvValue> {
    env::var(format!("{}_{}", ENV_PREFIX, key))
        .ok()
        .map(EnvValue::parse)
}

fn invalid(key: &str, expected: &str, got: &EnvValue) -> DiError {
    DiError::custom(format!(
        "{}_{} must be {}, got {:?}",
        ENV_PREFIX, key, expected, got
    ))
}
