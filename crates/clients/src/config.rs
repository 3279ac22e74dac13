//! Client configuration
//!
//! Loaded from TOML with every field defaulted, then overridden by the
//! deployment's environment variables, then validated as a whole. Validation
//! reports every violation, not just the first.

use registrar_breaker::{Config as BreakerConfig, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const COURSES_URL_VAR: &str = "COURSES_SERVICE_URL";
pub const STUDENTS_URL_VAR: &str = "STUDENT_SERVICE_URL";
pub const TIMEOUT_VAR: &str = "SERVICE_REQUEST_TIMEOUT";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid value for {name}: {value:?}")]
    Env { name: &'static str, value: String },
    #[error(
        "Validation failed: {}",
        .0.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
    )]
    Validation(Vec<ValidationError>),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientsConfig {
    /// Course catalog (RPC)
    pub courses: DependencyConfig,
    /// Student registry (REST)
    pub students: DependencyConfig,
    pub logging: LoggingConfig,
}

impl Default for ClientsConfig {
    fn default() -> Self {
        Self {
            courses: DependencyConfig::with_endpoint("http://localhost:8080", 10),
            students: DependencyConfig::with_endpoint("http://localhost:3001", 5),
            logging: LoggingConfig::default(),
        }
    }
}

/// Settings for one downstream dependency
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DependencyConfig {
    /// Base URL of the service
    pub endpoint: String,
    /// Per-call timeout in seconds
    pub timeout_secs: u64,
    pub breaker: BreakerSettings,
    pub retry: RetrySettings,
}

impl Default for DependencyConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            timeout_secs: 10,
            breaker: BreakerSettings::default(),
            retry: RetrySettings::default(),
        }
    }
}

impl DependencyConfig {
    pub fn with_endpoint(endpoint: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout_secs,
            ..Default::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn breaker_config(&self) -> BreakerConfig {
        BreakerConfig {
            failure_threshold: self.breaker.failure_threshold,
            reset_timeout: Duration::from_secs(self.breaker.reset_timeout_secs),
            success_threshold: self.breaker.success_threshold,
            half_open_max_trials: self.breaker.half_open_max_trials,
            jitter_factor: self.breaker.jitter_factor,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            base_delay: Duration::from_millis(self.retry.base_delay_ms),
            per_call_timeout: Some(self.timeout()),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BreakerSettings {
    pub failure_threshold: usize,
    pub reset_timeout_secs: u64,
    pub success_threshold: usize,
    pub half_open_max_trials: usize,
    pub jitter_factor: f64,
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout_secs: 60,
            success_threshold: 2,
            half_open_max_trials: 1,
            jitter_factor: 0.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives used when `RUST_LOG` is unset
    pub filter: String,
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            ansi: true,
        }
    }
}

impl ClientsConfig {
    /// Defaults plus environment overrides, validated
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        config.validate().map_err(ConfigError::Validation)?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from `lookup` (the process environment in production)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(COURSES_URL_VAR) {
            self.courses.endpoint = url;
        }
        if let Some(url) = lookup(STUDENTS_URL_VAR) {
            self.students.endpoint = url;
        }
        if let Some(value) = lookup(TIMEOUT_VAR) {
            let secs = value.trim().parse::<u64>().map_err(|_| ConfigError::Env {
                name: TIMEOUT_VAR,
                value: value.clone(),
            })?;
            self.courses.timeout_secs = secs;
            self.students.timeout_secs = secs;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        validate_dependency("courses", &self.courses, &mut errors);
        validate_dependency("students", &self.students, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn validate_dependency(name: &str, config: &DependencyConfig, errors: &mut Vec<ValidationError>) {
    let mut fail = |field: &str, message: &str| {
        errors.push(ValidationError {
            field: format!("{name}.{field}"),
            message: message.to_string(),
        });
    };

    if !(config.endpoint.starts_with("http://") || config.endpoint.starts_with("https://")) {
        fail("endpoint", "must be an http:// or https:// URL");
    }
    if config.timeout_secs == 0 {
        fail("timeout_secs", "must be positive");
    }
    if config.breaker.failure_threshold == 0 {
        fail("breaker.failure_threshold", "must be positive");
    }
    if config.breaker.success_threshold == 0 {
        fail("breaker.success_threshold", "must be positive");
    }
    if config.breaker.half_open_max_trials == 0 {
        fail("breaker.half_open_max_trials", "must be positive");
    }
    if !(0.0..=1.0).contains(&config.breaker.jitter_factor) {
        fail("breaker.jitter_factor", "must be within [0, 1]");
    }
    if config.retry.max_attempts == 0 {
        fail("retry.max_attempts", "at least one attempt is required");
    }
}

/// Load, override from the environment and validate a TOML file
pub fn load_config(path: &Path) -> Result<ClientsConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config: ClientsConfig = toml::from_str(&content)?;

    config.apply_env_overrides()?;
    config.validate().map_err(ConfigError::Validation)?;

    Ok(config)
}
