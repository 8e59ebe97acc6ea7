//! Common types and utilities shared across Mimic crates.
//!
//! This crate defines the configuration sections consumed by the behavior
//! layer, their validation rules, observability helpers, and the shared
//! error type. It stays dependency-light so every crate in the workspace can
//! depend on it.
//!
//! # Overview
//!
//! - [`StealthConfig`]: how physical interaction is humanized
//! - [`RateLimitsConfig`]: ceilings enforced by the rate governor
//! - [`LoggingConfig`]: log level, encoding and sink directory
//! - [`BrowserConfig`] and [`StealthLevel`]: WebDriver session settings
//! - [`observability`]: centralised tracing/logging initialisation
//! - [`MimicError`] and [`Result`]: shared error handling
//!
//! # Examples
//!
//! ```rust
//! use mimic_common::{RateLimitsConfig, StealthConfig};
//! use std::time::Duration;
//!
//! let stealth = StealthConfig::default();
//! assert_eq!(stealth.min_action_delay, Duration::from_secs(2));
//! assert!(stealth.validate().is_ok());
//!
//! let limits = RateLimitsConfig::default();
//! assert_eq!(limits.max_connections_per_day, 20);
//! ```
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds, DurationSeconds};
use std::time::Duration;

pub mod observability;

use observability::LogFormat;

/// Humanization settings for pointer, keyboard and scroll behavior.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StealthConfig {
    /// Drive the pointer along curved paths instead of jumping.
    pub enable_mouse_movement: bool,
    /// Type character by character with human timings.
    pub enable_typing_simulation: bool,
    /// Scroll through pages while "reading".
    pub enable_random_scrolling: bool,
    /// Linger over elements before clicking them.
    pub enable_hovering: bool,
    /// Lower bound for random action pauses.
    #[serde(rename = "min_action_delay_ms")]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub min_action_delay: Duration,
    /// Upper bound (exclusive) for random action pauses.
    #[serde(rename = "max_action_delay_ms")]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub max_action_delay: Duration,
    /// Restrict activity to the configured local-time window.
    pub business_hours_only: bool,
    /// First hour (inclusive) of the business window, 0–23.
    pub business_hours_start: u32,
    /// Hour (exclusive) at which the business window closes, 0–23.
    pub business_hours_end: u32,
}

impl Default for StealthConfig {
    fn default() -> Self {
        Self {
            enable_mouse_movement: true,
            enable_typing_simulation: true,
            enable_random_scrolling: true,
            enable_hovering: true,
            min_action_delay: Duration::from_secs(2),
            max_action_delay: Duration::from_secs(5),
            business_hours_only: true,
            business_hours_start: 9,
            business_hours_end: 17,
        }
    }
}

impl StealthConfig {
    /// Reject settings that would only surface as odd behavior mid-sequence.
    ///
    /// Overnight windows (`start >= end`) are refused rather than
    /// reinterpreted.
    pub fn validate(&self) -> std::result::Result<(), ConfigViolation> {
        if self.min_action_delay > self.max_action_delay {
            return Err(ConfigViolation::DelayRange {
                min: self.min_action_delay,
                max: self.max_action_delay,
            });
        }
        for (field, hour) in [
            ("business_hours_start", self.business_hours_start),
            ("business_hours_end", self.business_hours_end),
        ] {
            if hour > 23 {
                return Err(ConfigViolation::HourOutOfRange { field, hour });
            }
        }
        if self.business_hours_start >= self.business_hours_end {
            return Err(ConfigViolation::BusinessWindow {
                start: self.business_hours_start,
                end: self.business_hours_end,
            });
        }
        Ok(())
    }
}

/// Ceilings enforced by the rate governor.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitsConfig {
    pub max_connections_per_day: u32,
    pub max_messages_per_day: u32,
    pub max_searches_per_hour: u32,
    /// Minimum quiet time after any recorded action.
    #[serde(rename = "cooldown_period_secs")]
    #[serde_as(as = "DurationSeconds<u64>")]
    pub cooldown_period: Duration,
}

impl Default for RateLimitsConfig {
    fn default() -> Self {
        Self {
            max_connections_per_day: 20,
            max_messages_per_day: 15,
            max_searches_per_hour: 5,
            cooldown_period: Duration::from_secs(30 * 60),
        }
    }
}

impl RateLimitsConfig {
    /// Every ceiling must allow at least one action.
    pub fn validate(&self) -> std::result::Result<(), ConfigViolation> {
        for (field, value) in [
            ("max_connections_per_day", self.max_connections_per_day),
            ("max_messages_per_day", self.max_messages_per_day),
            ("max_searches_per_hour", self.max_searches_per_hour),
        ] {
            if value == 0 {
                return Err(ConfigViolation::NonPositiveLimit { field });
            }
        }
        Ok(())
    }
}

/// Logging section of the YAML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,
    pub format: LogFormat,
    /// Directory for the rolling log file; falls back to `MIMIC_LOG_DIR`.
    pub directory: Option<String>,
    /// Mirror events to stderr.
    pub stderr: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
            directory: None,
            stderr: false,
        }
    }
}

/// WebDriver session settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Endpoint of a running WebDriver service (Chromedriver by default).
    pub webdriver_url: String,
    /// Run browser automation without a visible window.
    pub headless: bool,
    pub stealth_level: StealthLevel,
    /// Pin a user agent instead of drawing one from the built-in pool.
    pub user_agent: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".to_string(),
            headless: false,
            stealth_level: StealthLevel::Balanced,
            user_agent: None,
        }
    }
}

/// Browser automation stealth level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StealthLevel {
    Lightweight,
    Balanced,
    Maximum,
}

/// A configuration value that cannot drive the behavior layer.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigViolation {
    #[error("min action delay {min:?} exceeds max action delay {max:?}")]
    DelayRange { min: Duration, max: Duration },

    #[error("{field} must be an hour between 0 and 23, got {hour}")]
    HourOutOfRange { field: &'static str, hour: u32 },

    #[error("business hours must start before they end (start {start}, end {end})")]
    BusinessWindow { start: u32, end: u32 },

    #[error("{field} must be at least 1")]
    NonPositiveLimit { field: &'static str },
}

/// Error types used across the Mimic workspace.
#[derive(thiserror::Error, Debug)]
pub enum MimicError {
    /// A driver (browser, network, etc.) reported an error.
    #[error("Driver error: {0}")]
    Driver(#[from] anyhow::Error),

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A configuration section failed validation.
    #[error("Invalid configuration: {0}")]
    Violation(#[from] ConfigViolation),
}

/// Convenient alias for results that use [`MimicError`].
pub type Result<T> = std::result::Result<T, MimicError>;
