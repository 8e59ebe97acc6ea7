//! Loader for workspace configuration with YAML + environment overlays.
//!
//! A `mimic.yaml` file carries four optional sections, each falling back to
//! its defaults when absent:
//!
//! ```yaml
//! stealth:
//!   min_action_delay_ms: 2000
//!   max_action_delay_ms: 5000
//!   business_hours_only: true
//!   business_hours_start: 9
//!   business_hours_end: 17
//! rate_limits:
//!   max_connections_per_day: 20
//!   max_messages_per_day: 15
//!   max_searches_per_hour: 5
//!   cooldown_period_secs: 1800
//! logging:
//!   level: info
//!   format: json
//! browser:
//!   webdriver_url: "${WEBDRIVER_URL}"
//! ```
//!
//! Precedence, lowest first: file(s) and inline snippets in the order they
//! were attached, then `MIMIC_`-prefixed environment variables using `__` to
//! descend into sections (`MIMIC_RATE_LIMITS__MAX_SEARCHES_PER_HOUR=3`).
//! `${VAR}` placeholders are expanded after merging, so they may appear in
//! either source.
use config::{Config, Environment, File};
use mimic_common::{
    BrowserConfig, LoggingConfig, MimicError, RateLimitsConfig, Result, StealthConfig,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MimicConfig {
    pub stealth: StealthConfig,
    pub rate_limits: RateLimitsConfig,
    pub logging: LoggingConfig,
    pub browser: BrowserConfig,
}

impl MimicConfig {
    /// Validate every section that the behavior layer consumes.
    pub fn validate(&self) -> Result<()> {
        self.stealth.validate()?;
        self.rate_limits.validate()?;
        Ok(())
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct MimicConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
    env: Option<Environment>,
}

impl Default for MimicConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl MimicConfigLoader {
    /// Start with defaults plus `MIMIC_` env overrides.
    ///
    /// ```
    /// use mimic_config::MimicConfigLoader;
    ///
    /// let config = MimicConfigLoader::new()
    ///     .with_yaml_str("rate_limits:\n  max_searches_per_hour: 3")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.rate_limits.max_searches_per_hour, 3);
    /// assert_eq!(config.rate_limits.max_connections_per_day, 20);
    /// ```
    pub fn new() -> Self {
        let env = Environment::with_prefix("MIMIC")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true);
        Self {
            builder: Config::builder(),
            env: Some(env),
        }
    }

    /// Attach a YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that may be absent, so deployments can rely purely on
    /// environment variables.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    ///
    /// ```
    /// use mimic_config::MimicConfigLoader;
    /// use std::time::Duration;
    ///
    /// let cfg = MimicConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// stealth:
    ///   min_action_delay_ms: 1000
    ///   max_action_delay_ms: 3000
    ///   business_hours_only: false
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.stealth.min_action_delay, Duration::from_secs(1));
    /// assert!(!cfg.stealth.business_hours_only);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Ignore `MIMIC_` environment variables entirely.
    pub fn without_env(mut self) -> Self {
        self.env = None;
        self
    }

    /// Consume the builder and deserialize the merged sources into strongly
    /// typed, validated config.
    ///
    /// ```
    /// use mimic_config::MimicConfigLoader;
    ///
    /// unsafe { std::env::set_var("DRIVER_HOST", "grid.internal"); }
    ///
    /// let config = MimicConfigLoader::new()
    ///     .with_yaml_str(r#"
    /// browser:
    ///   webdriver_url: "http://${DRIVER_HOST}:4444"
    ///   headless: true
    /// "#)
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(config.browser.webdriver_url, "http://grid.internal:4444");
    /// assert!(config.browser.headless);
    ///
    /// unsafe { std::env::remove_var("DRIVER_HOST"); }
    /// ```
    pub fn load(self) -> Result<MimicConfig> {
        let mut builder = self.builder;
        if let Some(env) = self.env {
            builder = builder.add_source(env);
        }
        let cfg = builder.build().map_err(config_error)?;

        let mut v: Value = cfg.try_deserialize().map_err(config_error)?;
        expand_env_in_value(&mut v);

        let typed: MimicConfig =
            serde_json::from_value(v).map_err(|e| MimicError::Config(e.to_string()))?;
        typed.validate()?;

        tracing::debug!(
            target: "config",
            business_hours_only = typed.stealth.business_hours_only,
            max_connections_per_day = typed.rate_limits.max_connections_per_day,
            "configuration loaded"
        );
        Ok(typed)
    }
}

fn config_error(e: config::ConfigError) -> MimicError {
    MimicError::Config(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expands_simple_string() {
        temp_env::with_var("FOO", Some("bar"), || {
            let mut v = json!("prefix-${FOO}-suffix");
            expand_env_in_value(&mut v);
            assert_eq!(v, json!("prefix-bar-suffix"));
        });
    }

    #[test]
    fn expands_in_array_and_object() {
        temp_env::with_vars([("CITY", Some("Winston")), ("STATE", Some("NC"))], || {
            let mut v = json!([
                "hello-$CITY",
                { "loc": "${CITY}-${STATE}" },
                42,
                true,
                null
            ]);
            expand_env_in_value(&mut v);
            assert_eq!(
                v,
                json!(["hello-Winston", { "loc": "Winston-NC" }, 42, true, null])
            );
        });
    }

    #[test]
    fn expands_recursively_across_env_values() {
        temp_env::with_vars(
            [
                ("BAZ", Some("qux")),
                ("BAR", Some("mid-${BAZ}")),
                ("FOO", Some("start-${BAR}-end")),
            ],
            || {
                let mut v = json!("X=${FOO}");
                expand_env_in_value(&mut v);
                assert_eq!(v, json!("X=start-mid-qux-end"));
            },
        );
    }

    #[test]
    fn stops_on_cycles() {
        temp_env::with_vars([("A", Some("${B}")), ("B", Some("${A}"))], || {
            let mut v = json!("x=${A}-y");
            expand_env_in_value(&mut v);
            let s = v.as_str().unwrap();
            assert!(s.starts_with("x=") && s.ends_with("-y"));
            assert!(s.contains("${"));
        });
    }

    #[test]
    fn unknown_vars_are_left_as_is() {
        let mut v = json!("hi-${DOES_NOT_EXIST}");
        expand_env_in_value(&mut v);
        assert_eq!(v, json!("hi-${DOES_NOT_EXIST}"));
    }

    #[test]
    fn empty_sources_yield_defaults() {
        let cfg = MimicConfigLoader::new().without_env().load().unwrap();
        assert_eq!(cfg, MimicConfig::default());
    }

    #[test]
    fn invalid_sections_are_rejected() {
        let err = MimicConfigLoader::new()
            .without_env()
            .with_yaml_str("stealth:\n  min_action_delay_ms: 9000\n  max_action_delay_ms: 1000")
            .load()
            .unwrap_err();
        assert!(matches!(err, MimicError::Violation(_)));
    }
}
