//! # Server Configuration
//!
//! Settings for the dispatch adapter, read from a YAML file, the environment, or
//! both (environment wins).
//!
//! ## Environment Variables
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `DECLROUTE_PORT` (falls back to `PORT`) | port the host adapter should bind | `80` |
//! | `DECLROUTE_ROUTE_PREFIX` | prefix prepended to every route | none |
//! | `DECLROUTE_CASE_SENSITIVE` | case-sensitive route matching | `false` |
//! | `DECLROUTE_VERBOSE_ROUTES` | log every registered route at info | `false` |
//! | `DECLROUTE_ENV` | `development` turns on verbose route logging | unset |
//!
//! ## File Format
//!
//! ```yaml
//! port: 8080
//! route_prefix: api
//! case_sensitive_routing: false
//! verbose_routes: true
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::logging::parse_flag;
use crate::route::trim_route;

pub const DEFAULT_PORT: u16 = 80;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub port: u16,
    pub route_prefix: Option<String>,
    pub case_sensitive_routing: bool,
    pub verbose_routes: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            route_prefix: None,
            case_sensitive_routing: false,
            verbose_routes: false,
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env(|name| std::env::var(name).ok());
        config
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml).context("invalid server configuration")?;
        Ok(config)
    }

    /// Read a YAML file, then apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read server configuration {}", path.display()))?;
        let mut config = Self::from_yaml_str(&text)
            .with_context(|| format!("failed to parse server configuration {}", path.display()))?;
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Apply overrides from a variable source. Unparseable values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(port) = lookup("DECLROUTE_PORT")
            .or_else(|| lookup("PORT"))
            .and_then(|v| v.trim().parse().ok())
        {
            self.port = port;
        }
        if let Some(prefix) = lookup("DECLROUTE_ROUTE_PREFIX") {
            self.route_prefix = Some(prefix);
        }
        if let Some(flag) = lookup("DECLROUTE_CASE_SENSITIVE") {
            self.case_sensitive_routing = parse_flag(&flag);
        }
        if let Some(env) = lookup("DECLROUTE_ENV") {
            if env.eq_ignore_ascii_case("development") {
                self.verbose_routes = true;
            }
        }
        if let Some(flag) = lookup("DECLROUTE_VERBOSE_ROUTES") {
            self.verbose_routes = parse_flag(&flag);
        }
    }

    /// Route prefix without surrounding slashes; empty when unset.
    #[must_use]
    pub fn route_prefix(&self) -> &str {
        self.route_prefix.as_deref().map(trim_route).unwrap_or("")
    }
}
