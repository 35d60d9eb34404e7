//! Runtime configuration.

use std::env;
use std::str::FromStr;

use thiserror::Error;

/// How released host views are pooled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RecyclingMode {
    #[default]
    Default,
    /// Released views are destroyed instead of returned to the pool.
    /// Views placed in the pool by `prefill` are still handed out.
    NoViewReuse,
    /// No pool at all: every insert creates a view, every delete destroys it.
    NoPooling,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown recycling mode `{0}`")]
pub struct ParseRecyclingModeError(String);

impl FromStr for RecyclingMode {
    type Err = ParseRecyclingModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "default" => Ok(RecyclingMode::Default),
            "no_view_reuse" => Ok(RecyclingMode::NoViewReuse),
            "no_pooling" => Ok(RecyclingMode::NoPooling),
            _ => Err(ParseRecyclingModeError(s.to_owned())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentsConfiguration {
    /// Maximum pooled views per view type. `None` keeps every released view.
    pub pool_capacity: Option<usize>,
    pub recycling_mode: RecyclingMode,
    /// Resolve the children of a node on the rayon pool.
    pub parallel_resolution: bool,
    /// Retry a failed bind once on a freshly created view.
    pub retry_failed_binds: bool,
}

impl Default for ComponentsConfiguration {
    fn default() -> Self {
        Self {
            pool_capacity: None,
            recycling_mode: RecyclingMode::Default,
            parallel_resolution: false,
            retry_failed_binds: true,
        }
    }
}

impl ComponentsConfiguration {
    pub const POOL_CAPACITY_VAR: &'static str = "LITHO_POOL_CAPACITY";
    pub const PARALLEL_RESOLUTION_VAR: &'static str = "LITHO_PARALLEL_RESOLUTION";
    pub const RECYCLING_MODE_VAR: &'static str = "LITHO_RECYCLING_MODE";

    /// Defaults overridden by the `LITHO_*` environment variables. Values that
    /// fail to parse are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(raw) = lookup(Self::POOL_CAPACITY_VAR) {
            match raw.trim().parse::<usize>() {
                Ok(capacity) => config.pool_capacity = Some(capacity),
                Err(err) => log::warn!(
                    "ignoring {}={raw:?}: {err}",
                    Self::POOL_CAPACITY_VAR
                ),
            }
        }
        if let Some(raw) = lookup(Self::PARALLEL_RESOLUTION_VAR) {
            match parse_flag(&raw) {
                Some(flag) => config.parallel_resolution = flag,
                None => log::warn!(
                    "ignoring {}={raw:?}: expected a boolean",
                    Self::PARALLEL_RESOLUTION_VAR
                ),
            }
        }
        if let Some(raw) = lookup(Self::RECYCLING_MODE_VAR) {
            match raw.parse::<RecyclingMode>() {
                Ok(mode) => config.recycling_mode = mode,
                Err(err) => log::warn!("ignoring {}: {err}", Self::RECYCLING_MODE_VAR),
            }
        }
        config
    }

    pub fn with_pool_capacity(mut self, capacity: usize) -> Self {
        self.pool_capacity = Some(capacity);
        self
    }

    pub fn with_recycling_mode(mut self, mode: RecyclingMode) -> Self {
        self.recycling_mode = mode;
        self
    }

    pub fn with_parallel_resolution(mut self, enabled: bool) -> Self {
        self.parallel_resolution = enabled;
        self
    }

    pub fn with_retry_failed_binds(mut self, enabled: bool) -> Self {
        self.retry_failed_binds = enabled;
        self
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_overrides_defaults() {
        let config = ComponentsConfiguration::from_lookup(|name| match name {
            "LITHO_POOL_CAPACITY" => Some("8".into()),
            "LITHO_PARALLEL_RESOLUTION" => Some("yes".into()),
            "LITHO_RECYCLING_MODE" => Some("no-view-reuse".into()),
            _ => None,
        });
        assert_eq!(config.pool_capacity, Some(8));
        assert!(config.parallel_resolution);
        assert_eq!(config.recycling_mode, RecyclingMode::NoViewReuse);
        assert!(config.retry_failed_binds);
    }

    #[test]
    fn invalid_values_keep_defaults() {
        let config = ComponentsConfiguration::from_lookup(|name| match name {
            "LITHO_POOL_CAPACITY" => Some("many".into()),
            "LITHO_RECYCLING_MODE" => Some("sometimes".into()),
            _ => None,
        });
        assert_eq!(config, ComponentsConfiguration::default());
    }
}
