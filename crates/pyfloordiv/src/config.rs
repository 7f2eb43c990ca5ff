use serde::{Deserialize, Serialize};

use crate::{
    exception::{ExcType, RunError, SimpleException},
    level::Level,
    resource::ResourceLimits,
};

/// Initial heap capacity when none is configured.
pub const DEFAULT_HEAP_CAPACITY: usize = 64;

/// Configuration for a [`Runtime`](crate::Runtime).
///
/// Deserializes from JSON with every field optional:
///
/// ```
/// use pyfloordiv::{Level, RuntimeConfig};
///
/// let config = RuntimeConfig::from_json(r#"{"level": "legacy", "limits": {"max_allocations": 10}}"#).unwrap();
/// assert_eq!(config.level, Level::Legacy);
/// assert_eq!(config.limits.max_allocations, Some(10));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Python era to emulate.
    pub level: Level,
    /// Allocation, memory and recursion limits.
    pub limits: ResourceLimits,
    /// Initial heap capacity in objects.
    pub heap_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            level: Level::default(),
            limits: ResourceLimits::default(),
            heap_capacity: DEFAULT_HEAP_CAPACITY,
        }
    }
}

impl RuntimeConfig {
    #[must_use]
    pub fn legacy() -> Self {
        Self {
            level: Level::Legacy,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn modern() -> Self {
        Self {
            level: Level::Modern,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_limits(mut self, limits: ResourceLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Parses a JSON configuration document.
    ///
    /// Malformed input is reported as a `ValueError`.
    pub fn from_json(json: &str) -> Result<Self, RunError> {
        serde_json::from_str(json)
            .map_err(|err| SimpleException::new_msg(ExcType::ValueError, format!("invalid runtime config: {err}")).into())
    }

    /// Serializes the configuration to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, RunError> {
        serde_json::to_string_pretty(self)
            .map_err(|err| RunError::internal(format!("failed to serialize runtime config: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        assert_eq!(RuntimeConfig::from_json("{}").unwrap(), RuntimeConfig::default());
    }

    #[test]
    fn json_round_trip() {
        let config = RuntimeConfig::legacy().with_limits(ResourceLimits::new().max_memory(4096));
        let parsed = RuntimeConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn unknown_level_is_a_value_error() {
        let err = RuntimeConfig::from_json(r#"{"level": "ancient"}"#).unwrap_err();
        assert_eq!(err.exc_type(), ExcType::ValueError);
    }
}
