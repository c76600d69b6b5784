use crate::detect::Direction;
use crate::{Error, Result};
use serde_json::{Map, Value};

/// Engine configuration backed by a JSON object.
///
/// Values are addressed by dotted paths (`"retry.max_attempts"`). Unknown keys
/// are preserved, so config files can carry settings for integrations this
/// crate does not know about.
#[derive(Debug, Clone, PartialEq)]
pub struct MasteryConfig(Value);

impl Default for MasteryConfig {
    fn default() -> Self {
        Self::empty_object()
    }
}

impl MasteryConfig {
    pub fn empty_object() -> Self {
        Self(Value::Object(Map::new()))
    }

    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    /// Engine defaults. Callers merge file/flag overrides on top with
    /// [`MasteryConfig::deep_merge`].
    pub fn default_engine() -> Self {
        Self(serde_json::json!({
            "model": "claude-sonnet-4-5",
            "api": {
                "base_url": "https://api.anthropic.com",
                "timeout_secs": 20,
                "max_tokens": 4096,
            },
            "retry": {
                "max_attempts": 3,
                "base_delay_ms": 1000,
                "max_delay_ms": 30000,
            },
            "diagram": {
                "default_direction": "TD",
            },
        }))
    }

    /// Parses a YAML config file body. The result is a plain override set;
    /// merge it over [`MasteryConfig::default_engine`] to get an effective
    /// config.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let raw: serde_yaml::Value =
            serde_yaml::from_str(text).map_err(|e| Error::InvalidConfigYaml {
                message: e.to_string(),
            })?;
        let value = serde_json::to_value(raw).map_err(|e| Error::InvalidConfigYaml {
            message: e.to_string(),
        })?;
        let mut config = Self::empty_object();
        config.deep_merge(&value);
        Ok(config)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn as_value_mut(&mut self) -> &mut Value {
        &mut self.0
    }

    pub fn get_str(&self, dotted_path: &str) -> Option<&str> {
        self.get_value(dotted_path)?.as_str()
    }

    pub fn get_u64(&self, dotted_path: &str) -> Option<u64> {
        self.get_value(dotted_path)?.as_u64()
    }

    fn get_value(&self, dotted_path: &str) -> Option<&Value> {
        let mut cur = &self.0;
        for segment in dotted_path.split('.') {
            cur = cur.as_object()?.get(segment)?;
        }
        Some(cur)
    }

    pub fn set_value(&mut self, dotted_path: &str, value: Value) {
        // Be defensive: callers can construct `MasteryConfig` from any JSON value via
        // `from_value`. Configs are objects; if we see a non-object here, coerce it
        // to an object so this API never panics on user input.
        if !self.0.is_object() {
            self.0 = Value::Object(Map::new());
        }

        let Value::Object(ref mut root) = self.0 else {
            return;
        };
        let mut cur: &mut Map<String, Value> = root;
        let mut segments = dotted_path.split('.').peekable();
        while let Some(seg) = segments.next() {
            if segments.peek().is_none() {
                cur.insert(seg.to_string(), value);
                return;
            }
            let slot = cur.entry(seg).or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            let Some(next) = slot.as_object_mut() else {
                return;
            };
            cur = next;
        }
    }

    pub fn deep_merge(&mut self, other: &Value) {
        deep_merge_value(&mut self.0, other);
    }
}

fn deep_merge_value(base: &mut Value, incoming: &Value) {
    match (base, incoming) {
        (Value::Object(base_map), Value::Object(in_map)) => {
            for (key, in_value) in in_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge_value(base_value, in_value),
                    None => {
                        base_map.insert(key.clone(), in_value.clone());
                    }
                }
            }
        }
        (base_slot, in_value) => {
            *base_slot = in_value.clone();
        }
    }
}

/// The sanitizer's explicit configuration. Passed into
/// [`crate::sanitize::sanitize_diagram`] rather than living in module state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SanitizeOptions {
    /// Direction used when a flowchart header is inserted or its direction
    /// token is repaired.
    pub default_direction: Direction,
}

impl SanitizeOptions {
    pub fn from_config(config: &MasteryConfig) -> Self {
        let default_direction = config
            .get_str("diagram.default_direction")
            .and_then(Direction::parse)
            .unwrap_or_default();
        Self { default_direction }
    }
}
