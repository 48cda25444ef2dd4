//! Merge configuration.
//!
//! A [`MergeConfig`] maps field names and `*` globs to update codes or to
//! nested configurations for object-valued fields, and carries the default
//! codes used for fields nothing matches. It can be built in code, parsed
//! from JSON, or loaded from TOML:
//!
//! ```toml
//! scalar = "B"
//! vector = "XM"
//! tags = "XS"
//! "ob*" = { x = "B", y = "N" }
//!
//! [owner]
//! name = "I"
//! ```

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strata_types::{Value, ValueKind};

use crate::code::UpdateCode;
use crate::error::{MergeError, MergeResult};

const SCALAR: &str = "scalar";
const VECTOR: &str = "vector";
const NESTED: &str = "nested";

/// What a configured key maps to.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigValue {
    Code(UpdateCode),
    Nested(MergeConfig),
}

impl From<UpdateCode> for ConfigValue {
    fn from(code: UpdateCode) -> Self {
        Self::Code(code)
    }
}

impl From<MergeConfig> for ConfigValue {
    fn from(config: MergeConfig) -> Self {
        Self::Nested(config)
    }
}

/// Per-field merge policy.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MergeConfig {
    /// Code for unmatched scalar fields. `N` when unset.
    pub scalar: Option<UpdateCode>,
    /// Code for unmatched array fields. `N` when unset.
    pub vector: Option<UpdateCode>,
    /// Code for unmatched object fields. `N` when unset.
    pub nested: Option<UpdateCode>,
    exact: Vec<(String, ConfigValue)>,
    globs: Vec<(String, ConfigValue)>,
}

impl MergeConfig {
    /// An empty config: every field resolves to `N`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default code for scalar fields.
    pub fn with_scalar(mut self, code: UpdateCode) -> Self {
        self.scalar = Some(code);
        self
    }

    /// Set the default code for array fields.
    pub fn with_vector(mut self, code: UpdateCode) -> Self {
        self.vector = Some(code);
        self
    }

    /// Set the default code for object fields.
    pub fn with_nested(mut self, code: UpdateCode) -> Self {
        self.nested = Some(code);
        self
    }

    /// Add or replace an entry. Keys containing `*` are globs. A code given
    /// for `scalar`, `vector` or `nested` sets that default instead.
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        let key = key.into();
        let value = value.into();
        if let ConfigValue::Code(code) = value {
            let default = match key.as_str() {
                SCALAR => Some(&mut self.scalar),
                VECTOR => Some(&mut self.vector),
                NESTED => Some(&mut self.nested),
                _ => None,
            };
            if let Some(slot) = default {
                *slot = Some(code);
                return self;
            }
        }
        let entries = if is_glob(&key) {
            &mut self.globs
        } else {
            &mut self.exact
        };
        match entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = value,
            None => entries.push((key, value)),
        }
        self
    }

    /// The entry configured for exactly `name`.
    pub fn exact(&self, name: &str) -> Option<&ConfigValue> {
        self.exact
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Glob entries in the order they were added.
    pub fn globs(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.globs.iter().map(|(pattern, value)| (pattern.as_str(), value))
    }

    /// No defaults and no entries.
    pub fn is_empty(&self) -> bool {
        self.scalar.is_none()
            && self.vector.is_none()
            && self.nested.is_none()
            && self.exact.is_empty()
            && self.globs.is_empty()
    }

    /// The default code for a field holding `value`.
    pub fn default_code(&self, value: &Value) -> UpdateCode {
        let code = match value.kind() {
            ValueKind::Array => self.vector,
            ValueKind::Object => self.nested,
            _ => self.scalar,
        };
        code.unwrap_or(UpdateCode::N)
    }

    /// This config with any unset default taken from `parent`.
    pub fn inherit(&self, parent: &MergeConfig) -> MergeConfig {
        MergeConfig {
            scalar: self.scalar.or(parent.scalar),
            vector: self.vector.or(parent.vector),
            nested: self.nested.or(parent.nested),
            ..self.clone()
        }
    }

    /// Parse a config from JSON. A bare code string is shorthand for
    /// `{"scalar": code}`.
    pub fn from_json(json: &serde_json::Value) -> MergeResult<Self> {
        let entries = match json {
            serde_json::Value::String(token) => return Ok(Self::from(token.parse::<UpdateCode>()?)),
            serde_json::Value::Object(entries) => entries,
            other => {
                return Err(MergeError::InvalidConfig {
                    reason: format!("expected an update code or a table, got {other}"),
                })
            }
        };
        entries.iter().try_fold(Self::new(), |config, (key, value)| {
            let reserved = matches!(key.as_str(), SCALAR | VECTOR | NESTED);
            let value = match value {
                serde_json::Value::String(token) => ConfigValue::Code(token.parse()?),
                serde_json::Value::Object(_) if !reserved => {
                    ConfigValue::Nested(Self::from_json(value)?)
                }
                _ => {
                    let expected = if reserved {
                        "an update code"
                    } else {
                        "an update code or a nested table"
                    };
                    return Err(MergeError::InvalidConfig {
                        reason: format!("{key:?} must hold {expected}"),
                    });
                }
            };
            Ok(config.with_entry(key.clone(), value))
        })
    }

    /// JSON form: defaults first, then exact keys, then globs.
    pub fn to_json(&self) -> serde_json::Value {
        let defaults = [
            (SCALAR, self.scalar),
            (VECTOR, self.vector),
            (NESTED, self.nested),
        ];
        let defaults = defaults
            .into_iter()
            .filter_map(|(key, code)| Some((key.to_string(), code_json(code?))));
        let entries = self.exact.iter().chain(&self.globs).map(|(key, value)| {
            let value = match value {
                ConfigValue::Code(code) => code_json(*code),
                ConfigValue::Nested(nested) => nested.to_json(),
            };
            (key.clone(), value)
        });
        serde_json::Value::Object(defaults.chain(entries).collect())
    }

    /// Load a config from TOML text.
    pub fn from_toml_str(text: &str) -> MergeResult<Self> {
        toml::from_str(text).map_err(|err| MergeError::InvalidConfig {
            reason: err.to_string(),
        })
    }
}

fn code_json(code: UpdateCode) -> serde_json::Value {
    serde_json::Value::String(code.as_str().to_string())
}

/// Whether a config key is a glob pattern.
pub fn is_glob(key: &str) -> bool {
    key.contains('*')
}

impl From<UpdateCode> for MergeConfig {
    fn from(code: UpdateCode) -> Self {
        Self::new().with_scalar(code)
    }
}

impl Serialize for MergeConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MergeConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = serde_json::Value::deserialize(deserializer)?;
        Self::from_json(&json).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn entries_split_into_exact_and_globs() {
        let config = MergeConfig::new()
            .with_entry("m", UpdateCode::XF)
            .with_entry("ob*", MergeConfig::new().with_entry("x", UpdateCode::B))
            .with_entry("vector", UpdateCode::N);

        assert_eq!(config.exact("m"), Some(&ConfigValue::Code(UpdateCode::XF)));
        assert_eq!(config.exact("ob*"), None);
        assert_eq!(config.globs().count(), 1);
        assert_eq!(config.vector, Some(UpdateCode::N));
    }

    #[test]
    fn later_entries_replace_earlier_ones() {
        let config = MergeConfig::new()
            .with_entry("a", UpdateCode::B)
            .with_entry("a", UpdateCode::D);
        assert_eq!(config.exact("a"), Some(&ConfigValue::Code(UpdateCode::D)));
        assert_eq!(config.to_json(), json!({"a": "D"}));
    }

    #[test]
    fn parses_json_config() {
        let config = MergeConfig::from_json(&json!({
            "m": "XF",
            "vector": "N",
            "*A*": "I",
            "obx": {"vector": "XI"}
        }))
        .unwrap();
        assert_eq!(config.vector, Some(UpdateCode::N));
        assert_eq!(config.scalar, None);
        match config.exact("obx") {
            Some(ConfigValue::Nested(nested)) => assert_eq!(nested.vector, Some(UpdateCode::XI)),
            other => panic!("expected nested config, got {:?}", other),
        }
        assert_eq!(config.globs().next().map(|(p, _)| p), Some("*A*"));
    }

    #[test]
    fn bare_code_is_a_scalar_default() {
        let config = MergeConfig::from_json(&json!("B")).unwrap();
        assert_eq!(config, MergeConfig::from(UpdateCode::B));
        assert_eq!(config.default_code(&Value::from("x")), UpdateCode::B);
        assert_eq!(config.default_code(&Value::array()), UpdateCode::N);
    }

    #[test]
    fn rejects_malformed_config() {
        assert!(matches!(
            MergeConfig::from_json(&json!({"a": "ZZ"})),
            Err(MergeError::InvalidCode { .. })
        ));
        match MergeConfig::from_json(&json!({"scalar": {"x": "B"}})) {
            Err(MergeError::InvalidConfig { reason }) => assert!(reason.contains("scalar")),
            other => panic!("expected InvalidConfig, got {:?}", other),
        }
        assert!(MergeConfig::from_json(&json!(3)).is_err());
    }

    #[test]
    fn loads_toml() {
        let config = MergeConfig::from_toml_str(
            r#"
            scalar = "B"
            tags = "XS"
            "ob*" = { x = "B", y = "N" }

            [owner]
            name = "I"
            "#,
        )
        .unwrap();
        assert_eq!(config.scalar, Some(UpdateCode::B));
        assert_eq!(config.exact("tags"), Some(&ConfigValue::Code(UpdateCode::XS)));
        match config.exact("owner") {
            Some(ConfigValue::Nested(owner)) => {
                assert_eq!(owner.exact("name"), Some(&ConfigValue::Code(UpdateCode::I)))
            }
            other => panic!("expected nested config, got {:?}", other),
        }

        assert!(matches!(
            MergeConfig::from_toml_str("tags = 3"),
            Err(MergeError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn serde_round_trip() {
        let config = MergeConfig::new()
            .with_nested(UpdateCode::Y)
            .with_entry("e*", UpdateCode::Y)
            .with_entry("obc", MergeConfig::new().with_entry("x", UpdateCode::D));
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json, json!({"nested": "Y", "obc": {"x": "D"}, "e*": "Y"}));
        let parsed: MergeConfig = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn nested_configs_inherit_defaults() {
        let parent = MergeConfig::new()
            .with_scalar(UpdateCode::B)
            .with_vector(UpdateCode::N);
        let child = MergeConfig::new().with_vector(UpdateCode::XI).inherit(&parent);
        assert_eq!(child.scalar, Some(UpdateCode::B));
        assert_eq!(child.vector, Some(UpdateCode::XI));
        assert_eq!(child.nested, None);
    }
}
