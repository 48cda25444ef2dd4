//! Expanding a [`MergeConfig`] against a concrete source object.
//!
//! Each source key gets exactly one code: exclusions first, then the exact
//! entry, then the longest matching glob, then the default for the kind of
//! the source value. Object-valued fields matched by a nested config resolve
//! recursively, so the result carries no globs.

use regex_lite::Regex;
use strata_types::{Key, Object, Value};
use tracing::debug;

use crate::code::UpdateCode;
use crate::config::{ConfigValue, MergeConfig};
use crate::error::{MergeError, MergeResult};

/// Resolved policy for one key.
#[derive(Clone, Debug, PartialEq)]
pub enum CodeEntry {
    Code(UpdateCode),
    Nested(ResolvedCodeMap),
}

impl From<UpdateCode> for CodeEntry {
    fn from(code: UpdateCode) -> Self {
        Self::Code(code)
    }
}

impl From<ResolvedCodeMap> for CodeEntry {
    fn from(map: ResolvedCodeMap) -> Self {
        Self::Nested(map)
    }
}

/// One [`CodeEntry`] per source key, in source key order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolvedCodeMap {
    entries: Vec<(Key, CodeEntry)>,
}

impl ResolvedCodeMap {
    /// An empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of resolved keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no key was resolved.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entry resolved for `key`.
    pub fn get(&self, key: &Key) -> Option<&CodeEntry> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, entry)| entry)
    }

    /// Set the entry for `key`, keeping its position when already present.
    pub fn insert(&mut self, key: impl Into<Key>, entry: impl Into<CodeEntry>) {
        let key = key.into();
        let entry = entry.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = entry,
            None => self.entries.push((key, entry)),
        }
    }

    /// Entries in source key order.
    pub fn iter(&self) -> impl Iterator<Item = (&Key, &CodeEntry)> {
        self.entries.iter().map(|(key, entry)| (key, entry))
    }

    /// Resolved keys in source key order.
    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.entries.iter().map(|(key, _)| key)
    }

    /// The same map with every key set to `code`.
    pub fn uniform<I, K>(keys: I, code: UpdateCode) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
    {
        keys.into_iter().map(|key| (key.into(), CodeEntry::Code(code))).collect()
    }
}

impl FromIterator<(Key, CodeEntry)> for ResolvedCodeMap {
    fn from_iter<T: IntoIterator<Item = (Key, CodeEntry)>>(iter: T) -> Self {
        let mut map = Self::new();
        for (key, entry) in iter {
            map.insert(key, entry);
        }
        map
    }
}

/// Resolve `config` into one code per key of `source`.
///
/// Keys named in `exclude_keys` resolve to `N`, as do null-valued keys when
/// `block_unset` is set. Exclusions apply to the top level only.
pub fn fill_update_codes(
    source: &Object,
    config: &MergeConfig,
    block_unset: bool,
    exclude_keys: &[&str],
) -> MergeResult<ResolvedCodeMap> {
    let resolved = Resolver::new(config, block_unset)?.resolve(source, exclude_keys)?;
    debug!(keys = resolved.len(), block_unset, "update codes resolved");
    Ok(resolved)
}

/// Translate a `*` glob into an anchored matcher. `*` matches one or more
/// characters; everything else is literal.
pub fn glob_matcher(pattern: &str) -> MergeResult<Regex> {
    let body = pattern
        .split('*')
        .map(regex_lite::escape)
        .collect::<Vec<_>>()
        .join(".+");
    Regex::new(&format!("^{body}$")).map_err(|err| MergeError::InvalidGlob {
        pattern: pattern.to_string(),
        reason: err.to_string(),
    })
}

struct Resolver<'a> {
    config: &'a MergeConfig,
    globs: Vec<(Regex, &'a ConfigValue)>,
    block_unset: bool,
}

impl<'a> Resolver<'a> {
    fn new(config: &'a MergeConfig, block_unset: bool) -> MergeResult<Self> {
        let mut patterns: Vec<(&str, &ConfigValue)> = config.globs().collect();
        patterns.sort_by_key(|(pattern, _)| std::cmp::Reverse(pattern.len()));
        let globs: Vec<(Regex, &'a ConfigValue)> = patterns
            .into_iter()
            .map(|(pattern, value)| Ok((glob_matcher(pattern)?, value)))
            .collect::<MergeResult<_>>()?;
        Ok(Self {
            config,
            globs,
            block_unset,
        })
    }

    fn resolve(&self, source: &Object, exclude_keys: &[&str]) -> MergeResult<ResolvedCodeMap> {
        let mut resolved = ResolvedCodeMap::new();
        for key in source.keys() {
            let value = source.get(&key).unwrap_or_default();
            let excluded = key.as_name().is_some_and(|name| exclude_keys.contains(&name));
            let entry = if excluded || (self.block_unset && value.is_null()) {
                CodeEntry::Code(UpdateCode::N)
            } else {
                match key.as_name().and_then(|name| self.lookup(name)) {
                    Some(matched) => self.expand(matched, &value)?,
                    None => CodeEntry::Code(self.config.default_code(&value)),
                }
            };
            resolved.insert(key, entry);
        }

        if resolved.len() != source.len() {
            let missing = source
                .keys()
                .into_iter()
                .find(|key| resolved.get(key).is_none())
                .map(|key| key.to_string())
                .unwrap_or_default();
            return Err(MergeError::UnresolvedKeys {
                key: missing,
                resolved: resolved.len(),
                expected: source.len(),
            });
        }
        Ok(resolved)
    }

    fn lookup(&self, name: &str) -> Option<&'a ConfigValue> {
        self.config.exact(name).or_else(|| {
            self.globs
                .iter()
                .find(|(matcher, _)| matcher.is_match(name))
                .map(|(_, value)| *value)
        })
    }

    fn expand(&self, matched: &ConfigValue, value: &Value) -> MergeResult<CodeEntry> {
        let nested = match matched {
            ConfigValue::Code(code) => return Ok(CodeEntry::Code(*code)),
            ConfigValue::Nested(nested) => nested.inherit(self.config),
        };
        match value {
            Value::Object(child) => {
                let map = Resolver::new(&nested, self.block_unset)?.resolve(child, &[])?;
                Ok(CodeEntry::Nested(map))
            }
            other => Ok(CodeEntry::Code(nested.default_code(other))),
        }
    }
}
