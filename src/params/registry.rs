//! Parameter registry
//!
//! Stores parameter definitions and their resolved values. One registry backs
//! a whole run; values are filled in by parsing passes (CLI, environment,
//! store, defaults), by prompting, and by command actions at run time.

use crate::error::{ParamError, ParamResult};
use crate::params::types::{ParamDef, ParamValue};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Parameter definitions plus the resolved-value mapping
#[derive(Debug, Clone, Default)]
pub struct ParamRegistry {
    /// Definitions in registration order
    defs: Vec<ParamDef>,

    /// Canonical name and alias lookup into `defs`
    index: HashMap<String, usize>,

    /// Resolved values, keyed by canonical name
    values: HashMap<String, ParamValue>,

    /// Persist-flagged parameters mutated since the last store write
    dirty: HashSet<String>,
}

impl ParamRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a parameter definition; re-registering the same name overwrites
    pub fn define(&mut self, def: ParamDef) {
        if let Some(&slot) = self.index.get(&def.name) {
            let old_aliases: Vec<String> = self.defs[slot].aliases.clone();
            for alias in old_aliases {
                self.index.remove(&alias);
            }
            for alias in &def.aliases {
                self.index.insert(alias.clone(), slot);
            }
            self.defs[slot] = def;
        } else {
            let slot = self.defs.len();
            self.index.insert(def.name.clone(), slot);
            for alias in &def.aliases {
                self.index.insert(alias.clone(), slot);
            }
            self.defs.push(def);
        }
    }

    /// Look up a definition by name or alias
    pub fn def(&self, name: &str) -> Option<&ParamDef> {
        self.index.get(name).map(|&slot| &self.defs[slot])
    }

    /// Canonical name for a name or alias
    pub fn canonical(&self, name: &str) -> Option<&str> {
        self.index.get(name).map(|&slot| self.defs[slot].name.as_str())
    }

    /// All definitions, in registration order
    pub fn defs(&self) -> impl Iterator<Item = &ParamDef> {
        self.defs.iter()
    }

    /// Whether any definition is persist-flagged
    pub fn any_persist(&self) -> bool {
        self.defs.iter().any(|d| d.persist)
    }

    /// Whether a parameter has a resolved value
    pub fn is_set(&self, name: &str) -> bool {
        let key = self.canonical(name).unwrap_or(name);
        self.values.contains_key(key)
    }

    /// Get the resolved value
    pub fn get(&self, name: &str) -> ParamResult<&ParamValue> {
        let key = self.canonical(name).unwrap_or(name);
        self.values
            .get(key)
            .ok_or_else(|| ParamError::MissingParam(name.to_string()))
    }

    /// Get a resolved string value
    pub fn get_str(&self, name: &str) -> ParamResult<&str> {
        self.get(name)?
            .as_str()
            .ok_or_else(|| type_mismatch(name, "string"))
    }

    /// Get a resolved boolean value
    pub fn get_bool(&self, name: &str) -> ParamResult<bool> {
        self.get(name)?
            .as_bool()
            .ok_or_else(|| type_mismatch(name, "bool"))
    }

    /// Get a resolved integer value
    pub fn get_int(&self, name: &str) -> ParamResult<i64> {
        self.get(name)?
            .as_int()
            .ok_or_else(|| type_mismatch(name, "int"))
    }

    /// Get a resolved float value (integers coerce)
    pub fn get_float(&self, name: &str) -> ParamResult<f64> {
        self.get(name)?
            .as_float()
            .ok_or_else(|| type_mismatch(name, "float"))
    }

    /// Set a value, marking persist-flagged parameters dirty
    ///
    /// Names without a definition are accepted as ad-hoc run state (loop
    /// counters and the like); they are never prompted or persisted.
    pub fn set(&mut self, name: &str, value: impl Into<ParamValue>) {
        self.insert(name, value.into(), true);
    }

    /// Parse and set a raw string value per the declared kind
    pub fn set_raw(&mut self, name: &str, raw: &str) -> ParamResult<()> {
        let def = self
            .def(name)
            .ok_or_else(|| ParamError::UnknownParam(name.to_string()))?;
        let value = def.kind.parse(&def.name, raw)?;
        self.insert(name, value, true);
        Ok(())
    }

    /// Remove a resolved value
    pub fn unset(&mut self, name: &str) {
        let key = self.canonical(name).unwrap_or(name).to_string();
        self.values.remove(&key);
    }

    /// One parsing pass: resolve values for the scoped definitions from
    /// raw CLI tokens, then the process environment, then the persisted
    /// store, then declared defaults. Already-set parameters are left alone.
    pub fn resolve_pass(
        &mut self,
        raw: &HashMap<String, String>,
        scope: Option<&HashSet<String>>,
        stored: &HashMap<String, ParamValue>,
    ) -> ParamResult<()> {
        let names: Vec<String> = self
            .defs
            .iter()
            .map(|d| d.name.clone())
            .filter(|n| scope.map_or(true, |s| s.contains(n)))
            .collect();

        for name in names {
            if self.is_set(&name) {
                continue;
            }

            if let Some(value) = raw.get(&name) {
                self.set_raw(&name, value)?;
                continue;
            }

            let def = match self.def(&name) {
                Some(d) => d.clone(),
                None => continue,
            };

            if let Some(var) = &def.env {
                if let Ok(value) = std::env::var(var) {
                    self.set_raw(&name, &value)?;
                    continue;
                }
            }

            if let Some(value) = stored.get(&name) {
                // store- and default-sourced values are not mutations
                self.insert(&name, value.clone(), false);
                continue;
            }

            if let Some(value) = &def.default {
                self.insert(&name, value.clone(), false);
            }
        }

        Ok(())
    }

    /// All resolved values as display strings, for interpolation
    pub fn string_map(&self) -> HashMap<String, String> {
        self.values
            .iter()
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect()
    }

    /// Resolved values of persist-flagged parameters, for the store
    pub fn persist_snapshot(&self) -> BTreeMap<String, ParamValue> {
        self.defs
            .iter()
            .filter(|d| d.persist)
            .filter_map(|d| self.values.get(&d.name).map(|v| (d.name.clone(), v.clone())))
            .collect()
    }

    /// Whether any persist-flagged parameter changed since the last flush
    pub fn has_dirty_persistent(&self) -> bool {
        !self.dirty.is_empty()
    }

    pub fn clear_dirty(&mut self) {
        self.dirty.clear();
    }

    /// Clear all resolved values (definitions are kept)
    pub fn reset(&mut self) {
        self.values.clear();
        self.dirty.clear();
    }

    fn insert(&mut self, name: &str, value: ParamValue, mark_dirty: bool) {
        let key = self.canonical(name).unwrap_or(name).to_string();
        if mark_dirty && self.def(&key).map_or(false, |d| d.persist) {
            self.dirty.insert(key.clone());
        }
        self.values.insert(key, value);
    }
}

fn type_mismatch(name: &str, expected: &str) -> ParamError {
    ParamError::InvalidValue {
        name: name.to_string(),
        error: format!("expected a {} value", expected),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::types::ValueKind;

    fn registry() -> ParamRegistry {
        let mut params = ParamRegistry::new();
        params.define(ParamDef::new("name", ValueKind::Str).alias("project-name"));
        params.define(ParamDef::new("count", ValueKind::Int).default_value(ParamValue::Int(1)));
        params.define(ParamDef::new("token", ValueKind::Str).persist());
        params
    }

    #[test]
    fn test_set_and_get_by_alias() {
        let mut params = registry();
        params.set("project-name", "demo");

        assert!(params.is_set("name"));
        assert_eq!(params.get_str("name").unwrap(), "demo");
        assert_eq!(params.get_str("project-name").unwrap(), "demo");
    }

    #[test]
    fn test_get_missing() {
        let params = registry();
        let result = params.get("name");
        assert!(matches!(result, Err(ParamError::MissingParam(_))));
    }

    #[test]
    fn test_set_raw_parses_kind() {
        let mut params = registry();
        params.set_raw("count", "7").unwrap();
        assert_eq!(params.get_int("count").unwrap(), 7);

        let result = params.set_raw("count", "seven");
        assert!(matches!(result, Err(ParamError::InvalidValue { .. })));
    }

    #[test]
    fn test_set_raw_unknown_param() {
        let mut params = registry();
        let result = params.set_raw("unknown", "x");
        assert!(matches!(result, Err(ParamError::UnknownParam(_))));
    }

    #[test]
    fn test_ad_hoc_values_allowed() {
        let mut params = registry();
        params.set("loop-counter", 3i64);
        assert_eq!(params.get_int("loop-counter").unwrap(), 3);
    }

    #[test]
    fn test_resolve_pass_precedence() {
        let mut params = registry();
        let mut raw = HashMap::new();
        raw.insert("name".to_string(), "from-cli".to_string());

        let mut stored = HashMap::new();
        stored.insert("count".to_string(), ParamValue::Int(9));
        stored.insert("name".to_string(), ParamValue::Str("from-store".to_string()));

        params.resolve_pass(&raw, None, &stored).unwrap();

        assert_eq!(params.get_str("name").unwrap(), "from-cli");
        // store beats default
        assert_eq!(params.get_int("count").unwrap(), 9);
    }

    #[test]
    fn test_resolve_pass_default() {
        let mut params = registry();
        params.resolve_pass(&HashMap::new(), None, &HashMap::new()).unwrap();
        assert_eq!(params.get_int("count").unwrap(), 1);
        assert!(!params.is_set("name"));
    }

    #[test]
    fn test_resolve_pass_scope() {
        let mut params = registry();
        let scope: HashSet<String> = ["name".to_string()].into_iter().collect();
        params.resolve_pass(&HashMap::new(), Some(&scope), &HashMap::new()).unwrap();
        // count is out of scope, so its default is not applied
        assert!(!params.is_set("count"));
    }

    #[test]
    fn test_dirty_tracking() {
        let mut params = registry();
        assert!(!params.has_dirty_persistent());

        params.set("name", "x");
        assert!(!params.has_dirty_persistent());

        params.set("token", "secret");
        assert!(params.has_dirty_persistent());
        assert_eq!(
            params.persist_snapshot().get("token"),
            Some(&ParamValue::Str("secret".to_string()))
        );

        params.clear_dirty();
        assert!(!params.has_dirty_persistent());
    }

    #[test]
    fn test_reset_keeps_defs() {
        let mut params = registry();
        params.set("name", "x");
        params.reset();
        assert!(!params.is_set("name"));
        assert!(params.def("name").is_some());
    }
}
