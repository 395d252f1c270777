//! Core representation of a trait-implementor registry.
//!
//! The types mirror the payload carried by a registry asset: a mapping from
//! crate name to the ordered list of implementor records for one trait. Use
//! `RegistryIndex` for validation and lookup; use these structs when the raw
//! mapping is enough (merging, rendering, reporting).

use crate::registry::identity::{CrateName, TypePath};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
/// One implementor entry: a rendered `impl` line plus the implementing types.
///
/// `text` carries markup for the documentation site's implementors panel.
/// `synthetic` marks auto-derived implementations; it is omitted from
/// hand-written payload fragments and defaults to `false`. `types` preserves
/// emission order because the panel script matches entries positionally.
pub struct ImplementorRecord {
    pub text: String,
    #[serde(default)]
    pub synthetic: bool,
    pub types: Vec<TypePath>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
/// Mapping from crate name to that crate's implementor records for one trait.
///
/// Crate keys are kept in a `BTreeMap` so every emission is deterministic;
/// per-crate record order is preserved exactly as provided.
pub struct ImplementorRegistry {
    entries: BTreeMap<CrateName, Vec<ImplementorRecord>>,
}

impl ImplementorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the full record list for one crate, replacing any previous entry.
    pub fn insert_crate(&mut self, name: CrateName, records: Vec<ImplementorRecord>) {
        self.entries.insert(name, records);
    }

    /// Remove a crate's entry, returning its records when present.
    pub fn remove_crate(&mut self, name: &CrateName) -> Option<Vec<ImplementorRecord>> {
        self.entries.remove(name)
    }

    /// Fold another registry into this one; the other registry's entries win
    /// for crates present in both.
    pub fn absorb(&mut self, other: ImplementorRegistry) {
        for (name, records) in other.entries {
            self.entries.insert(name, records);
        }
    }

    pub fn contains_crate(&self, name: &CrateName) -> bool {
        self.entries.contains_key(name)
    }

    pub fn records_for(&self, name: &CrateName) -> Option<&[ImplementorRecord]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    /// Iterate crate names in stable (sorted) order.
    pub fn crates(&self) -> impl Iterator<Item = &CrateName> {
        self.entries.keys()
    }

    /// Iterate `(crate, records)` pairs in stable order.
    pub fn entries(&self) -> impl Iterator<Item = (&CrateName, &[ImplementorRecord])> {
        self.entries.iter().map(|(name, records)| (name, records.as_slice()))
    }

    pub fn crate_count(&self) -> usize {
        self.entries.len()
    }

    pub fn record_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize into the un-wrapped payload mapping (`{"crate": [records]}`).
    pub fn to_payload_value(&self) -> Value {
        let mut map = Map::new();
        for (name, records) in &self.entries {
            map.insert(name.0.clone(), json!(records));
        }
        Value::Object(map)
    }

    /// Build a registry from an un-wrapped payload mapping.
    ///
    /// Shape errors carry the offending crate key so callers can point at the
    /// broken entry instead of the whole document.
    pub fn from_payload_value(value: &Value) -> Result<Self> {
        let Value::Object(map) = value else {
            bail!("payload must be a JSON object mapping crate names to record arrays");
        };
        let mut registry = ImplementorRegistry::new();
        for (key, records_value) in map {
            let records: Vec<ImplementorRecord> = serde_json::from_value(records_value.clone())
                .with_context(|| format!("parsing records for crate '{key}'"))?;
            registry.insert_crate(CrateName(key.clone()), records);
        }
        Ok(registry)
    }
}

/// Read and parse a payload mapping from disk without additional validation.
pub fn load_registry_from_path(path: &Path) -> Result<ImplementorRegistry> {
    let data =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let value: Value = serde_json::from_str(&data)
        .with_context(|| format!("parsing {}", path.display()))?;
    ImplementorRegistry::from_payload_value(&value)
        .with_context(|| format!("interpreting {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(text: &str, types: &[&str]) -> ImplementorRecord {
        ImplementorRecord {
            text: text.to_string(),
            synthetic: false,
            types: types.iter().map(|t| TypePath(t.to_string())).collect(),
        }
    }

    #[test]
    fn payload_round_trip_preserves_records() {
        let mut registry = ImplementorRegistry::new();
        registry.insert_crate(
            CrateName("ledger_core".to_string()),
            vec![record("impl Copy for Header", &["ledger_core::frame::Header"])],
        );

        let payload = registry.to_payload_value();
        assert_eq!(
            payload
                .pointer("/ledger_core/0/types/0")
                .and_then(Value::as_str),
            Some("ledger_core::frame::Header")
        );

        let back = ImplementorRegistry::from_payload_value(&payload).expect("payload parses");
        assert_eq!(back, registry);
    }

    #[test]
    fn synthetic_defaults_to_false() {
        let payload = json!({
            "ledger_core": [
                {"text": "impl Copy for Header", "types": ["ledger_core::frame::Header"]}
            ]
        });
        let registry = ImplementorRegistry::from_payload_value(&payload).expect("parses");
        let records = registry
            .records_for(&CrateName("ledger_core".to_string()))
            .expect("crate present");
        assert!(!records[0].synthetic);
    }

    #[test]
    fn payload_errors_name_the_broken_crate() {
        let payload = json!({"ledger_core": {"not": "an array"}});
        let err = ImplementorRegistry::from_payload_value(&payload).expect_err("shape error");
        assert!(format!("{err:#}").contains("ledger_core"));
    }

    #[test]
    fn absorb_replaces_same_crate_and_keeps_others() {
        let mut base = ImplementorRegistry::new();
        base.insert_crate(
            CrateName("ledger_core".to_string()),
            vec![record("old", &["ledger_core::Old"])],
        );
        base.insert_crate(
            CrateName("ledger_util".to_string()),
            vec![record("kept", &["ledger_util::Kept"])],
        );

        let mut fresh = ImplementorRegistry::new();
        fresh.insert_crate(
            CrateName("ledger_core".to_string()),
            vec![record("new", &["ledger_core::New"])],
        );

        base.absorb(fresh);
        assert_eq!(base.crate_count(), 2);
        let core = base
            .records_for(&CrateName("ledger_core".to_string()))
            .expect("core entry");
        assert_eq!(core[0].text, "new");
        assert!(base.contains_crate(&CrateName("ledger_util".to_string())));
    }
}
