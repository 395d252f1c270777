//! Indexed view of a validated implementor registry.
//!
//! The index enforces the payload schema and the structural rules before
//! handing out lookups, so helper binaries cannot silently consume a registry
//! with empty record lists or blank type paths. It also builds a reverse map
//! from type path to the crates that contribute records for it.

use crate::registry::load_registry_from_path;
use crate::registry::{CrateName, ImplementorRecord, ImplementorRegistry, TypePath};
use crate::schema_loader::load_payload_schema;
use anyhow::{Context, Result, bail};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

#[derive(Debug)]
/// Implementor registry plus a derived index keyed by type path.
pub struct RegistryIndex {
    registry: ImplementorRegistry,
    by_type: BTreeMap<TypePath, BTreeSet<CrateName>>,
}

impl RegistryIndex {
    /// Load and validate a payload file from disk.
    ///
    /// Validates against the payload schema first, then re-checks the typed
    /// form so error messages name the offending crate and record.
    pub fn load(path: &Path) -> Result<Self> {
        validate_against_schema(path)?;

        let registry = load_registry_from_path(path)
            .with_context(|| format!("loading {}", path.display()))?;
        Self::from_registry(registry)
    }

    /// Index an already-parsed registry, enforcing the structural rules.
    pub fn from_registry(registry: ImplementorRegistry) -> Result<Self> {
        let by_type = build_type_index(&registry)?;
        Ok(Self { registry, by_type })
    }

    /// Iterates crate names in stable order.
    pub fn crates(&self) -> impl Iterator<Item = &CrateName> {
        self.registry.crates()
    }

    /// Records registered under a crate name.
    ///
    /// Returns `None` instead of erroring; callers surface errors with the CLI
    /// context that referenced the missing crate.
    pub fn records_for(&self, name: &CrateName) -> Option<&[ImplementorRecord]> {
        self.registry.records_for(name)
    }

    /// Crates that contribute at least one record mentioning the type path.
    pub fn crates_for_type(&self, path: &TypePath) -> Option<&BTreeSet<CrateName>> {
        self.by_type.get(path)
    }

    /// Iterates indexed type paths in stable order.
    pub fn type_paths(&self) -> impl Iterator<Item = &TypePath> {
        self.by_type.keys()
    }

    /// Access the underlying registry.
    pub fn registry(&self) -> &ImplementorRegistry {
        &self.registry
    }
}

pub(crate) fn validate_crate_name(name: &CrateName) -> Result<()> {
    if name.0.is_empty() {
        bail!("crate name must not be empty");
    }

    if !name
        .0
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'))
    {
        bail!("crate name must match ^[A-Za-z0-9_-]+$, got {}", name.0);
    }

    Ok(())
}

pub(crate) fn validate_record(owner: &CrateName, record: &ImplementorRecord) -> Result<()> {
    if record.text.trim().is_empty() {
        bail!("crate {} has a record with empty text", owner.0);
    }
    if record.types.is_empty() {
        bail!(
            "crate {} has a record with no type paths: {}",
            owner.0,
            record.text
        );
    }
    for path in &record.types {
        if path.0.trim().is_empty() {
            bail!("crate {} has a record with an empty type path", owner.0);
        }
    }
    Ok(())
}

fn build_type_index(
    registry: &ImplementorRegistry,
) -> Result<BTreeMap<TypePath, BTreeSet<CrateName>>> {
    if registry.is_empty() {
        bail!("registry contains no crates");
    }

    let mut map: BTreeMap<TypePath, BTreeSet<CrateName>> = BTreeMap::new();
    for (name, records) in registry.entries() {
        validate_crate_name(name)?;
        if records.is_empty() {
            bail!("crate {} has an empty record list", name.0);
        }
        for record in records {
            validate_record(name, record)?;
            for path in &record.types {
                map.entry(path.clone()).or_default().insert(name.clone());
            }
        }
    }
    Ok(map)
}

/// Check an in-memory payload value against the shipped payload schema.
///
/// Used by `RegistryIndex::load` before deserialization and by the render CLI
/// before it turns fragments into an asset.
pub fn validate_payload_value(payload: &Value) -> Result<()> {
    let schema = load_payload_schema()?;
    if let Err(errors) = schema.compiled.validate(payload) {
        let details = errors
            .map(|err| err.to_string())
            .collect::<Vec<_>>()
            .join("\n");
        bail!("implementors payload failed schema validation:\n{details}");
    }
    Ok(())
}

fn validate_against_schema(payload_path: &Path) -> Result<()> {
    let payload_file = File::open(payload_path)
        .with_context(|| format!("opening payload {}", payload_path.display()))?;
    let payload_value: Value = serde_json::from_reader(BufReader::new(payload_file))
        .with_context(|| format!("parsing payload {}", payload_path.display()))?;

    validate_payload_value(&payload_value)
        .with_context(|| format!("payload {}", payload_path.display()))
}
