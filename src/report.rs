//! Coverage accounting over a scanned documentation tree.
//!
//! Helpers here summarize a `RegistryHub` from two directions: per trait
//! (which crates contribute implementors) and per crate (which traits a crate
//! shows up under). Both views stay deterministic so scan output can be
//! diffed across doc builds.

use crate::registry::{ImplementorRegistry, RegistryHub};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Serialize)]
/// Per-trait summary: how many crates and records feed one asset.
pub struct TraitCoverageEntry {
    pub crate_count: usize,
    pub record_count: usize,
    pub synthetic_count: usize,
    pub type_count: usize,
    pub crates: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
/// Per-crate summary: the traits a crate registers implementors for.
pub struct CrateRollupEntry {
    pub trait_count: usize,
    pub record_count: usize,
    pub traits: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
/// Tree-wide totals for scan output.
pub struct ScanTotals {
    pub traits: usize,
    pub crates: usize,
    pub records: usize,
    pub synthetic_records: usize,
}

/// Build a mapping of trait path to coverage for every registry in the hub.
pub fn build_trait_coverage_map(hub: &RegistryHub) -> BTreeMap<String, TraitCoverageEntry> {
    let mut map = BTreeMap::new();
    for trait_path in hub.trait_paths() {
        let Some(registry) = hub.get(trait_path) else {
            continue;
        };
        let mut entry = TraitCoverageEntry {
            crate_count: registry.crate_count(),
            record_count: registry.record_count(),
            synthetic_count: 0,
            type_count: 0,
            crates: Vec::new(),
        };
        for (name, records) in registry.entries() {
            entry.crates.push(name.0.clone());
            for record in records {
                if record.synthetic {
                    entry.synthetic_count += 1;
                }
                entry.type_count += record.types.len();
            }
        }
        map.insert(trait_path.0.clone(), entry);
    }
    map
}

/// Build the inverse view: crate name to the traits it registers under.
pub fn build_crate_rollup(hub: &RegistryHub) -> BTreeMap<String, CrateRollupEntry> {
    let mut map: BTreeMap<String, CrateRollupEntry> = BTreeMap::new();
    for trait_path in hub.trait_paths() {
        let Some(registry) = hub.get(trait_path) else {
            continue;
        };
        for (name, records) in registry.entries() {
            let entry = map.entry(name.0.clone()).or_insert_with(|| CrateRollupEntry {
                trait_count: 0,
                record_count: 0,
                traits: Vec::new(),
            });
            entry.trait_count += 1;
            entry.record_count += records.len();
            entry.traits.push(trait_path.0.clone());
        }
    }
    map
}

/// Tree-wide totals across every registry in the hub.
pub fn build_scan_totals(hub: &RegistryHub) -> ScanTotals {
    let mut crates: BTreeSet<String> = BTreeSet::new();
    let mut records = 0usize;
    let mut synthetic_records = 0usize;
    for trait_path in hub.trait_paths() {
        let Some(registry) = hub.get(trait_path) else {
            continue;
        };
        for (name, list) in registry.entries() {
            crates.insert(name.0.clone());
            records += list.len();
            synthetic_records += list.iter().filter(|record| record.synthetic).count();
        }
    }
    ScanTotals {
        traits: hub.len(),
        crates: crates.len(),
        records,
        synthetic_records,
    }
}

/// Copy a hub minus the named crates; traits left with no entries drop out.
pub fn strip_ignored_crates(hub: &RegistryHub, ignored: &[String]) -> RegistryHub {
    let mut filtered = RegistryHub::default();
    for trait_path in hub.trait_paths() {
        let Some(registry) = hub.get(trait_path) else {
            continue;
        };
        let mut kept = ImplementorRegistry::new();
        for (name, records) in registry.entries() {
            if !ignored.iter().any(|ignore| ignore == &name.0) {
                kept.insert_crate(name.clone(), records.to_vec());
            }
        }
        if !kept.is_empty() {
            filtered.register(trait_path.clone(), kept);
        }
    }
    filtered
}
