//! Folding freshly generated registry entries into an existing doc tree.
//!
//! When one crate's documentation is regenerated into a shared tree, its
//! statements must replace the stale ones for that crate while every other
//! crate's entries survive. The merge always rewrites assets in canonical
//! form, so repeated runs converge to byte-identical files.

use crate::asset::{read_registry_asset, render_registry_asset};
use crate::registry::{CrateName, ImplementorRegistry, TraitPath};
use crate::scan::{IMPLEMENTORS_DIR, asset_rel_path};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
/// Knobs for `merge_asset_file`.
pub struct MergeOptions {
    /// Drop entries for crates with no documentation directory in the tree.
    pub prune: bool,
}

#[derive(Debug, Serialize)]
/// What a merge did to one asset, for machine-readable reporting.
///
/// `replaced` lists crates the fresh registry supplied that already had an
/// entry, whether or not the records differed; `changed` tracks actual bytes.
pub struct MergeOutcome {
    pub trait_path: TraitPath,
    pub asset: PathBuf,
    pub created: bool,
    pub changed: bool,
    pub added: Vec<CrateName>,
    pub replaced: Vec<CrateName>,
    pub kept: Vec<CrateName>,
    pub pruned: Vec<CrateName>,
}

/// Combine two registries; `fresh` wins for crates present in both.
pub fn merge_registries(
    existing: ImplementorRegistry,
    fresh: ImplementorRegistry,
) -> ImplementorRegistry {
    let mut merged = existing;
    merged.absorb(fresh);
    merged
}

/// Drop entries for crates whose documentation directory is gone.
///
/// A generated tree holds one directory per documented crate next to
/// `implementors/`; an entry without that directory is left over from a crate
/// that is no longer part of the build. Returns the dropped names in stable
/// order.
pub fn prune_missing_crates(
    registry: &mut ImplementorRegistry,
    doc_root: &Path,
) -> Vec<CrateName> {
    let stale: Vec<CrateName> = registry
        .crates()
        .filter(|name| !doc_root.join(&name.0).is_dir())
        .cloned()
        .collect();
    for name in &stale {
        registry.remove_crate(name);
    }
    stale
}

/// Merge a fresh registry into the asset addressed by `trait_path`.
///
/// A missing asset file counts as an empty registry, so first-time generation
/// and regeneration share one code path. The asset is rewritten (canonically)
/// only when its bytes would change.
pub fn merge_asset_file(
    doc_root: &Path,
    trait_path: &TraitPath,
    fresh: ImplementorRegistry,
    options: &MergeOptions,
) -> Result<MergeOutcome> {
    let asset = doc_root.join(IMPLEMENTORS_DIR).join(asset_rel_path(trait_path)?);

    let (existing, created) = if asset.is_file() {
        (read_registry_asset(&asset)?, false)
    } else {
        (ImplementorRegistry::new(), true)
    };

    let mut added = Vec::new();
    let mut replaced = Vec::new();
    for name in fresh.crates() {
        if existing.contains_crate(name) {
            replaced.push(name.clone());
        } else {
            added.push(name.clone());
        }
    }
    let kept: Vec<CrateName> = existing
        .crates()
        .filter(|name| !fresh.contains_crate(name))
        .cloned()
        .collect();

    let mut merged = merge_registries(existing, fresh);
    let pruned = if options.prune {
        prune_missing_crates(&mut merged, doc_root)
    } else {
        Vec::new()
    };
    let kept = kept
        .into_iter()
        .filter(|name| !pruned.contains(name))
        .collect();

    let rendered = render_registry_asset(&merged)?;
    let changed = if created {
        true
    } else {
        let before =
            fs::read(&asset).with_context(|| format!("reading {}", asset.display()))?;
        before != rendered.as_bytes()
    };

    if changed {
        if let Some(parent) = asset.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        fs::write(&asset, &rendered).with_context(|| format!("writing {}", asset.display()))?;
    }

    Ok(MergeOutcome {
        trait_path: trait_path.clone(),
        asset,
        created,
        changed,
        added,
        replaced,
        kept,
        pruned,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::write_registry_asset;
    use crate::registry::{ImplementorRecord, TypePath};
    use tempfile::TempDir;

    fn single(name: &str, text: &str) -> ImplementorRegistry {
        let mut registry = ImplementorRegistry::new();
        registry.insert_crate(
            CrateName(name.to_string()),
            vec![ImplementorRecord {
                text: text.to_string(),
                synthetic: false,
                types: vec![TypePath(format!("{name}::Target"))],
            }],
        );
        registry
    }

    #[test]
    fn merge_replaces_fresh_crates_and_keeps_others() {
        let mut existing = single("ledger_core", "old core impl");
        existing.absorb(single("ledger_util", "util impl"));

        let merged = merge_registries(existing, single("ledger_core", "new core impl"));
        assert_eq!(merged.crate_count(), 2);
        let core = merged
            .records_for(&CrateName("ledger_core".to_string()))
            .expect("core entry");
        assert_eq!(core[0].text, "new core impl");
    }

    #[test]
    fn file_merge_creates_then_converges() {
        let temp = TempDir::new().expect("temp dir");
        let doc_root = temp.path();
        let trait_path = TraitPath("core::marker::Copy".to_string());

        let first = merge_asset_file(
            doc_root,
            &trait_path,
            single("ledger_core", "core impl"),
            &MergeOptions::default(),
        )
        .expect("first merge");
        assert!(first.created);
        assert!(first.changed);
        assert_eq!(first.added.len(), 1);
        assert!(first.asset.is_file());

        // Re-merging identical content rewrites nothing.
        let second = merge_asset_file(
            doc_root,
            &trait_path,
            single("ledger_core", "core impl"),
            &MergeOptions::default(),
        )
        .expect("second merge");
        assert!(!second.created);
        assert!(!second.changed);
        assert_eq!(second.replaced.len(), 1);
        assert!(second.added.is_empty());

        let third = merge_asset_file(
            doc_root,
            &trait_path,
            single("ledger_util", "util impl"),
            &MergeOptions::default(),
        )
        .expect("third merge");
        assert!(third.changed);
        assert_eq!(third.added, vec![CrateName("ledger_util".to_string())]);
        assert_eq!(third.kept, vec![CrateName("ledger_core".to_string())]);
    }

    #[test]
    fn prune_drops_crates_without_doc_dirs() {
        let temp = TempDir::new().expect("temp dir");
        let doc_root = temp.path();
        std::fs::create_dir_all(doc_root.join("ledger_core")).unwrap();

        let trait_path = TraitPath("core::marker::Copy".to_string());
        let mut seeded = single("ledger_core", "core impl");
        seeded.absorb(single("ledger_gone", "stale impl"));
        write_registry_asset(
            &doc_root.join("implementors/core/marker/trait.Copy.js"),
            &seeded,
        )
        .expect("seed asset");

        let outcome = merge_asset_file(
            doc_root,
            &trait_path,
            ImplementorRegistry::new(),
            &MergeOptions { prune: true },
        )
        .expect("pruning merge");
        assert_eq!(outcome.pruned, vec![CrateName("ledger_gone".to_string())]);
        assert_eq!(outcome.kept, vec![CrateName("ledger_core".to_string())]);
        assert!(outcome.changed);

        let after = read_registry_asset(&outcome.asset).expect("asset reloads");
        assert!(!after.contains_crate(&CrateName("ledger_gone".to_string())));
    }
}
