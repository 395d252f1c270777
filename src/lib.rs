//! Shared library for the traitdex toolset.
//!
//! The crate exposes the implementor-registry types and utilities used by the
//! helper binaries. Public functions here form the contract that the binaries
//! depend on: doc-tree discovery, helper binary resolution, registry asset
//! lookup, and the parse/render/merge/validate operations over the
//! `implementors/trait.*.js` assets that rustdoc-style trees carry.

use anyhow::{Context, Result, bail};
use std::env;
use std::path::{Path, PathBuf};

pub mod asset;
pub mod merge;
pub mod payload;
pub mod registry;
pub mod report;
pub mod runtime;
pub mod scan;
mod schema_loader;
pub mod validation;

pub use asset::{
    ASSET_HEADER, ASSET_TRAILER, AssetParseError, PENDING_SLOT, ParsedAsset, REGISTER_HOOK,
    parse_registry_asset, read_registry_asset, render_registry_asset, write_registry_asset,
};
pub use merge::{MergeOptions, MergeOutcome, merge_asset_file, merge_registries};
pub use payload::{PayloadArgs, PayloadFragment, PayloadSource, parse_payload_input};
pub use registry::{
    CrateName, ImplementorRecord, ImplementorRegistry, RegistrationBus, RegistryHook, RegistryHub,
    RegistryIndex, TargetKind, TraitPath, TypePath, load_registry_from_path,
    validate_payload_value,
};
pub use report::{
    CrateRollupEntry, ScanTotals, TraitCoverageEntry, build_crate_rollup,
    build_scan_totals, build_trait_coverage_map, strip_ignored_crates,
};
pub use scan::{
    IMPLEMENTORS_DIR, ImplTarget, ScannedAsset, asset_rel_path, load_registry_hub, scan_doc_tree,
    scrape_impl_target, scrape_trait_path, trait_path_from_asset,
};
pub use validation::{validate_asset_file, validate_doc_tree, validate_registry};

const DOC_ROOT_ENV: &str = "TRAITDEX_DOC_ROOT";
const DEFAULT_DOC_DIRS: &[&str] = &["doc", "target/doc"];

/// A directory qualifies as a doc root when it carries the implementors
/// subtree the tools operate on.
fn looks_like_doc_root(candidate: &Path) -> bool {
    candidate.join(IMPLEMENTORS_DIR).is_dir()
}

fn doc_root_from_hint(hint: &str) -> Option<PathBuf> {
    let trimmed = hint.trim();
    if trimmed.is_empty() {
        return None;
    }
    let candidate = PathBuf::from(trimmed);
    if candidate.exists() && looks_like_doc_root(&candidate) {
        return candidate.canonicalize().ok();
    }
    None
}

/// Determine the documentation tree to operate on.
///
/// Resolution order: explicit path, then `TRAITDEX_DOC_ROOT`, then `./doc`
/// and `./target/doc` relative to the working directory. An explicit path
/// that does not hold an `implementors/` directory is an error; a stale env
/// value falls through to the defaults.
pub fn resolve_doc_root(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if !looks_like_doc_root(path) {
            bail!(
                "{} does not look like a generated doc tree (no {}/ directory)",
                path.display(),
                IMPLEMENTORS_DIR
            );
        }
        return path
            .canonicalize()
            .with_context(|| format!("Failed to canonicalize doc root {}", path.display()));
    }

    if let Ok(hint) = env::var(DOC_ROOT_ENV) {
        if let Some(root) = doc_root_from_hint(&hint) {
            return Ok(root);
        }
    }

    for default in DEFAULT_DOC_DIRS {
        if let Some(root) = doc_root_from_hint(default) {
            return Ok(root);
        }
    }

    bail!(
        "Unable to locate a documentation tree. Pass --doc-root or set {} to a \
         directory containing an {}/ subtree.",
        DOC_ROOT_ENV,
        IMPLEMENTORS_DIR
    )
}

/// Resolve a registry asset identifier to a file inside the doc tree.
///
/// Accepts a trait path (`core::marker::Send`), a path relative to the
/// implementors root (`core/marker/trait.Send.js`), a path relative to the
/// doc root, or an absolute path. Resolved files must stay inside the
/// implementors subtree.
pub fn resolve_registry_asset(doc_root: &Path, identifier: &str) -> Result<PathBuf> {
    let implementors_root = doc_root
        .join(IMPLEMENTORS_DIR)
        .canonicalize()
        .with_context(|| {
            format!(
                "Doc tree at {} has no usable {}/ directory",
                doc_root.display(),
                IMPLEMENTORS_DIR
            )
        })?;

    let trimmed = identifier.trim();
    if trimmed.is_empty() {
        bail!("Registry asset identifier is empty");
    }
    let trimmed = trimmed.strip_prefix("./").unwrap_or(trimmed);

    let mut candidates: Vec<PathBuf> = Vec::new();
    if trimmed.contains("::") {
        let rel = asset_rel_path(&TraitPath(trimmed.to_string()))?;
        candidates.push(implementors_root.join(rel));
    } else {
        let as_path = PathBuf::from(trimmed);
        if as_path.is_absolute() {
            candidates.push(as_path);
        } else {
            candidates.push(implementors_root.join(&as_path));
            candidates.push(doc_root.join(&as_path));
        }
    }

    for candidate in candidates {
        if !candidate.is_file() {
            continue;
        }
        let resolved = candidate
            .canonicalize()
            .with_context(|| format!("Failed to canonicalize {}", candidate.display()))?;
        if resolved.starts_with(&implementors_root) {
            return Ok(resolved);
        }
    }

    bail!("Registry asset not found: {identifier}")
}

/// Split a comma- or whitespace-separated list into trimmed entries.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
