//! Doc-tree discovery and lightweight dissection of record text.
//!
//! The helpers here walk a generated documentation tree for registry assets
//! and scrape record markup for the identifiers reporting needs (implemented
//! trait, target item kind and name) without an HTML parser. They
//! intentionally err on the side of under-reporting when markup looks
//! unfamiliar because the outputs drive coverage accounting and validation.

use crate::asset::read_registry_asset;
use crate::registry::{ImplementorRegistry, RegistryHub, TargetKind, TraitPath};
use anyhow::{Context, Result, anyhow, bail};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Directory inside a doc root that holds registry assets.
pub const IMPLEMENTORS_DIR: &str = "implementors";

#[derive(Debug)]
/// One asset located and parsed during a tree scan.
pub struct ScannedAsset {
    pub trait_path: TraitPath,
    /// Asset location relative to the doc root.
    pub rel_path: PathBuf,
    pub registry: ImplementorRegistry,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Implementing type scraped from a record's markup.
pub struct ImplTarget {
    pub kind: TargetKind,
    pub display: String,
}

/// Collect every registry asset under `<doc_root>/implementors`.
///
/// Traversal is recursive because module paths nest arbitrarily deep. A doc
/// root without an implementors directory is an error: scans operate on a
/// built tree, not a partially generated one.
pub fn collect_registry_assets(doc_root: &Path) -> Result<Vec<PathBuf>> {
    let root = doc_root.join(IMPLEMENTORS_DIR);
    if !root.is_dir() {
        bail!(
            "{} has no {IMPLEMENTORS_DIR}/ directory; point at a generated doc tree",
            doc_root.display()
        );
    }
    let mut assets = Vec::new();
    collect_assets(&root, &mut assets)?;
    assets.sort();
    Ok(assets)
}

fn collect_assets(dir: &Path, acc: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_assets(&path, acc)?;
        } else if path.extension().and_then(|ext| ext.to_str()) == Some("js") {
            acc.push(path);
        }
    }
    Ok(())
}

/// Parse every asset in a doc tree, pairing each with its trait path.
pub fn scan_doc_tree(doc_root: &Path) -> Result<Vec<ScannedAsset>> {
    let implementors_root = doc_root.join(IMPLEMENTORS_DIR);
    let mut scanned = Vec::new();
    for asset in collect_registry_assets(doc_root)? {
        let trait_path = trait_path_from_asset(&implementors_root, &asset)?;
        let registry = read_registry_asset(&asset)?;
        let rel_path = asset
            .strip_prefix(doc_root)
            .unwrap_or(asset.as_path())
            .to_path_buf();
        scanned.push(ScannedAsset {
            trait_path,
            rel_path,
            registry,
        });
    }
    Ok(scanned)
}

/// Scan a doc tree and fold every asset into a `RegistryHub`.
pub fn load_registry_hub(doc_root: &Path) -> Result<RegistryHub> {
    let mut hub = RegistryHub::default();
    for scanned in scan_doc_tree(doc_root)? {
        hub.register(scanned.trait_path, scanned.registry);
    }
    Ok(hub)
}

/// Relative location of a trait's asset inside `implementors/`.
///
/// `core::marker::Copy` maps to `core/marker/trait.Copy.js`. Paths with fewer
/// than two segments or non-identifier segments are rejected; a trait always
/// lives inside a crate.
pub fn asset_rel_path(trait_path: &TraitPath) -> Result<PathBuf> {
    let segments: Vec<&str> = trait_path.segments().collect();
    if segments.len() < 2 {
        bail!("trait path '{trait_path}' must name both a module path and a trait");
    }
    for segment in &segments {
        if segment.is_empty() {
            bail!("trait path '{trait_path}' contains an empty segment");
        }
        if !segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            bail!("trait path '{trait_path}' contains a non-identifier segment '{segment}'");
        }
    }

    let mut path = PathBuf::new();
    for segment in &segments[..segments.len() - 1] {
        path.push(segment);
    }
    path.push(format!("trait.{}.js", segments[segments.len() - 1]));
    Ok(path)
}

/// Trait path encoded by an asset's location under `implementors/`.
pub fn trait_path_from_asset(implementors_root: &Path, asset: &Path) -> Result<TraitPath> {
    let rel = asset.strip_prefix(implementors_root).with_context(|| {
        format!(
            "asset {} lies outside {}",
            asset.display(),
            implementors_root.display()
        )
    })?;

    let mut segments: Vec<&str> = Vec::new();
    for component in rel.components() {
        let Component::Normal(part) = component else {
            bail!("asset path {} has a non-plain component", rel.display());
        };
        let part = part
            .to_str()
            .ok_or_else(|| anyhow!("asset path {} is not valid UTF-8", rel.display()))?;
        segments.push(part);
    }

    let Some(file_name) = segments.pop() else {
        bail!("asset path {} has no file name", rel.display());
    };
    let trait_name = file_name
        .strip_prefix("trait.")
        .and_then(|rest| rest.strip_suffix(".js"))
        .ok_or_else(|| {
            anyhow!("asset file '{file_name}' does not match the trait.<Name>.js form")
        })?;
    if trait_name.is_empty() {
        bail!("asset file '{file_name}' has an empty trait name");
    }
    if segments.is_empty() {
        bail!(
            "asset {} must live under a crate directory inside {IMPLEMENTORS_DIR}/",
            rel.display()
        );
    }

    let mut path = segments.join("::");
    path.push_str("::");
    path.push_str(trait_name);
    Ok(TraitPath(path))
}

/// Extract the implementing type's kind and display name from record markup.
///
/// Looks for the first anchor after the ` for ` separator; its `class`
/// attribute names the item kind and its inner text the bare type name.
/// Returns `None` for shapes without a target anchor (blanket impls over a
/// type parameter render no link).
pub fn scrape_impl_target(text: &str) -> Option<ImplTarget> {
    let separator = text.find(" for ")?;
    let tail = &text[separator + " for ".len()..];
    let anchor = &tail[tail.find("<a ")?..];
    let open_tag = &anchor[..anchor.find('>')?];

    let kind = TargetKind::from_str(attr_value(open_tag, "class")?);
    let inner_start = open_tag.len() + 1;
    let inner_end = anchor[inner_start..].find("</a>")? + inner_start;
    let display = anchor[inner_start..inner_end].trim();
    if display.is_empty() {
        return None;
    }
    Some(ImplTarget {
        kind,
        display: display.to_string(),
    })
}

/// Extract the implemented trait's path from record markup.
///
/// The trait anchor is the last `class="trait"` anchor before the ` for `
/// separator; earlier ones belong to generic bounds. The path rides in the
/// anchor's `title` attribute (`title="trait core::marker::Copy"`).
pub fn scrape_trait_path(text: &str) -> Option<TraitPath> {
    let separator = text.find(" for ")?;
    let mut head = &text[..separator];
    let mut found: Option<&str> = None;

    while let Some(idx) = head.find("<a ") {
        let anchor = &head[idx..];
        let Some(open_end) = anchor.find('>') else {
            break;
        };
        let open_tag = &anchor[..open_end];
        if attr_value(open_tag, "class") == Some("trait") {
            if let Some(path) = attr_value(open_tag, "title").and_then(|t| t.strip_prefix("trait "))
            {
                found = Some(path);
            }
        }
        head = &anchor[open_end..];
    }

    let path = found?.trim();
    if path.is_empty() {
        return None;
    }
    Some(TraitPath(path.to_string()))
}

fn attr_value<'a>(open_tag: &'a str, name: &str) -> Option<&'a str> {
    let marker = format!("{name}=\"");
    let start = open_tag.find(&marker)? + marker.len();
    let end = open_tag[start..].find('"')? + start;
    Some(&open_tag[start..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const RECORD_TEXT: &str = "impl&lt;T:&nbsp;<a class=\"trait\" href=\"https://doc.rust-lang.org/nightly/core/marker/trait.Copy.html\" title=\"trait core::marker::Copy\">Copy</a>&gt; <a class=\"trait\" href=\"https://doc.rust-lang.org/nightly/core/marker/trait.Copy.html\" title=\"trait core::marker::Copy\">Copy</a> for <a class=\"struct\" href=\"ledger_core/cell/struct.Slot.html\" title=\"struct ledger_core::cell::Slot\">Slot</a>&lt;T&gt;";

    #[test]
    fn trait_paths_and_asset_paths_round_trip() {
        let trait_path = TraitPath("core::marker::Copy".to_string());
        let rel = asset_rel_path(&trait_path).expect("valid trait path");
        assert_eq!(rel, PathBuf::from("core/marker/trait.Copy.js"));

        let root = PathBuf::from("/docs/implementors");
        let recovered =
            trait_path_from_asset(&root, &root.join(&rel)).expect("round trip");
        assert_eq!(recovered, trait_path);
    }

    #[test]
    fn rejects_degenerate_trait_paths() {
        assert!(asset_rel_path(&TraitPath("Copy".to_string())).is_err());
        assert!(asset_rel_path(&TraitPath("core::::Copy".to_string())).is_err());
        assert!(asset_rel_path(&TraitPath("core::mar ker::Copy".to_string())).is_err());
    }

    #[test]
    fn rejects_asset_names_outside_the_trait_form() {
        let root = PathBuf::from("/docs/implementors");
        assert!(trait_path_from_asset(&root, &root.join("core/macro.pin.js")).is_err());
        assert!(trait_path_from_asset(&root, &root.join("trait.Copy.js")).is_err());
        assert!(trait_path_from_asset(&root, &root.join("core/trait..js")).is_err());
    }

    #[test]
    fn scrape_finds_target_after_separator_not_bounds() {
        let target = scrape_impl_target(RECORD_TEXT).expect("target present");
        assert_eq!(target.kind, TargetKind::Struct);
        assert_eq!(target.display, "Slot");

        let trait_path = scrape_trait_path(RECORD_TEXT).expect("trait present");
        assert_eq!(trait_path.0, "core::marker::Copy");
    }

    #[test]
    fn scrape_under_reports_on_unlinked_targets() {
        // Blanket impls render the target as a bare type parameter.
        let blanket = "impl&lt;T&gt; <a class=\"trait\" href=\"x\" title=\"trait core::convert::From\">From</a>&lt;T&gt; for T";
        assert_eq!(scrape_impl_target(blanket), None);
        assert!(scrape_trait_path(blanket).is_some());

        assert_eq!(scrape_impl_target("no separator here"), None);
        assert_eq!(scrape_trait_path("no separator here"), None);
    }

    #[test]
    fn collect_assets_recurses_and_sorts() {
        let temp = TempDir::new().expect("temp dir");
        let root = temp.path();
        let deep = root.join("implementors/ledger_core/frame");
        std::fs::create_dir_all(&deep).unwrap();
        std::fs::create_dir_all(root.join("implementors/ledger_util")).unwrap();
        std::fs::write(deep.join("trait.Sealed.js"), "").unwrap();
        std::fs::write(root.join("implementors/ledger_util/trait.Log.js"), "").unwrap();

        let assets = collect_registry_assets(root).expect("collect assets");
        assert_eq!(assets.len(), 2);
        assert!(assets[0].ends_with("ledger_core/frame/trait.Sealed.js"));
        assert!(assets[1].ends_with("ledger_util/trait.Log.js"));

        let missing = TempDir::new().expect("temp dir");
        assert!(collect_registry_assets(missing.path()).is_err());
    }
}
