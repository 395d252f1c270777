//! Validation helpers for cross-checking registry assets.
//!
//! Used by the check CLI and guard-rail tests to ensure every asset in a doc
//! tree parses, satisfies the structural rules, and stores records whose
//! markup agrees with the asset's own location.

use crate::asset::{parse_registry_asset, render_registry_asset};
use crate::registry::index::{validate_crate_name, validate_payload_value};
use crate::registry::{ImplementorRegistry, TraitPath};
use crate::scan::{
    IMPLEMENTORS_DIR, collect_registry_assets, scrape_trait_path, trait_path_from_asset,
};
use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

/// Validate every registry asset under a doc root.
///
/// Returns a list of violations rather than short-circuiting so callers can
/// surface every broken asset at once. With `strict` set, each asset's bytes
/// must also match its canonical re-rendering.
pub fn validate_doc_tree(doc_root: &Path, strict: bool) -> Result<Vec<String>> {
    let implementors_root = doc_root.join(IMPLEMENTORS_DIR);
    let mut violations = Vec::new();
    for asset in collect_registry_assets(doc_root)? {
        let expected = match trait_path_from_asset(&implementors_root, &asset) {
            Ok(path) => Some(path),
            Err(err) => {
                violations.push(format!("{}: {err:#}", asset.display()));
                None
            }
        };
        violations.extend(validate_asset_file(&asset, expected.as_ref(), strict));
    }
    Ok(violations)
}

/// Validate a single asset file.
///
/// `expected_trait` enables the location-agreement check; pass `None` for
/// files inspected outside a doc tree.
pub fn validate_asset_file(
    asset: &Path,
    expected_trait: Option<&TraitPath>,
    strict: bool,
) -> Vec<String> {
    let display = asset.display().to_string();
    let file = match File::open(asset) {
        Ok(file) => file,
        Err(err) => return vec![format!("{display}: unable to open: {err}")],
    };
    let parsed = match parse_registry_asset(BufReader::new(file)) {
        Ok(parsed) => parsed,
        Err(err) => return vec![format!("{display}: {err}")],
    };

    let registry = parsed.into_registry();
    let mut violations = registry_violations(&display, expected_trait, &registry);
    if let Err(err) = validate_payload_value(&registry.to_payload_value()) {
        violations.push(format!("{display}: {err:#}"));
    }
    if strict {
        match canonical_mismatch(asset, &registry) {
            Ok(Some(message)) => violations.push(message),
            Ok(None) => {}
            Err(err) => violations.push(format!("{display}: {err:#}")),
        }
    }
    violations
}

/// Structural checks for one registry, labeled by its trait path.
pub fn validate_registry(trait_path: &TraitPath, registry: &ImplementorRegistry) -> Vec<String> {
    registry_violations(&trait_path.0, Some(trait_path), registry)
}

fn registry_violations(
    label: &str,
    expected_trait: Option<&TraitPath>,
    registry: &ImplementorRegistry,
) -> Vec<String> {
    let mut violations = Vec::new();
    if registry.is_empty() {
        violations.push(format!("{label}: registry has no crate entries"));
    }

    for (name, records) in registry.entries() {
        if let Err(err) = validate_crate_name(name) {
            violations.push(format!("{label}: {err:#}"));
        }
        if records.is_empty() {
            violations.push(format!("{label}: crate '{}' has an empty record list", name.0));
        }
        for (position, record) in records.iter().enumerate() {
            if record.text.trim().is_empty() {
                violations.push(format!(
                    "{label}: crate '{}' record {position} has empty text",
                    name.0
                ));
            }
            if record.types.is_empty() {
                violations.push(format!(
                    "{label}: crate '{}' record {position} has no type paths",
                    name.0
                ));
            }
            for path in &record.types {
                if path.0.trim().is_empty() {
                    violations.push(format!(
                        "{label}: crate '{}' record {position} has an empty type path",
                        name.0
                    ));
                }
            }
            if let (Some(expected), Some(scraped)) =
                (expected_trait, scrape_trait_path(&record.text))
            {
                if &scraped != expected {
                    violations.push(format!(
                        "{label}: crate '{}' record {position} links trait '{scraped}' but the asset is for '{expected}'",
                        name.0
                    ));
                }
            }
        }
    }
    violations
}

fn canonical_mismatch(asset: &Path, registry: &ImplementorRegistry) -> Result<Option<String>> {
    let on_disk =
        fs::read(asset).with_context(|| format!("reading {}", asset.display()))?;
    let canonical = render_registry_asset(registry)?;
    if on_disk == canonical.as_bytes() {
        Ok(None)
    } else {
        Ok(Some(format!(
            "{}: not in canonical form (re-rendering would change the file)",
            asset.display()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::write_registry_asset;
    use crate::registry::{CrateName, ImplementorRecord, TypePath};
    use std::fs::OpenOptions;
    use std::io::Write;
    use tempfile::TempDir;

    const LINKED_TEXT: &str = "impl <a class=\"trait\" href=\"https://doc.rust-lang.org/nightly/core/marker/trait.Send.html\" title=\"trait core::marker::Send\">Send</a> for <a class=\"struct\" href=\"ledger_core/frame/struct.Header.html\" title=\"struct ledger_core::frame::Header\">Header</a>";

    fn linked_registry() -> ImplementorRegistry {
        let mut registry = ImplementorRegistry::new();
        registry.insert_crate(
            CrateName("ledger_core".to_string()),
            vec![ImplementorRecord {
                text: LINKED_TEXT.to_string(),
                synthetic: false,
                types: vec![TypePath("ledger_core::frame::Header".to_string())],
            }],
        );
        registry
    }

    #[test]
    fn registry_checks_flag_structure_and_trait_disagreement() {
        let matching = TraitPath("core::marker::Send".to_string());
        assert!(validate_registry(&matching, &linked_registry()).is_empty());

        let other = TraitPath("ledger::marker::Tagged".to_string());
        let violations = validate_registry(&other, &linked_registry());
        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("links trait 'core::marker::Send'"));

        let mut broken = ImplementorRegistry::new();
        broken.insert_crate(
            CrateName("bad crate!".to_string()),
            vec![ImplementorRecord {
                text: "  ".to_string(),
                synthetic: false,
                types: vec![TypePath(String::new())],
            }],
        );
        let violations = validate_registry(&matching, &broken);
        assert!(violations.iter().any(|v| v.contains("crate name")));
        assert!(violations.iter().any(|v| v.contains("empty text")));
        assert!(violations.iter().any(|v| v.contains("empty type path")));

        let empty = ImplementorRegistry::new();
        let violations = validate_registry(&matching, &empty);
        assert!(violations.iter().any(|v| v.contains("no crate entries")));
    }

    #[test]
    fn strict_file_check_requires_canonical_bytes() {
        let temp = TempDir::new().expect("temp dir");
        let asset = temp.path().join("trait.Send.js");
        write_registry_asset(&asset, &linked_registry()).expect("asset written");

        let expected = TraitPath("core::marker::Send".to_string());
        assert!(validate_asset_file(&asset, Some(&expected), true).is_empty());

        let mut file = OpenOptions::new()
            .append(true)
            .open(&asset)
            .expect("asset reopens");
        writeln!(file).expect("newline appended");
        drop(file);

        let violations = validate_asset_file(&asset, Some(&expected), true);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("not in canonical form"));

        assert!(validate_asset_file(&asset, Some(&expected), false).is_empty());
    }
}
