//! Payload input handling shared by the render and merge binaries.
//!
//! A payload arrives either as one JSON mapping (crate name to record list,
//! the un-wrapped form of an asset) or as an NDJSON stream of per-crate
//! fragments, which is how per-crate doc builds hand their records to the
//! merge step. Sources are restricted to one file or stdin so the binaries
//! never mix inputs.

use crate::registry::{CrateName, ImplementorRecord, ImplementorRegistry};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
/// One crate's records, as emitted by a per-crate documentation build.
pub struct PayloadFragment {
    #[serde(rename = "crate")]
    pub crate_name: CrateName,
    pub records: Vec<ImplementorRecord>,
}

/// Where payload text comes from.
pub enum PayloadSource {
    File(PathBuf),
    Stdin,
}

impl PayloadSource {
    pub fn read(&self) -> Result<String> {
        match self {
            PayloadSource::File(path) => {
                if !path.is_file() {
                    bail!("payload file not found: {}", path.display());
                }
                fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
            }
            PayloadSource::Stdin => {
                let mut buf = String::new();
                io::stdin()
                    .read_to_string(&mut buf)
                    .context("reading stdin")?;
                Ok(buf)
            }
        }
    }

    pub fn load(&self) -> Result<ImplementorRegistry> {
        parse_payload_input(&self.read()?)
    }
}

#[derive(Default)]
/// Builder for payload input that enforces single-source rules.
///
/// The CLI may name a payload file or read stdin; mixing both would make the
/// merged result ambiguous. No source at all falls back to stdin.
pub struct PayloadArgs {
    file: Option<PathBuf>,
    stdin: bool,
}

impl PayloadArgs {
    pub fn set_file(&mut self, path: PathBuf) -> Result<()> {
        if self.file.is_some() {
            bail!("--payload provided multiple times");
        }
        self.file = Some(path);
        Ok(())
    }

    pub fn set_stdin(&mut self) -> Result<()> {
        if self.stdin {
            bail!("--stdin provided multiple times");
        }
        self.stdin = true;
        Ok(())
    }

    pub fn build(self) -> Result<PayloadSource> {
        match (self.file, self.stdin) {
            (Some(_), true) => bail!("--payload cannot be combined with --stdin"),
            (Some(path), false) => Ok(PayloadSource::File(path)),
            (None, _) => Ok(PayloadSource::Stdin),
        }
    }
}

/// Parse payload text into a registry.
///
/// Accepts either a full payload mapping or an NDJSON stream of fragments. A
/// lone JSON object whose `crate` key holds a string is a fragment; in a
/// mapping that key could only hold a record array.
pub fn parse_payload_input(input: &str) -> Result<ImplementorRegistry> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        bail!("payload input is empty");
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        if is_fragment_shape(&value) {
            let fragment: PayloadFragment =
                serde_json::from_value(value).context("parsing payload fragment")?;
            return fragments_into_registry(vec![fragment]);
        }
        return ImplementorRegistry::from_payload_value(&value);
    }

    let mut fragments = Vec::new();
    for (number, line) in trimmed.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let fragment: PayloadFragment = serde_json::from_str(line)
            .with_context(|| format!("line {}: unable to parse payload fragment", number + 1))?;
        fragments.push(fragment);
    }
    fragments_into_registry(fragments)
}

/// Collect fragments into a registry, rejecting repeated crates.
pub fn fragments_into_registry(fragments: Vec<PayloadFragment>) -> Result<ImplementorRegistry> {
    let mut registry = ImplementorRegistry::new();
    for fragment in fragments {
        if registry.contains_crate(&fragment.crate_name) {
            bail!(
                "crate '{}' appears in more than one fragment",
                fragment.crate_name.0
            );
        }
        registry.insert_crate(fragment.crate_name, fragment.records);
    }
    Ok(registry)
}

fn is_fragment_shape(value: &Value) -> bool {
    value.get("crate").is_some_and(Value::is_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn full_mapping_parses_directly() {
        let input = json!({
            "ledger_core": [
                {"text": "impl Copy for Header", "types": ["ledger_core::frame::Header"]}
            ]
        })
        .to_string();
        let registry = parse_payload_input(&input).expect("mapping parses");
        assert_eq!(registry.crate_count(), 1);
    }

    #[test]
    fn ndjson_fragments_accumulate() {
        let input = concat!(
            "{\"crate\":\"ledger_core\",\"records\":[{\"text\":\"impl Copy for Header\",\"types\":[\"ledger_core::frame::Header\"]}]}\n",
            "\n",
            "{\"crate\":\"ledger_util\",\"records\":[{\"text\":\"impl Copy for Span\",\"types\":[\"ledger_util::span::Span\"]}]}\n",
        );
        let registry = parse_payload_input(input).expect("fragments parse");
        assert_eq!(registry.crate_count(), 2);
        assert!(registry.contains_crate(&CrateName("ledger_util".to_string())));
    }

    #[test]
    fn single_fragment_is_not_mistaken_for_a_mapping() {
        let input = json!({
            "crate": "ledger_core",
            "records": [
                {"text": "impl Copy for Header", "types": ["ledger_core::frame::Header"]}
            ]
        })
        .to_string();
        let registry = parse_payload_input(&input).expect("fragment parses");
        assert!(registry.contains_crate(&CrateName("ledger_core".to_string())));

        // A crate literally named "crate" maps to an array, not a string.
        let mapping = json!({"crate": []}).to_string();
        let as_mapping = parse_payload_input(&mapping).expect("mapping parses");
        assert!(as_mapping.contains_crate(&CrateName("crate".to_string())));
    }

    #[test]
    fn repeated_fragment_crates_are_rejected() {
        let line = "{\"crate\":\"ledger_core\",\"records\":[{\"text\":\"impl Copy for Header\",\"types\":[\"ledger_core::frame::Header\"]}]}";
        let input = format!("{line}\n{line}\n");
        let err = parse_payload_input(&input).expect_err("duplicate crates rejected");
        assert!(err.to_string().contains("ledger_core"));
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(parse_payload_input("  \n ").is_err());
    }
}
