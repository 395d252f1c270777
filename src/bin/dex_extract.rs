//! JSON pointer extractor over a registry asset's payload.
//!
//! Unwraps an asset (file, stdin, or an identifier resolved in a doc tree) to
//! its payload mapping, walks an optional JSON Pointer, enforces an expected
//! type, and prints the selected value as compact JSON. Lets scripts pull a
//! crate's record list or a single field out of an asset without scraping the
//! JS shell.

use anyhow::{Context, Result, anyhow, bail};
use serde_json::Value;
use std::env;
use std::ffi::OsString;
use std::io::{self, Read};
use std::path::PathBuf;
use traitdex::{parse_registry_asset, read_registry_asset, resolve_doc_root, resolve_registry_asset};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = CliArgs::parse()?;
    let payload = args.input.load_payload()?;
    let selected = select_value(&payload, &args.selection)?;
    println!("{}", serde_json::to_string(&selected)?);
    Ok(())
}

/// Pointer walk plus type enforcement, shared by the CLI and its tests.
fn select_value(payload: &Value, selection: &Selection) -> Result<Value> {
    let found = if selection.pointer.is_empty() {
        Some(payload)
    } else {
        payload.pointer(&selection.pointer)
    };

    let value = match found {
        Some(value) => match &selection.expected_type {
            Some(expected) if !expected.matches(value) => match &selection.default_value {
                Some(default) => default.clone(),
                None => bail!(
                    "value at pointer {} is not of expected type {}",
                    selection.pointer,
                    expected.label()
                ),
            },
            _ => value.clone(),
        },
        None => match &selection.default_value {
            Some(default) => default.clone(),
            None => bail!("pointer {} not found in payload", selection.pointer),
        },
    };

    if let Some(expected) = &selection.expected_type {
        if !expected.matches(&value) {
            bail!("output value does not match expected type {}", expected.label());
        }
    }
    Ok(value)
}

#[derive(Debug, Clone, Copy)]
enum ValueType {
    Object,
    Array,
    String,
    Number,
    Bool,
    Null,
}

impl ValueType {
    fn from_str(raw: &str) -> Result<Self> {
        match raw {
            "object" => Ok(Self::Object),
            "array" => Ok(Self::Array),
            "string" => Ok(Self::String),
            "number" => Ok(Self::Number),
            "bool" | "boolean" => Ok(Self::Bool),
            "null" => Ok(Self::Null),
            other => bail!("unknown type '{other}' (expected object|array|string|number|bool|null)"),
        }
    }

    fn matches(&self, value: &Value) -> bool {
        match self {
            ValueType::Object => value.is_object(),
            ValueType::Array => value.is_array(),
            ValueType::String => value.is_string(),
            ValueType::Number => value.is_number(),
            ValueType::Bool => value.is_boolean(),
            ValueType::Null => value.is_null(),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ValueType::Object => "object",
            ValueType::Array => "array",
            ValueType::String => "string",
            ValueType::Number => "number",
            ValueType::Bool => "bool",
            ValueType::Null => "null",
        }
    }
}

enum AssetInput {
    File(PathBuf),
    Stdin,
    Identifier {
        identifier: String,
        doc_root: Option<PathBuf>,
    },
}

impl AssetInput {
    fn load_payload(&self) -> Result<Value> {
        let registry = match self {
            AssetInput::File(path) => {
                if !path.is_file() {
                    bail!("asset file not found: {}", path.display());
                }
                read_registry_asset(path)?
            }
            AssetInput::Stdin => {
                let mut buf = String::new();
                io::stdin()
                    .read_to_string(&mut buf)
                    .context("reading stdin")?;
                parse_registry_asset(buf.as_bytes())
                    .map_err(|err| anyhow!("stdin: {err}"))?
                    .into_registry()
            }
            AssetInput::Identifier {
                identifier,
                doc_root,
            } => {
                let root = resolve_doc_root(doc_root.as_deref())?;
                let asset = resolve_registry_asset(&root, identifier)?;
                read_registry_asset(&asset)?
            }
        };
        Ok(registry.to_payload_value())
    }
}

struct Selection {
    pointer: String,
    expected_type: Option<ValueType>,
    default_value: Option<Value>,
}

struct CliArgs {
    input: AssetInput,
    selection: Selection,
}

impl CliArgs {
    fn parse() -> Result<Self> {
        let mut args = env::args_os().skip(1);
        let mut file: Option<PathBuf> = None;
        let mut stdin = false;
        let mut identifier: Option<String> = None;
        let mut doc_root: Option<PathBuf> = None;
        let mut pointer: Option<String> = None;
        let mut expected_type: Option<ValueType> = None;
        let mut default_value: Option<Value> = None;

        while let Some(arg_os) = args.next() {
            let arg = arg_os
                .into_string()
                .map_err(|_| anyhow!("argument is not valid UTF-8"))?;
            match arg.as_str() {
                "--file" => {
                    file = Some(PathBuf::from(next_value(&mut args, "--file")?));
                }
                "--stdin" => stdin = true,
                "--asset" => {
                    identifier = Some(next_value(&mut args, "--asset")?);
                }
                "--doc-root" => {
                    doc_root = Some(PathBuf::from(next_value(&mut args, "--doc-root")?));
                }
                "--pointer" => {
                    let raw = next_value(&mut args, "--pointer")?;
                    if !raw.is_empty() && !raw.starts_with('/') {
                        bail!("--pointer must be empty (root) or start with '/'");
                    }
                    pointer = Some(raw);
                }
                "--type" => {
                    let raw = next_value(&mut args, "--type")?;
                    expected_type = Some(ValueType::from_str(&raw)?);
                }
                "--default" => {
                    let raw = next_value(&mut args, "--default")?;
                    let parsed: Value = serde_json::from_str(&raw)
                        .with_context(|| format!("invalid JSON for --default: {raw}"))?;
                    default_value = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                other => bail!("unknown flag: {other}"),
            }
        }

        if doc_root.is_some() && identifier.is_none() {
            bail!("--doc-root requires --asset");
        }
        let input = match (file, stdin, identifier) {
            (Some(_), true, _) | (Some(_), _, Some(_)) | (_, true, Some(_)) => {
                bail!("--file, --stdin, and --asset are mutually exclusive")
            }
            (Some(path), false, None) => AssetInput::File(path),
            (None, _, None) => AssetInput::Stdin,
            (None, false, Some(identifier)) => AssetInput::Identifier {
                identifier,
                doc_root,
            },
        };

        Ok(CliArgs {
            input,
            selection: Selection {
                pointer: pointer.unwrap_or_default(),
                expected_type,
                default_value,
            },
        })
    }
}

fn next_value(args: &mut impl Iterator<Item = OsString>, flag: &str) -> Result<String> {
    args.next()
        .map(|os| {
            os.into_string()
                .map_err(|_| anyhow!("value for {flag} is not valid UTF-8"))
        })
        .transpose()?
        .ok_or_else(|| anyhow!("missing value for {flag}"))
}

fn usage() -> &'static str {
    "Usage: dex-extract [--file PATH|--stdin|--asset TRAIT_OR_PATH [--doc-root DIR]] [--pointer /json/pointer] [--type object|array|string|number|bool|null] [--default JSON]\n\
Unwraps a registry asset to its payload, selects the value at the given JSON\n\
Pointer (default: root), enforces an optional type, and prints the value as\n\
compact JSON. Example pointer: /serde/0/text selects the first record text\n\
registered by the serde crate.\n"
}

fn print_usage() {
    print!("{}", usage());
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn matches_expected_types() {
        assert!(ValueType::Bool.matches(&Value::Bool(true)));
        assert!(ValueType::Number.matches(&Value::from(1)));
        assert!(!ValueType::String.matches(&Value::from(1)));
    }

    #[test]
    fn parse_expected_type_variants() {
        assert!(matches!(ValueType::from_str("object"), Ok(ValueType::Object)));
        assert!(ValueType::from_str("bool").is_ok());
        assert!(ValueType::from_str("boolean").is_ok());
        assert!(ValueType::from_str("unknown").is_err());
    }

    #[test]
    fn pointer_selects_record_fields() {
        let payload = json!({
            "demo": [{"text": "impl Marker for Demo", "synthetic": false, "types": ["demo::Demo"]}],
        });
        let selection = Selection {
            pointer: "/demo/0/text".to_string(),
            expected_type: Some(ValueType::String),
            default_value: None,
        };
        let value = select_value(&payload, &selection).expect("pointer resolves");
        assert_eq!(value, json!("impl Marker for Demo"));
    }

    #[test]
    fn default_is_used_when_pointer_missing() {
        let payload = json!({"present": []});
        let selection = Selection {
            pointer: "/missing".to_string(),
            expected_type: Some(ValueType::Array),
            default_value: Some(json!([])),
        };
        let value = select_value(&payload, &selection).expect("default applies");
        assert_eq!(value, json!([]));
    }

    #[test]
    fn missing_pointer_without_default_errors() {
        let payload = json!({"present": []});
        let selection = Selection {
            pointer: "/missing".to_string(),
            expected_type: None,
            default_value: None,
        };
        assert!(select_value(&payload, &selection).is_err());
    }
}
