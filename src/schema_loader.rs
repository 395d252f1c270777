//! Shared JSON Schema loader for the payload contract.
//!
//! Keeps schema handling in one place: callers get a compiled validator plus
//! the declared schema id, with the raw schema value pinned for the life of
//! the result so the compiled form stays valid.

use anyhow::{Context, Result, anyhow, bail};
use jsonschema::JSONSchema;
use serde_json::Value;
use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Identifier declared by the shipped payload schema.
pub(crate) const PAYLOAD_SCHEMA_ID: &str = "traitdex/implementors_payload_v1";

const SCHEMA_PATH_ENV: &str = "TRAITDEX_PAYLOAD_SCHEMA";

/// Result of loading and compiling a JSON Schema.
#[derive(Debug)]
pub(crate) struct SchemaLoadResult {
    pub schema_id: String,
    pub compiled: JSONSchema,
    #[allow(dead_code)]
    raw: Arc<Value>,
}

/// Controls how schemas are checked before compilation.
#[derive(Default)]
pub(crate) struct SchemaLoadOptions<'a> {
    /// Required `$id` value; loading fails when the file declares another id.
    pub expected_id: Option<&'a str>,
}

pub(crate) fn load_json_schema(
    path: &Path,
    options: SchemaLoadOptions<'_>,
) -> Result<SchemaLoadResult> {
    let schema_value: Value = serde_json::from_reader(BufReader::new(
        File::open(path).with_context(|| format!("opening schema {}", path.display()))?,
    ))
    .with_context(|| format!("parsing schema {}", path.display()))?;

    let schema_id = extract_schema_id(&schema_value)
        .ok_or_else(|| anyhow!("schema {} is missing a usable $id", path.display()))?;

    if let Some(expected) = options.expected_id {
        if schema_id != expected {
            bail!(
                "schema {} declares $id '{}', expected '{}'",
                path.display(),
                schema_id,
                expected
            );
        }
    }

    // JSONSchema::compile borrows the schema value; pin it behind an Arc kept
    // alive in the result and hand the compiler a pointer with that lifetime.
    let raw = Arc::new(schema_value);
    let raw_static: &'static Value = unsafe { &*(Arc::as_ptr(&raw)) };
    let compiled = JSONSchema::compile(raw_static)
        .with_context(|| format!("compiling schema {}", path.display()))?;

    Ok(SchemaLoadResult {
        schema_id,
        compiled,
        raw,
    })
}

/// Load the payload schema from its resolved location and enforce its id.
pub(crate) fn load_payload_schema() -> Result<SchemaLoadResult> {
    let path = resolve_payload_schema_path();
    load_json_schema(
        &path,
        SchemaLoadOptions {
            expected_id: Some(PAYLOAD_SCHEMA_ID),
        },
    )
    .with_context(|| format!("loading payload schema {}", path.display()))
}

/// Where the payload schema lives: env override first, then the copy shipped
/// with the crate sources.
pub(crate) fn resolve_payload_schema_path() -> PathBuf {
    if let Ok(explicit) = env::var(SCHEMA_PATH_ENV) {
        if !explicit.trim().is_empty() {
            return PathBuf::from(explicit);
        }
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("schema/implementors_payload.schema.json")
}

fn extract_schema_id(schema: &Value) -> Option<String> {
    let id = schema.get("$id").and_then(Value::as_str)?;
    if id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-' | '/'))
    {
        Some(id.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn shipped_payload_schema_loads_and_validates() {
        let schema = load_payload_schema().expect("shipped schema loads");
        assert_eq!(schema.schema_id, PAYLOAD_SCHEMA_ID);

        let valid = json!({
            "ledger_core": [
                {"text": "impl Copy for Header", "synthetic": false, "types": ["ledger_core::frame::Header"]}
            ]
        });
        assert!(schema.compiled.is_valid(&valid));

        let empty_type_path = json!({
            "ledger_core": [
                {"text": "impl Copy for Header", "types": [""]}
            ]
        });
        assert!(!schema.compiled.is_valid(&empty_type_path));

        let bad_key = json!({"bad key!": []});
        assert!(!schema.compiled.is_valid(&bad_key));
    }

    #[test]
    fn rejects_mismatched_schema_id() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", json!({"$id": "someone/else_v9", "type": "object"})).unwrap();
        let err = load_json_schema(
            file.path(),
            SchemaLoadOptions {
                expected_id: Some(PAYLOAD_SCHEMA_ID),
            },
        )
        .expect_err("id mismatch should fail");
        assert!(err.to_string().contains("someone/else_v9"));
    }

    #[test]
    fn rejects_schema_without_id() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", json!({"type": "object"})).unwrap();
        assert!(load_json_schema(file.path(), SchemaLoadOptions::default()).is_err());
    }
}
