//! Codec for implementors registry assets.
//!
//! An asset is the line-oriented script a documentation tree serves next to
//! each trait page: a prelude declaring the registry object, one assignment
//! statement per contributing crate, and a dispatch line that hands the
//! registry to the page hook or parks it in the pending slot. The parser is
//! line-aware so malformed files report the exact statement that broke.

use crate::registry::{CrateName, ImplementorRecord, ImplementorRegistry};
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;

/// First line of every registry asset.
pub const ASSET_HEADER: &str = "(function() {var implementors = {};";

/// Final line of every registry asset: invoke the page hook when installed,
/// otherwise assign the pending slot for later pickup.
pub const ASSET_TRAILER: &str = "if (window.register_implementors) {window.register_implementors(implementors);} else {window.pending_implementors = implementors;}})()";

/// Name of the page-level hook the trailer invokes.
pub const REGISTER_HOOK: &str = "register_implementors";

/// Name of the slot the trailer assigns when no hook is installed.
pub const PENDING_SLOT: &str = "pending_implementors";

/// Errors that can occur while reading a registry asset.
#[derive(Debug)]
pub enum AssetParseError {
    Io(std::io::Error),
    Header {
        found: String,
    },
    Trailer {
        line: usize,
        found: String,
    },
    Statement {
        line: usize,
        reason: &'static str,
    },
    Records {
        line: usize,
        crate_name: String,
        error: serde_json::Error,
    },
    DuplicateCrate {
        line: usize,
        crate_name: String,
    },
}

/// Asset contents with the file's statement order preserved.
///
/// Keys are unique (duplicates fail the parse); order is kept so callers can
/// tell whether a file already stores its statements in canonical order.
#[derive(Debug)]
pub struct ParsedAsset {
    statements: Vec<(CrateName, Vec<ImplementorRecord>)>,
}

impl ParsedAsset {
    /// Crate names in the order their statements appear in the file.
    pub fn crate_names(&self) -> impl Iterator<Item = &CrateName> {
        self.statements.iter().map(|(name, _)| name)
    }

    pub fn statement_count(&self) -> usize {
        self.statements.len()
    }

    pub fn record_count(&self) -> usize {
        self.statements.iter().map(|(_, records)| records.len()).sum()
    }

    /// Collapse into the keyed registry form.
    pub fn into_registry(self) -> ImplementorRegistry {
        let mut registry = ImplementorRegistry::new();
        for (name, records) in self.statements {
            registry.insert_crate(name, records);
        }
        registry
    }
}

/// Parse a registry asset from a line-oriented reader.
///
/// Interior lines containing only whitespace are skipped. Errors carry the
/// 1-based line number where parsing failed to simplify diagnostics for
/// callers.
pub fn parse_registry_asset<R: BufRead>(reader: R) -> Result<ParsedAsset, AssetParseError> {
    let mut lines = Vec::new();
    let mut line_buf = String::new();
    let mut reader = reader;

    loop {
        line_buf.clear();
        let bytes = reader.read_line(&mut line_buf).map_err(AssetParseError::Io)?;
        if bytes == 0 {
            break;
        }
        lines.push(line_buf.trim_end_matches(['\n', '\r']).to_string());
    }

    // A trailing newline leaves one empty line behind; it is not part of the
    // statement body.
    while lines.last().is_some_and(|line| line.trim().is_empty()) {
        lines.pop();
    }

    let Some(first) = lines.first() else {
        return Err(AssetParseError::Header {
            found: String::new(),
        });
    };
    if first != ASSET_HEADER {
        return Err(AssetParseError::Header {
            found: first.clone(),
        });
    }

    let trailer_index = lines.len() - 1;
    if trailer_index == 0 || lines[trailer_index] != ASSET_TRAILER {
        let found = if trailer_index == 0 {
            String::new()
        } else {
            lines[trailer_index].clone()
        };
        return Err(AssetParseError::Trailer {
            line: trailer_index + 1,
            found,
        });
    }

    let mut statements = Vec::new();
    let mut seen: BTreeSet<String> = BTreeSet::new();
    for (offset, line) in lines[1..trailer_index].iter().enumerate() {
        let line_number = offset + 2;
        if line.trim().is_empty() {
            continue;
        }
        let (name, body) = split_statement(line)
            .map_err(|reason| AssetParseError::Statement {
                line: line_number,
                reason,
            })?;
        if !seen.insert(name.clone()) {
            return Err(AssetParseError::DuplicateCrate {
                line: line_number,
                crate_name: name,
            });
        }
        let records: Vec<ImplementorRecord> =
            serde_json::from_str(body).map_err(|error| AssetParseError::Records {
                line: line_number,
                crate_name: name.clone(),
                error,
            })?;
        statements.push((CrateName(name), records));
    }

    Ok(ParsedAsset { statements })
}

fn split_statement(line: &str) -> Result<(String, &str), &'static str> {
    let rest = line
        .strip_prefix("implementors[\"")
        .ok_or("expected an implementors[\"...\"] assignment")?;
    let end = rest.find('"').ok_or("unterminated crate name")?;
    let name = rest[..end].to_string();
    if name.is_empty() {
        return Err("empty crate name");
    }
    let body = rest[end..]
        .strip_prefix("\"] = ")
        .ok_or("expected `\"] = ` after the crate name")?
        .strip_suffix(';')
        .ok_or("statement must end with `;`")?;
    Ok((name, body))
}

/// Render a registry in canonical form: sorted crate statements, one per
/// line, no trailing newline after the dispatch line.
pub fn render_registry_asset(registry: &ImplementorRegistry) -> Result<String> {
    let mut out = String::new();
    out.push_str(ASSET_HEADER);
    out.push('\n');
    for (name, records) in registry.entries() {
        let body = serde_json::to_string(records)
            .with_context(|| format!("serializing records for crate '{}'", name.0))?;
        out.push_str(&format!("implementors[\"{}\"] = {};\n", name.0, body));
    }
    out.push_str(ASSET_TRAILER);
    Ok(out)
}

/// Read an asset file into the keyed registry form.
pub fn read_registry_asset(path: &Path) -> Result<ImplementorRegistry> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let parsed = parse_registry_asset(BufReader::new(file))
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(parsed.into_registry())
}

/// Render a registry canonically and write it, creating parent directories as
/// needed.
pub fn write_registry_asset(path: &Path, registry: &ImplementorRegistry) -> Result<()> {
    let rendered = render_registry_asset(registry)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    fs::write(path, rendered).with_context(|| format!("writing {}", path.display()))
}

impl fmt::Display for AssetParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetParseError::Io(err) => write!(f, "failed to read asset: {err}"),
            AssetParseError::Header { found } if found.is_empty() => {
                write!(f, "line 1: missing registry prelude")
            }
            AssetParseError::Header { found } => {
                write!(f, "line 1: expected registry prelude, found `{found}`")
            }
            AssetParseError::Trailer { line, found } if found.is_empty() => {
                write!(f, "line {line}: asset ends without the dispatch line")
            }
            AssetParseError::Trailer { line, found } => {
                write!(f, "line {line}: expected dispatch line, found `{found}`")
            }
            AssetParseError::Statement { line, reason } => {
                write!(f, "line {line}: malformed statement ({reason})")
            }
            AssetParseError::Records {
                line,
                crate_name,
                error,
            } => {
                write!(
                    f,
                    "line {line}: unable to parse records for crate '{crate_name}' ({error})"
                )
            }
            AssetParseError::DuplicateCrate { line, crate_name } => {
                write!(f, "line {line}: crate '{crate_name}' assigned more than once")
            }
        }
    }
}

impl std::error::Error for AssetParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AssetParseError::Io(err) => Some(err),
            AssetParseError::Records { error, .. } => Some(error),
            _ => None,
        }
    }
}
