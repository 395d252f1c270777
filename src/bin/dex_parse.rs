//! Unwraps a registry asset into its JSON payload.
//!
//! Reads the asset JS from a file, stdin, or a trait/asset identifier resolved
//! inside a doc tree, strips the loader scaffolding, and prints the payload
//! mapping as compact JSON. Designed for pipelines that want the registry data
//! without scraping the JS shell themselves.

use anyhow::{Context, Result, anyhow, bail};
use std::env;
use std::ffi::OsString;
use std::io::{self, Read};
use std::path::PathBuf;
use traitdex::{
    CrateName, ImplementorRegistry, parse_registry_asset, read_registry_asset, resolve_doc_root,
    resolve_registry_asset,
};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = CliArgs::parse()?;
    let registry = args.input.load()?;

    let value = match &args.single_crate {
        Some(name) => {
            let records = registry
                .records_for(name)
                .ok_or_else(|| anyhow!("crate '{}' is not present in the asset", name.0))?;
            serde_json::to_value(records)?
        }
        None => registry.to_payload_value(),
    };

    let rendered = if args.pretty {
        serde_json::to_string_pretty(&value)?
    } else {
        serde_json::to_string(&value)?
    };
    println!("{rendered}");
    Ok(())
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
    fn load(&self) -> Result<ImplementorRegistry> {
        match self {
            AssetInput::File(path) => {
                if !path.is_file() {
                    bail!("asset file not found: {}", path.display());
                }
                read_registry_asset(path)
            }
            AssetInput::Stdin => {
                let mut buf = String::new();
                io::stdin()
                    .read_to_string(&mut buf)
                    .context("reading stdin")?;
                let parsed =
                    parse_registry_asset(buf.as_bytes()).map_err(|err| anyhow!("stdin: {err}"))?;
                Ok(parsed.into_registry())
            }
            AssetInput::Identifier {
                identifier,
                doc_root,
            } => {
                let root = resolve_doc_root(doc_root.as_deref())?;
                let asset = resolve_registry_asset(&root, identifier)?;
                read_registry_asset(&asset)
            }
        }
    }
}

struct CliArgs {
    input: AssetInput,
    single_crate: Option<CrateName>,
    pretty: bool,
}

impl CliArgs {
    fn parse() -> Result<Self> {
        let mut args = env::args_os().skip(1);
        let mut file: Option<PathBuf> = None;
        let mut stdin = false;
        let mut identifier: Option<String> = None;
        let mut doc_root: Option<PathBuf> = None;
        let mut single_crate: Option<CrateName> = None;
        let mut pretty = false;

        while let Some(arg_os) = args.next() {
            let arg = arg_os
                .into_string()
                .map_err(|_| anyhow!("argument is not valid UTF-8"))?;
            match arg.as_str() {
                "--file" => {
                    let value = next_value(&mut args, "--file")?;
                    file = Some(PathBuf::from(value));
                }
                "--stdin" => stdin = true,
                "--asset" => {
                    identifier = Some(next_value(&mut args, "--asset")?);
                }
                "--doc-root" => {
                    doc_root = Some(PathBuf::from(next_value(&mut args, "--doc-root")?));
                }
                "--crate" => {
                    single_crate = Some(CrateName(next_value(&mut args, "--crate")?));
                }
                "--pretty" => pretty = true,
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
            single_crate,
            pretty,
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
    "Usage: dex-parse [--file PATH|--stdin|--asset TRAIT_OR_PATH [--doc-root DIR]] [--crate NAME] [--pretty]\n\
Unwraps a registry asset to its payload mapping. --asset accepts a trait path\n\
(core::marker::Send) or a path inside <doc-root>/implementors. --crate prints\n\
only that crate's record array.\n"
}

fn print_usage() {
    print!("{}", usage());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stdin_input_round_trips_an_asset() {
        let asset = "(function() {var implementors = {};\n\
implementors[\"demo\"] = [{\"text\":\"impl Marker for Demo\",\"synthetic\":false,\"types\":[\"demo::Demo\"]}];\n\
if (window.register_implementors) {window.register_implementors(implementors);} else {window.pending_implementors = implementors;}})()";
        let parsed = parse_registry_asset(asset.as_bytes()).expect("asset parses");
        let registry = parsed.into_registry();
        assert!(registry.contains_crate(&CrateName("demo".to_string())));
    }

    #[test]
    fn missing_crate_is_an_error() {
        let registry = ImplementorRegistry::new();
        assert!(registry.records_for(&CrateName("absent".to_string())).is_none());
    }
}
