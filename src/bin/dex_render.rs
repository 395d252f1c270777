//! Renders payload fragments into a registry asset.
//!
//! This binary is the authoritative serializer for asset output. It reads
//! payload JSON (a full mapping or NDJSON fragments) from a file or stdin,
//! validates it against the shipped payload schema, and emits the canonical
//! asset JS. Asset bytes go to stdout unless `--out` names a file.

use anyhow::{Context, Result, anyhow, bail};
use serde_json::json;
use std::env;
use std::ffi::OsString;
use std::io::{self, Write};
use std::path::PathBuf;
use traitdex::{
    PayloadArgs, PayloadSource, RegistryIndex, render_registry_asset, validate_payload_value,
    write_registry_asset,
};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = CliArgs::parse()?;
    let registry = args.source.load()?;
    validate_payload_value(&registry.to_payload_value())?;
    let index = RegistryIndex::from_registry(registry)?;

    match &args.out {
        Some(path) => {
            write_registry_asset(path, index.registry())?;
            let outcome = json!({
                "asset": path.display().to_string(),
                "crates": index.registry().crate_count(),
                "records": index.registry().record_count(),
            });
            println!("{}", serde_json::to_string(&outcome)?);
        }
        None => {
            // Canonical form carries no trailing newline; write bytes as-is so
            // shell redirection produces a valid asset file.
            let rendered = render_registry_asset(index.registry())?;
            io::stdout()
                .write_all(rendered.as_bytes())
                .context("writing stdout")?;
        }
    }
    Ok(())
}

struct CliArgs {
    source: PayloadSource,
    out: Option<PathBuf>,
}

impl CliArgs {
    fn parse() -> Result<Self> {
        let mut args = env::args_os().skip(1);
        let mut payload = PayloadArgs::default();
        let mut out: Option<PathBuf> = None;

        while let Some(arg_os) = args.next() {
            let arg = arg_os
                .into_string()
                .map_err(|_| anyhow!("argument is not valid UTF-8"))?;
            match arg.as_str() {
                "--payload" => {
                    let value = next_value(&mut args, "--payload")?;
                    payload.set_file(PathBuf::from(value))?;
                }
                "--stdin" => payload.set_stdin()?,
                "--out" => {
                    if out.is_some() {
                        bail!("--out provided multiple times");
                    }
                    out = Some(PathBuf::from(next_value(&mut args, "--out")?));
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                other => bail!("unknown flag: {other}"),
            }
        }

        Ok(CliArgs {
            source: payload.build()?,
            out,
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
    "Usage: dex-render [--payload PATH|--stdin] [--out PATH]\n\
Reads payload JSON (mapping or NDJSON fragments), validates it against the\n\
payload schema, and renders the canonical asset JS. Without --out the asset\n\
bytes are written to stdout.\n"
}

fn print_usage() {
    print!("{}", usage());
}
