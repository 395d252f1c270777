//! Reports implementor coverage for a documentation tree.
//!
//! Walks every registry asset under `<doc-root>/implementors`, then prints a
//! JSON report with three views of the same data: per-trait coverage, a
//! per-crate rollup, and tree-wide totals. Crates named via `--ignore-crate`
//! are dropped from all three before counting.

use anyhow::{Result, anyhow, bail};
use serde_json::json;
use std::env;
use std::ffi::OsString;
use std::path::PathBuf;
use traitdex::{
    build_crate_rollup, build_scan_totals, build_trait_coverage_map, load_registry_hub,
    resolve_doc_root, split_list, strip_ignored_crates,
};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = CliArgs::parse()?;
    let doc_root = resolve_doc_root(args.doc_root.as_deref())?;

    let hub = load_registry_hub(&doc_root)?;
    let hub = if args.ignored.is_empty() {
        hub
    } else {
        strip_ignored_crates(&hub, &args.ignored)
    };

    let report = json!({
        "doc_root": doc_root.display().to_string(),
        "traits": build_trait_coverage_map(&hub),
        "crates": build_crate_rollup(&hub),
        "totals": build_scan_totals(&hub),
    });

    let rendered = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{rendered}");
    Ok(())
}

struct CliArgs {
    doc_root: Option<PathBuf>,
    ignored: Vec<String>,
    pretty: bool,
}

impl CliArgs {
    fn parse() -> Result<Self> {
        let mut args = env::args_os().skip(1);
        let mut doc_root: Option<PathBuf> = None;
        let mut ignored: Vec<String> = Vec::new();
        let mut pretty = false;

        while let Some(arg_os) = args.next() {
            let arg = arg_os
                .into_string()
                .map_err(|_| anyhow!("argument is not valid UTF-8"))?;
            match arg.as_str() {
                "--doc-root" => {
                    doc_root = Some(PathBuf::from(next_value(&mut args, "--doc-root")?));
                }
                "--ignore-crate" => {
                    let value = next_value(&mut args, "--ignore-crate")?;
                    ignored.extend(split_list(&value));
                }
                "--pretty" => pretty = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                other => bail!("unknown flag: {other}"),
            }
        }

        Ok(CliArgs {
            doc_root,
            ignored,
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
    "Usage: dex-scan [--doc-root DIR] [--ignore-crate NAMES] [--pretty]\n\
Walks the doc tree's registry assets and prints coverage JSON: per-trait\n\
entries, a per-crate rollup, and totals. --ignore-crate takes a comma- or\n\
whitespace-separated list and may repeat.\n"
}

fn print_usage() {
    print!("{}", usage());
}
