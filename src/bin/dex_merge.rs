//! Merges payload fragments into a doc tree's registry asset.
//!
//! Reads fresh payload JSON for one trait, folds it into the asset under
//! `<doc-root>/implementors`, and prints the merge outcome as JSON. Crates in
//! the fresh payload replace their existing entries; other entries are kept.
//! `--prune` additionally drops entries for crates whose documentation
//! directory no longer exists in the tree.

use anyhow::{Result, anyhow, bail};
use std::env;
use std::ffi::OsString;
use std::path::PathBuf;
use traitdex::{
    MergeOptions, PayloadArgs, PayloadSource, TraitPath, merge_asset_file, resolve_doc_root,
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
    let fresh = args.source.load()?;
    let options = MergeOptions { prune: args.prune };

    let outcome = merge_asset_file(&doc_root, &args.trait_path, fresh, &options)?;
    println!("{}", serde_json::to_string(&outcome)?);
    Ok(())
}

struct CliArgs {
    trait_path: TraitPath,
    doc_root: Option<PathBuf>,
    source: PayloadSource,
    prune: bool,
}

impl CliArgs {
    fn parse() -> Result<Self> {
        let mut args = env::args_os().skip(1);
        let mut trait_path: Option<TraitPath> = None;
        let mut doc_root: Option<PathBuf> = None;
        let mut payload = PayloadArgs::default();
        let mut prune = false;

        while let Some(arg_os) = args.next() {
            let arg = arg_os
                .into_string()
                .map_err(|_| anyhow!("argument is not valid UTF-8"))?;
            match arg.as_str() {
                "--trait" => {
                    if trait_path.is_some() {
                        bail!("--trait provided multiple times");
                    }
                    trait_path = Some(TraitPath(next_value(&mut args, "--trait")?));
                }
                "--doc-root" => {
                    doc_root = Some(PathBuf::from(next_value(&mut args, "--doc-root")?));
                }
                "--payload" => {
                    let value = next_value(&mut args, "--payload")?;
                    payload.set_file(PathBuf::from(value))?;
                }
                "--stdin" => payload.set_stdin()?,
                "--prune" => prune = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                other => bail!("unknown flag: {other}"),
            }
        }

        let trait_path = trait_path.ok_or_else(|| anyhow!("missing required flag: --trait"))?;

        Ok(CliArgs {
            trait_path,
            doc_root,
            source: payload.build()?,
            prune,
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
    "Usage: dex-merge --trait TRAIT_PATH [--doc-root DIR] [--payload PATH|--stdin] [--prune]\n\
Merges payload JSON into the registry asset for TRAIT_PATH (for example\n\
core::marker::Send) inside the doc tree, creating the asset when absent.\n\
Prints the merge outcome as JSON.\n"
}

fn print_usage() {
    print!("{}", usage());
}
