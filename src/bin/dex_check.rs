//! Validates registry assets without modifying them.
//!
//! In tree mode (the default) every asset under `<doc-root>/implementors` is
//! parsed and checked against the structural rules; `--file` checks a single
//! asset instead. The violation list is printed as JSON and the process exits
//! 1 when it is non-empty, so CI can gate on a clean tree. `--strict`
//! additionally re-renders each asset and flags files whose bytes are not in
//! canonical form.

use anyhow::{Result, anyhow, bail};
use serde_json::json;
use std::env;
use std::ffi::OsString;
use std::path::PathBuf;
use traitdex::{TraitPath, resolve_doc_root, validate_asset_file, validate_doc_tree};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = CliArgs::parse()?;

    let (target, violations) = match &args.file {
        Some(path) => {
            if !path.is_file() {
                bail!("asset file not found: {}", path.display());
            }
            let violations = validate_asset_file(path, args.expected_trait.as_ref(), args.strict);
            (path.display().to_string(), violations)
        }
        None => {
            let doc_root = resolve_doc_root(args.doc_root.as_deref())?;
            let violations = validate_doc_tree(&doc_root, args.strict)?;
            (doc_root.display().to_string(), violations)
        }
    };

    let ok = violations.is_empty();
    let report = json!({
        "target": target,
        "strict": args.strict,
        "violations": violations,
        "ok": ok,
    });
    println!("{}", serde_json::to_string(&report)?);

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

struct CliArgs {
    doc_root: Option<PathBuf>,
    file: Option<PathBuf>,
    expected_trait: Option<TraitPath>,
    strict: bool,
}

impl CliArgs {
    fn parse() -> Result<Self> {
        let mut args = env::args_os().skip(1);
        let mut doc_root: Option<PathBuf> = None;
        let mut file: Option<PathBuf> = None;
        let mut expected_trait: Option<TraitPath> = None;
        let mut strict = false;

        while let Some(arg_os) = args.next() {
            let arg = arg_os
                .into_string()
                .map_err(|_| anyhow!("argument is not valid UTF-8"))?;
            match arg.as_str() {
                "--doc-root" => {
                    doc_root = Some(PathBuf::from(next_value(&mut args, "--doc-root")?));
                }
                "--file" => {
                    file = Some(PathBuf::from(next_value(&mut args, "--file")?));
                }
                "--trait" => {
                    expected_trait = Some(TraitPath(next_value(&mut args, "--trait")?));
                }
                "--strict" => strict = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                other => bail!("unknown flag: {other}"),
            }
        }

        if file.is_none() && expected_trait.is_some() {
            bail!("--trait requires --file");
        }
        if file.is_some() && doc_root.is_some() {
            bail!("--file and --doc-root are mutually exclusive");
        }

        Ok(CliArgs {
            doc_root,
            file,
            expected_trait,
            strict,
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
    "Usage: dex-check [--doc-root DIR | --file PATH [--trait TRAIT_PATH]] [--strict]\n\
Validates registry assets and prints a JSON report with the violation list.\n\
Tree mode walks every asset under <doc-root>/implementors; --file checks one\n\
asset, optionally against the trait it should serve. Exits 1 on violations.\n"
}

fn print_usage() {
    print!("{}", usage());
}
