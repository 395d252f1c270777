//! Top-level CLI wrapper that delegates to the helper binaries.
//!
//! The binary keeps the public `dex --scan/--check/--merge/...` interface
//! stable while resolving the real helper paths (sibling binaries first, then
//! PATH). It also injects `TRAITDEX_DOC_ROOT` when a doc tree is discoverable
//! so helpers agree on the tree even when invoked from an installed location.

use anyhow::{Context, Result, bail};
use std::env;
use std::ffi::OsString;
use std::process::Command;
use traitdex::{resolve_doc_root, runtime::resolve_helper};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse()?;
    run_helper(&cli)
}

struct Cli {
    command: CommandTarget,
    trailing_args: Vec<OsString>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum CommandTarget {
    Parse,
    Render,
    Merge,
    Scan,
    Check,
    Extract,
}

impl CommandTarget {
    fn helper_name(self) -> &'static str {
        match self {
            CommandTarget::Parse => "dex-parse",
            CommandTarget::Render => "dex-render",
            CommandTarget::Merge => "dex-merge",
            CommandTarget::Scan => "dex-scan",
            CommandTarget::Check => "dex-check",
            CommandTarget::Extract => "dex-extract",
        }
    }
}

impl Cli {
    fn parse() -> Result<Self> {
        let mut args = env::args_os();
        let _program = args.next();

        let Some(flag) = args.next() else {
            usage(1);
        };

        let flag_str = flag
            .to_str()
            .with_context(|| "Invalid UTF-8 in command flag")?;

        let command = match flag_str {
            "--parse" | "-p" => CommandTarget::Parse,
            "--render" | "-r" => CommandTarget::Render,
            "--merge" | "-m" => CommandTarget::Merge,
            "--scan" | "-s" => CommandTarget::Scan,
            "--check" | "-c" => CommandTarget::Check,
            "--extract" | "-x" => CommandTarget::Extract,
            "--help" | "-h" => usage(0),
            _ => usage(1),
        };

        let trailing_args = args.collect();
        Ok(Self {
            command,
            trailing_args,
        })
    }
}

fn usage(code: i32) -> ! {
    eprintln!(
        "Usage: dex (--parse | --render | --merge | --scan | --check | --extract) [args]\n\nCommands:\n  --parse, -p     Unwrap a registry asset to its payload JSON (see dex-parse --help).\n  --render, -r    Render payload JSON into a canonical asset (see dex-render --help).\n  --merge, -m     Merge payload JSON into a doc tree's asset (see dex-merge --help).\n  --scan, -s      Report per-trait and per-crate coverage for a doc tree.\n  --check, -c     Validate one asset or a whole tree; exits 1 on violations.\n  --extract, -x   Select a value from an asset's payload by JSON pointer.\n\nExamples:\n  dex --scan --doc-root target/doc\n  dex --parse --asset core::marker::Send | dex --render --out trait.Send.js"
    );
    std::process::exit(code);
}

/// Execute the resolved helper, wiring TRAITDEX_DOC_ROOT when a tree is
/// discoverable from the current directory.
fn run_helper(cli: &Cli) -> Result<()> {
    let name = cli.command.helper_name();
    let Some(helper_path) = resolve_helper(name) else {
        bail!(
            "Unable to locate helper '{name}'. Run 'cargo build --bins' so it sits next to this executable, or add it to PATH."
        );
    };

    let mut command = Command::new(&helper_path);
    command.args(&cli.trailing_args);

    if env::var_os("TRAITDEX_DOC_ROOT").is_none() {
        if let Ok(root) = resolve_doc_root(None) {
            command.env("TRAITDEX_DOC_ROOT", root);
        }
    }

    let status = command
        .status()
        .with_context(|| format!("Failed to execute {}", helper_path.display()))?;

    if status.success() {
        return Ok(());
    }

    if let Some(code) = status.code() {
        std::process::exit(code);
    }

    bail!("Helper terminated by signal")
}
