use std::path::PathBuf;

use anyhow::{Context, Result};
use gocompile::colors::Painter;
use gocompile::diag::FatalError;
use gocompile::driver::{Compiler, DriverError};
use gocompile::flags::{self, CompilerFlags};

const USAGE: &str = "usage: gocompile [flags] file...\n\n\
Flags:\n  \
  -o <file>            output object file\n  \
  -p <path>            package import path (default \"main\")\n  \
  -I <dir>             add directory to import search path (repeatable)\n  \
  -D <dir>             base directory for local (\"./\") imports\n  \
  -importmap <src=dst> remap an import path\n  \
  -d <list>            comma-separated debug keys (see -d help)\n  \
  -pack                wrap the object in a single-member archive\n  \
  -linkobj <file>       write a separate link-only object\n  \
  -asmhdr <file>        write a header of symbol offsets for hand-written asm\n  \
  -u                   safe mode: reject unsafe package imports\n  \
  -nolocalimports      reject \"./\"-relative imports\n  \
  -installsuffix <s>    package install directory suffix\n  \
  -race | -msan        instrument for the race detector or MSan (mutually exclusive)\n  \
  -l                   disable inlining (repeat -l -l to re-enable with diagnostics)\n  \
  -e                   report all errors, not just the first 10 per line\n  \
  -h                   halt compilation at the first error\n  \
  -v                   verbose logging\n  \
  -V                   print version and exit\n  \
  +                    this is the runtime package (requires write barriers)\n";

fn print_version() {
    println!("gocompile version {}", env!("CARGO_PKG_VERSION"));
}

/// Runs the compiler and writes its artifacts, returning the process exit
/// code (§6/§7: 0 success, 1 diagnostics emitted, 2 usage/environment
/// error). Only I/O around the produced artifacts goes through `anyhow`;
/// the phase sequence itself reports through `DriverError`.
fn run(flags: CompilerFlags) -> Result<i32> {
    let painter = Painter::new(flags.color);
    let sources: Vec<PathBuf> = flags.inputs.clone();

    let mut compiler = Compiler::new(flags);
    match compiler.compile(&sources) {
        Ok(artifact) => {
            let out_path = compiler
                .flags
                .output
                .clone()
                .unwrap_or_else(|| PathBuf::from("a.o"));
            std::fs::write(&out_path, &artifact.object_bytes)
                .with_context(|| format!("writing {}", out_path.display()))?;
            if let (Some(path), Some(bytes)) = (&compiler.flags.linkobj, &artifact.linkobj_bytes) {
                std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
            }
            if let (Some(path), Some(bytes)) = (&compiler.flags.asmhdr, &artifact.asmhdr_bytes) {
                std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
            }
            compiler.print_diagnostics(&painter);
            Ok(0)
        }
        Err(DriverError::Fatal(err)) => {
            // §7's taxonomy splits fatals by domain: an import-class fatal
            // (§8 scenario 2, "cannot import package unsafe") is a
            // compilation failure and exits 1, while an environment fatal
            // (bad flags, unreadable source) is a usage/environment error
            // and exits 2.
            let code = match &err {
                FatalError::Import { .. } => 1,
                FatalError::Environment(_) => 2,
            };
            compiler.report_fatal(&err, &painter);
            Ok(code)
        }
        Err(DriverError::Halted) | Err(DriverError::Diagnostics) => {
            compiler.print_diagnostics(&painter);
            Ok(1)
        }
    }
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.iter().any(|a| a == "--help") {
        print!("{USAGE}");
        return Ok(());
    }

    let flags = match flags::parse_args(&args) {
        Ok(f) => f,
        Err(msg) => {
            eprintln!("gocompile: {msg}");
            eprint!("{USAGE}");
            std::process::exit(2);
        }
    };

    if flags.show_version {
        print_version();
        return Ok(());
    }

    let code = run(flags)?;
    std::process::exit(code);
}
