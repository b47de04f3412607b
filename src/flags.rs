//! Command-line flag parsing.
//!
//! A flat struct populated by an index-based `while i < args.len()` loop
//! over `std::env::args()`, no `clap`: the compiler driver this mirrors
//! hand-parses its own flags the same way.

use std::collections::HashMap;
use std::path::PathBuf;

use strsim::levenshtein;

/// Terminal color mode, threaded into `crate::colors::Painter`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

/// The `-d <list>` debug keys this driver recognizes (§6).
pub const DEBUG_KEYS: &[&str] = &[
    "append",
    "closure",
    "disablenil",
    "gcprog",
    "nil",
    "panic",
    "slice",
    "typeassert",
    "wb",
    "export",
];

/// Suggest the closest known debug key by Levenshtein distance (threshold 2),
/// mirroring `cli/parser/helpers.rs::suggest_similar_command`'s threshold and
/// tie-break (first-seen wins ties, closer distance always wins).
pub fn suggest_debug_key(input: &str) -> Option<&'static str> {
    suggest_from(input, DEBUG_KEYS)
}

fn suggest_from(input: &str, candidates: &[&'static str]) -> Option<&'static str> {
    let input_lower = input.to_lowercase();
    let mut best: Option<(&str, usize)> = None;
    for &cand in candidates {
        let distance = levenshtein(&input_lower, cand);
        if distance <= 2 {
            match best {
                Some((_, best_dist)) if distance >= best_dist => {}
                _ => best = Some((cand, distance)),
            }
        }
    }
    best.map(|(cand, _)| cand)
}

/// One `-d name[=int]` debug directive.
#[derive(Clone, Debug, Default)]
pub struct DebugFlags {
    pub keys: HashMap<String, i64>,
}

impl DebugFlags {
    pub fn is_set(&self, key: &str) -> bool {
        self.keys.get(key).is_some_and(|&v| v != 0)
    }

    pub fn value(&self, key: &str) -> i64 {
        self.keys.get(key).copied().unwrap_or(0)
    }
}

/// Parsed command-line flags (§6 External Interfaces).
#[derive(Clone, Debug)]
pub struct CompilerFlags {
    pub inputs: Vec<PathBuf>,
    pub output: Option<PathBuf>,
    pub package_path: Option<String>,
    pub import_dirs: Vec<PathBuf>,
    pub local_import_base: Option<PathBuf>,
    pub import_map: HashMap<String, String>,
    pub debug: DebugFlags,
    pub pack: bool,
    pub linkobj: Option<PathBuf>,
    pub asmhdr: Option<PathBuf>,
    pub buildid: Option<String>,
    pub safe_mode: bool,
    pub complete: bool,
    pub no_local_imports: bool,
    pub install_suffix: Option<String>,
    pub race: bool,
    pub msan: bool,
    pub shared: bool,
    pub dynlink: bool,
    pub large_model: bool,
    pub trim_path: Option<String>,
    pub disable_optimizations: bool,
    /// Number of `-l` flags seen. Mirrors the real driver's `Debug.l`
    /// counter: 0 (default) and 2+ both leave inlining enabled, exactly 1
    /// disables it; 2+ additionally re-enables eager import-body typecheck.
    pub inline_l_count: i32,
    pub disable_bounds_checks: bool,
    pub unlimited_errors: bool,
    pub halt_on_first_error: bool,
    pub print_assembly: bool,
    pub verbose: bool,
    pub write_barriers: bool,
    pub cpu_profile: Option<PathBuf>,
    pub mem_profile: Option<PathBuf>,
    pub mem_profile_rate: Option<i64>,
    pub show_version: bool,
    pub compiling_runtime: bool,
    pub color: ColorMode,
}

impl Default for CompilerFlags {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            output: None,
            package_path: None,
            import_dirs: Vec::new(),
            local_import_base: None,
            import_map: HashMap::new(),
            debug: DebugFlags::default(),
            pack: false,
            linkobj: None,
            asmhdr: None,
            buildid: None,
            safe_mode: false,
            complete: false,
            no_local_imports: false,
            install_suffix: None,
            race: false,
            msan: false,
            shared: false,
            dynlink: false,
            large_model: false,
            trim_path: None,
            disable_optimizations: false,
            inline_l_count: 0,
            disable_bounds_checks: false,
            unlimited_errors: false,
            halt_on_first_error: false,
            print_assembly: false,
            verbose: false,
            write_barriers: true,
            cpu_profile: None,
            mem_profile: None,
            mem_profile_rate: None,
            show_version: false,
            compiling_runtime: false,
            color: ColorMode::Auto,
        }
    }
}

impl CompilerFlags {
    /// `-l` disables inlining; `-l -l` re-enables it with extra diagnostics.
    pub fn inlining_enabled(&self) -> bool {
        self.inline_l_count != 1
    }

    pub fn eager_import_typecheck(&self) -> bool {
        self.inline_l_count >= 2
    }
}

/// Parse `args` (normally `std::env::args().skip(1)`) into `CompilerFlags`.
///
/// Returns `Err(message)` on a usage error (exit code 2, per §6).
pub fn parse_args(args: &[String]) -> Result<CompilerFlags, String> {
    let mut flags = CompilerFlags::default();
    let mut i = 0;
    while i < args.len() {
        let arg = args[i].as_str();
        match arg {
            "-o" => {
                flags.output = Some(PathBuf::from(require_value(args, &mut i, "-o")?));
            }
            "-p" => {
                flags.package_path = Some(require_value(args, &mut i, "-p")?);
            }
            "-I" => {
                flags.import_dirs.push(PathBuf::from(require_value(args, &mut i, "-I")?));
            }
            "-D" => {
                flags.local_import_base = Some(PathBuf::from(require_value(args, &mut i, "-D")?));
            }
            "-importmap" => {
                let raw = require_value(args, &mut i, "-importmap")?;
                let (src, actual) = raw
                    .split_once('=')
                    .ok_or_else(|| format!("-importmap: malformed mapping {raw:?}, want src=actual"))?;
                flags.import_map.insert(src.to_string(), actual.to_string());
            }
            "-d" => {
                let raw = require_value(args, &mut i, "-d")?;
                parse_debug_list(&raw, &mut flags.debug)?;
            }
            "-pack" => {
                flags.pack = true;
                i += 1;
            }
            "-linkobj" => {
                flags.linkobj = Some(PathBuf::from(require_value(args, &mut i, "-linkobj")?));
            }
            "-asmhdr" => {
                flags.asmhdr = Some(PathBuf::from(require_value(args, &mut i, "-asmhdr")?));
            }
            "-buildid" => {
                flags.buildid = Some(require_value(args, &mut i, "-buildid")?);
            }
            "-u" => {
                flags.safe_mode = true;
                i += 1;
            }
            "-complete" => {
                flags.complete = true;
                i += 1;
            }
            "-nolocalimports" => {
                flags.no_local_imports = true;
                i += 1;
            }
            "-installsuffix" => {
                flags.install_suffix = Some(require_value(args, &mut i, "-installsuffix")?);
            }
            "-race" => {
                if flags.msan {
                    return Err("-race and -msan are mutually exclusive".to_string());
                }
                flags.race = true;
                i += 1;
            }
            "-msan" => {
                if flags.race {
                    return Err("-race and -msan are mutually exclusive".to_string());
                }
                flags.msan = true;
                i += 1;
            }
            "-shared" => {
                flags.shared = true;
                i += 1;
            }
            "-dynlink" => {
                flags.dynlink = true;
                i += 1;
            }
            "-largemodel" => {
                flags.large_model = true;
                i += 1;
            }
            "-trimpath" => {
                flags.trim_path = Some(require_value(args, &mut i, "-trimpath")?);
            }
            "-N" => {
                flags.disable_optimizations = true;
                i += 1;
            }
            "-l" => {
                flags.inline_l_count += 1;
                i += 1;
            }
            "-B" => {
                flags.disable_bounds_checks = true;
                i += 1;
            }
            "-e" => {
                flags.unlimited_errors = true;
                i += 1;
            }
            "-h" => {
                flags.halt_on_first_error = true;
                i += 1;
            }
            "-S" => {
                flags.print_assembly = true;
                i += 1;
            }
            "-v" => {
                flags.verbose = true;
                i += 1;
            }
            "-wb" => {
                flags.write_barriers = true;
                i += 1;
            }
            "-cpuprofile" => {
                flags.cpu_profile = Some(PathBuf::from(require_value(args, &mut i, "-cpuprofile")?));
            }
            "-memprofile" => {
                flags.mem_profile = Some(PathBuf::from(require_value(args, &mut i, "-memprofile")?));
            }
            "-memprofilerate" => {
                let raw = require_value(args, &mut i, "-memprofilerate")?;
                flags.mem_profile_rate = Some(
                    raw.parse::<i64>()
                        .map_err(|_| format!("-memprofilerate: invalid integer {raw:?}"))?,
                );
            }
            "-V" => {
                flags.show_version = true;
                i += 1;
            }
            "+" => {
                flags.compiling_runtime = true;
                i += 1;
            }
            _ if arg.starts_with('-') => {
                return Err(format!("flag provided but not defined: {arg}"));
            }
            _ => {
                flags.inputs.push(PathBuf::from(arg));
                i += 1;
            }
        }
    }
    Ok(flags)
}

fn require_value(args: &[String], i: &mut usize, flag: &str) -> Result<String, String> {
    let value = args
        .get(*i + 1)
        .ok_or_else(|| format!("{flag} requires an argument"))?
        .clone();
    *i += 2;
    Ok(value)
}

fn parse_debug_list(raw: &str, debug: &mut DebugFlags) -> Result<(), String> {
    for item in raw.split(',') {
        if item.is_empty() {
            continue;
        }
        let (name, value) = match item.split_once('=') {
            Some((n, v)) => (
                n,
                v.parse::<i64>()
                    .map_err(|_| format!("-d {item}: malformed integer value"))?,
            ),
            None => (item, 1),
        };
        if !name.starts_with("ssa/") && !DEBUG_KEYS.contains(&name) {
            let mut msg = format!("unknown debug key {name:?}");
            if let Some(s) = suggest_debug_key(name) {
                msg.push_str(&format!(" (did you mean {s:?}?)"));
            }
            return Err(msg);
        }
        debug.keys.insert(name.to_string(), value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_positional_inputs() {
        let flags = parse_args(&args(&["a.go", "b.go"])).unwrap();
        assert_eq!(flags.inputs, vec![PathBuf::from("a.go"), PathBuf::from("b.go")]);
    }

    #[test]
    fn parses_repeatable_import_dirs() {
        let flags = parse_args(&args(&["-I", "vendor", "-I", "gopath/pkg", "main.go"])).unwrap();
        assert_eq!(flags.import_dirs.len(), 2);
    }

    #[test]
    fn parses_importmap() {
        let flags = parse_args(&args(&["-importmap", "foo=bar/baz", "x.go"])).unwrap();
        assert_eq!(flags.import_map.get("foo"), Some(&"bar/baz".to_string()));
    }

    #[test]
    fn malformed_importmap_is_usage_error() {
        let err = parse_args(&args(&["-importmap", "nomapping"])).unwrap_err();
        assert!(err.contains("malformed mapping"));
    }

    #[test]
    fn double_l_reenables_inlining_with_level_above_one() {
        let flags = parse_args(&args(&["-l", "-l", "x.go"])).unwrap();
        assert!(flags.inlining_enabled());
        assert!(flags.eager_import_typecheck());
    }

    #[test]
    fn single_l_disables_inlining() {
        let flags = parse_args(&args(&["-l", "x.go"])).unwrap();
        assert!(!flags.inlining_enabled());
    }

    #[test]
    fn race_and_msan_are_mutually_exclusive() {
        let err = parse_args(&args(&["-race", "-msan", "x.go"])).unwrap_err();
        assert!(err.contains("mutually exclusive"));
    }

    #[test]
    fn unknown_debug_key_suggests_closest_match() {
        let err = parse_args(&args(&["-d", "panik", "x.go"])).unwrap_err();
        assert!(err.contains("panic"));
    }

    #[test]
    fn debug_key_with_value_is_parsed() {
        let flags = parse_args(&args(&["-d", "wb=0", "x.go"])).unwrap();
        assert_eq!(flags.debug.value("wb"), 0);
        assert!(!flags.debug.is_set("wb"));
    }

    #[test]
    fn ssa_debug_keys_are_forwarded_without_validation() {
        let flags = parse_args(&args(&["-d", "ssa/lower/debug=1", "x.go"])).unwrap();
        assert_eq!(flags.debug.value("ssa/lower/debug"), 1);
    }

    #[test]
    fn unknown_flag_is_usage_error() {
        let err = parse_args(&args(&["--bogus"])).unwrap_err();
        assert!(err.contains("flag provided but not defined"));
    }
}
