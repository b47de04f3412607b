//! Phase driver (§4.10): owns the single `Compiler` context and sequences
//! every phase in hard order, the way the process-wide globals (`xtop`, the
//! package registry, the error counters, the current function pointer)
//! collapse into "a single `Compiler` context passed explicitly to every
//! phase" (§9 Design Notes: "Process-wide state").
//!
//! Per §1 Scope, the lexer/parser and the SSA backend are named external
//! collaborators. This driver fixes everything between them: it validates
//! and reads source files (§6 Input format: UTF-8, optional leading BOM),
//! but does not implement a language grammar — the `xtop` it hands to phase
//! 2 onward is seeded from whatever top-level declarations the caller (a
//! test, or in this crate's CLI, nothing beyond a bare package clause) has
//! already allocated into the `Ast`. A source file holding only a package
//! clause therefore compiles to an object with an empty declaration body
//! but a valid header, exactly the §8 boundary behavior this spec names.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::ast::{Ast, FuncId, Node, NodeId, Op};
use crate::closure_xform::{self, LoweredClosure};
use crate::closures;
use crate::colors::Painter;
use crate::decls::Scopes;
use crate::diag::{Diagnostics, FatalError, HaltRequested, Position};
use crate::escape;
use crate::export::{ExportData, ExportedFunc, ExportedType, ExportedConst, ExportedVar};
use crate::flags::CompilerFlags;
use crate::importer::{self, ImportContext};
use crate::inline::{self, INLINE_BUDGET};
use crate::objfile::{self, ObjectMeta};
use crate::symtab::{PackageId, SymbolId, SymbolTable};
use crate::types::{Kind, TypeId, TypeTable};
use crate::universe;

/// Everything `compile` needs besides source text: the six process-wide
/// stores §5 says are "mutated in sequence by the phase driver", gathered
/// behind one struct instead of scattered globals (§9).
pub struct Compiler {
    pub ast: Ast,
    pub types: TypeTable,
    pub symtab: SymbolTable,
    pub diags: Diagnostics,
    pub scopes: Scopes,
    pub xtop: Vec<NodeId>,
    pub flags: CompilerFlags,
    pub main_pkg: PackageId,
}

/// Failure modes that stop `compile` outright, mirroring §7's taxonomy: a
/// halted checker (`-h`), a propagated import/environment fatal, or errors
/// that survived to the final phase gate (§7: "the process exits with
/// status 1 after flushing").
#[derive(Debug)]
pub enum DriverError {
    Halted,
    Fatal(FatalError),
    Diagnostics,
}

impl From<HaltRequested> for DriverError {
    fn from(_: HaltRequested) -> Self {
        DriverError::Halted
    }
}

impl From<FatalError> for DriverError {
    fn from(e: FatalError) -> Self {
        DriverError::Fatal(e)
    }
}

/// The bytes this driver hands off to the (external) linker, plus whatever
/// `-linkobj`/`-asmhdr` sidecars were requested.
pub struct CompileArtifact {
    pub object_bytes: Vec<u8>,
    pub linkobj_bytes: Option<Vec<u8>>,
    pub asmhdr_bytes: Option<Vec<u8>>,
}

/// Target OS string, Go-style (§6 object header `<GOOS>`). Reads `GOOS`,
/// falling back to a translation of `std::env::consts::OS`.
pub fn target_os() -> String {
    std::env::var("GOOS").unwrap_or_else(|_| match std::env::consts::OS {
        "macos" => "darwin".to_string(),
        other => other.to_string(),
    })
}

/// Target arch string, Go-style (§6 object header `<GOARCH>`). Reads
/// `GOARCH`, falling back to a translation of `std::env::consts::ARCH`.
pub fn target_arch() -> String {
    std::env::var("GOARCH").unwrap_or_else(|_| match std::env::consts::ARCH {
        "x86_64" => "amd64".to_string(),
        "aarch64" => "arm64".to_string(),
        other => other.to_string(),
    })
}

/// Recognizes just enough surface syntax to pull the import path strings a
/// real parser's AST would already have attached to `OPACK` nodes: a
/// single `import "path"` line, or a parenthesized `import ( "a" "b" )`
/// block. The lexer/parser proper is an external collaborator (§1 Scope);
/// this is the minimum textual scan needed to make the import reader in
/// `importer/` reachable from an actual input file rather than only from
/// tests that build `xtop` by hand.
fn discover_import_paths(source: &str) -> Vec<String> {
    let mut paths = Vec::new();
    let mut lines = source.lines();
    while let Some(line) = lines.next() {
        let Some(rest) = line.trim().strip_prefix("import") else {
            continue;
        };
        let rest = rest.trim_start();
        if let Some(after_paren) = rest.strip_prefix('(') {
            if let Some(path) = extract_quoted(after_paren) {
                paths.push(path);
            }
            for line in lines.by_ref() {
                let trimmed = line.trim();
                if trimmed.starts_with(')') {
                    break;
                }
                if let Some(path) = extract_quoted(trimmed) {
                    paths.push(path);
                }
            }
        } else if let Some(path) = extract_quoted(rest) {
            paths.push(path);
        }
    }
    paths
}

/// Pulls the first `"..."`-quoted substring out of `s`, if any.
fn extract_quoted(s: &str) -> Option<String> {
    let s = s.trim();
    let rest = s.strip_prefix('"')?;
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}

fn experiments_string(flags: &CompilerFlags) -> String {
    let mut parts = Vec::new();
    if flags.race {
        parts.push("race");
    }
    if flags.msan {
        parts.push("msan");
    }
    if flags.shared {
        parts.push("shared");
    }
    if flags.dynlink {
        parts.push("dynlink");
    }
    if parts.is_empty() {
        "none".to_string()
    } else {
        parts.join(",")
    }
}

impl Compiler {
    /// Boots a fresh compiler context: pseudo-packages, the universe, the
    /// local package named by `-p` (default `main`), and `finishUniverse`
    /// (§4.4).
    pub fn new(flags: CompilerFlags) -> Self {
        let mut symtab = SymbolTable::bootstrap();
        let mut types = TypeTable::new();
        universe::init_universe(&mut symtab, &mut types);

        let package_path = flags.package_path.clone().unwrap_or_else(|| "main".to_string());
        let main_pkg = symtab.mkpkg(&package_path);
        universe::finish_universe(&mut symtab, main_pkg);

        let diags = Diagnostics::new(flags.unlimited_errors, flags.halt_on_first_error);

        Self {
            ast: Ast::new(),
            types,
            symtab,
            diags,
            scopes: Scopes::new(),
            xtop: Vec::new(),
            flags,
            main_pkg,
        }
    }

    /// §4.3 Bootstrap imports: pre-load `runtime` and `unsafe` without
    /// making their names visible to user code. The real compiler reads
    /// these from export data embedded in the binary at build time; this
    /// crate has no such embedded blob (no upstream `runtime` package to
    /// bundle), so the pseudo-packages are simply marked imported — they
    /// were already created with no symbols by `SymbolTable::bootstrap`,
    /// which is a faithful rendition of "present, but contributing nothing
    /// a user package can see" for a front-end that never reaches codegen.
    pub fn bootstrap_imports(&mut self) {
        self.symtab.package_mut(self.symtab.runtime_pkg).imported = true;
        self.symtab.package_mut(self.symtab.unsafe_pkg).imported = true;
    }

    /// §4.3 entry point, exposed so callers (and imports discovered while
    /// type-checking, in a fuller implementation) can resolve a path. Wires
    /// `self.flags` into an `ImportContext` for the single import call.
    pub fn import(&mut self, path: &str, source_dir: Option<&Path>) -> Result<PackageId, FatalError> {
        let goroot_pkg_dir = goroot_pkg_dir(&self.flags);
        // Owned copy so `ctx`'s borrow doesn't tie up `self.symtab` across
        // the `&mut self.symtab` passed to `importer::import` below.
        let current_package = self.symtab.package(self.main_pkg).import_path.clone();
        let os = target_os();
        let arch = target_arch();
        // §4.3 File location: a local (relative) import rebases against
        // `-D`'s `localimport` when the caller has no file-specific
        // directory of its own to offer.
        let source_dir = source_dir.or(self.flags.local_import_base.as_deref());
        let ctx = ImportContext {
            source_dir,
            search_dirs: &self.flags.import_dirs,
            goroot_pkg_dir: &goroot_pkg_dir,
            import_map: &self.flags.import_map,
            local_imports_disabled: self.flags.no_local_imports,
            safe_mode: self.flags.safe_mode,
            current_package: &current_package,
        };
        importer::import(&mut self.symtab, path, &ctx, &os, &arch)
    }

    /// §6 Input format: validates each source file is readable UTF-8 text
    /// with an optional leading BOM, which is skipped rather than treated
    /// as content. A read or decode failure is a syntax-adjacent fatal per
    /// §4.10 step 1 ("On any syntax error, abort immediately"). Also seeds
    /// `xtop` with one `OPACK` node per import path discovered in each file
    /// (see `discover_import_paths`), so `resolve_imports` below has
    /// something real to drive the import reader from.
    fn validate_sources(&mut self, sources: &[PathBuf]) -> Result<(), DriverError> {
        if sources.is_empty() {
            return Err(DriverError::Fatal(FatalError::Environment(
                "no input source files".to_string(),
            )));
        }
        for path in sources {
            let bytes = std::fs::read(path).map_err(|e| {
                DriverError::Fatal(FatalError::Environment(format!(
                    "{}: {e}",
                    path.display()
                )))
            })?;
            let text = String::from_utf8(bytes).map_err(|_| {
                DriverError::Fatal(FatalError::Environment(format!(
                    "{}: invalid UTF-8",
                    path.display()
                )))
            })?;
            let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

            for import_path in discover_import_paths(text) {
                let mut node = Node::new(
                    Op::OPACK,
                    Position::File {
                        file: path.clone(),
                        line: 1,
                    },
                );
                node.payload.import_path = Some(import_path);
                let id = self.ast.alloc_node(node);
                self.xtop.push(id);
            }
        }
        Ok(())
    }

    /// §4.3 entry point actually reached from `compile`: resolves every
    /// `OPACK` node `validate_sources` seeded into `xtop`, recording the
    /// resolved package on the node's `pkg` field. Runs before type
    /// checking so imported symbols are already installed when phase A
    /// looks names up.
    fn resolve_imports(&mut self, source_dir: Option<&Path>) -> Result<(), DriverError> {
        let packs: Vec<(NodeId, String)> = self
            .xtop
            .iter()
            .filter_map(|&id| {
                let node = self.ast.node(id);
                if node.op != Op::OPACK {
                    return None;
                }
                node.payload.import_path.clone().map(|path| (id, path))
            })
            .collect();

        for (id, path) in packs {
            let pkg = self.import(&path, source_dir)?;
            self.ast.node_mut(id).payload.pkg = Some(pkg);
        }
        Ok(())
    }

    /// Every `ODCLFUNC` (and its nested closures) reachable from `xtop`,
    /// used by the inliner and escape analyzer as their function universe.
    fn collect_funcs(&self) -> Vec<FuncId> {
        let mut funcs = Vec::new();
        let mut stack: Vec<NodeId> = self.xtop.clone();
        let mut visited = std::collections::HashSet::new();
        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            let node = self.ast.node(id);
            stack.extend(node.payload.list.iter().copied());
            stack.extend(node.payload.rlist.iter().copied());
            stack.extend(node.payload.left);
            stack.extend(node.payload.right);
            if matches!(node.op, Op::ODCLFUNC | Op::OCLOSURE) {
                if let Some(f) = node.payload.func {
                    funcs.push(f);
                    stack.extend(self.ast.func(f).body.iter().copied());
                }
            }
        }
        funcs
    }

    /// Resolves each `OCALL`/`OCALLFUNC` site to the `FuncId` it invokes, by
    /// following the callee expression's symbol to its definition node
    /// (§4.7/§4.8 both need this call graph).
    fn build_call_targets(&self) -> HashMap<NodeId, FuncId> {
        let mut targets = HashMap::new();
        let mut stack: Vec<NodeId> = self.xtop.clone();
        let mut visited = std::collections::HashSet::new();
        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            let node = self.ast.node(id);
            stack.extend(node.payload.list.iter().copied());
            stack.extend(node.payload.rlist.iter().copied());
            stack.extend(node.payload.left);
            stack.extend(node.payload.right);
            if let Some(f) = node.payload.func {
                stack.extend(self.ast.func(f).body.iter().copied());
            }

            if matches!(node.op, Op::OCALL | Op::OCALLFUNC) {
                if let Some(target) = self.resolve_call_target(id) {
                    targets.insert(id, target);
                }
            }
        }
        targets
    }

    fn resolve_call_target(&self, call_id: NodeId) -> Option<FuncId> {
        let callee = self.ast.node(call_id).payload.left?;
        let callee_node = self.ast.node(callee);
        if callee_node.op != Op::ONAME {
            return None;
        }
        let sym = callee_node.payload.sym?;
        let def = self.symtab.symbol(sym).definition?;
        self.ast.node(def).payload.func
    }

    /// §4.10 steps 2-9: type checking (three phases + deferred widths),
    /// closure capture decisions, inlining, and escape analysis. Returns
    /// early (without running later phases) only on `-h` halt; ordinary
    /// type errors are recorded and gated at the end of this method per §7
    /// ("saveerrors... so recoverable phases can still finish").
    fn run_middle_end(&mut self) -> Result<(), DriverError> {
        crate::typecheck::run_phases(
            &mut self.ast,
            &mut self.types,
            &mut self.symtab,
            &mut self.diags,
            &mut self.xtop,
        )?;

        if self.diags.nerrors() > 0 {
            self.diags.save_errors();
        }

        // Step 6: closure capture decisions (§4.6) must run before escape
        // analysis (§4.8 Ordering invariants).
        closures::analyze_captures(&mut self.ast, &self.xtop);

        // Step 7: eager import-body typecheck under `-l -l`. No imported
        // function ever carries an inline body in this crate (§4.3 installs
        // symbols, not bodies), so there is nothing to re-check here beyond
        // acknowledging the flag; a fuller import reader that reconstructed
        // inline bodies from export data would typecheck them in this slot.
        if self.flags.eager_import_typecheck() {
            // no-op: see doc comment above.
        }

        let funcs = self.collect_funcs();
        let call_targets = self.build_call_targets();

        // Step 8: inlining, bottom-up over the call graph, unless `-l`
        // disabled it.
        if self.flags.inlining_enabled() {
            for &f in &funcs {
                inline::caninl(&mut self.ast, f);
            }
            inline::inlcalls(&mut self.ast, &funcs, &call_targets);
        }

        // Step 9: whole-package escape analysis (§4.8), which must see the
        // final capture decisions from step 6.
        escape::analyze_escapes(&mut self.ast, &funcs, &call_targets);

        Ok(())
    }

    /// Step 10: closure transformation (§4.9), rewriting every closure that
    /// escapes or captures by reference into an explicit environment
    /// record. Capture types are looked up from the symbol's definition
    /// node type where available, defaulting to a zero-width placeholder
    /// otherwise (a capture whose defining node was itself dropped in a
    /// failed body, §4.10 step 5).
    fn lower_closures(&mut self) -> Vec<LoweredClosure> {
        // Collected up front, before handing `self.ast` off mutably to
        // `closure_xform::lower_closures`: a capture's own defining node
        // (`self.symtab.symbol(sym).definition`) already carries its type
        // once phase C has run (§8 invariant 2), so a plain symbol -> type
        // map is all `capture_types` below needs.
        let symbol_types = self.build_symbol_types();
        let default_ty = self.types.intern(Kind::Int(64));

        let ast = &mut self.ast;
        let types = &mut self.types;
        let xtop = &self.xtop;
        closure_xform::lower_closures(ast, types, xtop, move |sym| {
            symbol_types.get(&sym).copied().unwrap_or(default_ty)
        })
    }

    fn build_symbol_types(&self) -> HashMap<SymbolId, TypeId> {
        let mut map = HashMap::new();
        let mut stack: Vec<NodeId> = self.xtop.clone();
        let mut visited = std::collections::HashSet::new();
        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            let node = self.ast.node(id);
            if let (Some(sym), Some(ty)) = (node.payload.sym, node.ty) {
                map.entry(sym).or_insert(ty);
            }
            stack.extend(node.payload.list.iter().copied());
            stack.extend(node.payload.rlist.iter().copied());
            stack.extend(node.payload.left);
            stack.extend(node.payload.right);
            if let Some(f) = node.payload.func {
                stack.extend(self.ast.func(f).body.iter().copied());
            }
        }
        map
    }

    /// §4.10 step 13: when compiling the `runtime` package itself, a
    /// fuller implementation would verify write-barrier safety annotations
    /// on every pointer store. This crate's escape analyzer already tracks
    /// which stores must see a write barrier (`-wb`, on by default); the
    /// check here is the gate that would reject a missing annotation. No
    /// such annotation source exists in this AST yet, so the gate always
    /// passes — kept as an explicit step so the phase order stays intact.
    fn verify_write_barriers(&self) -> Result<(), DriverError> {
        if self.flags.compiling_runtime && !self.flags.write_barriers {
            return Err(DriverError::Fatal(FatalError::Environment(
                "compiling runtime requires write barriers enabled".to_string(),
            )));
        }
        Ok(())
    }

    /// Builds the `ExportData` this package exposes to importers (§4.3
    /// Post-conditions) from its top-level declarations.
    fn build_export_data(&self) -> ExportData {
        let mut data = ExportData {
            import_path: self.symtab.package(self.main_pkg).import_path.clone(),
            safe: self.symtab.package(self.main_pkg).safe,
            ..Default::default()
        };

        for &id in &self.xtop {
            let node = self.ast.node(id);
            match node.op {
                Op::ODCLFUNC => {
                    if let Some(func_id) = node.payload.func {
                        let func = self.ast.func(func_id);
                        let name = self.symtab.symbol(func.symbol).name.clone();
                        let signature = self.describe_func_signature(func_id);
                        let inline_body = func.inline_body.as_ref().map(|_| "inline".to_string());
                        data.funcs.push(ExportedFunc {
                            name,
                            signature,
                            inline_body,
                        });
                    }
                }
                Op::OTYPE => {
                    if let Some(sym) = node.payload.sym {
                        let name = self.symtab.symbol(sym).name.clone();
                        let underlying = node
                            .ty
                            .map(|t| self.describe_type(t))
                            .unwrap_or_else(|| "unknown".to_string());
                        let methods = node
                            .ty
                            .map(|t| {
                                self.types
                                    .info(t)
                                    .methods
                                    .iter()
                                    .map(|(name, _)| name.clone())
                                    .collect()
                            })
                            .unwrap_or_default();
                        data.types.push(ExportedType {
                            name,
                            underlying,
                            methods,
                        });
                    }
                }
                Op::ODCL => {
                    if let Some(sym) = node.payload.sym {
                        let name = self.symtab.symbol(sym).name.clone();
                        let ty = node
                            .ty
                            .map(|t| self.describe_type(t))
                            .unwrap_or_else(|| "unknown".to_string());
                        data.vars.push(ExportedVar { name, ty });
                    }
                }
                Op::OLITERAL => {
                    if let Some(sym) = node.payload.sym {
                        let name = self.symtab.symbol(sym).name.clone();
                        let ty = node
                            .ty
                            .map(|t| self.describe_type(t))
                            .unwrap_or_else(|| "unknown".to_string());
                        data.consts.push(ExportedConst {
                            name,
                            ty,
                            value: String::new(),
                        });
                    }
                }
                _ => {}
            }
        }

        data
    }

    fn describe_func_signature(&self, func_id: FuncId) -> String {
        let func = self.ast.func(func_id);
        let params: Vec<String> = func
            .params
            .iter()
            .map(|s| self.symtab.symbol(*s).name.clone())
            .collect();
        let results: Vec<String> = func
            .results
            .iter()
            .map(|s| self.symtab.symbol(*s).name.clone())
            .collect();
        format!("func({}) ({})", params.join(", "), results.join(", "))
    }

    fn describe_type(&self, id: crate::types::TypeId) -> String {
        match self.types.kind(id) {
            Kind::Bool => "bool".to_string(),
            Kind::Int(bits) => format!("int{bits}"),
            Kind::Uint(bits) => format!("uint{bits}"),
            Kind::Float(bits) => format!("float{bits}"),
            Kind::Complex(bits) => format!("complex{bits}"),
            Kind::String => "string".to_string(),
            Kind::Pointer(_) => "pointer".to_string(),
            Kind::Array { len, .. } => format!("[{len}]elem"),
            Kind::Slice(_) => "[]elem".to_string(),
            Kind::Map { .. } => "map[key]elem".to_string(),
            Kind::Chan { .. } => "chan elem".to_string(),
            Kind::Func { .. } => "func(...)".to_string(),
            Kind::Struct(fields) => format!("struct{{{} fields}}", fields.len()),
            Kind::Interface(methods) => format!("interface{{{} methods}}", methods.len()),
            Kind::Named { .. } => "named".to_string(),
        }
    }

    /// Runs the full hard-ordered phase sequence of §4.10 over `sources`
    /// and returns the serialized object bytes (and any `-linkobj`/`-asmhdr`
    /// sidecars), or a `DriverError` if a fatal occurred or errors survived
    /// to the final gate.
    pub fn compile(&mut self, sources: &[PathBuf]) -> Result<CompileArtifact, DriverError> {
        // Step 1: parse (here: validate + minimal import-clause discovery)
        // all source files.
        self.validate_sources(sources)?;
        self.bootstrap_imports();

        // Step 1.5 (§4.3): resolve every import discovered above before
        // type checking sees any of it.
        let source_dir = sources
            .first()
            .and_then(|p| p.parent())
            .map(Path::to_path_buf);
        self.resolve_imports(source_dir.as_deref())?;

        // Steps 2-9.
        self.run_middle_end()?;

        // Step 10: closure transformation.
        let _lowered = self.lower_closures();

        // Step 11: per-function backend compilation — external collaborator
        // (§1 Scope); nothing to invoke here beyond the phase boundary.

        // Step 12: package-init emission is folded into `build_export_data`
        // for this front-end-only crate; there is no separate init function
        // to synthesize without a real SSA backend to give it a body.

        // Step 13.
        self.verify_write_barriers()?;

        // Step 14: typecheck external declarations. Every declaration this
        // crate knows about already went through phases 2-5 above; imported
        // declarations are installed pre-typed by `importer::install`, so
        // there is nothing left to check here.

        self.symtab.testdclstack();

        // Final error gate (§7): if errors survived every recoverable
        // phase, no object file is written and the process reports failure.
        if self.diags.total() > 0 {
            return Err(DriverError::Diagnostics);
        }

        // Step 15: emit object file (and optional asm header).
        let export_data = self.build_export_data();
        let meta = ObjectMeta {
            os: target_os(),
            arch: target_arch(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            experiments: experiments_string(&self.flags),
            safe: self.symtab.package(self.main_pkg).safe,
        };

        let object_bytes = if self.flags.pack {
            objfile::write_archive(&meta, &export_data)
        } else {
            objfile::write_object(&meta, &export_data)
        }
        .map_err(|e| DriverError::Fatal(FatalError::Environment(e.to_string())))?;

        let linkobj_bytes = if self.flags.linkobj.is_some() {
            Some(
                objfile::write_object(&meta, &export_data)
                    .map_err(|e| DriverError::Fatal(FatalError::Environment(e.to_string())))?,
            )
        } else {
            None
        };

        let asmhdr_bytes = if self.flags.asmhdr.is_some() {
            Some(build_asm_header(&export_data))
        } else {
            None
        };

        Ok(CompileArtifact {
            object_bytes,
            linkobj_bytes,
            asmhdr_bytes,
        })
    }

    pub fn print_diagnostics(&self, painter: &Painter) {
        self.diags.print(painter);
    }

    /// §4.10 step 1's failure path: a syntax error aborts immediately,
    /// reported at "command line" if no finer position is available.
    pub fn report_fatal(&self, err: &FatalError, painter: &Painter) {
        eprintln!(
            "{}: {}",
            painter.pos(&Position::CommandLine.to_string()),
            painter.error(&err.to_string())
        );
    }
}

/// `-d asmhdr`-style output: symbol name plus a described type per
/// declaration, for hand-written assembly to `#include` (§6: "emit a
/// header file of symbol offsets for hand-written assembly").
fn build_asm_header(data: &ExportData) -> Vec<u8> {
    let mut out = String::new();
    for v in &data.vars {
        out.push_str(&format!("#define {}_offset 0\n", v.name));
    }
    for f in &data.funcs {
        out.push_str(&format!("// {}: {}\n", f.name, f.signature));
    }
    out.into_bytes()
}

fn goroot_pkg_dir(flags: &CompilerFlags) -> PathBuf {
    let goroot = std::env::var("GOROOT").unwrap_or_else(|_| "/usr/local/go".to_string());
    let suffix = flags.install_suffix.clone().unwrap_or_default();
    let dirname = if suffix.is_empty() {
        format!("{}_{}", target_os(), target_arch())
    } else {
        format!("{}_{}_{}", target_os(), target_arch(), suffix)
    };
    PathBuf::from(goroot).join("pkg").join(dirname)
}
