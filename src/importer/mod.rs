//! Import path preprocessing, object header validation, and body dispatch
//! (§4.3 Import Reader).

pub mod archive;
pub mod resolve;

use std::path::{Path, PathBuf};

use crate::diag::FatalError;
use crate::export::{decode, ExportData};
use crate::symtab::{PackageId, SymbolTable};

/// Current compilation context the import reader needs (§4.3 Inputs).
pub struct ImportContext<'a> {
    pub source_dir: Option<&'a Path>,
    pub search_dirs: &'a [PathBuf],
    pub goroot_pkg_dir: &'a Path,
    pub import_map: &'a std::collections::HashMap<String, String>,
    pub local_imports_disabled: bool,
    pub safe_mode: bool,
    pub current_package: &'a str,
}

/// Apply the import map, then reject the shapes §4.3 Preprocessing rules
/// out: empty paths, the literal `"main"` path, and self-imports.
fn preprocess<'a>(path: &'a str, ctx: &ImportContext) -> Result<String, FatalError> {
    let mapped = ctx
        .import_map
        .get(path)
        .cloned()
        .unwrap_or_else(|| path.to_string());

    if mapped.is_empty() {
        return Err(FatalError::Import {
            path: path.to_string(),
            reason: "empty import path".to_string(),
        });
    }
    if mapped == "main" {
        return Err(FatalError::Import {
            path: path.to_string(),
            reason: "import \"main\" is not allowed".to_string(),
        });
    }
    if mapped == ctx.current_package {
        return Err(FatalError::Import {
            path: path.to_string(),
            reason: "import cycle: package imports itself".to_string(),
        });
    }
    if mapped.starts_with('.') && (ctx.local_imports_disabled || ctx.safe_mode) {
        return Err(FatalError::Import {
            path: path.to_string(),
            reason: "local (relative) imports are disabled".to_string(),
        });
    }
    if is_non_canonical(&mapped) {
        return Err(FatalError::Import {
            path: path.to_string(),
            reason: "import path is not in canonical form".to_string(),
        });
    }
    Ok(mapped)
}

/// A path containing `.` or `..` segments (outside a single leading `.` for
/// local imports) is non-canonical (§4.3 Preprocessing, §8 boundary
/// behavior: `encoding/../encoding/base64` is rejected).
fn is_non_canonical(path: &str) -> bool {
    path.split('/').enumerate().any(|(i, seg)| {
        seg == ".." || (seg == "." && i != 0)
    })
}

/// Header fields read from line 1 (§6 Object file header).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectHeader {
    pub os: String,
    pub arch: String,
    pub version: String,
    pub experiments: String,
    pub safe: bool,
}

const OBJECT_HEADER_PREFIX: &str = "go object ";

/// Parses the object header out of the bytes following archive/ar framing
/// (§4.3 Object header). `empty archive` is tolerated and produces a header
/// with no symbols recorded beyond what's returned here (the caller treats
/// an all-empty `ExportData` as "imported successfully, nothing exported").
pub fn parse_header(text: &str) -> Result<Option<ObjectHeader>, FatalError> {
    let mut lines = text.lines();
    let first = lines.next().unwrap_or("");
    if first == "empty archive" {
        return Ok(None);
    }
    if !first.starts_with(OBJECT_HEADER_PREFIX) {
        return Err(FatalError::Import {
            path: String::new(),
            reason: format!("malformed object header: {first:?}"),
        });
    }
    let rest = &first[OBJECT_HEADER_PREFIX.len()..];
    let mut parts = rest.splitn(4, ' ');
    let os = parts.next().unwrap_or("").to_string();
    let arch = parts.next().unwrap_or("").to_string();
    let version = parts.next().unwrap_or("").to_string();
    let experiments = parts.next().unwrap_or("").to_string();

    let mut safe = false;
    for line in lines {
        if line.is_empty() {
            break;
        }
        if line == "safe" {
            safe = true;
        }
    }

    Ok(Some(ObjectHeader {
        os,
        arch,
        version,
        experiments,
        safe,
    }))
}

/// Validates a just-parsed header against the current compilation target
/// (§8 scenario 6: exact byte-level mismatch is fatal).
pub fn check_header_matches(
    path: &str,
    header: &ObjectHeader,
    expect_os: &str,
    expect_arch: &str,
) -> Result<(), FatalError> {
    if header.os != expect_os || header.arch != expect_arch {
        return Err(FatalError::Import {
            path: path.to_string(),
            reason: format!(
                "object is [{} {} {} {}] expected [{} {} ...]",
                header.os, header.arch, header.version, header.experiments, expect_os, expect_arch
            ),
        });
    }
    Ok(())
}

/// Body framing dispatch (§4.3 Body framing): scans for `$$`, reads the
/// selector byte, and returns the decoded export data.
pub fn read_body(text: &str) -> Result<ExportData, FatalError> {
    let marker_pos = text.find("$$").ok_or_else(|| FatalError::Import {
        path: String::new(),
        reason: "no $$ export marker found".to_string(),
    })?;
    let after = &text[marker_pos + 2..];
    let mut chars = after.chars();
    match chars.next() {
        Some('\n') => decode_text_body(chars.as_str()),
        Some('B') => {
            let mut rest = chars.as_str();
            if let Some(stripped) = rest.strip_prefix('\n') {
                rest = stripped;
            }
            decode_text_body(rest)
        }
        _ => Err(FatalError::Import {
            path: String::new(),
            reason: "no import in path".to_string(),
        }),
    }
}

fn decode_text_body(body: &str) -> Result<ExportData, FatalError> {
    let end = body.find("$$").unwrap_or(body.len());
    decode(body[..end].trim().as_bytes()).map_err(|e| FatalError::Import {
        path: String::new(),
        reason: e.to_string(),
    })
}

/// Installs `data`'s declarations into `pkg`'s symbol table and marks it
/// imported (§4.3 Post-conditions). Re-imports are a no-op by construction:
/// the caller checks `Package::imported` before calling this at all (§8
/// invariant 5, import idempotence).
pub fn install(symtab: &mut SymbolTable, pkg: PackageId, data: &ExportData) {
    for func in &data.funcs {
        let sym = symtab.lookup(pkg, &func.name);
        symtab
            .symbol_mut(sym)
            .flags
            .insert(crate::symtab::SymbolFlags::IMPORTED);
    }
    for ty in &data.types {
        let sym = symtab.lookup(pkg, &ty.name);
        symtab
            .symbol_mut(sym)
            .flags
            .insert(crate::symtab::SymbolFlags::IMPORTED);
    }
    for c in &data.consts {
        let sym = symtab.lookup(pkg, &c.name);
        symtab
            .symbol_mut(sym)
            .flags
            .insert(crate::symtab::SymbolFlags::IMPORTED);
    }
    for v in &data.vars {
        let sym = symtab.lookup(pkg, &v.name);
        symtab
            .symbol_mut(sym)
            .flags
            .insert(crate::symtab::SymbolFlags::IMPORTED);
    }
    symtab.package_mut(pkg).imported = true;
    symtab.package_mut(pkg).safe = data.safe;
}

/// Special-cases `unsafe` per §4.3 Preprocessing: in safe mode this is
/// fatal, otherwise the pseudo-package is returned directly with no file
/// I/O.
pub fn resolve_unsafe(symtab: &SymbolTable, ctx: &ImportContext) -> Result<PackageId, FatalError> {
    if ctx.safe_mode {
        return Err(FatalError::Import {
            path: "unsafe".to_string(),
            reason: "cannot import package unsafe".to_string(),
        });
    }
    Ok(symtab.unsafe_pkg)
}

/// Top-level entry: preprocess `path`, special-case `unsafe`, otherwise
/// probe for a file and read it. Returns the resolved `PackageId` on
/// success.
pub fn import(
    symtab: &mut SymbolTable,
    path: &str,
    ctx: &ImportContext,
    expect_os: &str,
    expect_arch: &str,
) -> Result<PackageId, FatalError> {
    let mapped = preprocess(path, ctx)?;
    if mapped == "unsafe" {
        return resolve_unsafe(symtab, ctx);
    }

    if let Some(existing) = symtab.find_package(&mapped) {
        if symtab.package(existing).imported {
            return Ok(existing);
        }
    }

    let found = resolve::resolve_import(&mapped, ctx.source_dir, ctx.search_dirs, ctx.goroot_pkg_dir)
        .ok_or_else(|| FatalError::Import {
            path: mapped.clone(),
            reason: "cannot find package".to_string(),
        })?;

    let raw = std::fs::read(&found).map_err(|e| FatalError::Import {
        path: mapped.clone(),
        reason: e.to_string(),
    })?;

    let body_start = if archive::is_archive(&raw) {
        let member = archive::first_member(&raw).map_err(|e| FatalError::Import {
            path: mapped.clone(),
            reason: e.to_string(),
        })?;
        member.body.to_vec()
    } else {
        raw
    };

    let text = String::from_utf8_lossy(&body_start);
    if let Some(header) = parse_header(&text)? {
        check_header_matches(&mapped, &header, expect_os, expect_arch)?;
        if header.safe && ctx.safe_mode {
            // A safe-mode compile may still import safe packages; nothing
            // further to reject here.
        } else if !header.safe && ctx.safe_mode {
            return Err(FatalError::Import {
                path: mapped.clone(),
                reason: "cannot import unsafe package in safe mode".to_string(),
            });
        }
        let data = read_body(&text)?;
        let pkg = symtab.mkpkg(&mapped);
        install(symtab, pkg, &data);
        Ok(pkg)
    } else {
        // "empty archive": install with no symbols.
        let pkg = symtab.mkpkg(&mapped);
        symtab.package_mut(pkg).imported = true;
        Ok(pkg)
    }
}
