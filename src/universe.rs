//! Builtin universe: predeclared types, constants, and functions (§4.4).
//!
//! The `const &[(&str, ...)]` tables follow `cli/parser/helpers.rs::SUBCOMMANDS`'s
//! shape: a flat, alphabetically-unordered list baked in as a compile-time
//! slice rather than built up through a `lazy_static`/`OnceCell` map, since
//! nothing here needs O(1) lookup at startup cost — only `finishUniverse`'s
//! one-time copy into a package's symbol table.

use crate::symtab::{PackageId, SymbolTable};
use crate::types::{Kind, TypeId, TypeTable};

/// Predeclared type names and the numeric/string/bool kind each maps to.
/// `error` is deliberately absent here — it is installed separately in
/// `install_types` because it is an interface, not a `Kind` literal.
pub const BUILTIN_TYPE_NAMES: &[&str] = &[
    "bool",
    "string",
    "int",
    "int8",
    "int16",
    "int32",
    "int64",
    "uint",
    "uint8",
    "uint16",
    "uint32",
    "uint64",
    "uintptr",
    "float32",
    "float64",
    "complex64",
    "complex128",
    "byte",
    "rune",
    "error",
];

/// Predeclared constant names (§4.4: "constants (`true`, `false`, `iota`,
/// `nil`)").
pub const BUILTIN_CONST_NAMES: &[&str] = &["true", "false", "iota", "nil"];

/// Predeclared function names (§4.4 Universe).
pub const BUILTIN_FUNC_NAMES: &[&str] = &[
    "len", "cap", "make", "new", "append", "copy", "delete", "panic", "recover", "print",
    "println", "complex", "real", "imag", "close",
];

fn kind_for_builtin_type(name: &str, string_ty: TypeId) -> Kind {
    match name {
        "bool" => Kind::Bool,
        "string" => Kind::String,
        "int" | "int64" => Kind::Int(64),
        "int8" => Kind::Int(8),
        "int16" => Kind::Int(16),
        "int32" | "rune" => Kind::Int(32),
        "uint" | "uint64" | "uintptr" => Kind::Uint(64),
        "uint8" | "byte" => Kind::Uint(8),
        "uint16" => Kind::Uint(16),
        "uint32" => Kind::Uint(32),
        "float32" => Kind::Float(32),
        "float64" => Kind::Float(64),
        "complex64" => Kind::Complex(64),
        "complex128" => Kind::Complex(128),
        "error" => Kind::Interface(vec![crate::types::InterfaceMethod {
            name: "Error".to_string(),
            signature: string_ty,
        }]),
        other => unreachable!("unhandled builtin type name: {other}"),
    }
}

/// Installs every predeclared symbol into the `universe` pseudo-package and
/// interns its type, constant stand-in, or function placeholder (§4.4
/// Universe). Must run once, before any user package is type-checked.
pub fn init_universe(symtab: &mut SymbolTable, types: &mut TypeTable) {
    let universe = symtab.universe;

    // `error`'s one method, `Error() string`, needs `string`'s TypeId
    // already interned; install it ahead of the main pass below.
    let string_ty = types.intern(Kind::String);
    types.dowidth(string_ty);
    let error_method_sig = types.intern(Kind::Func {
        params: vec![],
        results: vec![string_ty],
        variadic: false,
    });
    types.dowidth(error_method_sig);

    for &name in BUILTIN_TYPE_NAMES {
        let kind = kind_for_builtin_type(name, error_method_sig);
        let ty = types.intern(kind);
        types.dowidth(ty);
        let sym = symtab.lookup(universe, name);
        symtab
            .symbol_mut(sym)
            .flags
            .insert(crate::symtab::SymbolFlags::SAFE);
    }

    for &name in BUILTIN_CONST_NAMES {
        let sym = symtab.lookup(universe, name);
        symtab
            .symbol_mut(sym)
            .flags
            .insert(crate::symtab::SymbolFlags::SAFE);
    }

    for &name in BUILTIN_FUNC_NAMES {
        let sym = symtab.lookup(universe, name);
        symtab
            .symbol_mut(sym)
            .flags
            .insert(crate::symtab::SymbolFlags::SAFE);
    }
}

/// Copies every symbol visible in the `universe` pseudo-package into
/// `local`'s symbol table so builtins are usable unqualified (§4.4:
/// "`finishUniverse` copies visible universe symbols into the local
/// package's symbol table").
pub fn finish_universe(symtab: &mut SymbolTable, local: PackageId) {
    let universe = symtab.universe;
    let names: Vec<String> = symtab
        .package(universe)
        .symbols
        .keys()
        .cloned()
        .collect();
    for name in names {
        let universe_sym = symtab.lookup(universe, &name);
        let local_sym = symtab.lookup(local, &name);
        let definition = symtab.symbol(universe_sym).definition;
        if let Some(def) = definition {
            symtab.symbol_mut(local_sym).definition = Some(def);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_universe_installs_every_builtin_type() {
        let mut symtab = SymbolTable::bootstrap();
        let mut types = TypeTable::new();
        init_universe(&mut symtab, &mut types);
        for &name in BUILTIN_TYPE_NAMES {
            assert!(symtab.try_lookup(symtab.universe, name).is_some());
        }
    }

    #[test]
    fn init_universe_installs_builtin_funcs_and_consts() {
        let mut symtab = SymbolTable::bootstrap();
        let mut types = TypeTable::new();
        init_universe(&mut symtab, &mut types);
        assert!(symtab.try_lookup(symtab.universe, "append").is_some());
        assert!(symtab.try_lookup(symtab.universe, "nil").is_some());
        assert!(symtab.try_lookup(symtab.universe, "iota").is_some());
    }

    #[test]
    fn finish_universe_makes_builtins_reachable_from_local_package() {
        let mut symtab = SymbolTable::bootstrap();
        let mut types = TypeTable::new();
        init_universe(&mut symtab, &mut types);
        let main_pkg = symtab.mkpkg("main");
        finish_universe(&mut symtab, main_pkg);
        assert!(symtab.try_lookup(main_pkg, "len").is_some());
        assert!(symtab.try_lookup(main_pkg, "string").is_some());
    }
}
