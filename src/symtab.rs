//! Symbol table and package registry (§4.1, §3 Symbol/Package).
//!
//! Handles are arena indices (§9 Design Notes: "replace pointer cycles with
//! an arena of nodes/types indexed by stable integer handles") — no
//! `Rc`/`RefCell` back-references anywhere.

use std::collections::HashMap;

use crate::ast::NodeId;

/// Minimal hand-rolled bitflags, avoiding a dependency for a 3-bit flag set.
macro_rules! bitflags_like {
    (
        $(#[$meta:meta])*
        pub struct $name:ident: $ty:ty {
            $(const $variant:ident = $value:expr;)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
        pub struct $name($ty);

        impl $name {
            $(pub const $variant: Self = Self($value);)*

            pub const fn empty() -> Self {
                Self(0)
            }

            pub fn contains(&self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }

            pub fn insert(&mut self, other: Self) {
                self.0 |= other.0;
            }

            pub fn remove(&mut self, other: Self) {
                self.0 &= !other.0;
            }
        }

        impl std::ops::BitOr for $name {
            type Output = Self;
            fn bitor(self, rhs: Self) -> Self {
                Self(self.0 | rhs.0)
            }
        }
    };
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct SymbolId(pub u32);

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct PackageId(pub u32);

bitflags_like! {
    /// Per-symbol flags (§3 Symbol: `Used`, `Safe`, `Imported`).
    pub struct SymbolFlags: u8 {
        const USED = 1 << 0;
        const SAFE = 1 << 1;
        const IMPORTED = 1 << 2;
    }
}

#[derive(Clone, Debug)]
pub struct Symbol {
    pub name: String,
    pub package: PackageId,
    pub definition: Option<NodeId>,
    /// Innermost scope at which this symbol was last bound (§3: "block
    /// number recording the innermost scope at which it was last bound").
    pub block: u32,
    pub flags: SymbolFlags,
}

#[derive(Clone, Debug)]
pub struct Package {
    pub import_path: String,
    pub short_name: String,
    pub symbols: HashMap<String, SymbolId>,
    /// Path with special characters percent-escaped, e.g. `/` -> `%2f`.
    pub prefix: String,
    pub imported: bool,
    pub safe: bool,
}

impl Package {
    fn new(import_path: &str, short_name: &str) -> Self {
        Self {
            import_path: import_path.to_string(),
            short_name: short_name.to_string(),
            symbols: HashMap::new(),
            prefix: escape_prefix(import_path),
            imported: false,
            safe: false,
        }
    }
}

/// Percent-escape an import path into an object-file-safe symbol prefix
/// (§3 Package: "`/` escaped as `%2f`"), e.g. for the `go.itablink` /
/// method-symbol naming scheme the object writer needs.
pub fn escape_prefix(path: &str) -> String {
    urlencoding::encode(path).into_owned()
}

/// A declaration-stack entry, recording what to restore on `popdcl` (§4.1:
/// "each push records the previous definition to restore on pop").
struct DeclFrame {
    symbol: SymbolId,
    previous_definition: Option<NodeId>,
    previous_block: u32,
}

pub struct SymbolTable {
    symbols: Vec<Symbol>,
    packages: Vec<Package>,
    package_by_path: HashMap<String, PackageId>,
    decl_stack: Vec<DeclFrame>,
    blockgen: u32,
    pub universe: PackageId,
    pub unsafe_pkg: PackageId,
    pub runtime_pkg: PackageId,
    pub go_itab: PackageId,
    pub go_itablink: PackageId,
    pub go_track: PackageId,
    pub go_map: PackageId,
    pub type_pkg: PackageId,
}

impl SymbolTable {
    /// Creates the six pseudo-packages (§3: process-wide, created at startup,
    /// never freed) and returns an empty table otherwise.
    pub fn bootstrap() -> Self {
        let mut table = Self {
            symbols: Vec::new(),
            packages: Vec::new(),
            package_by_path: HashMap::new(),
            decl_stack: Vec::new(),
            blockgen: 0,
            universe: PackageId(0),
            unsafe_pkg: PackageId(0),
            runtime_pkg: PackageId(0),
            go_itab: PackageId(0),
            go_itablink: PackageId(0),
            go_track: PackageId(0),
            go_map: PackageId(0),
            type_pkg: PackageId(0),
        };
        table.universe = table.mkpkg("universe");
        table.unsafe_pkg = table.mkpkg("unsafe");
        table.runtime_pkg = table.mkpkg("runtime");
        table.go_itab = table.mkpkg("go.itab");
        table.go_itablink = table.mkpkg("go.itablink");
        table.go_track = table.mkpkg("go.track");
        table.go_map = table.mkpkg("go.map");
        table.type_pkg = table.mkpkg("type");
        table
    }

    /// Idempotent on `path`: a second call returns the existing package.
    pub fn mkpkg(&mut self, path: &str) -> PackageId {
        if let Some(&id) = self.package_by_path.get(path) {
            return id;
        }
        let short_name = path.rsplit('/').next().unwrap_or(path).to_string();
        let id = PackageId(self.packages.len() as u32);
        self.packages.push(Package::new(path, &short_name));
        self.package_by_path.insert(path.to_string(), id);
        id
    }

    pub fn package(&self, id: PackageId) -> &Package {
        &self.packages[id.0 as usize]
    }

    pub fn package_mut(&mut self, id: PackageId) -> &mut Package {
        &mut self.packages[id.0 as usize]
    }

    pub fn find_package(&self, path: &str) -> Option<PackageId> {
        self.package_by_path.get(path).copied()
    }

    /// Creates the symbol on first reference; subsequent lookups of the same
    /// `(name, package)` pair return the same handle (§8 invariant 3).
    pub fn lookup(&mut self, pkg: PackageId, name: &str) -> SymbolId {
        if let Some(&id) = self.package(pkg).symbols.get(name) {
            return id;
        }
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(Symbol {
            name: name.to_string(),
            package: pkg,
            definition: None,
            block: self.blockgen,
            flags: SymbolFlags::empty(),
        });
        self.package_mut(pkg).symbols.insert(name.to_string(), id);
        id
    }

    /// Lookup without creating; used by code that must not intern a new
    /// symbol as a side effect of a failed lookup (e.g. the import reader
    /// probing for an already-declared name).
    pub fn try_lookup(&self, pkg: PackageId, name: &str) -> Option<SymbolId> {
        self.package(pkg).symbols.get(name).copied()
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0 as usize]
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.0 as usize]
    }

    /// Enter a new lexical scope, returning its block number.
    pub fn push_block(&mut self) -> u32 {
        self.blockgen += 1;
        self.blockgen
    }

    pub fn current_block(&self) -> u32 {
        self.blockgen
    }

    /// Push `sym`'s definition/block onto the declaration stack, recording
    /// the previous values so `popdcl` can restore them (§4.1).
    pub fn pushdcl(&mut self, sym: SymbolId, definition: NodeId, block: u32) {
        let previous_definition = self.symbol(sym).definition;
        let previous_block = self.symbol(sym).block;
        self.decl_stack.push(DeclFrame {
            symbol: sym,
            previous_definition,
            previous_block,
        });
        let s = self.symbol_mut(sym);
        s.definition = Some(definition);
        s.block = block;
    }

    /// Restore the most recently pushed definition. Panics if the stack is
    /// empty — popping past the bottom is an internal consistency bug, not a
    /// recoverable condition (§7: "Internal consistency errors... treated as
    /// bugs").
    pub fn popdcl(&mut self) {
        let frame = self
            .decl_stack
            .pop()
            .expect("popdcl: declaration stack underflow");
        let s = self.symbol_mut(frame.symbol);
        s.definition = frame.previous_definition;
        s.block = frame.previous_block;
    }

    /// Asserts the declaration stack is balanced (§4.1 `testdclstack`).
    pub fn testdclstack(&self) {
        assert!(
            self.decl_stack.is_empty(),
            "declaration stack not empty between phases: {} entries left",
            self.decl_stack.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mkpkg_is_idempotent_on_path() {
        let mut table = SymbolTable::bootstrap();
        let a = table.mkpkg("fmt");
        let b = table.mkpkg("fmt");
        assert_eq!(a, b);
    }

    #[test]
    fn lookup_returns_same_handle_for_same_name() {
        let mut table = SymbolTable::bootstrap();
        let pkg = table.mkpkg("fmt");
        let a = table.lookup(pkg, "Println");
        let b = table.lookup(pkg, "Println");
        assert_eq!(a, b);
    }

    #[test]
    fn lookup_is_scoped_per_package() {
        let mut table = SymbolTable::bootstrap();
        let fmt_pkg = table.mkpkg("fmt");
        let os_pkg = table.mkpkg("os");
        let a = table.lookup(fmt_pkg, "Exit");
        let b = table.lookup(os_pkg, "Exit");
        assert_ne!(a, b);
    }

    #[test]
    fn pseudo_packages_are_distinct() {
        let table = SymbolTable::bootstrap();
        let ids = [
            table.universe,
            table.unsafe_pkg,
            table.runtime_pkg,
            table.go_itab,
            table.go_itablink,
            table.go_track,
            table.go_map,
            table.type_pkg,
        ];
        for i in 0..ids.len() {
            for j in (i + 1)..ids.len() {
                assert_ne!(ids[i], ids[j]);
            }
        }
    }

    #[test]
    fn pushdcl_popdcl_restores_previous_definition() {
        let mut table = SymbolTable::bootstrap();
        let pkg = table.mkpkg("main");
        let sym = table.lookup(pkg, "x");
        assert_eq!(table.symbol(sym).definition, None);

        let outer_block = table.push_block();
        table.pushdcl(sym, NodeId(1), outer_block);
        assert_eq!(table.symbol(sym).definition, Some(NodeId(1)));

        let inner_block = table.push_block();
        table.pushdcl(sym, NodeId(2), inner_block);
        assert_eq!(table.symbol(sym).definition, Some(NodeId(2)));

        table.popdcl();
        assert_eq!(table.symbol(sym).definition, Some(NodeId(1)));

        table.popdcl();
        assert_eq!(table.symbol(sym).definition, None);

        table.testdclstack();
    }

    #[test]
    #[should_panic(expected = "declaration stack not empty")]
    fn testdclstack_panics_when_unbalanced() {
        let mut table = SymbolTable::bootstrap();
        let pkg = table.mkpkg("main");
        let sym = table.lookup(pkg, "x");
        let block = table.push_block();
        table.pushdcl(sym, NodeId(1), block);
        table.testdclstack();
    }

    #[test]
    fn escape_prefix_escapes_slash() {
        assert_eq!(escape_prefix("encoding/base64"), "encoding%2Fbase64");
    }
}
