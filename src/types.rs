//! Canonical type representation and width resolution (§4.2, §3 Type).
//!
//! Types are arena-interned: a structural description maps to one canonical
//! `TypeId` through `TypeTable::intern`, the same "arena of nodes indexed by
//! stable integer handles" idiom used for `NodeId`/`SymbolId` elsewhere, in
//! place of the pointer-identity-as-canonicalization the original compiler
//! relies on.

use std::collections::HashMap;

use crate::ast::FuncId;
use crate::symtab::SymbolId;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct TypeId(pub u32);

/// Channel direction (`chan T`, `chan<- T`, `<-chan T`).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StructField {
    pub name: String,
    pub ty: TypeId,
    pub embedded: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct InterfaceMethod {
    pub name: String,
    pub signature: TypeId,
}

/// A tagged variant over kinds (§3 Type). Structural kinds compare by
/// structure; `Named` carries identity through its own `TypeId` plus a
/// method list.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Bool,
    Int(u8),
    Uint(u8),
    Float(u8),
    Complex(u8),
    String,
    Pointer(TypeId),
    Array { len: u64, elem: TypeId },
    Slice(TypeId),
    Map { key: TypeId, elem: TypeId },
    Chan { dir: ChanDir, elem: TypeId },
    Func { params: Vec<TypeId>, results: Vec<TypeId>, variadic: bool },
    Struct(Vec<StructField>),
    Interface(Vec<InterfaceMethod>),
    Named { symbol: SymbolId, underlying: TypeId },
}

/// Width-resolution state (§4.2 Failure: "poisoned types propagate").
/// `Unresolved` and `Deferred` are transient; every type reaching code
/// emission must be `Resolved` or `Poisoned` (§3 invariant: "no code
/// generation may observe an unresolved width").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WidthState {
    Unresolved,
    Resolved { size: u64, align: u64 },
    Poisoned,
}

pub struct TypeInfo {
    pub kind: Kind,
    pub width: WidthState,
    pub methods: Vec<(String, FuncId)>,
}

/// Arena + canonicalization table for `Kind`s, plus the deferred-width queue
/// from §4.4 ("width queue").
pub struct TypeTable {
    types: Vec<TypeInfo>,
    canon: HashMap<Kind, TypeId>,
    defer_depth: u32,
    pending_widths: Vec<TypeId>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self {
            types: Vec::new(),
            canon: HashMap::new(),
            defer_depth: 0,
            pending_widths: Vec::new(),
        }
    }

    /// Returns the one canonical handle for `kind`, interning it on first
    /// use (§4.2 Canonicalization). `Named` types are never deduplicated by
    /// structure — each carries its own symbol identity — so each call for a
    /// `Named` kind allocates a fresh handle.
    pub fn intern(&mut self, kind: Kind) -> TypeId {
        if matches!(kind, Kind::Named { .. }) {
            return self.alloc(kind);
        }
        if let Some(&id) = self.canon.get(&kind) {
            return id;
        }
        let id = self.alloc(kind.clone());
        self.canon.insert(kind, id);
        id
    }

    fn alloc(&mut self, kind: Kind) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(TypeInfo {
            kind,
            width: WidthState::Unresolved,
            methods: Vec::new(),
        });
        id
    }

    pub fn info(&self, id: TypeId) -> &TypeInfo {
        &self.types[id.0 as usize]
    }

    pub fn info_mut(&mut self, id: TypeId) -> &mut TypeInfo {
        &mut self.types[id.0 as usize]
    }

    pub fn kind(&self, id: TypeId) -> &Kind {
        &self.info(id).kind
    }

    /// Disable immediate width computation; every `dowidth` call made while
    /// deferred enqueues its type instead of resolving it (§4.4 Width
    /// queue). Calls may nest — only the outermost pair actually toggles.
    pub fn defercheckwidth(&mut self) {
        self.defer_depth += 1;
    }

    /// Drain the pending-width queue, computing each width once; types
    /// enqueued while draining (a width computation that itself requests
    /// another type's width) are processed in turn until fixpoint (§4.4).
    pub fn resumecheckwidth(&mut self) {
        self.defer_depth = self.defer_depth.saturating_sub(1);
        if self.defer_depth > 0 {
            return;
        }
        while let Some(id) = self.pending_widths.pop() {
            self.resolve_width(id, &mut Vec::new());
        }
    }

    /// Computes byte size and alignment for `id`, recursing into component
    /// types (§4.2 "may recurse"). While width computation is deferred
    /// (`defercheckwidth` outstanding), queues `id` instead of recursing.
    pub fn dowidth(&mut self, id: TypeId) {
        if self.defer_depth > 0 {
            if self.info(id).width == WidthState::Unresolved {
                self.pending_widths.push(id);
            }
            return;
        }
        self.resolve_width(id, &mut Vec::new());
    }

    /// `visiting` tracks the in-progress recursion chain to detect a type
    /// that transitively depends on its own width (§4.2 Failure: `type T
    /// struct{ x T }`), which is only reachable through a named type whose
    /// underlying struct embeds itself by value.
    fn resolve_width(&mut self, id: TypeId, visiting: &mut Vec<TypeId>) {
        match self.info(id).width {
            WidthState::Resolved { .. } | WidthState::Poisoned => return,
            WidthState::Unresolved => {}
        }
        if visiting.contains(&id) {
            self.info_mut(id).width = WidthState::Poisoned;
            return;
        }
        visiting.push(id);

        let width = match self.kind(id).clone() {
            Kind::Bool => Some((1, 1)),
            Kind::Int(bits) | Kind::Uint(bits) => {
                let bytes = (bits / 8).max(1) as u64;
                Some((bytes, bytes))
            }
            Kind::Float(bits) => {
                let bytes = (bits / 8) as u64;
                Some((bytes, bytes))
            }
            Kind::Complex(bits) => {
                let bytes = (bits / 8) as u64;
                Some((bytes, bytes / 2))
            }
            Kind::String => Some((16, 8)),
            Kind::Pointer(_) | Kind::Chan { .. } | Kind::Map { .. } | Kind::Func { .. } => {
                Some((8, 8))
            }
            Kind::Slice(_) => Some((24, 8)),
            Kind::Interface(_) => Some((16, 8)),
            Kind::Array { len, elem } => {
                self.resolve_width(elem, visiting);
                match self.info(elem).width {
                    WidthState::Resolved { size, align } => Some((size * len, align.max(1))),
                    WidthState::Poisoned => {
                        self.info_mut(id).width = WidthState::Poisoned;
                        visiting.pop();
                        return;
                    }
                    WidthState::Unresolved => None,
                }
            }
            Kind::Struct(fields) => {
                let mut offset = 0u64;
                let mut max_align = 1u64;
                let mut poisoned = false;
                for field in &fields {
                    self.resolve_width(field.ty, visiting);
                    match self.info(field.ty).width {
                        WidthState::Resolved { size, align } => {
                            offset = align_up(offset, align) + size;
                            max_align = max_align.max(align);
                        }
                        WidthState::Poisoned => poisoned = true,
                        WidthState::Unresolved => {}
                    }
                }
                if poisoned {
                    self.info_mut(id).width = WidthState::Poisoned;
                    visiting.pop();
                    return;
                }
                Some((align_up(offset, max_align), max_align))
            }
            Kind::Named { underlying, .. } => {
                self.resolve_width(underlying, visiting);
                match self.info(underlying).width {
                    WidthState::Resolved { size, align } => Some((size, align)),
                    WidthState::Poisoned => {
                        self.info_mut(id).width = WidthState::Poisoned;
                        visiting.pop();
                        return;
                    }
                    WidthState::Unresolved => None,
                }
            }
        };

        visiting.pop();
        self.info_mut(id).width = match width {
            Some((size, align)) => WidthState::Resolved { size, align },
            None => WidthState::Poisoned,
        };
    }

    pub fn is_poisoned(&self, id: TypeId) -> bool {
        self.info(id).width == WidthState::Poisoned
    }

    /// Structural assignability: identical canonical handle, or (for
    /// interfaces) the source's method set is a superset of the target's
    /// (§4.2 Operations). Named-type method sets are not modeled at the
    /// level of detail this component needs beyond interface satisfaction.
    pub fn assignable(&self, from: TypeId, to: TypeId) -> bool {
        if from == to {
            return true;
        }
        if let Kind::Interface(want) = self.kind(to) {
            let have = &self.info(from).methods;
            return want
                .iter()
                .all(|m| have.iter().any(|(name, _)| name == &m.name));
        }
        false
    }
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}

fn align_up(offset: u64, align: u64) -> u64 {
    if align == 0 {
        return offset;
    }
    (offset + align - 1) / align * align
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_deduplicates_structural_kinds() {
        let mut types = TypeTable::new();
        let a = types.intern(Kind::Int(64));
        let b = types.intern(Kind::Int(64));
        assert_eq!(a, b);
    }

    #[test]
    fn named_types_are_never_deduplicated() {
        let mut types = TypeTable::new();
        let underlying = types.intern(Kind::Int(64));
        let a = types.intern(Kind::Named {
            symbol: SymbolId(0),
            underlying,
        });
        let b = types.intern(Kind::Named {
            symbol: SymbolId(0),
            underlying,
        });
        assert_ne!(a, b);
    }

    #[test]
    fn dowidth_resolves_struct_with_padding() {
        let mut types = TypeTable::new();
        let b = types.intern(Kind::Bool);
        let i = types.intern(Kind::Int(64));
        let s = types.intern(Kind::Struct(vec![
            StructField {
                name: "flag".into(),
                ty: b,
                embedded: false,
            },
            StructField {
                name: "value".into(),
                ty: i,
                embedded: false,
            },
        ]));
        types.dowidth(s);
        assert_eq!(
            types.info(s).width,
            WidthState::Resolved { size: 16, align: 8 }
        );
    }

    #[test]
    fn recursive_struct_is_poisoned_not_resolved() {
        let mut types = TypeTable::new();
        // Build `type T struct { x T }` by reserving T's handle first and
        // pointing the struct field back at it.
        let placeholder = types.intern(Kind::Int(8));
        let named = types.intern(Kind::Named {
            symbol: SymbolId(1),
            underlying: placeholder,
        });
        let cyclic_struct = types.alloc(Kind::Struct(vec![StructField {
            name: "x".into(),
            ty: named,
            embedded: false,
        }]));
        types.info_mut(named).kind = Kind::Named {
            symbol: SymbolId(1),
            underlying: cyclic_struct,
        };

        types.dowidth(named);
        assert_eq!(types.info(named).width, WidthState::Poisoned);
    }

    #[test]
    fn defer_and_resume_width_processes_queue_once() {
        let mut types = TypeTable::new();
        let i = types.intern(Kind::Int(32));
        types.defercheckwidth();
        types.dowidth(i);
        assert_eq!(types.info(i).width, WidthState::Unresolved);
        types.resumecheckwidth();
        assert_eq!(
            types.info(i).width,
            WidthState::Resolved { size: 4, align: 4 }
        );
    }

    #[test]
    fn nested_defer_only_resumes_on_outermost_call() {
        let mut types = TypeTable::new();
        let i = types.intern(Kind::Int(32));
        types.defercheckwidth();
        types.defercheckwidth();
        types.dowidth(i);
        types.resumecheckwidth();
        assert_eq!(types.info(i).width, WidthState::Unresolved);
        types.resumecheckwidth();
        assert_eq!(
            types.info(i).width,
            WidthState::Resolved { size: 4, align: 4 }
        );
    }

    #[test]
    fn interface_assignability_checks_method_superset() {
        let mut types = TypeTable::new();
        let sig = types.intern(Kind::Func {
            params: vec![],
            results: vec![],
            variadic: false,
        });
        let iface = types.intern(Kind::Interface(vec![InterfaceMethod {
            name: "String".into(),
            signature: sig,
        }]));
        let concrete = types.intern(Kind::Int(64));
        types
            .info_mut(concrete)
            .methods
            .push(("String".into(), FuncId(0)));
        assert!(types.assignable(concrete, iface));

        let concrete2 = types.intern(Kind::Bool);
        assert!(!types.assignable(concrete2, iface));
    }
}
