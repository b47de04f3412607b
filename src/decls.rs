//! Declaration context and scope-entry bookkeeping (§4.4 Scopes).
//!
//! `DeclContext` and `Scopes` are a thin wrapper over `SymbolTable`'s
//! block-number generator: they add the `{external, parameter, auto,
//! function}` context tag the type checker consults to decide how a new
//! name should be declared, without duplicating the stack itself.

use crate::symtab::SymbolTable;

/// Current declaration context (§4.4: "`dclcontext` holds the current
/// declaration context").
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DeclContext {
    External,
    Parameter,
    Auto,
    Function,
}

/// Scope-entry/exit glue layered on top of `SymbolTable::push_block`.
/// Tracks the current `DeclContext` and the stack of block numbers entered,
/// so `pop_scope` can restore both in one call.
pub struct Scopes {
    context: DeclContext,
    block_stack: Vec<u32>,
}

impl Scopes {
    pub fn new() -> Self {
        Self {
            context: DeclContext::External,
            block_stack: Vec::new(),
        }
    }

    pub fn context(&self) -> DeclContext {
        self.context
    }

    pub fn set_context(&mut self, context: DeclContext) {
        self.context = context;
    }

    /// Enter a new lexical scope under `symtab`, recording its block number
    /// (§4.4: "entering a scope increments `blockgen` and records its value
    /// on entry").
    pub fn push_scope(&mut self, symtab: &mut SymbolTable) -> u32 {
        let block = symtab.push_block();
        self.block_stack.push(block);
        block
    }

    /// Leave the most recently entered scope. The caller is responsible for
    /// popping every symbol declared at that block via `SymbolTable::popdcl`
    /// before calling this — `Scopes` only tracks which block is current.
    pub fn pop_scope(&mut self) -> Option<u32> {
        self.block_stack.pop()
    }

    pub fn current_block(&self) -> Option<u32> {
        self.block_stack.last().copied()
    }

    pub fn depth(&self) -> usize {
        self.block_stack.len()
    }
}

impl Default for Scopes {
    fn default() -> Self {
        Self::new()
    }
}
