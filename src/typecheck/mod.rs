//! Recursive, re-entrant type checker over the AST (§4.5).
//!
//! `Mode` is a plain `#[derive(Clone, Copy, PartialEq, Eq, Debug)] enum`: a
//! small closed set of operating modes threaded through one recursive
//! function rather than a trait per mode.

use crate::ast::{Ast, FuncId, NodeId, Op};
use crate::diag::{Diagnostics, HaltRequested, Position};
use crate::symtab::SymbolTable;
use crate::types::{Kind, TypeId, TypeTable};

/// The five checking contexts a node can be visited under (§4.5 Public
/// entry).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Mode {
    Statement,
    RValue,
    LValue,
    TypePosition,
    CallTarget,
}

/// Returned by `typecheck` whenever it must bail early because `-h` fired.
pub type CheckResult = Result<(), HaltRequested>;

/// Sentinel "unknown" type installed on a node whose checking failed (§4.5
/// Contract: "sets the node's type to a sentinel unknown").
fn unknown_type(types: &mut TypeTable) -> TypeId {
    types.intern(Kind::Struct(Vec::new()))
}

/// Checks `id`, filling in its `ty` field. Idempotent: a node that already
/// has a type is returned as-is without re-descending (§4.5 Contract, §8
/// round-trip law: "running typecheck twice ... is a no-op").
pub fn typecheck(
    ast: &mut Ast,
    types: &mut TypeTable,
    symtab: &mut SymbolTable,
    diags: &mut Diagnostics,
    id: NodeId,
    mode: Mode,
) -> CheckResult {
    if ast.node(id).ty.is_some() {
        return Ok(());
    }

    let op = ast.node(id).op;
    let pos = ast.node(id).pos.clone();

    let resolved = match op {
        Op::OLITERAL => Some(types.intern(Kind::Int(64))),
        Op::ONAME => {
            let sym = ast.node(id).payload.sym;
            match sym {
                Some(s) => {
                    let resolved_ty = symtab.symbol(s).definition.and_then(|def| ast.node(def).ty);
                    if resolved_ty.is_none() {
                        let name = symtab.symbol(s).name.clone();
                        diags.error(pos.clone(), format!("undefined: {name}"))?;
                    }
                    resolved_ty
                }
                None => None,
            }
        }
        Op::OBINARY | Op::OUNARY => {
            let children: Vec<NodeId> = ast
                .node(id)
                .payload
                .left
                .into_iter()
                .chain(ast.node(id).payload.right)
                .collect();
            for child in children {
                typecheck(ast, types, symtab, diags, child, Mode::RValue)?;
            }
            Some(types.intern(Kind::Int(64)))
        }
        Op::OCALL | Op::OCALLFUNC => {
            if mode != Mode::CallTarget && mode != Mode::Statement && mode != Mode::RValue {
                diags.error(pos.clone(), "call used in invalid context")?;
            }
            let list = ast.node(id).payload.list.clone();
            for arg in list {
                typecheck(ast, types, symtab, diags, arg, Mode::RValue)?;
            }
            Some(types.intern(Kind::Int(64)))
        }
        Op::OCLOSURE => {
            let func = ast.node(id).payload.func;
            if let Some(f) = func {
                let body = ast.func(f).body.clone();
                for stmt in &body {
                    typecheck(ast, types, symtab, diags, *stmt, Mode::Statement)?;
                }
            }
            Some(types.intern(Kind::Func {
                params: vec![],
                results: vec![],
                variadic: false,
            }))
        }
        Op::OBLOCK | Op::OIF | Op::OFOR | Op::ORANGE | Op::OSWITCH | Op::OSELECT => {
            let list = ast.node(id).payload.list.clone();
            for stmt in list {
                typecheck(ast, types, symtab, diags, stmt, Mode::Statement)?;
            }
            None
        }
        Op::ORETURN => {
            let list = ast.node(id).payload.list.clone();
            for expr in list {
                typecheck(ast, types, symtab, diags, expr, Mode::RValue)?;
            }
            None
        }
        _ => None,
    };

    let ty = match resolved {
        Some(t) => t,
        None => unknown_type(types),
    };
    ast.node_mut(id).ty = Some(ty);
    Ok(())
}

/// Three-phase discipline over `xtop` (§4.5: "variable initializers may
/// depend on types defined later in the file"). Each phase is index-based
/// so nodes appended mid-pass (synthesized closures) are visited in the
/// same pass (§9 `xtop` growth discipline).
pub fn run_phases(
    ast: &mut Ast,
    types: &mut TypeTable,
    symtab: &mut SymbolTable,
    diags: &mut Diagnostics,
    xtop: &mut Vec<NodeId>,
) -> CheckResult {
    phase_a(ast, types, symtab, diags, xtop)?;
    phase_b(ast, types, symtab, diags, xtop)?;
    types.resumecheckwidth();
    phase_c(ast, types, symtab, diags, xtop)?;
    Ok(())
}

/// Phase A: every top-level node that is *not* a declaration/assignment.
fn phase_a(
    ast: &mut Ast,
    types: &mut TypeTable,
    symtab: &mut SymbolTable,
    diags: &mut Diagnostics,
    xtop: &mut Vec<NodeId>,
) -> CheckResult {
    let mut i = 0;
    while i < xtop.len() {
        let id = xtop[i];
        if !matches!(ast.node(id).op, Op::ODCL | Op::OAS | Op::OAS2) {
            typecheck(ast, types, symtab, diags, id, Mode::TypePosition)?;
        }
        i += 1;
    }
    Ok(())
}

/// Phase B: declarations and assignments.
fn phase_b(
    ast: &mut Ast,
    types: &mut TypeTable,
    symtab: &mut SymbolTable,
    diags: &mut Diagnostics,
    xtop: &mut Vec<NodeId>,
) -> CheckResult {
    let mut i = 0;
    while i < xtop.len() {
        let id = xtop[i];
        if matches!(ast.node(id).op, Op::ODCL | Op::OAS | Op::OAS2) {
            typecheck(ast, types, symtab, diags, id, Mode::Statement)?;
        }
        i += 1;
    }
    Ok(())
}

/// Phase C: function bodies. A body that fails to check is dropped and the
/// function marked "do not compile" instead of aborting the whole pipeline
/// (§4.10 step 5).
fn phase_c(
    ast: &mut Ast,
    types: &mut TypeTable,
    symtab: &mut SymbolTable,
    diags: &mut Diagnostics,
    xtop: &mut Vec<NodeId>,
) -> CheckResult {
    let mut i = 0;
    while i < xtop.len() {
        let id = xtop[i];
        if ast.node(id).op == Op::ODCLFUNC {
            if let Some(func_id) = ast.node(id).payload.func {
                let errors_before = diags.total();
                let body = ast.func(func_id).body.clone();
                for stmt in &body {
                    typecheck(ast, types, symtab, diags, *stmt, Mode::Statement)?;
                }
                if diags.total() > errors_before {
                    ast.func_mut(func_id).body.clear();
                    ast.func_mut(func_id).do_not_compile = true;
                } else {
                    checkreturn(ast, func_id, diags)?;
                }
            }
        }
        i += 1;
    }
    Ok(())
}

/// Verifies every non-void control-flow path ends in a return statement or
/// an unconditional terminator like `panic` (§4.5 Return-path analysis).
/// This is a conservative approximation: the last statement of the body
/// must itself be terminating, or be an `if` whose every branch is.
pub fn checkreturn(ast: &Ast, func_id: FuncId, diags: &mut Diagnostics) -> CheckResult {
    let func = ast.func(func_id);
    if func.results.is_empty() {
        return Ok(());
    }
    if !body_terminates(ast, &func.body) {
        let pos = func
            .body
            .last()
            .map(|id| ast.node(*id).pos.clone())
            .unwrap_or(Position::CommandLine);
        diags.error(pos, "missing return at end of function")?;
    }
    Ok(())
}

fn body_terminates(ast: &Ast, body: &[NodeId]) -> bool {
    match body.last() {
        None => false,
        Some(&last) => {
            let node = ast.node(last);
            if node.op.is_terminating_statement() {
                return true;
            }
            if node.op == Op::OIF {
                let then_ok = body_terminates(ast, &node.payload.list);
                let else_ok = body_terminates(ast, &node.payload.rlist);
                return then_ok && else_ok && !node.payload.rlist.is_empty();
            }
            false
        }
    }
}
