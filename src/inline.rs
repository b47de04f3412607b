//! Inliner: eligibility (`caninl`) and bottom-up expansion (`inlcalls`)
//! (§4.7).

use std::collections::HashMap;

use crate::ast::{Ast, FuncId, NodeId, Op};
use crate::scc::tarjan_scc;

/// Maximum AST node count of a function body still eligible for inlining
/// (§4.7 Eligibility: "body size ≤ a threshold expressed in AST node
/// count"). Chosen to match the order of magnitude the real compiler uses
/// for its node-budget heuristic without claiming to reproduce its exact
/// cost model.
pub const INLINE_BUDGET: usize = 80;

/// Decides whether `func_id` is inlinable, and if so attaches a copy of its
/// body to `inline_body` (§4.7 Eligibility).
pub fn caninl(ast: &mut Ast, func_id: FuncId) -> bool {
    if ast.func(func_id).no_inline {
        return false;
    }
    if ast.func(func_id).is_closure() {
        return false;
    }
    let body = ast.func(func_id).body.clone();
    if ast.count_statement_tree(&body) > INLINE_BUDGET {
        return false;
    }
    if body_has_disallowed_construct(ast, &body) {
        return false;
    }
    ast.func_mut(func_id).inline_body = Some(body);
    true
}

fn body_has_disallowed_construct(ast: &Ast, body: &[NodeId]) -> bool {
    let mut stack = body.to_vec();
    while let Some(id) = stack.pop() {
        let node = ast.node(id);
        if node.op.blocks_inlining() {
            return true;
        }
        stack.extend(node.payload.list.iter().copied());
        stack.extend(node.payload.rlist.iter().copied());
        stack.extend(node.payload.left);
        stack.extend(node.payload.right);
    }
    false
}

/// Returns every function symbol called (directly, via `OCALL`/`OCALLFUNC`)
/// from `func_id`'s body, used to build the call graph for SCC traversal.
fn callees(ast: &Ast, func_id: FuncId, call_targets: &HashMap<NodeId, FuncId>) -> Vec<FuncId> {
    let body = ast.func(func_id).body.clone();
    let mut stack = body;
    let mut found = Vec::new();
    while let Some(id) = stack.pop() {
        let node = ast.node(id);
        if matches!(node.op, Op::OCALL | Op::OCALLFUNC) {
            if let Some(target) = node.payload.func.or_else(|| call_targets.get(&id).copied()) {
                found.push(target);
            }
        }
        stack.extend(node.payload.list.iter().copied());
        stack.extend(node.payload.rlist.iter().copied());
        stack.extend(node.payload.left);
        stack.extend(node.payload.right);
    }
    found
}

/// Replaces every eligible call site in `func_id`'s body with a clone of the
/// callee's cached inline body (§4.7 Expansion). Clones get fresh `NodeId`s
/// so the same callee can be inlined at multiple call sites without aliasing
/// — parameter substitution itself is left for the SSA backend to perform
/// on the cloned body's parameter `ONAME`s, which is out of this
/// component's scope per §1.
fn inline_calls_into(ast: &mut Ast, func_id: FuncId, call_targets: &HashMap<NodeId, FuncId>) {
    let body = ast.func(func_id).body.clone();
    let mut new_body = Vec::with_capacity(body.len());
    for stmt in body {
        new_body.push(expand_node(ast, stmt, call_targets));
    }
    ast.func_mut(func_id).body = new_body;
}

fn expand_node(ast: &mut Ast, id: NodeId, call_targets: &HashMap<NodeId, FuncId>) -> NodeId {
    let op = ast.node(id).op;
    if matches!(op, Op::OCALL | Op::OCALLFUNC) {
        if let Some(&target) = call_targets.get(&id) {
            if let Some(inline_body) = ast.func(target).inline_body.clone() {
                if let Some(&first) = inline_body.first() {
                    return clone_subtree(ast, first);
                }
            }
        }
    }
    id
}

/// Deep-clones the subtree rooted at `id`, returning the new root's handle.
fn clone_subtree(ast: &mut Ast, id: NodeId) -> NodeId {
    let mut node = ast.node(id).clone();
    node.payload.left = node.payload.left.map(|c| clone_subtree(ast, c));
    node.payload.right = node.payload.right.map(|c| clone_subtree(ast, c));
    node.payload.list = node
        .payload
        .list
        .iter()
        .map(|c| clone_subtree(ast, *c))
        .collect();
    node.payload.rlist = node
        .payload
        .rlist
        .iter()
        .map(|c| clone_subtree(ast, *c))
        .collect();
    ast.alloc_node(node)
}

/// Visits the call graph of `funcs` bottom-up via SCC (§4.7 Bottom-up
/// traversal): every function is considered for inlining after all its
/// callees, and functions inside a recursive SCC are never inlined.
pub fn inlcalls(ast: &mut Ast, funcs: &[FuncId], call_targets: &HashMap<NodeId, FuncId>) {
    let sccs = tarjan_scc(funcs, |f| callees(ast, *f, call_targets));

    for scc in &sccs {
        let recursive = crate::scc::is_cycle(scc, &|f| callees(ast, *f, call_targets));
        for &func_id in scc {
            if !recursive {
                caninl(ast, func_id);
            }
            inline_calls_into(ast, func_id, call_targets);
        }
    }
}
