//! Escape analysis (§4.8): whole-package dataflow over addresses, deciding
//! whether each parameter/local can be stack-allocated.
//!
//! The lattice is `NoEscape < EscapesThroughReturn(depth) < EscapesToHeap`,
//! computed by propagating dataflow edges to a fixpoint over the call
//! graph's SCCs, most-scc-cyclic-parts-first the same way `inline.rs` walks
//! bottom-up — reusing `scc::tarjan_scc` for a second, unrelated graph, just
//! as its module doc promises.

use std::collections::HashMap;

use crate::ast::{Ast, EscapeTag, FuncId, NodeId, Op};
use crate::scc::tarjan_scc;

/// One dataflow edge discovered while walking a function body: `from`
/// (a parameter index within the function) flows into `to`'s fate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Sink {
    /// Flows into the function's `n`th result (§4.8: "assignment to a
    /// pointer stored in a result" → `EscapesThroughReturn`).
    Result(u8),
    /// Flows somewhere this analysis can't prove is stack-bound: sent on a
    /// channel, stored through an existing pointer, passed to an indirect
    /// call, or captured by a closure that itself escapes.
    Heap,
}

fn escape_rank(tag: EscapeTag) -> u8 {
    match tag {
        EscapeTag::Unknown | EscapeTag::DoesNotEscape => 0,
        EscapeTag::EscapesThroughReturn(_) => 1,
        EscapeTag::EscapesToHeap => 2,
    }
}

fn join(a: EscapeTag, b: EscapeTag) -> EscapeTag {
    if escape_rank(b) > escape_rank(a) {
        b
    } else {
        a
    }
}

/// Finds every sink a parameter's address can reach within a single
/// function body, by walking statements looking for `OADDR` on a parameter
/// name followed by assignment into a result slot, a channel send, an
/// indirect call argument, or a closure capture.
fn param_sinks(ast: &Ast, func_id: FuncId) -> HashMap<u32, Vec<Sink>> {
    let func = ast.func(func_id);
    let mut param_index: HashMap<crate::symtab::SymbolId, u32> = HashMap::new();
    for (i, sym) in func.params.iter().enumerate() {
        param_index.insert(*sym, i as u32);
    }
    let mut sinks: HashMap<u32, Vec<Sink>> = HashMap::new();

    let mut stack: Vec<NodeId> = func.body.clone();
    while let Some(id) = stack.pop() {
        let node = ast.node(id);
        match node.op {
            Op::ORETURN => {
                for (slot, value) in node.payload.list.iter().enumerate() {
                    if let Some(p) = addressed_param(ast, *value, &param_index) {
                        sinks
                            .entry(p)
                            .or_default()
                            .push(Sink::Result(slot as u8));
                    }
                }
            }
            Op::OSEND | Op::OCALL => {
                for arg in &node.payload.list {
                    if let Some(p) = addressed_param(ast, *arg, &param_index) {
                        sinks.entry(p).or_default().push(Sink::Heap);
                    }
                }
                if let Some(left) = node.payload.left {
                    if let Some(p) = addressed_param(ast, left, &param_index) {
                        sinks.entry(p).or_default().push(Sink::Heap);
                    }
                }
            }
            Op::OAS | Op::OAS2 => {
                // Assigning a parameter's address through an existing
                // pointer (`*q = &p`) escapes it; assigning to a plain
                // local does not, so only the dereferenced-target shape is
                // treated as a sink here.
                if let Some(target) = node.payload.list.first() {
                    if ast.node(*target).op == Op::OIND {
                        if let Some(right) = node.payload.right {
                            if let Some(p) = addressed_param(ast, right, &param_index) {
                                sinks.entry(p).or_default().push(Sink::Heap);
                            }
                        }
                    }
                }
            }
            _ => {}
        }
        stack.extend(node.payload.list.iter().copied());
        stack.extend(node.payload.rlist.iter().copied());
        stack.extend(node.payload.left);
        stack.extend(node.payload.right);
    }

    sinks
}

/// If `id` is (directly, or through one `OADDR`) the address of one of
/// `func`'s parameters, returns that parameter's index.
fn addressed_param(
    ast: &Ast,
    id: NodeId,
    param_index: &HashMap<crate::symtab::SymbolId, u32>,
) -> Option<u32> {
    let node = ast.node(id);
    if node.op != Op::OADDR {
        return None;
    }
    let target = ast.node(node.payload.left?);
    if target.op != Op::ONAME {
        return None;
    }
    param_index.get(&target.payload.sym?).copied()
}

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

/// Runs escape analysis over every function in `funcs`, writing results
/// onto each `Func::param_escape` (§4.8: "Per-parameter escape
/// classification for every top-level function"). SCCs are visited callee
/// first via `tarjan_scc`, matching the ordering invariant in §4.8 ("a
/// function's result-escape tags must be finalized before any caller that
/// captures its return value is analyzed").
pub fn analyze_escapes(ast: &mut Ast, funcs: &[FuncId], call_targets: &HashMap<NodeId, FuncId>) {
    let sccs = tarjan_scc(funcs, |f| callees(ast, *f, call_targets));

    for scc in &sccs {
        // A cyclic SCC is analyzed to a local fixpoint before moving on,
        // since members may flow into each other's results.
        let mut changed = true;
        while changed {
            changed = false;
            for &func_id in scc {
                if apply_one_pass(ast, func_id) {
                    changed = true;
                }
            }
        }
    }

    propagate_closure_escapes(ast, funcs);
}

fn apply_one_pass(ast: &mut Ast, func_id: FuncId) -> bool {
    let sinks = param_sinks(ast, func_id);
    let mut changed = false;
    let param_count = ast.func(func_id).params.len();
    if ast.func(func_id).param_escape.len() != param_count {
        ast.func_mut(func_id).param_escape = vec![EscapeTag::DoesNotEscape; param_count];
    }
    for (param, edges) in sinks {
        let idx = param as usize;
        if idx >= param_count {
            continue;
        }
        let mut tag = ast.func(func_id).param_escape[idx];
        for sink in edges {
            let proposed = match sink {
                Sink::Result(depth) => EscapeTag::EscapesThroughReturn(depth),
                Sink::Heap => EscapeTag::EscapesToHeap,
            };
            let joined = join(tag, proposed);
            if joined != tag {
                tag = joined;
                changed = true;
            }
        }
        ast.func_mut(func_id).param_escape[idx] = tag;
    }
    changed
}

/// True when `closure_id`'s own value (not its address — closures are
/// already reference types, so the closure itself, not `&closure`, is what
/// a caller stores or returns) flows into one of the same sink shapes
/// `param_sinks` recognizes for addresses: returned, sent on a channel,
/// passed to an indirect call, or stored through an existing pointer.
fn closure_value_escapes(ast: &Ast, body: &[NodeId], closure_id: NodeId) -> bool {
    let mut stack: Vec<NodeId> = body.to_vec();
    while let Some(id) = stack.pop() {
        let node = ast.node(id);
        match node.op {
            Op::ORETURN | Op::OSEND | Op::OCALL => {
                if node.payload.list.contains(&closure_id) || node.payload.left == Some(closure_id)
                {
                    return true;
                }
            }
            Op::OAS | Op::OAS2 => {
                if node.payload.right == Some(closure_id) {
                    if let Some(target) = node.payload.list.first() {
                        if ast.node(*target).op == Op::OIND {
                            return true;
                        }
                    }
                }
            }
            _ => {}
        }
        stack.extend(node.payload.list.iter().copied());
        stack.extend(node.payload.rlist.iter().copied());
        stack.extend(node.payload.left);
        stack.extend(node.payload.right);
    }
    false
}

/// A closure whose own value escapes its defining function forces every
/// by-value capture to escape too (§4.8 Ordering invariants: "if a closure
/// itself escapes its defining function, its by-value captures must also
/// escape"). This is distinct from the closure's `result_escape` (its
/// *return values'* escape tags) — what matters here is whether the closure
/// value itself is returned, sent, or stored somewhere outliving the call.
fn propagate_closure_escapes(ast: &mut Ast, funcs: &[FuncId]) {
    for &func_id in funcs {
        let body = ast.func(func_id).body.clone();
        let mut stack = body.clone();
        let mut closures = Vec::new();
        while let Some(id) = stack.pop() {
            let node = ast.node(id);
            if node.op == Op::OCLOSURE {
                closures.push(id);
            }
            stack.extend(node.payload.list.iter().copied());
            stack.extend(node.payload.rlist.iter().copied());
            stack.extend(node.payload.left);
            stack.extend(node.payload.right);
        }

        for closure_id in closures {
            if !closure_value_escapes(ast, &body, closure_id) {
                continue;
            }
            let inner = match ast.node(closure_id).payload.func {
                Some(f) => f,
                None => continue,
            };
            if let Some(info) = ast.func_mut(inner).closure.as_mut() {
                for cap in info.captures.iter_mut() {
                    if !cap.by_reference {
                        cap.escape = EscapeTag::EscapesToHeap;
                    }
                }
            }
        }
    }
}
