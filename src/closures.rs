//! Closure capture analyzer (§4.6). Runs after type checking, before escape
//! analysis: for every closure discovered in `xtop`, decides by-value vs
//! by-reference capture for each free variable referenced in its body.

use std::collections::HashSet;

use crate::ast::{Ast, Capture, NodeId, Op};
use crate::symtab::SymbolId;

/// Decides capture mode for every closure reachable from `xtop` and records
/// it on each closure's `ClosureInfo::captures` list.
pub fn analyze_captures(ast: &mut Ast, xtop: &[NodeId]) {
    let mut i = 0;
    while i < xtop.len() {
        visit(ast, xtop[i]);
        i += 1;
    }
}

fn visit(ast: &mut Ast, id: NodeId) {
    let children = {
        let node = ast.node(id);
        let mut c = node.payload.list.clone();
        c.extend(node.payload.rlist.iter().copied());
        c.extend(node.payload.left);
        c.extend(node.payload.right);
        c
    };
    for child in &children {
        visit(ast, *child);
    }

    if ast.node(id).op != Op::OCLOSURE {
        return;
    }
    let func_id = match ast.node(id).payload.func {
        Some(f) => f,
        None => return,
    };

    let body = ast.func(func_id).body.clone();
    let free_vars = collect_free_reads_and_writes(ast, &body);

    let captures: Vec<Capture> = free_vars
        .into_iter()
        .map(|(name, addr_taken, written)| Capture {
            name,
            by_reference: addr_taken || written,
            escape: crate::ast::EscapeTag::DoesNotEscape,
        })
        .collect();

    if let Some(info) = ast.func_mut(func_id).closure.as_mut() {
        info.captures = captures;
    }
}

/// Walks `body`, returning every `ONAME` reference found along with whether
/// its address was taken (`OADDR` parent) or it was the target of an
/// assignment (`OAS` left-hand side) — the two conditions that force
/// by-reference capture (§4.6: "If the variable's address is not taken and
/// it is read-only in the closure, mark the capture as by-value").
fn collect_free_reads_and_writes(ast: &Ast, body: &[NodeId]) -> Vec<(SymbolId, bool, bool)> {
    let mut seen: HashSet<SymbolId> = HashSet::new();
    let mut result = Vec::new();
    let mut stack: Vec<(NodeId, bool, bool)> = body.iter().map(|id| (*id, false, false)).collect();

    while let Some((id, under_addr, under_assign_target)) = stack.pop() {
        let node = ast.node(id);
        if node.op == Op::ONAME {
            if let Some(sym) = node.payload.sym {
                if seen.insert(sym) {
                    result.push((sym, under_addr, under_assign_target));
                } else if under_addr || under_assign_target {
                    if let Some(entry) = result.iter_mut().find(|(s, _, _)| *s == sym) {
                        entry.1 |= under_addr;
                        entry.2 |= under_assign_target;
                    }
                }
            }
            continue;
        }

        let addr_here = node.op == Op::OADDR;
        let assign_here = node.op == Op::OAS || node.op == Op::OAS2;

        if let Some(left) = node.payload.left {
            stack.push((left, under_addr || addr_here, under_assign_target || assign_here));
        }
        if let Some(right) = node.payload.right {
            stack.push((right, under_addr, under_assign_target));
        }
        for item in &node.payload.list {
            // In an assignment, `list` holds the left-hand targets.
            stack.push((*item, under_addr, under_assign_target || assign_here));
        }
        for item in &node.payload.rlist {
            stack.push((*item, under_addr, under_assign_target));
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ClosureInfo, Func, Node, Payload};
    use crate::diag::Position;
    use crate::symtab::SymbolTable;

    fn dummy_pos() -> Position {
        Position::File {
            file: "x.go".into(),
            line: 1,
        }
    }

    #[test]
    fn read_only_capture_is_by_value() {
        let mut ast = Ast::new();
        let mut symtab = SymbolTable::bootstrap();
        let pkg = symtab.mkpkg("main");
        let x = symtab.lookup(pkg, "x");

        let mut read = Node::new(Op::ONAME, dummy_pos());
        read.payload = Payload {
            sym: Some(x),
            ..Payload::default()
        };
        let read_id = ast.alloc_node(read);

        let outer_func_id = ast.alloc_func(Func::new(crate::symtab::SymbolId(0)));
        let mut inner_func = Func::new(crate::symtab::SymbolId(1));
        inner_func.body.push(read_id);
        inner_func.closure = Some(ClosureInfo {
            outer: outer_func_id,
            captures: Vec::new(),
        });
        let inner_func_id = ast.alloc_func(inner_func);

        let mut closure_node = Node::new(Op::OCLOSURE, dummy_pos());
        closure_node.payload.func = Some(inner_func_id);
        let closure_id = ast.alloc_node(closure_node);

        analyze_captures(&mut ast, &[closure_id]);

        let captures = &ast.func(inner_func_id).closure.as_ref().unwrap().captures;
        assert_eq!(captures.len(), 1);
        assert_eq!(captures[0].name, x);
        assert!(!captures[0].by_reference);
    }

    #[test]
    fn assigned_capture_is_by_reference() {
        let mut ast = Ast::new();
        let mut symtab = SymbolTable::bootstrap();
        let pkg = symtab.mkpkg("main");
        let x = symtab.lookup(pkg, "x");

        let mut target = Node::new(Op::ONAME, dummy_pos());
        target.payload = Payload {
            sym: Some(x),
            ..Payload::default()
        };
        let target_id = ast.alloc_node(target);

        let mut value = Node::new(Op::OLITERAL, dummy_pos());
        value.payload = Payload::default();
        let value_id = ast.alloc_node(value);

        let mut assign = Node::new(Op::OAS, dummy_pos());
        assign.payload.list = vec![target_id];
        assign.payload.right = Some(value_id);
        let assign_id = ast.alloc_node(assign);

        let outer_func_id = ast.alloc_func(Func::new(crate::symtab::SymbolId(0)));
        let mut inner_func = Func::new(crate::symtab::SymbolId(1));
        inner_func.body.push(assign_id);
        inner_func.closure = Some(ClosureInfo {
            outer: outer_func_id,
            captures: Vec::new(),
        });
        let inner_func_id = ast.alloc_func(inner_func);

        let mut closure_node = Node::new(Op::OCLOSURE, dummy_pos());
        closure_node.payload.func = Some(inner_func_id);
        let closure_id = ast.alloc_node(closure_node);

        analyze_captures(&mut ast, &[closure_id]);

        let captures = &ast.func(inner_func_id).closure.as_ref().unwrap().captures;
        assert_eq!(captures.len(), 1);
        assert!(captures[0].by_reference);
    }

    #[test]
    fn address_taken_capture_is_by_reference() {
        let mut ast = Ast::new();
        let mut symtab = SymbolTable::bootstrap();
        let pkg = symtab.mkpkg("main");
        let x = symtab.lookup(pkg, "x");

        let mut name = Node::new(Op::ONAME, dummy_pos());
        name.payload = Payload {
            sym: Some(x),
            ..Payload::default()
        };
        let name_id = ast.alloc_node(name);

        let mut addr = Node::new(Op::OADDR, dummy_pos());
        addr.payload.left = Some(name_id);
        let addr_id = ast.alloc_node(addr);

        let outer_func_id = ast.alloc_func(Func::new(crate::symtab::SymbolId(0)));
        let mut inner_func = Func::new(crate::symtab::SymbolId(1));
        inner_func.body.push(addr_id);
        inner_func.closure = Some(ClosureInfo {
            outer: outer_func_id,
            captures: Vec::new(),
        });
        let inner_func_id = ast.alloc_func(inner_func);

        let mut closure_node = Node::new(Op::OCLOSURE, dummy_pos());
        closure_node.payload.func = Some(inner_func_id);
        let closure_id = ast.alloc_node(closure_node);

        analyze_captures(&mut ast, &[closure_id]);

        let captures = &ast.func(inner_func_id).closure.as_ref().unwrap().captures;
        assert!(captures[0].by_reference);
    }
}
