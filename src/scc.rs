//! Tarjan's strongly-connected-components algorithm, generalized.
//!
//! Generic over any node type so the same `TarjanData`/`strongconnect` pair
//! backs two different call sites in this crate:
//!
//! - the import reader's cycle check (§4.3): nodes are package paths;
//! - the inliner's and escape analyzer's bottom-up call-graph traversal
//!   (§4.7, §4.8): nodes are function symbols.
//!
//! A single-node SCC with no self-loop is not a cycle: a node only forms its
//! own SCC when no back-edge re-enters it.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

struct TarjanData<N> {
    index: usize,
    indices: HashMap<N, usize>,
    lowlinks: HashMap<N, usize>,
    stack: Vec<N>,
    on_stack: HashSet<N>,
    sccs: Vec<Vec<N>>,
}

/// Returns the strongly-connected components of the graph described by
/// `nodes` and `successors`, in the order Tarjan's algorithm discovers them
/// (a valid reverse topological / bottom-up order: a component's successors
/// are always finished before the component itself).
pub fn tarjan_scc<N, F>(nodes: &[N], successors: F) -> Vec<Vec<N>>
where
    N: Eq + Hash + Clone,
    F: Fn(&N) -> Vec<N>,
{
    let mut data = TarjanData {
        index: 0,
        indices: HashMap::new(),
        lowlinks: HashMap::new(),
        stack: Vec::new(),
        on_stack: HashSet::new(),
        sccs: Vec::new(),
    };

    for node in nodes {
        if !data.indices.contains_key(node) {
            strongconnect(node, &successors, &mut data);
        }
    }

    data.sccs
}

fn strongconnect<N, F>(node: &N, successors: &F, data: &mut TarjanData<N>)
where
    N: Eq + Hash + Clone,
    F: Fn(&N) -> Vec<N>,
{
    data.indices.insert(node.clone(), data.index);
    data.lowlinks.insert(node.clone(), data.index);
    data.index += 1;
    data.stack.push(node.clone());
    data.on_stack.insert(node.clone());

    for w in successors(node) {
        if !data.indices.contains_key(&w) {
            strongconnect(&w, successors, data);
            let v_low = *data
                .lowlinks
                .get(node)
                .expect("tarjan: node lowlink must exist after init");
            let w_low = *data
                .lowlinks
                .get(&w)
                .expect("tarjan: successor lowlink must exist after recursion");
            data.lowlinks.insert(node.clone(), v_low.min(w_low));
        } else if data.on_stack.contains(&w) {
            let v_low = *data
                .lowlinks
                .get(node)
                .expect("tarjan: node lowlink must exist after init");
            let w_index = *data
                .indices
                .get(&w)
                .expect("tarjan: successor index must exist if visited");
            data.lowlinks.insert(node.clone(), v_low.min(w_index));
        }
    }

    let v_low = *data
        .lowlinks
        .get(node)
        .expect("tarjan: node lowlink must exist after init");
    let v_index = *data
        .indices
        .get(node)
        .expect("tarjan: node index must exist after init");

    if v_low == v_index {
        let mut scc = Vec::new();
        loop {
            let w = data
                .stack
                .pop()
                .expect("tarjan: stack must contain the node that was pushed");
            data.on_stack.remove(&w);
            let is_node = w == *node;
            scc.push(w);
            if is_node {
                break;
            }
        }
        data.sccs.push(scc);
    }
}

/// True when `scc` represents an actual cycle rather than a lone node: either
/// more than one member, or a single member with a self-edge.
pub fn is_cycle<N, F>(scc: &[N], successors: &F) -> bool
where
    N: Eq + Hash + Clone,
    F: Fn(&N) -> Vec<N>,
{
    match scc {
        [] => false,
        [only] => successors(only).contains(only),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as Map;

    fn graph(edges: &[(&str, &str)]) -> impl Fn(&&str) -> Vec<&'static str> {
        let mut adj: Map<&'static str, Vec<&'static str>> = Map::new();
        for (a, b) in edges {
            adj.entry(a).or_default().push(b);
        }
        move |n: &&str| adj.get(n).cloned().unwrap_or_default()
    }

    #[test]
    fn detects_simple_two_node_cycle() {
        let nodes = ["a", "b"];
        let succ = graph(&[("a", "b"), ("b", "a")]);
        let sccs = tarjan_scc(&nodes, |n| succ(&n));
        assert_eq!(sccs.len(), 1);
        assert_eq!(sccs[0].len(), 2);
    }

    #[test]
    fn acyclic_chain_has_no_multi_node_scc() {
        let nodes = ["a", "b", "c"];
        let succ = graph(&[("a", "b"), ("b", "c")]);
        let sccs = tarjan_scc(&nodes, |n| succ(&n));
        assert!(sccs.iter().all(|scc| scc.len() == 1));
    }

    #[test]
    fn bottom_up_order_places_callee_before_caller() {
        // a -> b -> c, non-recursive: c's SCC must be discovered (and thus
        // finished) before b's, and b's before a's.
        let nodes = ["a", "b", "c"];
        let succ = graph(&[("a", "b"), ("b", "c")]);
        let sccs = tarjan_scc(&nodes, |n| succ(&n));
        let pos = |name: &str| sccs.iter().position(|scc| scc.contains(&name)).unwrap();
        assert!(pos("c") < pos("b"));
        assert!(pos("b") < pos("a"));
    }

    #[test]
    fn self_loop_is_a_cycle_single_node_is_not() {
        let succ = graph(&[("a", "a")]);
        assert!(is_cycle(&["a"], &|n: &&str| succ(n)));
        let succ2 = graph(&[]);
        assert!(!is_cycle(&["a"], &|n: &&str| succ2(n)));
    }

    #[test]
    fn mutual_recursion_forms_one_scc() {
        let nodes = ["a", "b"];
        let succ = graph(&[("a", "b"), ("b", "a")]);
        let sccs = tarjan_scc(&nodes, |n| succ(&n));
        assert_eq!(sccs.len(), 1);
        assert!(is_cycle(&sccs[0], &|n: &&str| succ(n)));
    }
}
