//! Kahn topological sort with insertion-order tie breaking.
//!
//! Shared by the scheduler container and the render graph. Among all nodes
//! whose dependencies are satisfied, the one inserted first is emitted
//! first, so a graph without edges keeps its insertion order.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

/// The nodes that could not be ordered because they sit on (or behind) a
/// dependency cycle, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleError<K> {
    pub involved: Vec<K>,
}

impl<K: fmt::Debug> fmt::Display for CycleError<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dependency cycle detected among: {:?}", self.involved)
    }
}

impl<K: fmt::Debug> std::error::Error for CycleError<K> {}

/// Orders `nodes` so that for every `(before, after)` edge, `before` comes
/// first.
///
/// Edges that mention a node outside `nodes` are ignored; callers that care
/// about dangling edges report them before sorting.
pub fn topological_order<K>(
    nodes: &[K],
    edges: impl IntoIterator<Item = (K, K)>,
) -> Result<Vec<K>, CycleError<K>>
where
    K: Copy + Eq + Hash,
{
    let position: HashMap<K, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, node)| (*node, i))
        .collect();

    // dependents[i] = nodes that must wait for i
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    let mut in_degrees = vec![0usize; nodes.len()];
    let mut seen = HashSet::new();

    for (before, after) in edges {
        let (Some(&b), Some(&a)) = (position.get(&before), position.get(&after)) else {
            continue;
        };
        if seen.insert((b, a)) {
            dependents[b].push(a);
            in_degrees[a] += 1;
        }
    }

    let mut ready: BinaryHeap<Reverse<usize>> = in_degrees
        .iter()
        .enumerate()
        .filter(|&(_, &degree)| degree == 0)
        .map(|(i, _)| Reverse(i))
        .collect();

    let mut order = Vec::with_capacity(nodes.len());
    while let Some(Reverse(node)) = ready.pop() {
        order.push(nodes[node]);
        for &dependent in &dependents[node] {
            in_degrees[dependent] -= 1;
            if in_degrees[dependent] == 0 {
                ready.push(Reverse(dependent));
            }
        }
    }

    if order.len() == nodes.len() {
        Ok(order)
    } else {
        let involved = in_degrees
            .iter()
            .enumerate()
            .filter(|&(_, &remaining)| remaining > 0)
            .map(|(i, _)| nodes[i])
            .collect();
        Err(CycleError { involved })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_edges_keeps_insertion_order() {
        let order = topological_order(&[3, 1, 2], []).unwrap();
        assert_eq!(order, vec![3, 1, 2]);
    }

    #[test]
    fn linear_chain() {
        let order = topological_order(&[1, 2, 3], [(1, 2), (2, 3)]).unwrap();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn reversed_chain() {
        let order = topological_order(&[1, 2, 3], [(3, 2), (2, 1)]).unwrap();
        assert_eq!(order, vec![3, 2, 1]);
    }

    #[test]
    fn diamond_uses_insertion_order_for_ties() {
        let order = topological_order(&[1, 2, 3, 4], [(1, 2), (1, 3), (2, 4), (3, 4)]).unwrap();
        assert_eq!(order, vec![1, 2, 3, 4]);

        let order = topological_order(&[1, 3, 2, 4], [(1, 2), (1, 3), (2, 4), (3, 4)]).unwrap();
        assert_eq!(order, vec![1, 3, 2, 4]);
    }

    #[test]
    fn tie_break_prefers_earliest_ready_node() {
        // 4 only becomes ready after 1, but it was inserted before 2 and 3.
        let order = topological_order(&[1, 4, 2, 3], [(1, 4)]).unwrap();
        assert_eq!(order, vec![1, 4, 2, 3]);
    }

    #[test]
    fn cycle_reports_members() {
        let err = topological_order(&[1, 2, 3, 4], [(1, 2), (2, 3), (3, 1)]).unwrap_err();
        assert_eq!(err.involved, vec![1, 2, 3]);
    }

    #[test]
    fn downstream_of_cycle_is_reported() {
        let err = topological_order(&[1, 2, 3], [(1, 2), (2, 1), (2, 3)]).unwrap_err();
        assert_eq!(err.involved, vec![1, 2, 3]);
    }

    #[test]
    fn dangling_edges_are_ignored() {
        let order = topological_order(&[1, 2], [(9, 1), (2, 1)]).unwrap();
        assert_eq!(order, vec![2, 1]);
    }

    #[test]
    fn duplicate_edges_count_once() {
        let order = topological_order(&[1, 2], [(1, 2), (1, 2)]).unwrap();
        assert_eq!(order, vec![1, 2]);
    }
}
