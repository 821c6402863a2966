//! Node pool and open list for the triangle A* search
//!

use navmesh_common::{NavLink, TriangleRef};
use std::cmp::Ordering;
use std::collections::HashMap;

/// State of a node in the search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Node is in the open list
    Open,
    /// Node has been expanded
    Closed,
}

/// Triangle reached by the search
#[derive(Debug, Clone)]
pub struct SearchNode {
    /// Triangle the node corresponds to
    pub triangle: TriangleRef,
    /// Index of the parent node in the pool
    pub parent: Option<usize>,
    /// Link of the parent triangle leading to this node
    pub via: Option<NavLink>,
    /// Cost from the start triangle
    pub g: f32,
    /// Total estimated cost (g + h)
    pub f: f32,
    pub state: NodeState,
}

/// Step of a route: leave `triangle` through `link`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteStep {
    pub triangle: TriangleRef,
    pub link: NavLink,
}

/// Node storage indexed by packed triangle key
#[derive(Debug, Default)]
pub struct NodePool {
    nodes: Vec<SearchNode>,
    lookup: HashMap<u64, usize>,
}

impl NodePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.lookup.clear();
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Finds the node of a triangle
    pub fn find(&self, triangle: TriangleRef) -> Option<usize> {
        self.lookup.get(&triangle.key()).copied()
    }

    /// Returns the node of a triangle, allocating an open one with infinite
    /// costs when the triangle was never reached
    pub fn get_or_insert(&mut self, triangle: TriangleRef) -> usize {
        let nodes = &mut self.nodes;
        *self.lookup.entry(triangle.key()).or_insert_with(|| {
            nodes.push(SearchNode {
                triangle,
                parent: None,
                via: None,
                g: f32::INFINITY,
                f: f32::INFINITY,
                state: NodeState::Open,
            });
            nodes.len() - 1
        })
    }

    pub fn node(&self, index: usize) -> &SearchNode {
        &self.nodes[index]
    }

    pub fn node_mut(&mut self, index: usize) -> &mut SearchNode {
        &mut self.nodes[index]
    }

    /// Walks the parents back to the start node and returns the steps in
    /// travel order
    pub fn route(&self, index: usize) -> Vec<RouteStep> {
        let mut steps = Vec::new();
        let mut current = index;
        while let (Some(parent), Some(link)) = (self.nodes[current].parent, self.nodes[current].via) {
            steps.push(RouteStep {
                triangle: self.nodes[parent].triangle,
                link,
            });
            current = parent;
        }
        steps.reverse();
        steps
    }
}

/// Open list entry; ordered so that `BinaryHeap` pops the lowest `f` first
#[derive(Debug, Clone, Copy)]
pub struct HeapNode {
    pub index: usize,
    pub f: f32,
}

impl PartialEq for HeapNode {
    fn eq(&self, other: &Self) -> bool {
        self.f == other.f
    }
}

impl Eq for HeapNode {}

impl PartialOrd for HeapNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapNode {
    fn cmp(&self, other: &Self) -> Ordering {
        other.f.total_cmp(&self.f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use navmesh_common::NavPolygonId;
    use std::collections::BinaryHeap;

    #[test]
    fn test_heap_pops_lowest_cost_first() {
        let mut heap = BinaryHeap::new();
        heap.push(HeapNode { index: 0, f: 3.0 });
        heap.push(HeapNode { index: 1, f: 1.0 });
        heap.push(HeapNode { index: 2, f: 2.0 });
        let order: Vec<usize> = std::iter::from_fn(|| heap.pop()).map(|n| n.index).collect();
        assert_eq!(order, vec![1, 2, 0]);
    }

    #[test]
    fn test_get_or_insert_reuses_nodes() {
        let mut pool = NodePool::new();
        let a = TriangleRef::new(NavPolygonId(1), 0);
        let b = TriangleRef::new(NavPolygonId(1), 1);
        let first = pool.get_or_insert(a);
        assert_eq!(pool.get_or_insert(b), 1);
        assert_eq!(pool.get_or_insert(a), first);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.find(b), Some(1));
        assert!(pool.node(first).g.is_infinite());

        pool.clear();
        assert!(pool.is_empty());
        assert_eq!(pool.find(a), None);
    }

    #[test]
    fn test_route_follows_parents() {
        let mut pool = NodePool::new();
        let refs: Vec<TriangleRef> = (0..3).map(|i| TriangleRef::new(NavPolygonId(1), i)).collect();
        let indices: Vec<usize> = refs.iter().map(|r| pool.get_or_insert(*r)).collect();
        for i in 1..3 {
            let node = pool.node_mut(indices[i]);
            node.parent = Some(indices[i - 1]);
            node.via = Some(NavLink::direct(0, refs[i], 1));
        }

        let route = pool.route(indices[2]);
        assert_eq!(route.len(), 2);
        assert_eq!(route[0].triangle, refs[0]);
        assert_eq!(route[0].link.target, refs[1]);
        assert_eq!(route[1].triangle, refs[1]);
        assert!(pool.route(indices[0]).is_empty());
    }
}
