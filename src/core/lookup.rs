//! The packed cluster index: one disjoint tree forest shared by a whole
//! group of radius levels.
//!
//! Every element owns a leaf node. When an element is the center of a
//! cluster, the forest records, per cluster slot, the interval of levels on
//! which it is the root; elements assigned to a cluster hang below that
//! cluster's root. A chain of same-element internal nodes encodes that one
//! element roots clusters on several level intervals at once, so a single
//! split or merge of the chain updates the whole group.
//!
//! All nodes live in an arena and refer to each other through [`NodeId`]
//! handles; parent, child and sibling links are `Option<NodeId>`, which keeps
//! the cyclic shape of the forest out of the ownership story entirely.

use std::mem;

/// A half-open interval `[begin, end)` of levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Span {
    pub begin: u32,
    pub end: u32,
}

impl Span {
    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    pub fn contains(&self, level: u32) -> bool {
        self.begin <= level && level < self.end
    }
}

/// Handle of a node in the forest arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NodeId(u32);

#[derive(Debug)]
struct Node {
    /// Per cluster slot, the levels on which this node roots that cluster.
    spans: Vec<Span>,
    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    prev: Option<NodeId>,
    next: Option<NodeId>,
    /// In a leaf, the element itself; in an internal node, the center whose
    /// clusters the node represents.
    element: u32,
    /// Whether `element` is the center of any cluster through this node.
    marked: bool,
    /// Smallest level on which this node roots a cluster.
    lowest: u32,
    /// Cluster slot of that smallest level.
    lowest_k: u32,
}

/// The forest indexing a packed group of `nb_levels` radius levels with up to
/// `k` clusters each, over elements `0..range`.
#[derive(Debug)]
pub struct LookupForest {
    nodes: Vec<Node>,
    free: Vec<NodeId>,
    /// Root node of each `(level, slot)` cluster, row-major by level.
    table: Vec<Option<NodeId>>,
    /// Leaf node of each element, if present.
    leaves: Vec<Option<NodeId>>,
    /// Computed per-element level intervals, one span per cluster slot.
    clusters: Vec<Vec<Span>>,
    /// `leftovers[l]` holds the elements whose first placement was level `l`;
    /// the extra bucket at `nb_levels` holds elements placed on no level.
    leftovers: Vec<Vec<u32>>,
    leftover_ptr: Vec<(u32, u32)>,
    k: usize,
    nb_levels: usize,
}

impl LookupForest {
    pub fn new(k: usize, nb_levels: usize, range: usize) -> Self {
        LookupForest {
            nodes: Vec::new(),
            free: Vec::new(),
            table: vec![None; k * nb_levels],
            leaves: vec![None; range],
            clusters: vec![Vec::new(); range],
            leftovers: vec![Vec::new(); nb_levels + 1],
            leftover_ptr: vec![(0, 0); range],
            k,
            nb_levels,
        }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn nb_levels(&self) -> usize {
        self.nb_levels
    }

    pub fn has_element(&self, element: u32) -> bool {
        self.leaves[element as usize].is_some()
    }

    pub fn is_marked(&self, element: u32) -> bool {
        let leaf = self.leaves[element as usize].expect("element has no leaf");
        self.node(leaf).marked
    }

    /// The center element of the cluster rooted at `(level, slot)`, if the
    /// slot is occupied.
    pub fn root_element(&self, level: usize, slot: usize) -> Option<u32> {
        self.table[self.cell(level, slot)].map(|id| self.node(id).element)
    }

    /// Number of occupied cluster slots on `level`, scanning from slot 0 to
    /// the first empty one.
    pub fn nb_clusters(&self, level: usize) -> usize {
        (0..self.k)
            .take_while(|&slot| self.table[self.cell(level, slot)].is_some())
            .count()
    }

    /// The highest level whose leftovers bucket is non-empty, which is also
    /// the smallest level on which every present element sits in a cluster.
    /// `Some(nb_levels)` means some element fit nowhere; `None` means the
    /// forest is empty.
    pub fn smallest_valid_level(&self) -> Option<usize> {
        self.leftovers.iter().rposition(|bucket| !bucket.is_empty())
    }

    /// The cluster slot of `element` on `level` according to its computed
    /// interval list, or `k` when the element has no cluster there.
    pub fn cluster_of(&self, level: usize, element: u32) -> usize {
        self.clusters[element as usize]
            .iter()
            .position(|span| span.contains(level as u32))
            .unwrap_or(self.k)
    }

    /// All elements whose leaves sit below the cluster root at
    /// `(level, slot)`, the center included.
    pub fn cluster_members(&self, level: usize, slot: usize, out: &mut Vec<u32>) {
        if let Some(root) = self.table[self.cell(level, slot)] {
            self.collect_leaves(root, out);
        }
    }

    /// Creates the leaf of a brand-new element.
    pub fn create_leaf(&mut self, element: u32) {
        debug_assert!(self.leaves[element as usize].is_none());
        let leaf = self.alloc_node(element);
        self.leaves[element as usize] = Some(leaf);
        self.clusters[element as usize] = vec![Span::default(); self.k];
    }

    /// Adds `element` to the cluster at `(level, slot)`, creating the cluster
    /// when the slot is empty. `slot == k` is the overflow case and a no-op.
    pub fn connect(&mut self, element: u32, level: usize, slot: usize) {
        if slot == self.k {
            return;
        }
        let leaf = self.leaves[element as usize].expect("element has no leaf");
        if !self.node(leaf).marked {
            self.add_leftover(element, level);
        }
        match self.table[self.cell(level, slot)] {
            None => self.add_root_ptr(leaf, level, slot),
            Some(root) => {
                let root = if self.is_leaf(root) || self.node(root).lowest < level as u32 {
                    self.split_node(root, level as u32, slot)
                } else {
                    root
                };
                self.graft(root, leaf);
            }
        }
    }

    /// Records `element` as placed on no level of the group.
    pub fn add_highest_leftover(&mut self, element: u32) {
        self.add_leftover(element, self.nb_levels);
    }

    /// Fills in the element's per-level interval list from its leaf and the
    /// chain of ancestors above it.
    pub fn compute_clusters(&mut self, element: u32) {
        let leaf = self.leaves[element as usize].expect("element has no leaf");
        let mut list = mem::take(&mut self.clusters[element as usize]);
        list.copy_from_slice(&self.node(leaf).spans);
        let mut current = self.node(leaf).parent;
        while let Some(node) = current {
            let node = self.node(node);
            merge_spans_second(&node.spans, &mut list, node.lowest_k as usize);
            current = node.parent;
        }
        self.clusters[element as usize] = list;
    }

    /// Removes `element` from the forest.
    ///
    /// For an element that was never a center this is a local unlink and
    /// `out` stays empty. For a center, every cluster it transitively roots
    /// is torn down and `out` receives the elements that must be re-inserted;
    /// returns whether that happened.
    pub fn remove(&mut self, element: u32, out: &mut Vec<u32>) -> bool {
        out.clear();
        let leaf = self.leaves[element as usize].expect("element has no leaf");
        if !self.node(leaf).marked {
            self.remove_unmarked(leaf);
            false
        } else {
            self.remove_marked(leaf, out);
            true
        }
    }

    // -- arena plumbing -------------------------------------------------

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }

    fn cell(&self, level: usize, slot: usize) -> usize {
        level * self.k + slot
    }

    fn is_leaf(&self, id: NodeId) -> bool {
        self.node(id).first_child.is_none()
    }

    fn alloc_node(&mut self, element: u32) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                let node = self.node_mut(id);
                node.element = element;
                id
            }
            None => {
                let id = NodeId(self.nodes.len() as u32);
                self.nodes.push(Node {
                    spans: vec![Span::default(); self.k],
                    parent: None,
                    first_child: None,
                    prev: None,
                    next: None,
                    element,
                    marked: false,
                    lowest: 0,
                    lowest_k: 0,
                });
                id
            }
        }
    }

    fn free_node(&mut self, id: NodeId) {
        self.reset_node(id);
        self.free.push(id);
    }

    /// Returns `id` to its freshly-allocated state, keeping its element.
    fn reset_node(&mut self, id: NodeId) {
        let node = self.node_mut(id);
        node.spans.fill(Span::default());
        node.parent = None;
        node.first_child = None;
        node.prev = None;
        node.next = None;
        node.marked = false;
        node.lowest = 0;
        node.lowest_k = 0;
    }

    // -- sibling list surgery -------------------------------------------

    fn unlink_child(&mut self, child: NodeId) {
        let (parent, prev, next) = {
            let node = self.node(child);
            (node.parent, node.prev, node.next)
        };
        let Some(parent) = parent else { return };
        match prev {
            None => self.node_mut(parent).first_child = next,
            Some(prev) => self.node_mut(prev).next = next,
        }
        if let Some(next) = next {
            self.node_mut(next).prev = prev;
        }
        let node = self.node_mut(child);
        node.parent = None;
        node.prev = None;
        node.next = None;
    }

    /// Prepends `child` to `parent`'s children, so the chain-closing last
    /// child stays last.
    fn graft(&mut self, parent: NodeId, child: NodeId) {
        let head = self.node(parent).first_child.expect("graft onto a leaf");
        self.node_mut(child).parent = Some(parent);
        self.node_mut(child).next = Some(head);
        self.node_mut(head).prev = Some(child);
        self.node_mut(parent).first_child = Some(child);
    }

    fn has_single_child(&self, id: NodeId) -> bool {
        match self.node(id).first_child {
            Some(child) => self.node(child).next.is_none(),
            None => false,
        }
    }

    // -- table maintenance ----------------------------------------------

    /// Points every table cell covered by `id`'s spans at `id`.
    fn update_table(&mut self, id: NodeId) {
        for slot in 0..self.k {
            let span = self.node(id).spans[slot];
            for level in span.begin..span.end {
                let cell = self.cell(level as usize, slot);
                self.table[cell] = Some(id);
            }
        }
    }

    /// Clears every table cell covered by `id`'s spans.
    fn remove_table_ptrs(&mut self, id: NodeId) {
        for slot in 0..self.k {
            let span = self.node(id).spans[slot];
            for level in span.begin..span.end {
                let cell = self.cell(level as usize, slot);
                self.table[cell] = None;
            }
        }
    }

    /// Makes `id` the root of the cluster at `(level, slot)` and extends its
    /// span there.
    fn add_root_ptr(&mut self, id: NodeId, level: usize, slot: usize) {
        let cell = self.cell(level, slot);
        self.table[cell] = Some(id);
        let node = self.node_mut(id);
        if !node.marked {
            node.lowest = level as u32;
            node.lowest_k = slot as u32;
            node.marked = true;
        }
        if node.spans[slot].end == 0 {
            node.spans[slot].begin = level as u32;
        }
        node.spans[slot].end = level as u32 + 1;
    }

    // -- split and merge ------------------------------------------------

    /// Splits `node` at `(level, slot)`: a new parent takes the levels from
    /// `level` upward on `slot` plus all earlier slots, `node` keeps the
    /// rest, and the new parent takes `node`'s place among its siblings.
    fn split_node(&mut self, node: NodeId, level: u32, slot: usize) -> NodeId {
        let element = self.node(node).element;
        let parent = self.alloc_node(element);
        let (old_parent, prev, next) = {
            let n = self.node(node);
            (n.parent, n.prev, n.next)
        };
        if let Some(old_parent) = old_parent {
            match prev {
                None => self.node_mut(old_parent).first_child = Some(parent),
                Some(prev) => {
                    self.node_mut(prev).next = Some(parent);
                    self.node_mut(parent).prev = Some(prev);
                }
            }
            if let Some(next) = next {
                self.node_mut(next).prev = Some(parent);
                self.node_mut(parent).next = Some(next);
            }
        }
        {
            let n = self.node_mut(node);
            n.parent = Some(parent);
            n.prev = None;
            n.next = None;
        }
        {
            let p = self.node_mut(parent);
            p.parent = old_parent;
            p.first_child = Some(node);
            p.marked = true;
            p.lowest = level;
            p.lowest_k = slot as u32;
        }
        let mut lower = mem::take(&mut self.node_mut(node).spans);
        let mut upper = mem::take(&mut self.node_mut(parent).spans);
        split_spans(&mut lower, &mut upper, level, slot);
        self.node_mut(node).spans = lower;
        self.node_mut(parent).spans = upper;
        self.update_table(parent);
        parent
    }

    /// Fuses a node that is down to a single child with that child; the
    /// child inherits the union of the two span lists and the node's place in
    /// the forest.
    fn merge_unary(&mut self, node: NodeId) -> NodeId {
        let child = self.node(node).first_child.expect("merge of a leaf");
        debug_assert!(self.node(child).next.is_none());
        let slot = self.node(node).lowest_k as usize;
        let mut merged = mem::take(&mut self.node_mut(node).spans);
        let child_spans = mem::take(&mut self.node_mut(child).spans);
        merge_spans_first(&mut merged, &child_spans, slot);
        self.node_mut(node).spans = child_spans;
        self.node_mut(child).spans = merged;

        let (parent, prev, next) = {
            let n = self.node(node);
            (n.parent, n.prev, n.next)
        };
        {
            let c = self.node_mut(child);
            c.parent = parent;
            c.prev = prev;
            c.next = next;
            c.marked = true;
        }
        if let Some(parent) = parent {
            match prev {
                None => self.node_mut(parent).first_child = Some(child),
                Some(prev) => self.node_mut(prev).next = Some(child),
            }
            if let Some(next) = next {
                self.node_mut(next).prev = Some(child);
            }
        }
        self.update_table(child);
        self.free_node(node);
        child
    }

    // -- leftovers ------------------------------------------------------

    fn add_leftover(&mut self, element: u32, level: usize) {
        let bucket = &mut self.leftovers[level];
        self.leftover_ptr[element as usize] = (level as u32, bucket.len() as u32);
        bucket.push(element);
    }

    fn remove_leftover(&mut self, element: u32) {
        let (level, pos) = self.leftover_ptr[element as usize];
        let bucket = &mut self.leftovers[level as usize];
        bucket.swap_remove(pos as usize);
        if let Some(&moved) = bucket.get(pos as usize) {
            self.leftover_ptr[moved as usize] = (level, pos);
        }
    }

    // -- removal --------------------------------------------------------

    fn remove_unmarked(&mut self, leaf: NodeId) {
        let parent = self.node(leaf).parent;
        if let Some(parent) = parent {
            self.unlink_child(leaf);
            if self.has_single_child(parent) {
                self.merge_unary(parent);
            }
        }
        let element = self.node(leaf).element;
        self.remove_leftover(element);
        self.drop_leaf(element);
    }

    fn remove_marked(&mut self, leaf: NodeId, out: &mut Vec<u32>) {
        let element = self.node(leaf).element;
        let mut list = self.node(leaf).spans.clone();
        if let Some(parent) = self.node(leaf).parent {
            if self.node(parent).element == element {
                self.recluster(parent, element, &mut list);
            }
        }
        let mut lowest = self.nb_levels;
        for slot in 0..self.k {
            if !list[slot].is_empty() {
                lowest = list[slot].begin as usize;
                for level in (list[slot].begin..list[slot].end).rev() {
                    self.extract_clusters_level(level as usize, slot, out);
                }
            }
        }
        self.remove_leftovers_from(lowest, out);
        let pos = out
            .iter()
            .position(|&e| e == element)
            .expect("deleted center must be among the extracted leaves");
        out.swap_remove(pos);
        self.drop_leaf(element);
    }

    fn drop_leaf(&mut self, element: u32) {
        let leaf = self.leaves[element as usize]
            .take()
            .expect("element has no leaf");
        self.clusters[element as usize] = Vec::new();
        self.free_node(leaf);
    }

    /// Accumulates into `list` the clusters rooted by the same-element chain
    /// starting at `node`, then stretches the lowest occupied slot to the top
    /// of the group: everything the chain roots above its recorded spans is
    /// reached through it as well.
    fn recluster(&mut self, node: NodeId, element: u32, list: &mut [Span]) {
        let mut current = Some(node);
        while let Some(id) = current {
            let n = self.node(id);
            if n.element != element {
                break;
            }
            merge_spans_second(&n.spans, list, n.lowest_k as usize);
            current = n.parent;
        }
        if let Some(slot) = list.iter().position(|span| !span.is_empty()) {
            list[slot].end = self.nb_levels as u32;
        }
    }

    /// Tears down the subtree rooted at `id`. Internal nodes are freed;
    /// leaves are reset in place (their handle survives re-insertion) and
    /// their elements pushed to `out`.
    fn extract_tree(&mut self, id: NodeId, out: &mut Vec<u32>) {
        if self.node(id).marked {
            self.remove_table_ptrs(id);
        }
        if self.is_leaf(id) {
            let element = self.node(id).element;
            self.reset_node(id);
            out.push(element);
            self.remove_leftover(element);
            return;
        }
        while let Some(child) = self.node(id).first_child {
            self.node_mut(id).first_child = self.node(child).next;
            self.extract_tree(child, out);
        }
        self.free_node(id);
    }

    /// Detaches the whole same-element chain above `node` from the rest of
    /// the forest and extracts it.
    fn extract_chain(&mut self, mut node: NodeId, out: &mut Vec<u32>) {
        let element = self.node(node).element;
        while let Some(parent) = self.node(node).parent {
            if self.node(parent).element != element {
                break;
            }
            node = parent;
        }
        if let Some(parent) = self.node(node).parent {
            self.unlink_child(node);
            if self.has_single_child(parent) {
                self.merge_unary(parent);
            }
        }
        self.extract_tree(node, out);
    }

    /// Extracts every cluster at `(level, slot..k)`.
    fn extract_clusters_level(&mut self, level: usize, slot: usize, out: &mut Vec<u32>) {
        for slot in slot..self.k {
            if let Some(root) = self.table[self.cell(level, slot)] {
                self.extract_chain(root, out);
            }
        }
    }

    /// Drains the leftovers buckets of every level from `level` upward; those
    /// elements were placed through clusters that no longer exist.
    fn remove_leftovers_from(&mut self, level: usize, out: &mut Vec<u32>) {
        for bucket in level..=self.nb_levels {
            while let Some(&element) = self.leftovers[bucket].first() {
                let leaf = self.leaves[element as usize].expect("leftover has no leaf");
                self.extract_chain(leaf, out);
            }
        }
    }

    fn collect_leaves(&self, id: NodeId, out: &mut Vec<u32>) {
        if self.is_leaf(id) {
            out.push(self.node(id).element);
            return;
        }
        let mut child = self.node(id).first_child;
        while let Some(c) = child {
            self.collect_leaves(c, out);
            child = self.node(c).next;
        }
    }
}

/// Cuts `old` at `(level, slot)`: `new` receives the levels from `level`
/// upward on `slot` plus every earlier slot, `old` keeps the rest.
fn split_spans(old: &mut [Span], new: &mut [Span], level: u32, slot: usize) {
    for span in new[slot + 1..].iter_mut() {
        *span = Span::default();
    }
    for (n, o) in new[..slot].iter_mut().zip(old[..slot].iter_mut()) {
        *n = *o;
        *o = Span::default();
    }
    new[slot] = Span {
        begin: level,
        end: old[slot].end,
    };
    old[slot].end = level;
}

/// Merges the later-levels list `second` into `first` at the cut `slot`;
/// `first` ends up with the union.
fn merge_spans_first(first: &mut [Span], second: &[Span], slot: usize) {
    first[slot].begin = second[slot].begin;
    first[slot + 1..].copy_from_slice(&second[slot + 1..]);
}

/// Merges the earlier-levels list `first` into `second` at the cut `slot`;
/// `second` ends up with the union.
fn merge_spans_second(first: &[Span], second: &mut [Span], slot: usize) {
    second[slot].end = first[slot].end;
    second[..slot].copy_from_slice(&first[..slot]);
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Walks every tree in the forest and checks the structural invariants:
    /// internal nodes have at least two children, the last child of a node
    /// shares its element, parent/sibling links agree, and span lists are
    /// well-formed.
    fn assert_shape(forest: &LookupForest) {
        let mut seen = Vec::new();
        for level in 0..forest.nb_levels {
            for slot in 0..forest.k {
                if let Some(root) = forest.table[forest.cell(level, slot)] {
                    if !seen.contains(&root) {
                        seen.push(root);
                        assert_subtree(forest, root);
                    }
                }
            }
        }
    }

    fn assert_subtree(forest: &LookupForest, id: NodeId) {
        let node = forest.node(id);
        for span in &node.spans {
            assert!(span.begin <= span.end);
            assert!(span.end as usize <= forest.nb_levels);
        }
        let Some(first) = node.first_child else { return };
        assert!(forest.node(first).prev.is_none());
        let mut count = 0;
        let mut child = Some(first);
        let mut last = first;
        while let Some(c) = child {
            assert_eq!(forest.node(c).parent, Some(id));
            if let Some(next) = forest.node(c).next {
                assert_eq!(forest.node(next).prev, Some(c));
            }
            assert_subtree(forest, c);
            last = c;
            count += 1;
            child = forest.node(c).next;
        }
        assert!(count >= 2, "internal node with a single child");
        assert_eq!(
            forest.node(last).element,
            node.element,
            "last child must share the node's element"
        );
    }

    #[test]
    fn test_first_cluster() {
        let mut forest = LookupForest::new(2, 3, 8);
        forest.create_leaf(0);
        forest.connect(0, 0, 0);
        assert!(forest.has_element(0));
        assert!(forest.is_marked(0));
        assert_eq!(forest.root_element(0, 0), Some(0));
        assert_eq!(forest.nb_clusters(0), 1);
        assert_eq!(forest.smallest_valid_level(), Some(0));
        assert_shape(&forest);
    }

    #[test]
    fn test_join_splits_leaf_root() {
        let mut forest = LookupForest::new(2, 3, 8);
        forest.create_leaf(0);
        // Element 0 roots cluster 0 on all three levels.
        for level in 0..3 {
            forest.connect(0, level, 0);
        }
        forest.compute_clusters(0);
        forest.create_leaf(1);
        forest.connect(1, 1, 0);
        forest.compute_clusters(1);
        assert_shape(&forest);

        // Joining at level 1 split element 0's chain there: levels 1 and 2
        // now resolve through an internal node whose element is still 0.
        assert_eq!(forest.root_element(1, 0), Some(0));
        assert_eq!(forest.root_element(2, 0), Some(0));
        assert_eq!(forest.cluster_of(0, 0), 0);
        assert_eq!(forest.cluster_of(1, 1), 0);
        assert_eq!(forest.cluster_of(2, 1), 0);
    }

    #[test]
    fn test_remove_unmarked_merges_chain() {
        let mut forest = LookupForest::new(2, 3, 8);
        forest.create_leaf(0);
        for level in 0..3 {
            forest.connect(0, level, 0);
        }
        forest.create_leaf(1);
        forest.connect(1, 1, 0);
        let mut out = Vec::new();
        assert!(!forest.remove(1, &mut out));
        assert!(out.is_empty());
        assert!(!forest.has_element(1));
        // The transiently unary split parent was fused back.
        assert_shape(&forest);
        assert_eq!(forest.root_element(0, 0), Some(0));
        assert_eq!(forest.root_element(2, 0), Some(0));
        assert_eq!(forest.smallest_valid_level(), Some(0));
    }

    #[test]
    fn test_remove_marked_returns_reinsertions() {
        let mut forest = LookupForest::new(2, 3, 8);
        forest.create_leaf(0);
        for level in 0..3 {
            forest.connect(0, level, 0);
        }
        forest.compute_clusters(0);
        forest.create_leaf(1);
        forest.connect(1, 0, 1);
        forest.connect(1, 1, 0);
        forest.compute_clusters(1);
        forest.create_leaf(2);
        forest.connect(2, 2, 0);
        forest.compute_clusters(2);
        assert_shape(&forest);

        // Deleting center 0 must hand back everything it transitively held.
        let mut out = Vec::new();
        assert!(forest.remove(0, &mut out));
        out.sort_unstable();
        assert_eq!(out, vec![1, 2]);
        assert!(!forest.has_element(0));
        // Survivors keep their leaves and can be re-inserted.
        assert!(forest.has_element(1));
        assert!(forest.has_element(2));
        assert!(!forest.is_marked(1));
        assert_eq!(forest.nb_clusters(0), 0);
        assert_eq!(forest.nb_clusters(1), 0);
        assert_eq!(forest.smallest_valid_level(), None);
    }

    #[test]
    fn test_highest_leftovers() {
        let mut forest = LookupForest::new(1, 2, 4);
        forest.create_leaf(0);
        forest.add_highest_leftover(0);
        assert_eq!(forest.smallest_valid_level(), Some(2));
        let mut out = Vec::new();
        assert!(!forest.is_marked(0));
        forest.remove(0, &mut out);
        assert_eq!(forest.smallest_valid_level(), None);
    }
}
