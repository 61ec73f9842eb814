//! Fugue: the tree-backed sequence.
//!
//! Where the flat algorithms scan an array, Fugue keeps the tree explicit:
//! every item is a node with a parent and a side, and the visible sequence
//! is the in-order traversal (left children, self, right children). A new
//! node's parent and side follow from its origins alone, so every replica
//! derives the same tree:
//!
//! - no right origin: right child of the left origin (or of the root);
//! - right origin inside the left origin's subtree: left child of the
//!   right origin (the insert went *between* a node and its descendant);
//! - right origin elsewhere: right child of the left origin, keeping the
//!   right origin as an ordering key among siblings.
//!
//! Same-side siblings are concurrent inserts at the same anchor. Right
//! children order primarily by where their right origin sits in the current
//! sequence, farthest first (an absent right origin counts as farthest);
//! remaining ties, and left children generally, order by agent so that the
//! traversed sequence tie-breaks ascending. This makes the tree agree with
//! the YjsMod ordering on every scenario in the test suite.
//!
//! Subtree sizes are cached on every node, giving O(depth) position lookup
//! instead of a full traversal.

use std::collections::HashMap;

use rustc_hash::FxHashMap;

use crate::crdt::merge;
use crate::crdt::primitives::AgentIdx;
use crate::crdt::primitives::AgentTable;
use crate::crdt::primitives::Id;
use crate::crdt::primitives::Version;
use crate::crdt::ListCrdt;
use crate::error::{Error, Result};
use crate::wire::WireItem;

/// Arena index of the virtual root.
const ROOT: usize = 0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

// =============================================================================
// Node
// =============================================================================

#[derive(Clone, Debug)]
struct FugueNode<T> {
    id: Id,
    /// `None` only for the virtual root.
    content: Option<T>,
    deleted: bool,
    parent: usize,
    side: Side,
    origin_left: Option<Id>,
    origin_right: Option<Id>,
    /// Same-side sibling arrays, kept in traversal order.
    left_children: Vec<usize>,
    right_children: Vec<usize>,
    /// Visible nodes in this subtree, self included.
    size: usize,
}

impl<T> FugueNode<T> {
    #[inline]
    fn visible(&self) -> bool {
        return !self.deleted && self.content.is_some();
    }
}

// =============================================================================
// FugueDoc
// =============================================================================

/// A replicated list document backed by an explicit Fugue tree.
///
/// Nodes live in an arena in integration order, which is also a causal
/// order: a node is only ever integrated after both of its origins. `save`
/// leans on that to emit a stream `load` can replay directly.
#[derive(Clone, Debug)]
pub struct FugueDoc<T> {
    nodes: Vec<FugueNode<T>>,
    index: FxHashMap<Id, usize>,
    pub(crate) agents: AgentTable,
    pub(crate) version: Version,
}

impl<T> Default for FugueDoc<T> {
    fn default() -> Self {
        return Self::new();
    }
}

impl<T> FugueDoc<T> {
    /// Create an empty document.
    pub fn new() -> FugueDoc<T> {
        let root = FugueNode {
            id: Id::new(AgentIdx::NONE, 0),
            content: None,
            deleted: false,
            parent: ROOT,
            side: Side::Right,
            origin_left: None,
            origin_right: None,
            left_children: Vec::new(),
            right_children: Vec::new(),
            size: 0,
        };
        return FugueDoc {
            nodes: vec![root],
            index: FxHashMap::default(),
            agents: AgentTable::new(),
            version: Version::new(),
        };
    }

    /// Visible length.
    pub fn len(&self) -> usize {
        return self.nodes[ROOT].size;
    }

    pub fn is_empty(&self) -> bool {
        return self.len() == 0;
    }

    /// Total node count, tombstones included, root excluded.
    pub fn node_count(&self) -> usize {
        return self.nodes.len() - 1;
    }

    // =========================================================================
    // Tree navigation
    // =========================================================================

    /// The arena index of the node at visible position `pos`, found by
    /// descending the cached subtree sizes from the root.
    fn node_at_visible(&self, pos: usize) -> Result<usize> {
        if pos >= self.len() {
            return Err(Error::PositionOutOfRange {
                pos,
                len: self.len(),
            });
        }
        let mut n = ROOT;
        let mut pos = pos;
        'descend: loop {
            for &c in &self.nodes[n].left_children {
                if pos < self.nodes[c].size {
                    n = c;
                    continue 'descend;
                }
                pos -= self.nodes[c].size;
            }
            if self.nodes[n].visible() {
                if pos == 0 {
                    return Ok(n);
                }
                pos -= 1;
            }
            for &c in &self.nodes[n].right_children {
                if pos < self.nodes[c].size {
                    n = c;
                    continue 'descend;
                }
                pos -= self.nodes[c].size;
            }
            unreachable!("subtree sizes out of sync with tree");
        }
    }

    /// First node visited in the subtree rooted at `n`.
    fn leftmost_descendant(&self, mut n: usize) -> usize {
        while let Some(&c) = self.nodes[n].left_children.first() {
            n = c;
        }
        return n;
    }

    /// The node that follows `n`'s entire subtree in traversal order.
    fn next_non_descendant(&self, mut n: usize) -> Option<usize> {
        while n != ROOT {
            let p = self.nodes[n].parent;
            let parent = &self.nodes[p];
            match self.nodes[n].side {
                Side::Left => {
                    let k = parent.left_children.iter().position(|&c| c == n).unwrap();
                    if k + 1 < parent.left_children.len() {
                        return Some(self.leftmost_descendant(parent.left_children[k + 1]));
                    }
                    // After the last left child comes the parent itself.
                    return Some(p);
                }
                Side::Right => {
                    let k = parent.right_children.iter().position(|&c| c == n).unwrap();
                    if k + 1 < parent.right_children.len() {
                        return Some(self.leftmost_descendant(parent.right_children[k + 1]));
                    }
                    n = p;
                }
            }
        }
        return None;
    }

    fn is_ancestor(&self, a: usize, b: usize) -> bool {
        let mut cur = b;
        while cur != ROOT {
            cur = self.nodes[cur].parent;
            if cur == a {
                return true;
            }
        }
        return false;
    }

    /// The root-to-node step path: `(0, k)` = k-th left child, `(2, k)` =
    /// k-th right child. The self-position between the two sides is `(1, 0)`
    /// in `traversal_cmp`.
    fn path_from_root(&self, mut n: usize) -> Vec<(u8, usize)> {
        let mut steps = Vec::new();
        while n != ROOT {
            let p = self.nodes[n].parent;
            let parent = &self.nodes[p];
            let step = match self.nodes[n].side {
                Side::Left => (
                    0u8,
                    parent.left_children.iter().position(|&c| c == n).unwrap(),
                ),
                Side::Right => (
                    2u8,
                    parent.right_children.iter().position(|&c| c == n).unwrap(),
                ),
            };
            steps.push(step);
            n = p;
        }
        steps.reverse();
        return steps;
    }

    /// Compare two nodes' positions in the traversal. Sibling arrays only
    /// ever grow, and growth never reorders existing entries, so the result
    /// for two given nodes is stable over time and across replicas.
    fn traversal_cmp(&self, a: usize, b: usize) -> std::cmp::Ordering {
        use std::cmp::Ordering;
        if a == b {
            return Ordering::Equal;
        }
        let pa = self.path_from_root(a);
        let pb = self.path_from_root(b);
        let mut i = 0;
        loop {
            match (pa.get(i), pb.get(i)) {
                (Some(x), Some(y)) => {
                    if x != y {
                        return x.cmp(y);
                    }
                }
                // One path ended: that node is an ancestor of the other,
                // and sorts against the descendant by which side the
                // descendant hangs on.
                (None, Some(y)) => return (1u8, 0usize).cmp(y),
                (Some(x), None) => return x.cmp(&(1u8, 0usize)),
                (None, None) => unreachable!("distinct nodes cannot share a full path"),
            }
            i += 1;
        }
    }

    // =========================================================================
    // Sibling ordering
    // =========================================================================

    /// Does `a` precede `b` among right children of the same parent?
    fn right_sibling_precedes(&self, a: usize, b: usize) -> bool {
        use std::cmp::Ordering;
        match (self.nodes[a].origin_right, self.nodes[b].origin_right) {
            // An absent right origin anchors to the document end: farthest
            // right, so earliest among siblings.
            (None, Some(_)) => return true,
            (Some(_), None) => return false,
            (Some(x), Some(y)) if x != y => {
                let xi = self.index[&x];
                let yi = self.index[&y];
                return self.traversal_cmp(xi, yi) == Ordering::Greater;
            }
            _ => {}
        }
        // Same anchor: concurrent inserts at the same spot. Agent order
        // decides, ascending in the traversed sequence.
        match self
            .agents
            .cmp_names(self.nodes[a].id.agent, self.nodes[b].id.agent)
        {
            Ordering::Less => return true,
            Ordering::Greater => return false,
            Ordering::Equal => return self.nodes[a].id.seq > self.nodes[b].id.seq,
        }
    }

    /// Does `a` precede `b` among left children of the same parent?
    fn left_sibling_precedes(&self, a: usize, b: usize) -> bool {
        use std::cmp::Ordering;
        match self
            .agents
            .cmp_names(self.nodes[a].id.agent, self.nodes[b].id.agent)
        {
            Ordering::Less => return true,
            Ordering::Greater => return false,
            Ordering::Equal => return self.nodes[a].id.seq > self.nodes[b].id.seq,
        }
    }

    /// Insert a freshly created node into its parent's sibling array,
    /// keeping the array in traversal order.
    fn insert_child(&mut self, parent: usize, side: Side, new_idx: usize) {
        match side {
            Side::Right => {
                let len = self.nodes[parent].right_children.len();
                let mut k = 0;
                while k < len {
                    let sib = self.nodes[parent].right_children[k];
                    if self.right_sibling_precedes(new_idx, sib) {
                        break;
                    }
                    k += 1;
                }
                self.nodes[parent].right_children.insert(k, new_idx);
            }
            Side::Left => {
                let len = self.nodes[parent].left_children.len();
                let mut k = 0;
                while k < len {
                    let sib = self.nodes[parent].left_children[k];
                    if self.left_sibling_precedes(new_idx, sib) {
                        break;
                    }
                    k += 1;
                }
                self.nodes[parent].left_children.insert(k, new_idx);
            }
        }
    }

    fn adjust_sizes_up(&mut self, mut n: usize, delta: isize) {
        if delta == 0 {
            return;
        }
        loop {
            let node = &mut self.nodes[n];
            node.size = (node.size as isize + delta) as usize;
            if n == ROOT {
                return;
            }
            n = node.parent;
        }
    }

    // =========================================================================
    // Local operations
    // =========================================================================

    /// Insert `value` at visible position `pos` as `agent`.
    ///
    /// The left origin is the visible left neighbor. If that neighbor has
    /// right children, the new node must land immediately before the
    /// neighbor's successor, so the successor becomes the right origin (and
    /// the node its left child). Otherwise the new node extends the
    /// neighbor's right spine, and the right origin records whatever came
    /// next so concurrent siblings can be ordered against it.
    pub fn local_insert(&mut self, agent: &str, pos: usize, value: T) -> Result<()> {
        if pos > self.len() {
            return Err(Error::PositionOutOfRange {
                pos,
                len: self.len(),
            });
        }

        let left = if pos == 0 {
            ROOT
        } else {
            self.node_at_visible(pos - 1)?
        };
        let origin_left = if left == ROOT {
            None
        } else {
            Some(self.nodes[left].id)
        };
        let origin_right = if self.nodes[left].right_children.is_empty() {
            self.next_non_descendant(left).map(|n| self.nodes[n].id)
        } else {
            let first = self.nodes[left].right_children[0];
            Some(self.nodes[self.leftmost_descendant(first)].id)
        };

        let agent_idx = self.agents.get_or_insert(agent);
        let id = Id::new(agent_idx, self.version.next_seq(agent_idx));
        return self.integrate_node(id, origin_left, origin_right, Some(value), false);
    }

    /// Insert a run of values starting at `pos`, one item per value.
    pub fn local_insert_all(
        &mut self,
        agent: &str,
        pos: usize,
        values: impl IntoIterator<Item = T>,
    ) -> Result<()> {
        for (k, value) in values.into_iter().enumerate() {
            self.local_insert(agent, pos + k, value)?;
        }
        return Ok(());
    }

    /// Tombstone the node at visible position `pos`. The node stays in the
    /// tree; only the cached sizes shrink.
    pub fn local_delete(&mut self, _agent: &str, pos: usize) -> Result<()> {
        let n = self.node_at_visible(pos)?;
        self.nodes[n].deleted = true;
        self.adjust_sizes_up(n, -1);
        return Ok(());
    }

    // =========================================================================
    // Integration
    // =========================================================================

    /// Admit a foreign item in wire form.
    pub fn integrate(&mut self, wire: WireItem<T>, _hint: Option<usize>) -> Result<()> {
        let agent = self.agents.get_or_insert(&wire.agent);
        let id = Id::new(agent, wire.seq);
        let origin_left = wire
            .origin_left()
            .map(|(name, seq)| Id::new(self.agents.get_or_insert(name), seq));
        let origin_right = wire
            .origin_right()
            .map(|(name, seq)| Id::new(self.agents.get_or_insert(name), seq));
        return self.integrate_node(id, origin_left, origin_right, wire.content, wire.deleted);
    }

    fn resolve(&self, id: Option<Id>) -> Result<usize> {
        match id {
            None => return Ok(ROOT),
            Some(id) => match self.index.get(&id) {
                Some(&n) => return Ok(n),
                None => {
                    return Err(Error::NotFound {
                        agent: self.agents.name(id.agent).to_string(),
                        seq: id.seq,
                    })
                }
            },
        }
    }

    fn integrate_node(
        &mut self,
        id: Id,
        origin_left: Option<Id>,
        origin_right: Option<Id>,
        content: Option<T>,
        deleted: bool,
    ) -> Result<()> {
        if !self.version.is_next(id) {
            return Err(Error::CausalGap {
                agent: self.agents.name(id.agent).to_string(),
                expected: self.version.next_seq(id.agent),
                got: id.seq,
            });
        }
        self.version.record(id);

        let left = self.resolve(origin_left)?;
        let (parent, side) = match origin_right {
            None => (left, Side::Right),
            Some(r) => {
                let right = self.resolve(Some(r))?;
                if left == ROOT || self.is_ancestor(left, right) {
                    // The insert went between a node and its descendant:
                    // slot in as a left child of the descendant.
                    (right, Side::Left)
                } else {
                    (left, Side::Right)
                }
            }
        };

        let visible = !deleted && content.is_some();
        let node = FugueNode {
            id,
            content,
            deleted,
            parent,
            side,
            origin_left,
            origin_right,
            left_children: Vec::new(),
            right_children: Vec::new(),
            size: if visible { 1 } else { 0 },
        };
        let idx = self.nodes.len();
        self.nodes.push(node);
        self.index.insert(id, idx);
        self.insert_child(parent, side, idx);
        if visible {
            self.adjust_sizes_up(parent, 1);
        }
        return Ok(());
    }

    // =========================================================================
    // Projection and export
    // =========================================================================

    /// The visible content, by in-order traversal.
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        enum Frame {
            Enter(usize),
            Emit(usize),
        }
        let mut out = Vec::with_capacity(self.len());
        let mut stack = vec![Frame::Enter(ROOT)];
        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Enter(n) => {
                    let node = &self.nodes[n];
                    for &c in node.right_children.iter().rev() {
                        stack.push(Frame::Enter(c));
                    }
                    stack.push(Frame::Emit(n));
                    for &c in node.left_children.iter().rev() {
                        stack.push(Frame::Enter(c));
                    }
                }
                Frame::Emit(n) => {
                    let node = &self.nodes[n];
                    if node.visible() {
                        out.push(node.content.clone().unwrap());
                    }
                }
            }
        }
        return out;
    }

    /// The current per-agent last integrated seq.
    pub fn version(&self) -> HashMap<String, u32> {
        return self
            .version
            .iter_last()
            .map(|(idx, seq)| (self.agents.name(idx).to_string(), seq))
            .collect();
    }

    fn node_to_wire(&self, node: &FugueNode<T>) -> WireItem<T>
    where
        T: Clone,
    {
        let origin = |id: Option<Id>| {
            return id.map(|id| (self.agents.name(id.agent).to_string(), id.seq));
        };
        let left = origin(node.origin_left);
        let right = origin(node.origin_right);
        return WireItem {
            agent: self.agents.name(node.id.agent).to_string(),
            seq: node.id.seq,
            origin_left_agent: left.as_ref().map(|(a, _)| a.clone()),
            origin_left_seq: left.map(|(_, s)| s),
            origin_right_agent: right.as_ref().map(|(a, _)| a.clone()),
            origin_right_seq: right.map(|(_, s)| s),
            item_seq: None,
            insert_after: None,
            content_present: node.content.is_some(),
            content: node.content.clone(),
            deleted: node.deleted,
        };
    }

    /// Every node in wire form, in integration order.
    ///
    /// Integration order is causal by construction (both origins of a node
    /// are integrated before it) and per-agent seqs appear in order, so
    /// the stream satisfies the topological requirement `load` depends on:
    /// by the time a node is re-inserted, its right origin already has a
    /// position to compare against.
    pub fn save(&self) -> Vec<WireItem<T>>
    where
        T: Clone,
    {
        return self
            .nodes
            .iter()
            .skip(1)
            .map(|node| self.node_to_wire(node))
            .collect();
    }

    /// Rebuild a document from a `save` stream.
    pub fn load(items: impl IntoIterator<Item = WireItem<T>>) -> Result<FugueDoc<T>> {
        let mut doc = FugueDoc::new();
        for item in items {
            doc.integrate(item, None)?;
        }
        return Ok(doc);
    }
}

// =============================================================================
// Trait surface
// =============================================================================

impl<T: Clone> ListCrdt<T> for FugueDoc<T> {
    fn local_insert(&mut self, agent: &str, pos: usize, value: T) -> Result<()> {
        return FugueDoc::local_insert(self, agent, pos, value);
    }

    fn local_delete(&mut self, agent: &str, pos: usize) -> Result<()> {
        return FugueDoc::local_delete(self, agent, pos);
    }

    fn merge_from(&mut self, src: &Self) -> Result<()> {
        return merge::merge_into(self, src);
    }

    fn to_vec(&self) -> Vec<T> {
        return FugueDoc::to_vec(self);
    }

    fn len(&self) -> usize {
        return FugueDoc::len(self);
    }

    fn version(&self) -> HashMap<String, u32> {
        return FugueDoc::version(self);
    }
}
