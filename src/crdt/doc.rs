//! The flat-array document model shared by the Yjs-family, RGA and Sync9
//! algorithms.
//!
//! A document is an ordered array of items plus a per-agent version vector.
//! Items are only ever *inserted*: deletion sets a tombstone bit, and an
//! item, once integrated, is never removed nor reordered. The visible
//! sequence is the subsequence of items that are not deleted and carry
//! content (Sync9 split markers have no content and are invisible anchors).
//!
//! The document is tagged with an [`Algorithm`] at construction; the tag
//! selects the local-insert generator and the integration kernel. Everything
//! else in this file (position lookup, hinted id lookup, tombstoning,
//! projection) is algorithm-independent.

use std::collections::HashMap;

use crate::crdt::merge;
use crate::crdt::primitives::AgentTable;
use crate::crdt::primitives::Id;
use crate::crdt::primitives::Version;
use crate::crdt::Algorithm;
use crate::crdt::ListCrdt;
use crate::crdt::{rga, sync9, yjs, yjs_mod};
use crate::error::{Error, Result};
use crate::wire::WireItem;

// =============================================================================
// Item
// =============================================================================

/// A single sequence element.
///
/// `origin_left` and `origin_right` record what the author observed next to
/// the insertion point at generation time; they are immutable and drive all
/// concurrency resolution. `origin_left` plays the role of a logical parent
/// in every algorithm (RGA literally calls it that), so the code here sticks
/// to the left-origin/parent vocabulary throughout.
#[derive(Clone, Debug)]
pub struct Item<T> {
    /// Payload. `None` marks a Sync9 split marker: a zero-width anchor that
    /// participates in traversal but never in visible content.
    pub content: Option<T>,
    /// Unique identifier `(agent, seq)`.
    pub id: Id,
    /// Id observed immediately to the left; absent = document start.
    pub origin_left: Option<Id>,
    /// Id observed immediately to the right; absent = document end.
    /// Yjs-family only.
    pub origin_right: Option<Id>,
    /// Lamport-like counter, strictly greater than every counter the author
    /// had observed. RGA only (`itemSeq` on the wire).
    pub lamport: u32,
    /// Whether the item attaches to its parent's "after" anchor rather than
    /// its "before" anchor. Sync9 only.
    pub insert_after: bool,
    /// Tombstone bit.
    pub deleted: bool,
}

impl<T> Item<T> {
    /// Visible items count toward positions and the document length.
    #[inline]
    pub fn visible(&self) -> bool {
        return !self.deleted && self.content.is_some();
    }
}

// =============================================================================
// Doc
// =============================================================================

/// A replicated list document backed by a flat item array.
///
/// Strictly single-threaded: every operation assumes exclusive access. Two
/// documents participating in a merge must both be held stable for the whole
/// merge.
#[derive(Clone, Debug)]
pub struct Doc<T> {
    algorithm: Algorithm,
    pub(crate) content: Vec<Item<T>>,
    pub(crate) version: Version,
    pub(crate) agents: AgentTable,
    /// Count of visible items. Maintained incrementally.
    length: usize,
    /// Highest `lamport` observed. RGA feeds its generator from this.
    max_lamport: u32,
}

impl<T> Doc<T> {
    /// Create an empty document using the given integration algorithm.
    pub fn new(algorithm: Algorithm) -> Doc<T> {
        return Doc {
            algorithm,
            content: Vec::new(),
            version: Version::new(),
            agents: AgentTable::new(),
            length: 0,
            max_lamport: 0,
        };
    }

    /// The algorithm this document was constructed with.
    pub fn algorithm(&self) -> Algorithm {
        return self.algorithm;
    }

    /// Visible length.
    pub fn len(&self) -> usize {
        return self.length;
    }

    pub fn is_empty(&self) -> bool {
        return self.length == 0;
    }

    /// Number of entries in the backing array, tombstones and split markers
    /// included. For profiling and tests.
    pub fn item_count(&self) -> usize {
        return self.content.len();
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Translate a visible position into a content-array index.
    ///
    /// Walks left to right, skipping deleted items and split markers. With
    /// `stick_end`, a position that lands exactly at a boundary adjacent to
    /// invisible items resolves to the first such index instead of skipping
    /// past them (Sync9's generator needs this to anchor before markers and
    /// tombstones rather than after them).
    ///
    /// `pos == len()` resolves to one past the last entry. Anything larger
    /// is an error.
    pub(crate) fn find_item_at_pos(&self, pos: usize, stick_end: bool) -> Result<usize> {
        let mut remaining = pos;
        for (i, item) in self.content.iter().enumerate() {
            if stick_end && remaining == 0 {
                return Ok(i);
            }
            if !item.visible() {
                continue;
            }
            if remaining == 0 {
                return Ok(i);
            }
            remaining -= 1;
        }
        if remaining == 0 {
            return Ok(self.content.len());
        }
        return Err(Error::PositionOutOfRange {
            pos,
            len: self.length,
        });
    }

    /// Find the content-array index of the item with this id.
    ///
    /// An absent needle resolves to `None`, conceptually "before position
    /// zero". A present needle that cannot be found is a hard error: origins
    /// are always integrated before the items that reference them, so a miss
    /// means corrupted input.
    ///
    /// The hint is an index guess (usually from the caller's own position
    /// scan); when it points at the right item the lookup is O(1), otherwise
    /// we fall back to a linear scan.
    pub(crate) fn find_item(&self, needle: Option<Id>, hint: Option<usize>) -> Result<Option<usize>> {
        let needle = match needle {
            Some(id) => id,
            None => return Ok(None),
        };

        if let Some(h) = hint {
            if let Some(item) = self.content.get(h) {
                if item.id == needle {
                    return Ok(Some(h));
                }
            }
        }

        match self.content.iter().position(|item| item.id == needle) {
            Some(idx) => return Ok(Some(idx)),
            None => {
                return Err(Error::NotFound {
                    agent: self.agents.name(needle.agent).to_string(),
                    seq: needle.seq,
                })
            }
        }
    }

    /// Id lookup for Sync9 anchors.
    ///
    /// With `at_end`, only an entry with real content matches: a split
    /// marker shares its item's id, and the "after" anchor belongs to the
    /// content-bearing clone, not the marker. Without `at_end` the first
    /// entry wins, which is the marker when the item has been split.
    pub(crate) fn find_anchor(
        &self,
        needle: Option<Id>,
        at_end: bool,
        hint: Option<usize>,
    ) -> Result<Option<usize>> {
        let needle = match needle {
            Some(id) => id,
            None => return Ok(None),
        };

        if let Some(h) = hint {
            if let Some(item) = self.content.get(h) {
                if item.id == needle && (!at_end || item.content.is_some()) {
                    return Ok(Some(h));
                }
            }
        }

        let found = self
            .content
            .iter()
            .position(|item| item.id == needle && (!at_end || item.content.is_some()));
        match found {
            Some(idx) => return Ok(Some(idx)),
            None => {
                return Err(Error::NotFound {
                    agent: self.agents.name(needle.agent).to_string(),
                    seq: needle.seq,
                })
            }
        }
    }

    /// The right-boundary index for a scan: the index of `origin_right`, or
    /// one past the end when absent.
    pub(crate) fn right_boundary(&self, origin_right: Option<Id>, hint: Option<usize>) -> Result<usize> {
        match self.find_item(origin_right, hint)? {
            Some(idx) => return Ok(idx),
            None => return Ok(self.content.len()),
        }
    }

    // =========================================================================
    // Local operations
    // =========================================================================

    /// Insert `value` at visible position `pos` as `agent`.
    ///
    /// Computes the origin fields for the document's algorithm and hands the
    /// finished item to the integration kernel; generators never splice into
    /// the array themselves.
    pub fn local_insert(&mut self, agent: &str, pos: usize, value: T) -> Result<()> {
        if pos > self.length {
            return Err(Error::PositionOutOfRange {
                pos,
                len: self.length,
            });
        }

        match self.algorithm {
            Algorithm::Sync9 => return sync9::local_insert(self, agent, pos, value),
            _ => {}
        }

        // Yjs-family generator (shared by strict Yjs, YjsMod and RGA): both
        // origins are the array neighbors of the insertion boundary, and RGA
        // additionally stamps a fresh Lamport counter.
        let i = self.find_item_at_pos(pos, false)?;
        let agent_idx = self.agents.get_or_insert(agent);
        let item = Item {
            content: Some(value),
            id: Id::new(agent_idx, self.version.next_seq(agent_idx)),
            origin_left: if i == 0 {
                None
            } else {
                Some(self.content[i - 1].id)
            },
            origin_right: self.content.get(i).map(|o| o.id),
            lamport: match self.algorithm {
                Algorithm::Rga => self.max_lamport + 1,
                _ => 0,
            },
            insert_after: false,
            deleted: false,
        };
        return self.integrate_item(item, Some(i));
    }

    /// Insert a run of values starting at `pos`. Each value becomes its own
    /// item with chained origins, exactly as if typed one by one.
    pub fn local_insert_all(&mut self, agent: &str, pos: usize, values: impl IntoIterator<Item = T>) -> Result<()> {
        for (k, value) in values.into_iter().enumerate() {
            self.local_insert(agent, pos + k, value)?;
        }
        return Ok(());
    }

    /// Mark the item at visible position `pos` deleted.
    ///
    /// Tombstones stay in the array to preserve causal references; only the
    /// visible length shrinks. Deletions are local-only: the merge driver
    /// refuses to ship them (see `merge`).
    pub fn local_delete(&mut self, _agent: &str, pos: usize) -> Result<()> {
        if pos >= self.length {
            return Err(Error::PositionOutOfRange {
                pos,
                len: self.length,
            });
        }
        let idx = self.find_item_at_pos(pos, false)?;
        self.content[idx].deleted = true;
        self.length -= 1;
        return Ok(());
    }

    // =========================================================================
    // Integration
    // =========================================================================

    /// Admit a foreign item in wire form.
    ///
    /// The caller is responsible for causal readiness (the merge driver
    /// checks it); a seq gap or replay fails with `CausalGap`, a dangling
    /// origin with `NotFound`.
    pub fn integrate(&mut self, item: WireItem<T>, hint: Option<usize>) -> Result<()> {
        let item = self.item_from_wire(item)?;
        return self.integrate_item(item, hint);
    }

    /// Kernel dispatch. The prelude shared by all kernels (seq validation,
    /// version bump) lives in `prelude`; each kernel calls it first.
    pub(crate) fn integrate_item(&mut self, item: Item<T>, hint: Option<usize>) -> Result<()> {
        match self.algorithm {
            Algorithm::Yjs => return yjs::integrate(self, item, hint),
            Algorithm::YjsMod => return yjs_mod::integrate(self, item, hint),
            Algorithm::Rga => return rga::integrate(self, item, hint),
            Algorithm::Sync9 => return sync9::integrate(self, item, hint),
        }
    }

    /// Validate that `id` is exactly the next seq expected from its agent
    /// (no gap, no replay), then bump the version.
    pub(crate) fn prelude(&mut self, id: Id) -> Result<()> {
        if !self.version.is_next(id) {
            return Err(Error::CausalGap {
                agent: self.agents.name(id.agent).to_string(),
                expected: self.version.next_seq(id.agent),
                got: id.seq,
            });
        }
        self.version.record(id);
        return Ok(());
    }

    /// Splice an integrated item into the array at `dest` and update the
    /// bookkeeping. The only place items enter `content`.
    pub(crate) fn splice(&mut self, dest: usize, item: Item<T>) {
        if item.visible() {
            self.length += 1;
        }
        self.max_lamport = self.max_lamport.max(item.lamport);
        self.content.insert(dest, item);
    }

    // =========================================================================
    // Projection and export
    // =========================================================================

    /// The visible content, in sequence order.
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        return self
            .content
            .iter()
            .filter(|item| item.visible())
            .map(|item| item.content.clone().unwrap())
            .collect();
    }

    /// The current per-agent last integrated seq.
    pub fn version(&self) -> HashMap<String, u32> {
        return self
            .version
            .iter_last()
            .map(|(idx, seq)| (self.agents.name(idx).to_string(), seq))
            .collect();
    }

    /// Every content-bearing item in wire form, in array order. Split
    /// markers are local artifacts and are skipped; integration recreates
    /// them where needed.
    pub fn items(&self) -> Vec<WireItem<T>>
    where
        T: Clone,
    {
        return self
            .content
            .iter()
            .filter(|item| item.content.is_some())
            .map(|item| self.item_to_wire(item))
            .collect();
    }

    pub(crate) fn item_to_wire(&self, item: &Item<T>) -> WireItem<T>
    where
        T: Clone,
    {
        let origin = |id: Option<Id>| {
            return id.map(|id| (self.agents.name(id.agent).to_string(), id.seq));
        };
        let left = origin(item.origin_left);
        let right = origin(item.origin_right);
        return WireItem {
            agent: self.agents.name(item.id.agent).to_string(),
            seq: item.id.seq,
            origin_left_agent: left.as_ref().map(|(a, _)| a.clone()),
            origin_left_seq: left.map(|(_, s)| s),
            origin_right_agent: right.as_ref().map(|(a, _)| a.clone()),
            origin_right_seq: right.map(|(_, s)| s),
            item_seq: match self.algorithm {
                Algorithm::Rga => Some(item.lamport),
                _ => None,
            },
            insert_after: match self.algorithm {
                Algorithm::Sync9 => Some(item.insert_after),
                _ => None,
            },
            content_present: item.content.is_some(),
            content: item.content.clone(),
            deleted: item.deleted,
        };
    }

    pub(crate) fn item_from_wire(&mut self, wire: WireItem<T>) -> Result<Item<T>> {
        let agent = self.agents.get_or_insert(&wire.agent);
        let origin_left = wire
            .origin_left()
            .map(|(name, seq)| Id::new(self.agents.get_or_insert(name), seq));
        let origin_right = wire
            .origin_right()
            .map(|(name, seq)| Id::new(self.agents.get_or_insert(name), seq));
        return Ok(Item {
            content: wire.content,
            id: Id::new(agent, wire.seq),
            origin_left,
            origin_right,
            lamport: wire.item_seq.unwrap_or(0),
            insert_after: wire.insert_after.unwrap_or(false),
            deleted: wire.deleted,
        });
    }
}

// =============================================================================
// Trait surface
// =============================================================================

impl<T: Clone> ListCrdt<T> for Doc<T> {
    fn local_insert(&mut self, agent: &str, pos: usize, value: T) -> Result<()> {
        return Doc::local_insert(self, agent, pos, value);
    }

    fn local_delete(&mut self, agent: &str, pos: usize) -> Result<()> {
        return Doc::local_delete(self, agent, pos);
    }

    fn merge_from(&mut self, src: &Self) -> Result<()> {
        return merge::merge_into(self, src);
    }

    fn to_vec(&self) -> Vec<T> {
        return Doc::to_vec(self);
    }

    fn len(&self) -> usize {
        return Doc::len(self);
    }

    fn version(&self) -> HashMap<String, u32> {
        return Doc::version(self);
    }
}
