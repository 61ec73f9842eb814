//! The merge driver: import everything a source document has that the
//! destination lacks, in causal order.
//!
//! The driver is the same for every algorithm (only the integration kernel
//! differs), so it talks to documents through the small [`MergeDoc`] trait.
//! It repeatedly passes over the pending set, integrating each item whose
//! dependencies are satisfied; a pass that places nothing means the input
//! is not causally consistent, which is fatal.
//!
//! The final sequence does not depend on the order concurrent items happen
//! to be integrated in; that is each algorithm's convergence guarantee, and
//! the property tests hammer on it.

use crate::error::{Error, Result};
use crate::wire::WireItem;

/// What the driver needs from a document. Implemented by both the flat
/// [`Doc`](crate::Doc) and the tree-backed [`FugueDoc`](crate::FugueDoc).
pub(crate) trait MergeDoc<T: Clone> {
    /// Is `(agent, seq)` already integrated here?
    fn contains(&self, agent: &str, seq: u32) -> bool;

    /// The next sequence number expected from `agent`.
    fn next_seq_for(&self, agent: &str) -> u32;

    /// Every content-bearing item, in wire form. Sync9 split markers are
    /// tree-structure artifacts and are not exported; integration recreates
    /// them where needed.
    fn export_items(&self) -> Vec<WireItem<T>>;

    /// Hand one causally-ready item to the integration kernel.
    fn integrate_wire(&mut self, item: WireItem<T>, hint: Option<usize>) -> Result<()>;
}

/// Import into `dest` every item of `src` that `dest` has not integrated.
pub(crate) fn merge_into<T: Clone, D: MergeDoc<T>>(dest: &mut D, src: &D) -> Result<()> {
    let mut pending: Vec<WireItem<T>> = src
        .export_items()
        .into_iter()
        .filter(|item| !dest.contains(&item.agent, item.seq))
        .collect();

    // Deletions do not travel. An item the destination already has may
    // carry a tombstone on the source side (the source's local state, left
    // alone here), but importing a tombstoned item would smuggle the delete
    // across, so that input is rejected outright.
    if pending.iter().any(|item| item.deleted) {
        return Err(Error::UnsupportedOp("cannot merge a deletion"));
    }

    while !pending.is_empty() {
        let mut remaining = Vec::with_capacity(pending.len());
        let mut placed = 0usize;

        for item in pending {
            if can_insert_now(&item, dest) {
                dest.integrate_wire(item, None)?;
                placed += 1;
            } else {
                remaining.push(item);
            }
        }

        if placed == 0 {
            return Err(Error::MergeStall {
                pending: remaining.len(),
            });
        }
        pending = remaining;
    }

    return Ok(());
}

/// Causal readiness: the item is exactly the next one expected from its
/// agent (covers both "not yet present" and "previous seq integrated"), and
/// both origins are already in the destination's version.
fn can_insert_now<T: Clone>(item: &WireItem<T>, dest: &impl MergeDoc<T>) -> bool {
    if dest.next_seq_for(&item.agent) != item.seq {
        return false;
    }
    if let Some((agent, seq)) = item.origin_left() {
        if !dest.contains(agent, seq) {
            return false;
        }
    }
    if let Some((agent, seq)) = item.origin_right() {
        if !dest.contains(agent, seq) {
            return false;
        }
    }
    return true;
}

// =============================================================================
// Document impls
// =============================================================================

impl<T: Clone> MergeDoc<T> for crate::crdt::doc::Doc<T> {
    fn contains(&self, agent: &str, seq: u32) -> bool {
        match self.agents.get(agent) {
            Some(idx) => {
                return self
                    .version
                    .contains(crate::crdt::primitives::Id::new(idx, seq))
            }
            None => return false,
        }
    }

    fn next_seq_for(&self, agent: &str) -> u32 {
        match self.agents.get(agent) {
            Some(idx) => return self.version.next_seq(idx),
            None => return 0,
        }
    }

    fn export_items(&self) -> Vec<WireItem<T>> {
        return self.items();
    }

    fn integrate_wire(&mut self, item: WireItem<T>, hint: Option<usize>) -> Result<()> {
        return self.integrate(item, hint);
    }
}

impl<T: Clone> MergeDoc<T> for crate::crdt::fugue::FugueDoc<T> {
    fn contains(&self, agent: &str, seq: u32) -> bool {
        match self.agents.get(agent) {
            Some(idx) => {
                return self
                    .version
                    .contains(crate::crdt::primitives::Id::new(idx, seq))
            }
            None => return false,
        }
    }

    fn next_seq_for(&self, agent: &str) -> u32 {
        match self.agents.get(agent) {
            Some(idx) => return self.version.next_seq(idx),
            None => return 0,
        }
    }

    fn export_items(&self) -> Vec<WireItem<T>> {
        return self.save();
    }

    fn integrate_wire(&mut self, item: WireItem<T>, hint: Option<usize>) -> Result<()> {
        return self.integrate(item, hint);
    }
}

#[cfg(test)]
mod tests {
    use crate::crdt::Algorithm;
    use crate::crdt::ListCrdt;
    use crate::crdt::doc::Doc;

    fn doc(algorithm: Algorithm) -> Doc<char> {
        return Doc::new(algorithm);
    }

    #[test]
    fn merge_disjoint_documents() {
        for algorithm in Algorithm::ALL {
            let mut a = doc(algorithm);
            let mut b = doc(algorithm);
            a.local_insert_all("A", 0, "aa".chars()).unwrap();
            b.local_insert_all("B", 0, "bb".chars()).unwrap();

            let mut ab = a.clone();
            ab.merge_from(&b).unwrap();
            let mut ba = b.clone();
            ba.merge_from(&a).unwrap();

            assert_eq!(ab.to_vec(), ba.to_vec(), "{:?}", algorithm);
            assert_eq!(ab.len(), 4);
        }
    }

    #[test]
    fn merge_is_idempotent() {
        for algorithm in Algorithm::ALL {
            let mut a = doc(algorithm);
            let mut b = doc(algorithm);
            a.local_insert_all("A", 0, "abc".chars()).unwrap();
            b.local_insert_all("B", 0, "xyz".chars()).unwrap();

            a.merge_from(&b).unwrap();
            let once = a.to_vec();
            a.merge_from(&b).unwrap();
            assert_eq!(a.to_vec(), once, "{:?}", algorithm);
        }
    }

    #[test]
    fn merge_with_self_is_a_noop() {
        for algorithm in Algorithm::ALL {
            let mut a = doc(algorithm);
            a.local_insert_all("A", 0, "abc".chars()).unwrap();
            let before = a.to_vec();
            let snapshot = a.clone();
            a.merge_from(&snapshot).unwrap();
            assert_eq!(a.to_vec(), before, "{:?}", algorithm);
        }
    }

    #[test]
    fn merge_resolves_dependencies_across_passes() {
        // b's chain arrives interleaved with a's in export order; the
        // driver needs several passes regardless of how the items happen
        // to be ordered.
        let mut a = doc(Algorithm::YjsMod);
        let mut b = doc(Algorithm::YjsMod);
        a.local_insert_all("A", 0, "123".chars()).unwrap();
        b.merge_from(&a).unwrap();
        b.local_insert_all("B", 1, "xy".chars()).unwrap();
        b.local_insert("B", 0, 'z').unwrap();

        a.merge_from(&b).unwrap();
        let mut b2 = b.clone();
        b2.merge_from(&a).unwrap();
        assert_eq!(a.to_vec(), b2.to_vec());
    }

    #[test]
    fn merge_rejects_shipped_deletions() {
        let mut a = doc(Algorithm::YjsMod);
        let mut b = doc(Algorithm::YjsMod);
        b.local_insert_all("B", 0, "xyz".chars()).unwrap();
        b.local_delete("B", 1).unwrap();

        let err = a.merge_from(&b).unwrap_err();
        assert_eq!(
            err,
            crate::error::Error::UnsupportedOp("cannot merge a deletion")
        );
    }

    #[test]
    fn tombstones_on_shared_items_are_left_alone() {
        let mut a = doc(Algorithm::YjsMod);
        a.local_insert_all("A", 0, "abc".chars()).unwrap();
        let mut b = a.clone();
        b.local_delete("B", 1).unwrap();

        // a already has every item b would ship; the tombstone stays local.
        a.merge_from(&b).unwrap();
        assert_eq!(a.to_vec(), vec!['a', 'b', 'c']);
        assert_eq!(b.to_vec(), vec!['a', 'c']);
    }

    #[test]
    fn fugue_merge_converges() {
        use crate::crdt::fugue::FugueDoc;
        let mut a: FugueDoc<char> = FugueDoc::new();
        let mut b: FugueDoc<char> = FugueDoc::new();
        a.local_insert_all("A", 0, "aaa".chars()).unwrap();
        b.local_insert_all("B", 0, "bbb".chars()).unwrap();

        let mut ab = a.clone();
        ab.merge_from(&b).unwrap();
        let mut ba = b.clone();
        ba.merge_from(&a).unwrap();

        assert_eq!(ab.to_vec(), ba.to_vec());
        assert_eq!(ab.to_vec(), vec!['a', 'a', 'a', 'b', 'b', 'b']);
    }
}
