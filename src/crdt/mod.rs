//! List CRDTs: five ways to merge concurrent edits to a shared sequence.
//!
//! Four algorithms (strict Yjs, YjsMod, RGA/Automerge, Sync9) share the
//! flat-array document in [`doc`]; Fugue keeps an explicit tree in
//! [`fugue`]. All five answer the same question (given a new insert whose
//! author observed certain neighbors, where in the merged sequence does it
//! belong so that every peer converges?) and differ only in how they order
//! concurrent inserts at the same spot.

pub mod doc;
pub mod fugue;
pub(crate) mod merge;
pub mod primitives;

mod rga;
mod sync9;
mod yjs;
mod yjs_mod;

use std::collections::HashMap;

use crate::error::Result;

/// The integration algorithm a flat document runs.
///
/// Selected once at construction; the tag picks both the local-insert
/// generator and the integration kernel. Fugue is not listed here because
/// it uses its own tree-backed document type, [`fugue::FugueDoc`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// Reference-compatible Yjs (YATA). Tolerates backward interleaving.
    Yjs,
    /// Yjs with the modified tie-break that also prevents backward
    /// interleaving.
    YjsMod,
    /// RGA as shipped by Automerge, with ascending agent tie-breaks (see
    /// `wire::automerge_agent` for the interop shim).
    Rga,
    /// Sync9: parent/anchor tree flattened into the item array with split
    /// markers.
    Sync9,
}

impl Algorithm {
    /// All flat-array algorithms, for tests and benches that sweep them.
    pub const ALL: [Algorithm; 4] = [
        Algorithm::Yjs,
        Algorithm::YjsMod,
        Algorithm::Rga,
        Algorithm::Sync9,
    ];
}

/// The operation surface shared by every list CRDT in this crate.
///
/// The merge operation must satisfy the CRDT laws:
/// - Commutative: `merge(A, B)` and `merge(B, A)` leave the same sequence
/// - Idempotent: merging the same document twice is a no-op
/// - Order-invariant: integrating the same causally-valid item set in any
///   topological order yields the same sequence
pub trait ListCrdt<T: Clone> {
    /// Insert `value` at visible position `pos` as `agent`.
    fn local_insert(&mut self, agent: &str, pos: usize, value: T) -> Result<()>;

    /// Tombstone the item at visible position `pos`.
    ///
    /// Deletions are local: the merge driver refuses to ship them.
    fn local_delete(&mut self, agent: &str, pos: usize) -> Result<()>;

    /// Import every item of `src` missing here, in causal order.
    fn merge_from(&mut self, src: &Self) -> Result<()>;

    /// The visible content, in sequence order.
    fn to_vec(&self) -> Vec<T>;

    /// Visible length.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        return self.len() == 0;
    }

    /// Per-agent last integrated sequence number.
    fn version(&self) -> HashMap<String, u32>;
}
