//! Error kinds for document operations.
//!
//! Every error here signals programmer error or corrupted input: an
//! out-of-order insert, a dangling origin reference, a position past the
//! end, or a merge input that is not causally consistent. None of them are
//! retried internally; the caller decides what to do with a poisoned
//! document.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A local or remote insert skipped a sequence number, replayed an old
    /// one, or referenced an origin outside the document's version.
    #[error("causal gap: expected seq {expected} for agent {agent:?}, got {got}")]
    CausalGap {
        agent: String,
        expected: u32,
        got: u32,
    },

    /// An id claimed to be integrated could not be found in the sequence.
    #[error("item not found: ({agent:?}, {seq})")]
    NotFound { agent: String, seq: u32 },

    /// A visible position past the end of the document.
    #[error("position {pos} out of range (visible length {len})")]
    PositionOutOfRange { pos: usize, len: usize },

    /// A merge pass placed zero items: the input set has a causal cycle or
    /// a missing dependency.
    #[error("merge stalled with {pending} items still pending")]
    MergeStall { pending: usize },

    /// The operation is a declared non-goal (currently: shipping deletes
    /// through a merge).
    #[error("unsupported operation: {0}")]
    UnsupportedOp(&'static str),
}
