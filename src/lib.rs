//! Converge: reference implementations of collaborative list CRDTs.
//!
//! Five algorithms that let peers edit a shared sequence independently and
//! still end up with the same document: strict Yjs (YATA), YjsMod,
//! RGA/Automerge, Sync9, and Fugue. The interesting part of each is the
//! *integration* routine (given a new insert whose author observed certain
//! neighbors, where does it go so that every peer converges?), and this
//! crate keeps those routines small, explicit, and heavily cross-tested.
//!
//! Four algorithms share a flat-array document ([`Doc`], tagged with an
//! [`Algorithm`] at construction); Fugue maintains an explicit tree
//! ([`FugueDoc`]). All five expose the same surface through [`ListCrdt`].
//!
//! # Example
//!
//! ```
//! use converge::{Algorithm, Doc, ListCrdt};
//!
//! let mut alice: Doc<char> = Doc::new(Algorithm::YjsMod);
//! let mut bob: Doc<char> = Doc::new(Algorithm::YjsMod);
//!
//! alice.local_insert_all("alice", 0, "hey".chars()).unwrap();
//! bob.local_insert_all("bob", 0, "yo".chars()).unwrap();
//!
//! alice.merge_from(&bob).unwrap();
//! bob.merge_from(&alice).unwrap();
//!
//! // Both peers converge on the same sequence.
//! assert_eq!(alice.to_vec(), bob.to_vec());
//! ```
//!
//! Not a production system: documents grow monotonically (tombstones are
//! never collected), lookups are linear where a production implementation
//! would use an order-statistics tree, and shipping deletions through a
//! merge is deliberately unsupported.

pub mod crdt;
pub mod error;
pub mod wire;

pub use crdt::doc::Doc;
pub use crdt::doc::Item;
pub use crdt::fugue::FugueDoc;
pub use crdt::Algorithm;
pub use crdt::ListCrdt;
pub use error::Error;
pub use error::Result;
pub use wire::WireItem;
