//! Shared primitives for the list CRDT implementations.
//!
//! Every algorithm in this crate builds on the same three pieces:
//!
//! - `Id` / `AgentIdx`: compact item and agent identifiers
//! - `AgentTable`: interning table from agent names to indices
//! - `Version`: per-agent vector of integrated sequence numbers
//!
//! Agent order is significant (it breaks concurrency ties), and it is
//! defined on the *names*, not the interned indices. `AgentTable::cmp_names`
//! is the single place that comparison lives.

pub mod agent_table;
pub mod id;
pub mod version;

pub use agent_table::AgentTable;
pub use id::AgentIdx;
pub use id::Id;
pub use version::Version;
