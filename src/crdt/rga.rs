//! RGA integration as shipped by Automerge.
//!
//! Only the left origin (the "parent") is used. Concurrent siblings under
//! the same parent are ordered by Lamport counter descending, then by agent
//! ascending. Upstream Automerge orders sibling agents *descending*; callers
//! comparing against it must invert shipped agent bytes (see
//! `wire::automerge_agent`).

use std::cmp::Ordering;

use crate::crdt::doc::{Doc, Item};
use crate::error::Result;

pub(crate) fn integrate<T>(doc: &mut Doc<T>, item: Item<T>, hint: Option<usize>) -> Result<()> {
    doc.prelude(item.id)?;

    let parent = doc.find_item(item.origin_left, hint.and_then(|h| h.checked_sub(1)))?;
    let mut dest = parent.map_or(0, |p| p + 1);

    while dest < doc.content.len() {
        let o = &doc.content[dest];

        // A higher counter than the cursor's always wins the spot, whatever
        // `o`'s parent turns out to be; skip the lookup entirely.
        if item.lamport > o.lamport {
            break;
        }

        let o_agent = o.id.agent;
        let o_left = o.origin_left;
        let o_lamport = o.lamport;

        let oparent = doc.find_item(o_left, None)?;
        if oparent < parent {
            break;
        }
        if oparent == parent
            && item.lamport == o_lamport
            && doc.agents.cmp_names(item.id.agent, o_agent) == Ordering::Less
        {
            break;
        }

        dest += 1;
    }

    doc.splice(dest, item);
    return Ok(());
}
