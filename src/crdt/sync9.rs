//! Sync9 integration: a parent/anchor tree flattened into the item array.
//!
//! Every item hangs off an anchor of its parent (`origin_left`): the
//! "after" anchor of a content entry, or the "before" anchor that comes
//! into existence when the parent is *split*. A split clones the parent as
//! a content-absent marker immediately before it; before-children live
//! between the marker and the content entry. Markers are purely local
//! artifacts: they are never shipped, and each replica recreates them when
//! an item first attaches to a before-anchor.
//!
//! The array is the depth-first flattening of this tree, so integration is
//! a sibling scan exactly like RGA's, with the anchor-aware id lookup
//! (`find_anchor`) standing in for the plain one.

use std::cmp::Ordering;

use crate::crdt::doc::{Doc, Item};
use crate::crdt::primitives::Id;
use crate::error::Result;

// =============================================================================
// Local insert
// =============================================================================

/// Generate a local insert at visible position `pos`.
///
/// Starting from the after-anchor of the left neighbor, walk forward across
/// entries hanging off the current anchor: descend to the before-anchor of
/// each child we must precede, and cross split markers into the
/// before-children they introduce. The walk ends at the anchor whose
/// sibling scan will land the new item exactly at `pos`.
pub(crate) fn local_insert<T>(doc: &mut Doc<T>, agent: &str, pos: usize, value: T) -> Result<()> {
    let i = doc.find_item_at_pos(pos, true)?;

    let mut parent: Option<Id> = if i == 0 {
        None
    } else {
        Some(doc.content[i - 1].id)
    };
    let mut insert_after = i != 0;
    let mut parent_at = i.checked_sub(1);

    for j in i..doc.content.len() {
        let o = &doc.content[j];
        if o.origin_left != parent || o.insert_after != insert_after {
            break;
        }
        // `o` hangs off our current anchor; target its before-anchor.
        parent = Some(o.id);
        insert_after = false;
        parent_at = Some(j);
        if o.content.is_some() {
            break;
        }
        // `o` was a split marker: keep walking through the before-children
        // of the item it belongs to.
    }

    let agent_idx = doc.agents.get_or_insert(agent);
    let item = Item {
        content: Some(value),
        id: Id::new(agent_idx, doc.version.next_seq(agent_idx)),
        origin_left: parent,
        origin_right: None,
        lamport: 0,
        insert_after,
        deleted: false,
    };
    return integrate(doc, item, parent_at);
}

// =============================================================================
// Integration
// =============================================================================

pub(crate) fn integrate<T>(doc: &mut Doc<T>, item: Item<T>, hint: Option<usize>) -> Result<()> {
    doc.prelude(item.id)?;

    let parent_idx = doc.find_anchor(item.origin_left, item.insert_after, hint)?;

    // Attaching to the before-anchor of an unsplit parent: split it. The
    // marker clones the parent's identity and origin so it occupies the
    // parent's spot in every future anchor scan, and the new item goes in
    // as the marker's only child.
    if !item.insert_after {
        if let Some(p) = parent_idx {
            if doc.content[p].content.is_some() {
                let marker = Item {
                    content: None,
                    id: doc.content[p].id,
                    origin_left: doc.content[p].origin_left,
                    origin_right: None,
                    lamport: doc.content[p].lamport,
                    insert_after: doc.content[p].insert_after,
                    deleted: false,
                };
                doc.splice(p, marker);
                doc.splice(p + 1, item);
                return Ok(());
            }
        }
    }

    // Sibling scan, RGA-style: entries attached to an earlier anchor end
    // the parent's child region; direct siblings tie-break on agent
    // ascending; anything deeper (a sibling's subtree) is skipped over.
    let mut dest = parent_idx.map_or(0, |p| p + 1);
    while dest < doc.content.len() {
        let o = &doc.content[dest];
        let o_agent = o.id.agent;
        let o_left = o.origin_left;
        let o_after = o.insert_after;

        let oparent = doc.find_anchor(o_left, o_after, None)?;
        if oparent < parent_idx {
            break;
        }
        if oparent == parent_idx
            && doc.agents.cmp_names(item.id.agent, o_agent) == Ordering::Less
        {
            break;
        }

        dest += 1;
    }

    doc.splice(dest, item);
    return Ok(());
}
