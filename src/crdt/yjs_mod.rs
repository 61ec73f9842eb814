//! YjsMod integration: dual-origin placement with a modified tie-break.
//!
//! The scan walks right from the left origin looking for the spot where the
//! new item belongs. `scanning` freezes the destination while we look ahead
//! past items that might still end up after us; it flips off again the
//! moment we learn they do not. Compared to strict Yjs, the tie-break below
//! also keeps *backward*-typed runs contiguous across peers.

use std::cmp::Ordering;

use crate::crdt::doc::{Doc, Item};
use crate::error::Result;

pub(crate) fn integrate<T>(doc: &mut Doc<T>, item: Item<T>, hint: Option<usize>) -> Result<()> {
    doc.prelude(item.id)?;

    let left = doc.find_item(item.origin_left, hint.and_then(|h| h.checked_sub(1)))?;
    let right = doc.right_boundary(item.origin_right, hint)?;

    let mut dest = left.map_or(0, |l| l + 1);
    let mut scanning = false;
    let mut i = dest;

    loop {
        if !scanning {
            dest = i;
        }
        if i == doc.content.len() || i == right {
            break;
        }

        let o = &doc.content[i];
        let o_agent = o.id.agent;
        let o_left = o.origin_left;
        let o_right = o.origin_right;

        let oleft = doc.find_item(o_left, None)?;
        let oright = doc.right_boundary(o_right, None)?;

        // The new item goes before `o` when `o` hangs off an earlier left
        // origin, or when it is a direct sibling (both origins equal) that
        // loses the agent tie.
        if oleft < left
            || (oleft == left
                && oright == right
                && doc.agents.cmp_names(item.id.agent, o_agent) == Ordering::Less)
        {
            break;
        }
        // Among siblings, a smaller right origin means `o` may still sort
        // after us: freeze the destination and keep looking.
        if oleft == left {
            scanning = oright < right;
        }

        i += 1;
    }

    doc.splice(dest, item);
    return Ok(());
}
