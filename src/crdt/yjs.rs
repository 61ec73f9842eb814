//! Strict Yjs (YATA) integration, bit-compatible with upstream.
//!
//! Same scan structure as `yjs_mod`, different tie-break: agents are
//! compared *first* in the same-left-origin branch. This reproduces
//! upstream Yjs exactly, including its known tolerance of interleaving for
//! backward-typed runs (the `withTails2` divergence); that behavior is kept
//! on purpose for compatibility.

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

        if oleft < left {
            break;
        } else if oleft == left {
            // Upstream resolves the conflict on agents before looking at
            // right origins.
            if doc.agents.cmp_names(item.id.agent, o_agent) == Ordering::Greater {
                scanning = false;
            } else {
                let oright = doc.right_boundary(o_right, None)?;
                if oright == right {
                    break;
                } else {
                    scanning = true;
                }
            }
        }

        i += 1;
    }

    doc.splice(dest, item);
    return Ok(());
}
