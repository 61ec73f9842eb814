//! The language-independent item record.
//!
//! Documents exchange items in a flat record carrying the agent name rather
//! than a document-local index, so the same shape works across replicas (and
//! across implementations in other languages). There is no framing and no
//! binary format here; callers pick a serde format.
//!
//! `contentPresent` distinguishes a real payload from a Sync9 split marker.
//! Split markers are never shipped (each replica recreates them during
//! integration), but the flag keeps the record able to describe any item a
//! document can hold.

use serde::Deserialize;
use serde::Serialize;

/// A single item in wire form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireItem<T> {
    /// Authoring agent, by name.
    pub agent: String,
    /// Per-agent sequence number of this item.
    pub seq: u32,

    /// Id of the item observed immediately to the left at generation time.
    /// Absent = virtual document start.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_left_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_left_seq: Option<u32>,

    /// Id of the item observed immediately to the right at generation time.
    /// Absent = virtual document end. Yjs-family and Fugue only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_right_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_right_seq: Option<u32>,

    /// Lamport-like counter, strictly greater than everything the author
    /// had observed. RGA only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_seq: Option<u32>,

    /// Whether the item attaches to its parent's "after" anchor. Sync9 only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insert_after: Option<bool>,

    /// False for content-absent anchors (Sync9 split markers).
    pub content_present: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<T>,

    /// Local tombstone bit.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deleted: bool,
}

impl<T> WireItem<T> {
    /// A plain insert with both origins absent.
    pub fn insert(agent: &str, seq: u32, content: T) -> WireItem<T> {
        return WireItem {
            agent: agent.to_string(),
            seq,
            origin_left_agent: None,
            origin_left_seq: None,
            origin_right_agent: None,
            origin_right_seq: None,
            item_seq: None,
            insert_after: None,
            content_present: true,
            content: Some(content),
            deleted: false,
        };
    }

    /// Set the left origin.
    pub fn left(mut self, agent: &str, seq: u32) -> WireItem<T> {
        self.origin_left_agent = Some(agent.to_string());
        self.origin_left_seq = Some(seq);
        return self;
    }

    /// Set the right origin.
    pub fn right(mut self, agent: &str, seq: u32) -> WireItem<T> {
        self.origin_right_agent = Some(agent.to_string());
        self.origin_right_seq = Some(seq);
        return self;
    }

    /// Set the RGA Lamport counter.
    pub fn item_seq(mut self, item_seq: u32) -> WireItem<T> {
        self.item_seq = Some(item_seq);
        return self;
    }

    /// Set the Sync9 anchor flag.
    pub fn insert_after(mut self, after: bool) -> WireItem<T> {
        self.insert_after = Some(after);
        return self;
    }

    /// The left origin as a pair, if present.
    pub fn origin_left(&self) -> Option<(&str, u32)> {
        match (&self.origin_left_agent, self.origin_left_seq) {
            (Some(agent), Some(seq)) => return Some((agent, seq)),
            _ => return None,
        }
    }

    /// The right origin as a pair, if present.
    pub fn origin_right(&self) -> Option<(&str, u32)> {
        match (&self.origin_right_agent, self.origin_right_seq) {
            (Some(agent), Some(seq)) => return Some((agent, seq)),
            _ => return None,
        }
    }
}

/// Agent name to ship to an Automerge oracle.
///
/// This crate orders concurrent RGA siblings by *ascending* agent, upstream
/// Automerge by *descending*. Inverting each single-byte agent id before it
/// leaves the process makes the two orderings agree: agent `i` ships as the
/// byte `255 - i` rendered as two hex digits.
pub fn automerge_agent(i: u8) -> String {
    return format!("{:02x}", 255 - i);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_minimal() {
        let item = WireItem::insert("alice", 0, 'x');
        let json = serde_json::to_string(&item).unwrap();
        let back: WireItem<char> = serde_json::from_str(&json).unwrap();
        assert_eq!(item, back);
        // Absent fields stay off the wire entirely.
        assert!(!json.contains("originLeftAgent"));
        assert!(!json.contains("deleted"));
    }

    #[test]
    fn roundtrip_full() {
        let item = WireItem::insert("bob", 3, 'y')
            .left("alice", 7)
            .right("carol", 1)
            .item_seq(12)
            .insert_after(true);
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"originLeftAgent\":\"alice\""));
        assert!(json.contains("\"itemSeq\":12"));
        let back: WireItem<char> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.origin_left(), Some(("alice", 7)));
        assert_eq!(back.origin_right(), Some(("carol", 1)));
        assert_eq!(back.insert_after, Some(true));
    }

    #[test]
    fn automerge_agent_inverts_order() {
        // Ascending local agents come out descending, which is what an
        // agent-descending oracle needs to agree with us.
        let a = automerge_agent(0);
        let b = automerge_agent(1);
        assert_eq!(a, "ff");
        assert_eq!(b, "fe");
        assert!(a > b);
    }
}
