//! AFL fuzz harness for the list CRDTs.
//!
//! Byte-steered version of the convergence driver: three replicas of one
//! algorithm, random inserts and broadcasts, with the critical invariant
//! checked after every full sync: replicas that have seen the same items
//! must project the same sequence.
//!
//! Build with `cargo afl build --features fuzzing` and run under
//! `cargo afl fuzz`.

use afl::fuzz;

use converge::{Algorithm, Doc, FugueDoc, ListCrdt};

const NUM_PEERS: usize = 3;
const AGENTS: [&str; NUM_PEERS] = ["a0", "a1", "a2"];

#[derive(Debug, Clone, Copy)]
enum FuzzOp {
    /// A peer inserts one value into its own replica.
    Insert { peer: u8, pos_frac: u8 },
    /// One peer receives a broadcast from another.
    Broadcast { from: u8, to: u8 },
    /// Everyone syncs with everyone; replicas must converge.
    FullSync,
}

impl FuzzOp {
    fn from_bytes(bytes: &[u8]) -> Option<(FuzzOp, &[u8])> {
        if bytes.is_empty() {
            return None;
        }
        let op_type = bytes[0] % 3;
        let rest = &bytes[1..];
        match op_type {
            0 if rest.len() >= 2 => {
                let op = FuzzOp::Insert {
                    peer: rest[0] % NUM_PEERS as u8,
                    pos_frac: rest[1],
                };
                return Some((op, &rest[2..]));
            }
            1 if rest.len() >= 2 => {
                let op = FuzzOp::Broadcast {
                    from: rest[0] % NUM_PEERS as u8,
                    to: rest[1] % NUM_PEERS as u8,
                };
                return Some((op, &rest[2..]));
            }
            2 => return Some((FuzzOp::FullSync, rest)),
            _ => return None,
        }
    }
}

fn drive<D: ListCrdt<u32> + Clone>(make: impl Fn() -> D, mut data: &[u8]) {
    let mut replicas: Vec<D> = (0..NUM_PEERS).map(|_| make()).collect();
    let mut counter = 0u32;

    while let Some((op, rest)) = FuzzOp::from_bytes(data) {
        data = rest;
        match op {
            FuzzOp::Insert { peer, pos_frac } => {
                let replica = &mut replicas[peer as usize];
                let len = replica.len();
                let pos = if len == 0 {
                    0
                } else {
                    (pos_frac as usize * len / 256).min(len)
                };
                counter += 1;
                replica
                    .local_insert(AGENTS[peer as usize], pos, counter)
                    .unwrap();
            }
            FuzzOp::Broadcast { from, to } => {
                if from != to {
                    let source = replicas[from as usize].clone();
                    replicas[to as usize].merge_from(&source).unwrap();
                }
            }
            FuzzOp::FullSync => {
                full_sync(&mut replicas);
            }
        }
    }

    full_sync(&mut replicas);

    for replica in &replicas {
        assert_eq!(replica.to_vec().len(), replica.len(), "length out of sync");
    }
}

fn full_sync<D: ListCrdt<u32> + Clone>(replicas: &mut [D]) {
    for i in 0..replicas.len() {
        for j in 0..replicas.len() {
            if i != j {
                let source = replicas[j].clone();
                replicas[i].merge_from(&source).unwrap();
            }
        }
    }
    let first = replicas[0].to_vec();
    for (i, replica) in replicas.iter().enumerate().skip(1) {
        assert_eq!(
            replica.to_vec(),
            first,
            "convergence failure: replica {} disagrees with replica 0",
            i
        );
    }
}

fn main() {
    fuzz!(|data: &[u8]| {
        if data.is_empty() {
            return;
        }
        // First byte picks the algorithm under test.
        let rest = &data[1..];
        match data[0] % 5 {
            0 => drive(|| Doc::<u32>::new(Algorithm::Yjs), rest),
            1 => drive(|| Doc::<u32>::new(Algorithm::YjsMod), rest),
            2 => drive(|| Doc::<u32>::new(Algorithm::Rga), rest),
            3 => drive(|| Doc::<u32>::new(Algorithm::Sync9), rest),
            _ => drive(FugueDoc::<u32>::new, rest),
        }
    });
}
