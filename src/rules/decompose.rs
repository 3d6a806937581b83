//! Winning-shape decomposition over a 34-kind counts array: standard four
//! melds plus a pair, seven pairs, and thirteen orphans. Multiset-based;
//! tile order never matters here.

use crate::engine::models::{Tile, TILE_KINDS};

pub type Counts = [u8; TILE_KINDS];

/// Ordinals of the thirteen terminal and honor kinds.
const ORPHANS: [usize; 13] = [0, 8, 9, 17, 18, 26, 27, 28, 29, 30, 31, 32, 33];

pub fn counts_of(tiles: &[Tile]) -> Counts {
    let mut counts = [0u8; TILE_KINDS];
    for tile in tiles {
        counts[tile.ordinal()] += 1;
    }
    counts
}

/// A meld by ordinal: a triplet of one kind, or a sequence starting at the
/// given kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Meld {
    Triplet(usize),
    Sequence(usize),
}

/// One way to read 14 tiles as four melds plus a pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decomposition {
    pub pair: usize,
    pub melds: Vec<Meld>,
}

/// Sequences exist only inside a number suit and start at rank 7 or below.
fn sequence_starts_at(ordinal: usize) -> bool {
    ordinal < 27 && ordinal % 9 <= 6
}

/// Enumerates every standard decomposition. Melds are always consumed from
/// the lowest remaining kind, so each decomposition is produced exactly
/// once per pair choice.
pub fn decompose_standard(counts: &Counts) -> Vec<Decomposition> {
    let mut out = Vec::new();
    if counts.iter().map(|&c| c as u32).sum::<u32>() != 14 {
        return out;
    }

    let mut work = *counts;
    for pair in 0..TILE_KINDS {
        if work[pair] < 2 {
            continue;
        }
        work[pair] -= 2;
        let mut acc = Vec::with_capacity(4);
        collect_melds(&mut work, &mut acc, &mut |melds| {
            out.push(Decomposition {
                pair,
                melds: melds.to_vec(),
            });
        });
        work[pair] += 2;
    }
    out
}

fn collect_melds(counts: &mut Counts, acc: &mut Vec<Meld>, found: &mut impl FnMut(&[Meld])) {
    let start = match counts.iter().position(|&c| c > 0) {
        Some(i) => i,
        None => {
            found(acc);
            return;
        }
    };

    if counts[start] >= 3 {
        counts[start] -= 3;
        acc.push(Meld::Triplet(start));
        collect_melds(counts, acc, found);
        acc.pop();
        counts[start] += 3;
    }

    if sequence_starts_at(start) && counts[start + 1] > 0 && counts[start + 2] > 0 {
        for i in 0..3 {
            counts[start + i] -= 1;
        }
        acc.push(Meld::Sequence(start));
        collect_melds(counts, acc, found);
        acc.pop();
        for i in 0..3 {
            counts[start + i] += 1;
        }
    }
}

/// Seven distinct pairs, no kind repeated twice.
pub fn seven_pairs(counts: &Counts) -> bool {
    counts.iter().all(|&c| c == 0 || c == 2) && counts.iter().filter(|&&c| c == 2).count() == 7
}

/// One of each terminal and honor, plus one duplicate among them.
pub fn thirteen_orphans(counts: &Counts) -> bool {
    let mut total = 0u32;
    for kind in 0..TILE_KINDS {
        let c = counts[kind];
        if c > 0 && !ORPHANS.contains(&kind) {
            return false;
        }
        total += c as u32;
    }
    total == 14 && ORPHANS.iter().all(|&kind| counts[kind] >= 1)
}

/// Any winning shape at all.
pub fn is_winning_shape(counts: &Counts) -> bool {
    thirteen_orphans(counts) || seven_pairs(counts) || !decompose_standard(counts).is_empty()
}
