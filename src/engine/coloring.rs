//! Duplicate-aware per-position feedback: an exact pass then a presence
//! pass, both decrementing a shared remaining-count so duplicated guess
//! tiles are never credited beyond the secret's multiset.

use crate::engine::models::{Feedback, Tile, TILE_KINDS};

/// Computes one color per guess position. Exact matches are resolved first,
/// so a correctly placed tile is never stolen by an earlier position's
/// presence check. `secret` and `guess` must be the same length.
pub fn color_guess(secret: &[Tile], guess: &[Tile]) -> Vec<Feedback> {
    debug_assert_eq!(secret.len(), guess.len());

    let mut remain = [0u8; TILE_KINDS];
    for tile in secret {
        remain[tile.ordinal()] += 1;
    }

    let mut colors = vec![Feedback::Absent; guess.len()];

    for i in 0..guess.len() {
        if guess[i] == secret[i] && remain[guess[i].ordinal()] > 0 {
            colors[i] = Feedback::Exact;
            remain[guess[i].ordinal()] -= 1;
        }
    }

    for i in 0..guess.len() {
        if colors[i] == Feedback::Exact {
            continue;
        }
        let kind = guess[i].ordinal();
        if remain[kind] > 0 {
            colors[i] = Feedback::Present;
            remain[kind] -= 1;
        }
    }

    colors
}
