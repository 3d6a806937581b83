//! Guobiao-variant legality oracle: fan counting with the 8-fan declaration
//! minimum. A winning shape below the minimum evaluates to zero, which the
//! engine reports as an unscoring hand.

use crate::engine::models::{RuleContext, RuleVariant, Suit, Tile, HAND_TILES};
use crate::engine::oracle::{Evaluation, HandEvaluator};

use super::decompose::{
    counts_of, decompose_standard, seven_pairs, thirteen_orphans, Counts, Decomposition, Meld,
};

/// Minimum fan total required to declare a win.
pub const MIN_FAN: u32 = 8;

const DRAGONS: [(usize, &str); 3] = [
    (31, "dragon_pung_haku"),
    (32, "dragon_pung_hatsu"),
    (33, "dragon_pung_chun"),
];

pub struct GuobiaoEvaluator;

impl HandEvaluator for GuobiaoEvaluator {
    fn variant(&self) -> RuleVariant {
        RuleVariant::Guobiao
    }

    fn evaluate(
        &self,
        tiles: &[Tile],
        _winning_tile: Tile,
        ctx: &RuleContext,
    ) -> Result<Evaluation, String> {
        if tiles.len() != HAND_TILES {
            return Err(format!("expected {} tiles, got {}", HAND_TILES, tiles.len()));
        }
        let counts = counts_of(tiles);

        let mut best: Option<(u32, Vec<&'static str>)> = None;
        let mut consider = |candidate: (u32, Vec<&'static str>)| {
            if best.as_ref().map(|(v, _)| candidate.0 > *v).unwrap_or(true) {
                best = Some(candidate);
            }
        };

        if thirteen_orphans(&counts) {
            consider(concealment_applied(
                (88, vec!["thirteen_orphans"]),
                ctx.self_draw,
            ));
        }
        if seven_pairs(&counts) {
            consider(score_seven_pairs(&counts, ctx));
        }
        for decomp in decompose_standard(&counts) {
            consider(score_decomposition(&decomp, &counts, ctx));
        }

        match best {
            Some((value, terms)) => Ok(Evaluation {
                winning: true,
                // Below the declaration minimum the hand scores nothing.
                value: if value >= MIN_FAN { value } else { 0 },
                terms: terms.into_iter().map(String::from).collect(),
            }),
            None => Ok(Evaluation::not_winning()),
        }
    }
}

/// Every hand here is concealed: self-drawn wins take the fully-concealed
/// fan, discard wins the concealed-hand fan.
fn concealment_applied(
    (mut value, mut terms): (u32, Vec<&'static str>),
    self_draw: bool,
) -> (u32, Vec<&'static str>) {
    if self_draw {
        value += 4;
        terms.push("fully_concealed_hand");
    } else {
        value += 2;
        terms.push("concealed_hand");
    }
    (value, terms)
}

fn all_simples(counts: &Counts) -> bool {
    (0..counts.len()).all(|kind| {
        counts[kind] == 0
            || Tile::from_ordinal(kind)
                .map(|t| !t.is_terminal_or_honor())
                .unwrap_or(false)
    })
}

fn flush_term(counts: &Counts) -> Option<(&'static str, u32)> {
    let honors = (27..34).any(|kind| counts[kind] > 0);
    let suits_used = [Suit::Man, Suit::Pin, Suit::Sou]
        .iter()
        .filter(|suit| (0..9).any(|i| counts[suit.offset() + i] > 0))
        .count();
    match (suits_used, honors) {
        (1, false) => Some(("full_flush", 24)),
        (1, true) => Some(("half_flush", 6)),
        _ => None,
    }
}

fn score_seven_pairs(counts: &Counts, ctx: &RuleContext) -> (u32, Vec<&'static str>) {
    let mut value = 24;
    let mut terms = vec!["seven_pairs"];
    if all_simples(counts) {
        value += 2;
        terms.push("all_simples");
    }
    if let Some((term, fan)) = flush_term(counts) {
        value += fan;
        terms.push(term);
    }
    concealment_applied((value, terms), ctx.self_draw)
}

fn score_decomposition(
    decomp: &Decomposition,
    counts: &Counts,
    ctx: &RuleContext,
) -> (u32, Vec<&'static str>) {
    let triplets: Vec<usize> = decomp
        .melds
        .iter()
        .filter_map(|m| match m {
            Meld::Triplet(kind) => Some(*kind),
            Meld::Sequence(_) => None,
        })
        .collect();
    let sequences: Vec<usize> = decomp
        .melds
        .iter()
        .filter_map(|m| match m {
            Meld::Sequence(start) => Some(*start),
            Meld::Triplet(_) => None,
        })
        .collect();

    let mut value = 0;
    let mut terms = Vec::new();

    if all_simples(counts) {
        value += 2;
        terms.push("all_simples");
    }
    for (kind, term) in DRAGONS {
        if triplets.contains(&kind) {
            value += 2;
            terms.push(term);
        }
    }
    if triplets.contains(&ctx.round_wind.tile().ordinal()) {
        value += 2;
        terms.push("prevalent_wind");
    }
    if triplets.contains(&ctx.seat_wind.tile().ordinal()) {
        value += 2;
        terms.push("seat_wind");
    }
    if sequences.is_empty() {
        value += 6;
        terms.push("all_pungs");
    }
    for base in [0usize, 9, 18] {
        if [base, base + 3, base + 6]
            .iter()
            .all(|start| sequences.contains(start))
        {
            value += 16;
            terms.push("pure_straight");
            break;
        }
    }
    if let Some((term, fan)) = flush_term(counts) {
        value += fan;
        terms.push(term);
    }

    concealment_applied((value, terms), ctx.self_draw)
}
