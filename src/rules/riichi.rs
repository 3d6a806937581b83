//! Riichi-variant legality oracle: closed-hand han counting over the best
//! decomposition. Only elements visible in the tiles and rule context are
//! credited — nothing declaration-dependent — so a winning shape can still
//! evaluate to zero and be rejected as unscoring.

use crate::engine::models::{RuleContext, RuleVariant, Suit, Tile, HAND_TILES};
use crate::engine::oracle::{Evaluation, HandEvaluator};

use super::decompose::{
    counts_of, decompose_standard, seven_pairs, thirteen_orphans, Counts, Decomposition, Meld,
};

/// Dragon kinds: honors ranked 5-7.
const HAKU: usize = 31;
const HATSU: usize = 32;
const CHUN: usize = 33;

pub struct RiichiEvaluator;

impl HandEvaluator for RiichiEvaluator {
    fn variant(&self) -> RuleVariant {
        RuleVariant::Riichi
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

        if thirteen_orphans(&counts) {
            return Ok(Evaluation {
                winning: true,
                value: 13,
                terms: vec!["kokushi_musou".into()],
            });
        }

        let mut best: Option<(u32, Vec<&'static str>)> = None;
        let mut consider = |candidate: (u32, Vec<&'static str>)| {
            if best.as_ref().map(|(v, _)| candidate.0 > *v).unwrap_or(true) {
                best = Some(candidate);
            }
        };

        if seven_pairs(&counts) {
            consider(score_seven_pairs(&counts, ctx));
        }
        for decomp in decompose_standard(&counts) {
            consider(score_decomposition(&decomp, &counts, ctx));
        }

        match best {
            Some((value, terms)) => Ok(Evaluation {
                winning: true,
                value,
                terms: terms.into_iter().map(String::from).collect(),
            }),
            None => Ok(Evaluation::not_winning()),
        }
    }
}

fn all_simples(counts: &Counts) -> bool {
    (0..counts.len()).all(|kind| {
        counts[kind] == 0
            || Tile::from_ordinal(kind)
                .map(|t| !t.is_terminal_or_honor())
                .unwrap_or(false)
    })
}

/// Chinitsu (one number suit only) or honitsu (one number suit plus honors).
fn flush_term(counts: &Counts) -> Option<(&'static str, u32)> {
    let honors = (27..34).any(|kind| counts[kind] > 0);
    let suits_used = [Suit::Man, Suit::Pin, Suit::Sou]
        .iter()
        .filter(|suit| (0..9).any(|i| counts[suit.offset() + i] > 0))
        .count();
    match (suits_used, honors) {
        (1, false) => Some(("chinitsu", 6)),
        (1, true) => Some(("honitsu", 3)),
        _ => None,
    }
}

fn score_seven_pairs(counts: &Counts, ctx: &RuleContext) -> (u32, Vec<&'static str>) {
    let mut value = 0;
    let mut terms = Vec::new();
    if ctx.self_draw {
        value += 1;
        terms.push("menzen_tsumo");
    }
    if all_simples(counts) {
        value += 1;
        terms.push("tanyao");
    }
    value += 2;
    terms.push("chiitoitsu");
    if let Some((term, han)) = flush_term(counts) {
        value += han;
        terms.push(term);
    }
    (value, terms)
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

    // Three dragon triplets outrank everything else.
    if [HAKU, HATSU, CHUN].iter().all(|d| triplets.contains(d)) {
        return (13, vec!["daisangen"]);
    }

    let mut value = 0;
    let mut terms = Vec::new();

    if ctx.self_draw {
        value += 1;
        terms.push("menzen_tsumo");
    }
    if all_simples(counts) {
        value += 1;
        terms.push("tanyao");
    }
    for (kind, term) in [
        (HAKU, "yakuhai_haku"),
        (HATSU, "yakuhai_hatsu"),
        (CHUN, "yakuhai_chun"),
    ] {
        if triplets.contains(&kind) {
            value += 1;
            terms.push(term);
        }
    }
    if triplets.contains(&ctx.seat_wind.tile().ordinal()) {
        value += 1;
        terms.push("seat_wind");
    }
    if triplets.contains(&ctx.round_wind.tile().ordinal()) {
        value += 1;
        terms.push("round_wind");
    }
    // One duplicated sequence; the hand is always closed here.
    let has_iipeiko = sequences
        .iter()
        .enumerate()
        .any(|(i, s)| sequences[i + 1..].contains(s));
    if has_iipeiko {
        value += 1;
        terms.push("iipeiko");
    }
    for base in [0usize, 9, 18] {
        if [base, base + 3, base + 6]
            .iter()
            .all(|start| sequences.contains(start))
        {
            value += 2;
            terms.push("ittsuu");
            break;
        }
    }
    if sequences.is_empty() {
        value += 2;
        terms.push("toitoi");
    }
    if let Some((term, han)) = flush_term(counts) {
        value += han;
        terms.push(term);
    }

    (value, terms)
}
