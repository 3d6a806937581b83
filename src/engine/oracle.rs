//! Seam to the legality oracle. The engine never interprets rules itself:
//! it hands 14 tiles and the session's rule context to a [`HandEvaluator`]
//! and maps the verdict onto the rejection taxonomy.

use std::collections::HashMap;

use crate::engine::models::{RejectCode, Rejection, RuleContext, RuleVariant, Tile};

/// Verdict of one oracle call. `value` is the variant's scoring total (han
/// or fan); `terms` are stable identifiers of the scoring elements found —
/// display phrasing is a caller concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub winning: bool,
    pub value: u32,
    pub terms: Vec<String>,
}

impl Evaluation {
    /// A resolved non-winning verdict.
    pub fn not_winning() -> Evaluation {
        Evaluation {
            winning: false,
            value: 0,
            terms: Vec::new(),
        }
    }
}

/// The oracle contract: deterministic and side-effect-free for identical
/// inputs. `winning_tile` is the hand's 14th tile; the first 13 are held.
pub trait HandEvaluator: Send + Sync {
    fn variant(&self) -> RuleVariant;

    fn evaluate(
        &self,
        tiles: &[Tile],
        winning_tile: Tile,
        ctx: &RuleContext,
    ) -> Result<Evaluation, String>;
}

/// Maps rule variants to their evaluator.
pub struct EvaluatorRegistry {
    evaluators: HashMap<RuleVariant, Box<dyn HandEvaluator>>,
}

impl EvaluatorRegistry {
    pub fn new() -> EvaluatorRegistry {
        EvaluatorRegistry {
            evaluators: HashMap::new(),
        }
    }

    pub fn register(&mut self, evaluator: Box<dyn HandEvaluator>) {
        self.evaluators.insert(evaluator.variant(), evaluator);
    }

    pub fn get(&self, variant: RuleVariant) -> Option<&dyn HandEvaluator> {
        self.evaluators.get(&variant).map(|e| e.as_ref())
    }

    pub fn variants(&self) -> Vec<RuleVariant> {
        self.evaluators.keys().copied().collect()
    }
}

impl Default for EvaluatorRegistry {
    fn default() -> EvaluatorRegistry {
        EvaluatorRegistry::new()
    }
}

/// A guess the oracle accepted: it wins and carries at least one scoring
/// element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegalGuess {
    pub value: u32,
    pub terms: Vec<String>,
}

/// Runs the oracle on a syntactically valid guess. Oracle faults are never
/// treated as legal; they surface as a could-not-evaluate rejection.
pub fn check_guess(
    evaluator: &dyn HandEvaluator,
    tiles: &[Tile],
    ctx: &RuleContext,
) -> Result<LegalGuess, Rejection> {
    let winning_tile = *tiles
        .last()
        .ok_or_else(|| Rejection::format("empty guess"))?;

    let eval = evaluator
        .evaluate(tiles, winning_tile, ctx)
        .map_err(|err| Rejection::format(format!("could not evaluate hand: {err}")))?;

    if !eval.winning {
        return Err(Rejection::new(
            RejectCode::NotWinningHand,
            "tiles do not form a winning hand",
        ));
    }
    if eval.value == 0 {
        return Err(Rejection::new(
            RejectCode::NoScoringElement,
            "winning shape has no scoring element",
        ));
    }
    Ok(LegalGuess {
        value: eval.value,
        terms: eval.terms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::codec::decode;
    use crate::engine::models::Wind;

    /// Scripted oracle for exercising the adapter without real rules.
    struct ScriptedOracle {
        outcome: Result<Evaluation, String>,
    }

    impl HandEvaluator for ScriptedOracle {
        fn variant(&self) -> RuleVariant {
            RuleVariant::Riichi
        }

        fn evaluate(
            &self,
            _tiles: &[Tile],
            _winning_tile: Tile,
            _ctx: &RuleContext,
        ) -> Result<Evaluation, String> {
            self.outcome.clone()
        }
    }

    fn ctx() -> RuleContext {
        RuleContext {
            round_wind: Wind::East,
            seat_wind: Wind::East,
            self_draw: false,
            variant: RuleVariant::Riichi,
        }
    }

    #[test]
    fn test_not_winning_maps_to_rejection() {
        let oracle = ScriptedOracle {
            outcome: Ok(Evaluation::not_winning()),
        };
        let tiles = decode("123m456p789s111z22z").unwrap();
        let err = check_guess(&oracle, &tiles, &ctx()).unwrap_err();
        assert_eq!(err.code, RejectCode::NotWinningHand);
    }

    #[test]
    fn test_zero_value_maps_to_no_scoring_element() {
        let oracle = ScriptedOracle {
            outcome: Ok(Evaluation {
                winning: true,
                value: 0,
                terms: Vec::new(),
            }),
        };
        let tiles = decode("123m456p789s111z22z").unwrap();
        let err = check_guess(&oracle, &tiles, &ctx()).unwrap_err();
        assert_eq!(err.code, RejectCode::NoScoringElement);
    }

    #[test]
    fn test_oracle_fault_is_never_legal() {
        let oracle = ScriptedOracle {
            outcome: Err("ruleset exploded".into()),
        };
        let tiles = decode("123m456p789s111z22z").unwrap();
        let err = check_guess(&oracle, &tiles, &ctx()).unwrap_err();
        assert_eq!(err.code, RejectCode::FormatError);
        assert!(err.message.contains("could not evaluate"));
    }

    #[test]
    fn test_legal_guess_carries_value_and_terms() {
        let oracle = ScriptedOracle {
            outcome: Ok(Evaluation {
                winning: true,
                value: 2,
                terms: vec!["tanyao".into(), "seat_wind".into()],
            }),
        };
        let tiles = decode("123m456p789s111z22z").unwrap();
        let legal = check_guess(&oracle, &tiles, &ctx()).unwrap();
        assert_eq!(legal.value, 2);
        assert_eq!(legal.terms, vec!["tanyao", "seat_wind"]);
    }
}
