//! Session and per-player progress: the state machine that turns one raw
//! guess into validation, legality checking, progress mutation, coloring
//! and (on finish) a durable score.
//!
//! Per player the states are Unseen -> InProgress -> Finished(win|lose);
//! nothing ever leaves Finished, and a rejected submission never creates or
//! mutates a player row.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::engine::coloring::color_guess;
use crate::engine::models::{Feedback, RejectCode, Rejection, RuleContext, Tile};
use crate::engine::normalize::normalize;
use crate::engine::oracle::{check_guess, HandEvaluator};
use crate::engine::scoring::final_score;

/// The hidden answer plus its oracle verdict, baked at session creation so
/// hints never need a second oracle call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecretHand {
    pub tiles: Vec<Tile>,
    pub value: u32,
    pub terms: Vec<String>,
}

/// One accepted guess: tiles as submitted, its color vector and the
/// submission timestamp. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuessAttempt {
    pub tiles: Vec<Tile>,
    pub colors: Vec<Feedback>,
    pub created_at: f64,
}

/// Per-player progress. `score` and `finished_at` are meaningful only once
/// `finished` is set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerProgress {
    #[serde(default)]
    pub attempts_used: u32,
    #[serde(default)]
    pub history: Vec<GuessAttempt>,
    #[serde(default)]
    pub finished: bool,
    #[serde(default)]
    pub win: bool,
    #[serde(default)]
    pub score: u32,
    #[serde(default)]
    pub finished_at: Option<f64>,
}

/// One puzzle instance. The secret hand and rule context never change after
/// creation; expiry is the store's concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSession {
    pub session_id: String,
    pub created_at: f64,
    pub attempt_budget: u32,
    pub context: RuleContext,
    pub secret: SecretHand,
    #[serde(default)]
    pub players: HashMap<String, PlayerProgress>,
}

/// Result of one accepted guess.
#[derive(Debug, Clone, PartialEq)]
pub struct GuessOutcome {
    pub tiles: Vec<Tile>,
    pub colors: Vec<Feedback>,
    pub remaining: u32,
    pub finished: bool,
    pub win: bool,
    /// Final score; zero unless this guess finished the game.
    pub score: u32,
    /// The oracle's scoring total and elements for the guess itself.
    pub value: u32,
    pub terms: Vec<String>,
    pub created_at: f64,
}

/// Read-only progress view; zero-valued for a player the session has never
/// seen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub attempts_used: u32,
    pub remaining: u32,
    pub finished: bool,
    pub win: bool,
    pub score: u32,
    pub finished_at: Option<f64>,
    pub history: Vec<GuessAttempt>,
}

impl GameSession {
    pub fn new(
        session_id: String,
        created_at: f64,
        attempt_budget: u32,
        context: RuleContext,
        secret: SecretHand,
    ) -> GameSession {
        GameSession {
            session_id,
            created_at,
            attempt_budget,
            context,
            secret,
            players: HashMap::new(),
        }
    }

    /// Evaluates one submission for one player.
    ///
    /// Order matters: the finished gate, then normalization, then the
    /// legality check — all before any mutation, so a rejection leaves the
    /// player row untouched (or nonexistent). Only a legal submission
    /// consumes an attempt and appends to history.
    pub fn submit(
        &mut self,
        evaluator: &dyn HandEvaluator,
        player_id: &str,
        raw_guess: &str,
        now: f64,
    ) -> Result<GuessOutcome, Rejection> {
        if self.players.get(player_id).map(|p| p.finished) == Some(true) {
            return Err(Rejection::new(
                RejectCode::GameFinished,
                "game already finished for this player",
            ));
        }

        let tiles = normalize(raw_guess)?;
        let legal = check_guess(evaluator, &tiles, &self.context)?;

        // Legal from here on: the lazy player row is created and exactly
        // one attempt is consumed.
        let budget = self.attempt_budget;
        let secret_tiles = &self.secret.tiles;
        let progress = self.players.entry(player_id.to_string()).or_default();
        progress.attempts_used += 1;

        let colors = color_guess(secret_tiles, &tiles);
        let win = tiles == *secret_tiles;
        let remaining = budget.saturating_sub(progress.attempts_used);
        let finished = win || remaining == 0;

        progress.history.push(GuessAttempt {
            tiles: tiles.clone(),
            colors: colors.clone(),
            created_at: now,
        });
        progress.finished = finished;
        progress.win = win;

        let mut score = 0;
        if finished {
            let elapsed = (now - self.created_at).max(0.0);
            score = final_score(progress.attempts_used, elapsed, win);
            progress.score = score;
            progress.finished_at = Some(now);
        }

        Ok(GuessOutcome {
            tiles,
            colors,
            remaining,
            finished,
            win,
            score,
            value: legal.value,
            terms: legal.terms,
            created_at: now,
        })
    }

    /// Progress snapshot without mutation.
    pub fn progress(&self, player_id: &str) -> ProgressSnapshot {
        match self.players.get(player_id) {
            Some(p) => ProgressSnapshot {
                attempts_used: p.attempts_used,
                remaining: self.attempt_budget.saturating_sub(p.attempts_used),
                finished: p.finished,
                win: p.win,
                score: p.score,
                finished_at: p.finished_at,
                history: p.history.clone(),
            },
            None => ProgressSnapshot {
                attempts_used: 0,
                remaining: self.attempt_budget,
                finished: false,
                win: false,
                score: 0,
                finished_at: None,
                history: Vec::new(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::codec::decode;
    use crate::engine::models::{RuleVariant, Wind};
    use crate::engine::oracle::Evaluation;

    /// Accepts any decodable 14-tile hand as a 1-value win; rules are
    /// exercised separately.
    struct AcceptAll;

    impl HandEvaluator for AcceptAll {
        fn variant(&self) -> RuleVariant {
            RuleVariant::Riichi
        }

        fn evaluate(
            &self,
            _tiles: &[Tile],
            _winning_tile: Tile,
            _ctx: &RuleContext,
        ) -> Result<Evaluation, String> {
            Ok(Evaluation {
                winning: true,
                value: 1,
                terms: vec!["stub".into()],
            })
        }
    }

    const SECRET: &str = "123m456p789s111z22z";
    const OTHER: &str = "123p456p789p111z22z";

    fn session(budget: u32) -> GameSession {
        GameSession::new(
            "s1".into(),
            1000.0,
            budget,
            RuleContext {
                round_wind: Wind::East,
                seat_wind: Wind::East,
                self_draw: false,
                variant: RuleVariant::Riichi,
            },
            SecretHand {
                tiles: decode(SECRET).unwrap(),
                value: 2,
                terms: vec!["round_wind".into(), "seat_wind".into()],
            },
        )
    }

    #[test]
    fn test_winning_guess_finishes_with_score() {
        let mut s = session(8);
        let out = s.submit(&AcceptAll, "u1", SECRET, 1010.0).unwrap();
        assert!(out.win);
        assert!(out.finished);
        assert_eq!(out.remaining, 7);
        assert_eq!(out.score, 1500);
        assert!(out.colors.iter().all(|c| *c == Feedback::Exact));

        let p = &s.players["u1"];
        assert_eq!(p.attempts_used, 1);
        assert_eq!(p.history.len(), 1);
        assert_eq!(p.score, 1500);
        assert_eq!(p.finished_at, Some(1010.0));
    }

    #[test]
    fn test_attempts_exhaustion_finishes_without_score() {
        let mut s = session(3);
        for i in 0..2 {
            let out = s.submit(&AcceptAll, "u1", OTHER, 1010.0 + i as f64).unwrap();
            assert!(!out.finished);
        }
        let out = s.submit(&AcceptAll, "u1", OTHER, 1020.0).unwrap();
        assert!(out.finished);
        assert!(!out.win);
        assert_eq!(out.remaining, 0);
        assert_eq!(out.score, 0);
        assert_eq!(s.players["u1"].attempts_used, 3);
    }

    #[test]
    fn test_rejection_never_creates_player_row() {
        let mut s = session(8);
        let err = s.submit(&AcceptAll, "u1", "abc???", 1010.0).unwrap_err();
        assert_eq!(err.code, RejectCode::FormatError);
        assert!(s.players.is_empty());
    }

    #[test]
    fn test_rejection_never_mutates_existing_row() {
        let mut s = session(8);
        s.submit(&AcceptAll, "u1", OTHER, 1010.0).unwrap();
        let before = s.players["u1"].clone();

        let err = s
            .submit(&AcceptAll, "u1", "123m456m789m111z2z", 1020.0)
            .unwrap_err();
        assert_eq!(err.code, RejectCode::CountError);
        assert_eq!(s.players["u1"], before);
    }

    #[test]
    fn test_finished_player_is_terminal() {
        let mut s = session(8);
        s.submit(&AcceptAll, "u1", SECRET, 1010.0).unwrap();
        let before = s.players["u1"].clone();

        let err = s.submit(&AcceptAll, "u1", SECRET, 1020.0).unwrap_err();
        assert_eq!(err.code, RejectCode::GameFinished);
        let err = s.submit(&AcceptAll, "u1", "garbage!!", 1020.0).unwrap_err();
        assert_eq!(err.code, RejectCode::GameFinished);
        assert_eq!(s.players["u1"], before);
    }

    #[test]
    fn test_players_are_independent() {
        let mut s = session(8);
        s.submit(&AcceptAll, "u1", SECRET, 1010.0).unwrap();
        let out = s.submit(&AcceptAll, "u2", OTHER, 1011.0).unwrap();
        assert!(!out.finished);
        assert_eq!(s.players.len(), 2);
        assert!(s.players["u1"].finished);
        assert!(!s.players["u2"].finished);
    }

    #[test]
    fn test_history_length_tracks_attempts() {
        let mut s = session(8);
        for i in 0..4 {
            s.submit(&AcceptAll, "u1", OTHER, 1010.0 + i as f64).unwrap();
            let p = &s.players["u1"];
            assert_eq!(p.history.len() as u32, p.attempts_used);
        }
    }

    #[test]
    fn test_snapshot_for_unseen_player() {
        let s = session(8);
        let snap = s.progress("nobody");
        assert_eq!(snap.attempts_used, 0);
        assert_eq!(snap.remaining, 8);
        assert!(!snap.finished);
        assert!(snap.history.is_empty());
    }

    #[test]
    fn test_snapshot_reflects_progress() {
        let mut s = session(8);
        s.submit(&AcceptAll, "u1", OTHER, 1010.0).unwrap();
        let snap = s.progress("u1");
        assert_eq!(snap.attempts_used, 1);
        assert_eq!(snap.remaining, 7);
        assert_eq!(snap.history.len(), 1);
    }
}
