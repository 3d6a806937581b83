//! End-to-end guess flow against the real riichi oracle and the session
//! store: the scenarios a deployment relies on.

use mahjong_handle_engine::engine::codec::decode;
use mahjong_handle_engine::engine::models::{
    Feedback, RejectCode, RuleContext, RuleVariant, Wind,
};
use mahjong_handle_engine::engine::oracle::HandEvaluator;
use mahjong_handle_engine::engine::session::{GameSession, SecretHand};
use mahjong_handle_engine::rules::riichi::RiichiEvaluator;
use mahjong_handle_engine::store::{update_with, MemoryStore, SessionStore};

/// Honitsu plus double east: comfortably legal under riichi rules.
const SECRET: &str = "123m456m789m111z22z";
/// Same shape in pin tiles: legal, but never equal to the secret.
const DECOY: &str = "123p456p789p111z22z";

fn context() -> RuleContext {
    RuleContext {
        round_wind: Wind::East,
        seat_wind: Wind::East,
        self_draw: false,
        variant: RuleVariant::Riichi,
    }
}

fn make_session(attempt_budget: u32, created_at: f64) -> GameSession {
    let tiles = decode(SECRET).unwrap();
    let winning_tile = *tiles.last().unwrap();
    let eval = RiichiEvaluator
        .evaluate(&tiles, winning_tile, &context())
        .unwrap();
    assert!(eval.winning && eval.value > 0, "secret must be a scoring hand");

    GameSession::new(
        "game1".into(),
        created_at,
        attempt_budget,
        context(),
        SecretHand {
            tiles,
            value: eval.value,
            terms: eval.terms,
        },
    )
}

#[test]
fn scenario_a_exact_guess_on_first_attempt() {
    let mut session = make_session(8, 1000.0);
    let out = session
        .submit(&RiichiEvaluator, "u1", SECRET, 1010.0)
        .unwrap();

    assert!(out.win);
    assert!(out.finished);
    assert_eq!(out.colors, vec![Feedback::Exact; 14]);
    assert_eq!(out.remaining, 7);
    // floor(1500 * (0.9 + 0.1) * (0.6 + 0.4)) with F = G = 1.
    assert_eq!(out.score, 1500);

    let snap = session.progress("u1");
    assert_eq!(snap.attempts_used, 1);
    assert_eq!(snap.score, 1500);
    assert_eq!(snap.finished_at, Some(1010.0));
}

#[test]
fn scenario_b_budget_exhaustion_loses_with_zero_score() {
    let mut session = make_session(8, 1000.0);
    for attempt in 1..=8u32 {
        let out = session
            .submit(&RiichiEvaluator, "u1", DECOY, 1000.0 + attempt as f64)
            .unwrap();
        assert!(!out.win);
        assert_eq!(out.remaining, 8 - attempt);
        assert_eq!(out.finished, attempt == 8);
    }

    let snap = session.progress("u1");
    assert!(snap.finished);
    assert!(!snap.win);
    assert_eq!(snap.score, 0);
    assert_eq!(snap.remaining, 0);
    assert_eq!(snap.history.len(), 8);
}

#[test]
fn scenario_c_malformed_guess_costs_nothing() {
    let mut session = make_session(8, 1000.0);
    session
        .submit(&RiichiEvaluator, "u1", DECOY, 1001.0)
        .unwrap();
    let before = session.progress("u1");

    let err = session
        .submit(&RiichiEvaluator, "u1", "abc???", 1002.0)
        .unwrap_err();
    assert_eq!(err.code, RejectCode::FormatError);
    assert_eq!(session.progress("u1"), before);
}

#[test]
fn scenario_d_thirteen_tiles_reports_count() {
    let mut session = make_session(8, 1000.0);
    let err = session
        .submit(&RiichiEvaluator, "u1", "123m456m789m111z2z", 1001.0)
        .unwrap_err();
    assert_eq!(err.code, RejectCode::CountError);
    assert_eq!(err.count, Some(13));
    assert!(session.players.is_empty());
}

#[test]
fn scenario_e_submissions_after_finish_are_rejected() {
    // Finished by winning.
    let mut session = make_session(8, 1000.0);
    session
        .submit(&RiichiEvaluator, "u1", SECRET, 1001.0)
        .unwrap();
    let err = session
        .submit(&RiichiEvaluator, "u1", DECOY, 1002.0)
        .unwrap_err();
    assert_eq!(err.code, RejectCode::GameFinished);

    // Finished by exhaustion; even garbage input reports the terminal state.
    let mut session = make_session(1, 1000.0);
    session
        .submit(&RiichiEvaluator, "u1", DECOY, 1001.0)
        .unwrap();
    let err = session
        .submit(&RiichiEvaluator, "u1", "not even tiles", 1002.0)
        .unwrap_err();
    assert_eq!(err.code, RejectCode::GameFinished);
}

#[test]
fn oracle_rejections_leave_no_trace() {
    let mut session = make_session(8, 1000.0);

    // No winning decomposition.
    let err = session
        .submit(&RiichiEvaluator, "u1", "123m456m789m12345s", 1001.0)
        .unwrap_err();
    assert_eq!(err.code, RejectCode::NotWinningHand);

    // Winning shape with nothing to score on a discard win.
    let err = session
        .submit(&RiichiEvaluator, "u1", "123m456p234789s11z", 1002.0)
        .unwrap_err();
    assert_eq!(err.code, RejectCode::NoScoringElement);

    assert!(session.players.is_empty());
}

#[test]
fn late_win_scores_with_time_decay() {
    let mut session = make_session(8, 1000.0);
    session
        .submit(&RiichiEvaluator, "u1", DECOY, 1001.0)
        .unwrap();
    let out = session
        .submit(&RiichiEvaluator, "u1", SECRET, 1090.0)
        .unwrap();
    assert!(out.win && out.finished);
    // Two attempts, 90 seconds elapsed: strictly between zero and perfect.
    assert!(out.score > 0 && out.score < 1500);

    // The stored score is durable and re-servable without recomputation.
    assert_eq!(session.progress("u1").score, out.score);
}

#[test]
fn submissions_flow_through_the_store_atomically() {
    let store = MemoryStore::new(3600);
    let created = make_session(8, 1000.0);
    let session = store.create(
        created.context,
        created.secret.clone(),
        created.attempt_budget,
        1000.0,
    );
    let id = session.session_id.clone();

    let out = update_with(&store, &id, |s| {
        s.submit(&RiichiEvaluator, "u1", DECOY, 1001.0)
    })
    .unwrap()
    .unwrap();
    assert_eq!(out.remaining, 7);

    // The mutation is visible on the next read.
    let loaded = store.get(&id).unwrap();
    assert_eq!(loaded.progress("u1").attempts_used, 1);

    // A rejected guess changes nothing, even through the store.
    let err = update_with(&store, &id, |s| {
        s.submit(&RiichiEvaluator, "u1", "abc???", 1002.0)
    })
    .unwrap()
    .unwrap_err();
    assert_eq!(err.code, RejectCode::FormatError);
    assert_eq!(store.get(&id).unwrap(), loaded);
}

#[test]
fn two_players_progress_independently_in_one_session() {
    let store = MemoryStore::new(3600);
    let created = make_session(8, 1000.0);
    let session = store.create(
        created.context,
        created.secret.clone(),
        created.attempt_budget,
        1000.0,
    );
    let id = session.session_id.clone();

    update_with(&store, &id, |s| {
        s.submit(&RiichiEvaluator, "u1", SECRET, 1001.0)
    })
    .unwrap()
    .unwrap();
    update_with(&store, &id, |s| {
        s.submit(&RiichiEvaluator, "u2", DECOY, 1002.0)
    })
    .unwrap()
    .unwrap();

    let loaded = store.get(&id).unwrap();
    assert!(loaded.progress("u1").win);
    assert!(!loaded.progress("u2").finished);
    assert_eq!(loaded.progress("u2").attempts_used, 1);
}
