//! gRPC server implementation for HandleService.

use std::sync::Arc;

use tonic::{Request, Response, Status};

use crate::bank::HandBank;
use crate::engine::codec;
use crate::engine::models::{Feedback, Rejection, RuleContext, RuleVariant, Tile};
use crate::engine::oracle::{EvaluatorRegistry, HandEvaluator};
use crate::engine::session::{GameSession, GuessAttempt, SecretHand};
use crate::rules::RuleTables;
use crate::store::{self, SessionStore, StoreError};

pub mod proto {
    tonic::include_proto!("mahjong.handle.v1");
}

use proto::handle_service_server::HandleService;
use proto::*;

/// The gRPC service implementation: thin glue over the engine, the store,
/// the evaluator registry and the hand bank.
pub struct HandleServer {
    store: Arc<dyn SessionStore>,
    registry: Arc<EvaluatorRegistry>,
    bank: Arc<HandBank>,
    tables: Arc<RuleTables>,
    default_budget: u32,
    default_variant: RuleVariant,
}

impl HandleServer {
    pub fn new(
        store: Arc<dyn SessionStore>,
        registry: Arc<EvaluatorRegistry>,
        bank: Arc<HandBank>,
        tables: Arc<RuleTables>,
        default_budget: u32,
        default_variant: RuleVariant,
    ) -> HandleServer {
        HandleServer {
            store,
            registry,
            bank,
            tables,
            default_budget,
            default_variant,
        }
    }

    fn resolve_variant(&self, raw: &str) -> Result<RuleVariant, Status> {
        if raw.is_empty() {
            return Ok(self.default_variant);
        }
        RuleVariant::parse(raw)
            .ok_or_else(|| Status::invalid_argument(format!("unknown rule variant: {raw}")))
    }

    /// Picks a bank entry, has the oracle grade it, and persists the new
    /// session. A bank entry the oracle rejects is a data defect, not a
    /// player error.
    fn create_session(
        &self,
        attempt_budget: u32,
        hand_index: Option<u32>,
        variant: RuleVariant,
        now: f64,
    ) -> Result<GameSession, Status> {
        let budget = if attempt_budget == 0 {
            self.default_budget
        } else {
            attempt_budget
        };

        let (index, entry) = self
            .bank
            .pick(hand_index.map(|i| i as usize))
            .map_err(Status::failed_precondition)?;
        let context = RuleContext {
            round_wind: entry.round_wind,
            seat_wind: entry.seat_wind,
            self_draw: entry.self_draw,
            variant,
        };
        let evaluator = self
            .registry
            .get(variant)
            .ok_or_else(|| Status::unimplemented(format!("no evaluator for {}", variant.as_str())))?;
        let winning_tile = *entry
            .tiles
            .last()
            .ok_or_else(|| Status::internal("empty bank entry"))?;
        let eval = evaluator
            .evaluate(&entry.tiles, winning_tile, &context)
            .map_err(|err| Status::internal(format!("bank entry {index} failed evaluation: {err}")))?;
        if !eval.winning || eval.value == 0 {
            return Err(Status::internal(format!(
                "bank entry {index} is not a scoring winning hand"
            )));
        }

        let secret = SecretHand {
            tiles: entry.tiles.clone(),
            value: eval.value,
            terms: eval.terms,
        };
        Ok(self.store.create(context, secret, budget, now))
    }

    fn hint_for(&self, session: &GameSession) -> Hint {
        let variant = session.context.variant;
        Hint {
            terms_tip: self.tables.terms_tip(variant, &session.secret.terms),
            value_tip: self.tables.value_tip(variant, session.secret.value),
            wind_tip: format!(
                "Seat {}, Round {}",
                self.tables.wind_name(session.context.seat_wind),
                self.tables.wind_name(session.context.round_wind),
            ),
            draw_tip: self.tables.draw_name(session.context.self_draw).to_string(),
        }
    }

    fn start_response(&self, session: &GameSession) -> StartGameResponse {
        StartGameResponse {
            session_id: session.session_id.clone(),
            attempt_budget: session.attempt_budget,
            created_at: session.created_at,
            rule_variant: session.context.variant.as_str().to_string(),
            hint: Some(self.hint_for(session)),
        }
    }
}

// --- Conversion helpers: engine types -> protobuf ---

fn tiles_to_proto(tiles: &[Tile]) -> Vec<String> {
    tiles.iter().map(Tile::to_string).collect()
}

fn colors_to_proto(colors: &[Feedback]) -> Vec<String> {
    colors.iter().map(|c| c.as_str().to_string()).collect()
}

fn rejection_to_proto(rejection: &Rejection) -> GuessRejection {
    GuessRejection {
        code: rejection.code.as_str().to_string(),
        message: rejection.message.clone(),
        count: rejection.count.unwrap_or(0) as u32,
    }
}

fn history_to_proto(history: &[GuessAttempt]) -> Vec<HistoryEntry> {
    history
        .iter()
        .map(|attempt| HistoryEntry {
            guess_tiles: tiles_to_proto(&attempt.tiles),
            colors: colors_to_proto(&attempt.colors),
            created_at: attempt.created_at,
        })
        .collect()
}

/// Answer payload, only ever built once the player has finished.
fn answer_payload(session: &GameSession) -> (Vec<String>, String) {
    (
        tiles_to_proto(&session.secret.tiles),
        codec::encode(&session.secret.tiles),
    )
}

#[tonic::async_trait]
impl HandleService for HandleServer {
    async fn start_game(
        &self,
        request: Request<StartGameRequest>,
    ) -> Result<Response<StartGameResponse>, Status> {
        let req = request.into_inner();
        let variant = self.resolve_variant(&req.rule_variant)?;
        let session = self.create_session(req.attempt_budget, req.hand_index, variant, store::unix_now())?;
        tracing::info!(
            session_id = %session.session_id,
            player_id = %req.player_id,
            attempt_budget = session.attempt_budget,
            variant = variant.as_str(),
            "game started"
        );
        Ok(Response::new(self.start_response(&session)))
    }

    async fn submit_guess(
        &self,
        request: Request<SubmitGuessRequest>,
    ) -> Result<Response<SubmitGuessResponse>, Status> {
        let req = request.into_inner();
        let now = store::unix_now();

        let outcome = store::update_with(self.store.as_ref(), &req.session_id, |session| {
            let evaluator = self
                .registry
                .get(session.context.variant)
                .ok_or_else(|| Rejection::format("could not evaluate hand: variant unavailable"))?;
            let out = session.submit(evaluator, &req.player_id, &req.guess, now)?;
            let hint = self.hint_for(session);
            let answer = out.finished.then(|| answer_payload(session));
            Ok::<_, Rejection>((out, hint, answer))
        });

        match outcome {
            Err(StoreError::NotFound) => Err(Status::not_found("unknown or expired session")),
            Ok(Err(rejection)) => {
                tracing::info!(
                    session_id = %req.session_id,
                    player_id = %req.player_id,
                    code = rejection.code.as_str(),
                    "guess rejected"
                );
                Ok(Response::new(SubmitGuessResponse {
                    result: None,
                    rejection: Some(rejection_to_proto(&rejection)),
                }))
            }
            Ok(Ok((out, hint, answer))) => {
                tracing::info!(
                    session_id = %req.session_id,
                    player_id = %req.player_id,
                    remaining = out.remaining,
                    finished = out.finished,
                    win = out.win,
                    "guess accepted"
                );
                let (answer_tiles, answer_text) = answer.unwrap_or_default();
                Ok(Response::new(SubmitGuessResponse {
                    result: Some(GuessResult {
                        guess_tiles: tiles_to_proto(&out.tiles),
                        colors: colors_to_proto(&out.colors),
                        remaining: out.remaining,
                        finished: out.finished,
                        win: out.win,
                        score: out.score,
                        created_at: out.created_at,
                        hint: Some(hint),
                        answer_tiles,
                        answer_text,
                    }),
                    rejection: None,
                }))
            }
        }
    }

    async fn get_status(
        &self,
        request: Request<GetStatusRequest>,
    ) -> Result<Response<GetStatusResponse>, Status> {
        let req = request.into_inner();
        let session = self
            .store
            .get(&req.session_id)
            .ok_or_else(|| Status::not_found("unknown or expired session"))?;

        let snapshot = session.progress(&req.player_id);
        let (answer_tiles, answer_text) = if snapshot.finished {
            answer_payload(&session)
        } else {
            Default::default()
        };

        Ok(Response::new(GetStatusResponse {
            session_id: session.session_id.clone(),
            attempt_budget: session.attempt_budget,
            created_at: session.created_at,
            rule_variant: session.context.variant.as_str().to_string(),
            attempts_used: snapshot.attempts_used,
            remaining: snapshot.remaining,
            finished: snapshot.finished,
            win: snapshot.win,
            score: snapshot.score,
            history: history_to_proto(&snapshot.history),
            hint: Some(self.hint_for(&session)),
            answer_tiles,
            answer_text,
        }))
    }

    async fn reset_game(
        &self,
        request: Request<ResetGameRequest>,
    ) -> Result<Response<StartGameResponse>, Status> {
        let req = request.into_inner();
        let variant = self.resolve_variant(&req.rule_variant)?;
        self.store.delete(&req.session_id);
        let session = self.create_session(req.attempt_budget, req.hand_index, variant, store::unix_now())?;
        tracing::info!(
            old_session_id = %req.session_id,
            session_id = %session.session_id,
            player_id = %req.player_id,
            "game reset"
        );
        Ok(Response::new(self.start_response(&session)))
    }
}
