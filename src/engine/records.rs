//! Versioned session records for cache-backed stores. Loading is an
//! explicit migration: legacy blobs (the previous deployment's field names
//! and color vocabulary) are rewritten to the current shape before
//! deserialization, and absent optional fields fill with defaults.

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::engine::session::GameSession;

/// Bump when the serialized shape changes; `decode_session` migrates older
/// versions forward.
pub const SESSION_RECORD_VERSION: u64 = 1;

#[derive(Serialize)]
struct RecordOut<'a> {
    version: u64,
    #[serde(flatten)]
    session: &'a GameSession,
}

/// Serializes a session with its format version stamped in.
pub fn encode_session(session: &GameSession) -> Result<String, String> {
    serde_json::to_string(&RecordOut {
        version: SESSION_RECORD_VERSION,
        session,
    })
    .map_err(|err| format!("failed to encode session: {err}"))
}

/// Parses a session blob of any known version.
pub fn decode_session(raw: &str) -> Result<GameSession, String> {
    let mut value: Value =
        serde_json::from_str(raw).map_err(|err| format!("failed to parse session: {err}"))?;

    let version = value.get("version").and_then(Value::as_u64).unwrap_or(0);
    if version == 0 {
        value = migrate_v0(value);
    } else if version > SESSION_RECORD_VERSION {
        return Err(format!("unknown session record version {version}"));
    }

    serde_json::from_value(value).map_err(|err| format!("failed to decode session: {err}"))
}

fn wind_name(rank: u64) -> &'static str {
    match rank {
        2 => "south",
        3 => "west",
        4 => "north",
        _ => "east",
    }
}

fn take(map: &mut Map<String, Value>, keys: &[&str]) -> Option<Value> {
    for key in keys {
        if let Some(v) = map.remove(*key) {
            return Some(v);
        }
    }
    None
}

/// Rewrites the unversioned legacy shape: renamed fields, the 13+1 tile
/// split, integer wind ranks and blue/orange/gray colors.
fn migrate_v0(value: Value) -> Value {
    let mut map = match value {
        Value::Object(map) => map,
        other => return other,
    };

    let session_id = take(&mut map, &["session_id", "game_id", "gameId"])
        .unwrap_or_else(|| json!(""));
    let created_at = take(&mut map, &["created_at", "createdAt"]).unwrap_or_else(|| json!(0.0));
    let attempt_budget =
        take(&mut map, &["attempt_budget", "max_guess", "maxGuess"]).unwrap_or_else(|| json!(8));

    let hand = take(&mut map, &["hand"]).unwrap_or_else(|| json!({}));
    let mut tiles: Vec<Value> = hand
        .get("tiles_ascii_13")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    if let Some(win_tile) = hand.get("win_tile").and_then(Value::as_str) {
        if !win_tile.is_empty() {
            tiles.push(json!(win_tile));
        }
    }
    let secret = json!({
        "tiles": tiles,
        "value": hand.get("han").and_then(Value::as_u64).unwrap_or(0),
        "terms": [],
    });
    let context = json!({
        "round_wind": wind_name(hand.get("round_wind").and_then(Value::as_u64).unwrap_or(1)),
        "seat_wind": wind_name(hand.get("seat_wind").and_then(Value::as_u64).unwrap_or(1)),
        "self_draw": hand.get("tsumo").and_then(Value::as_bool).unwrap_or(false),
        "variant": "riichi",
    });

    let users = take(&mut map, &["players", "users"]).unwrap_or_else(|| json!({}));
    let mut players = Map::new();
    if let Value::Object(users) = users {
        for (uid, progress) in users {
            players.insert(uid, migrate_v0_progress(progress));
        }
    }

    json!({
        "version": SESSION_RECORD_VERSION,
        "session_id": session_id,
        "created_at": created_at,
        "attempt_budget": attempt_budget,
        "context": context,
        "secret": secret,
        "players": players,
    })
}

fn migrate_v0_progress(value: Value) -> Value {
    let mut map = match value {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    let attempts_used = take(&mut map, &["attempts_used", "hit_count_valid", "hitCountValid"])
        .unwrap_or_else(|| json!(0));
    let history: Vec<Value> = take(&mut map, &["history"])
        .and_then(|h| h.as_array().cloned())
        .unwrap_or_default()
        .into_iter()
        .map(migrate_v0_attempt)
        .collect();

    json!({
        "attempts_used": attempts_used,
        "history": history,
        "finished": map.remove("finished").unwrap_or(json!(false)),
        "win": map.remove("win").unwrap_or(json!(false)),
        "score": map.remove("score").unwrap_or(json!(0)),
        "finished_at": map.remove("finished_at").unwrap_or(Value::Null),
    })
}

fn migrate_v0_attempt(value: Value) -> Value {
    let mut map = match value {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    let tiles = take(&mut map, &["tiles", "guess_tiles_14", "guessTiles14"])
        .unwrap_or_else(|| json!([]));
    let colors: Vec<Value> = take(&mut map, &["colors", "colors_14", "colors14"])
        .and_then(|c| c.as_array().cloned())
        .unwrap_or_default()
        .iter()
        .map(|c| match c.as_str() {
            Some("blue") => json!("exact"),
            Some("orange") => json!("present"),
            Some("gray") => json!("absent"),
            _ => c.clone(),
        })
        .collect();

    json!({
        "tiles": tiles,
        "colors": colors,
        "created_at": take(&mut map, &["created_at", "createdAt"]).unwrap_or(json!(0.0)),
    })
}
