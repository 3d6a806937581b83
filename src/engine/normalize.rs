//! Boundary validation: turns raw guess text into a syntactically valid
//! 14-tile candidate, or a structured rejection. Produces no side effects;
//! the state machine only mutates after this and the legality check pass.

use crate::engine::codec;
use crate::engine::models::{Rejection, Suit, Tile, HAND_TILES};

/// Shortest possible encoding of a 14-tile hand: fourteen rank digits plus
/// one suit letter.
pub const MIN_ENCODED_LEN: usize = HAND_TILES + 1;

fn is_allowed(ch: char) -> bool {
    ch.is_ascii_digit() || Suit::from_letter(ch).is_some()
}

/// Validation steps in order, each short-circuiting: strip whitespace,
/// alphabet check, minimum length, decode, tile count.
pub fn normalize(raw: &str) -> Result<Vec<Tile>, Rejection> {
    let cleaned: String = raw.trim().chars().filter(|ch| !ch.is_whitespace()).collect();

    if let Some(bad) = cleaned.chars().find(|ch| !is_allowed(*ch)) {
        return Err(Rejection::format(format!(
            "input contains disallowed character '{bad}'"
        )));
    }
    if cleaned.len() < MIN_ENCODED_LEN {
        return Err(Rejection::format(
            "input too short to encode a 14-tile hand",
        ));
    }

    let tiles = codec::decode(&cleaned).map_err(|err| Rejection::format(err.to_string()))?;
    if tiles.len() != HAND_TILES {
        return Err(Rejection::count(tiles.len()));
    }
    Ok(tiles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::models::RejectCode;

    #[test]
    fn test_normalize_accepts_spaced_input() {
        let tiles = normalize("  123m 456p 789s 111z 22z ").unwrap();
        assert_eq!(tiles.len(), HAND_TILES);
        assert_eq!(tiles, codec::decode("123m456p789s111z22z").unwrap());
    }

    #[test]
    fn test_normalize_rejects_disallowed_characters() {
        let err = normalize("abc???").unwrap_err();
        assert_eq!(err.code, RejectCode::FormatError);
    }

    #[test]
    fn test_normalize_rejects_short_input() {
        // Valid alphabet, but cannot possibly encode 14 tiles.
        let err = normalize("123m456p").unwrap_err();
        assert_eq!(err.code, RejectCode::FormatError);
    }

    #[test]
    fn test_normalize_rejects_codec_failures() {
        let err = normalize("123456789m12345").unwrap_err();
        assert_eq!(err.code, RejectCode::FormatError);
    }

    #[test]
    fn test_normalize_reports_wrong_tile_count() {
        let err = normalize("123m456m789m111z2z").unwrap_err();
        assert_eq!(err.code, RejectCode::CountError);
        assert_eq!(err.count, Some(13));

        let err = normalize("123m456m789m111z222z").unwrap_err();
        assert_eq!(err.count, Some(15));
    }
}
