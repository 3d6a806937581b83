//! Core value types for the guess engine: tiles, winds, rule context,
//! feedback colors and the rejection taxonomy.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A complete hand is always exactly 14 tiles: 13 held plus the winning tile.
pub const HAND_TILES: usize = 14;

/// Distinct tile kinds: three number suits ranked 1-9 plus seven honors.
pub const TILE_KINDS: usize = 34;

/// The four tile suits of the one-line notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Suit {
    Man,
    Pin,
    Sou,
    Honor,
}

impl Suit {
    /// Canonical notation letter for this suit.
    pub fn letter(self) -> char {
        match self {
            Suit::Man => 'm',
            Suit::Pin => 'p',
            Suit::Sou => 's',
            Suit::Honor => 'z',
        }
    }

    /// Number of ranks in this suit (9 for number suits, 7 for honors).
    pub fn rank_count(self) -> u8 {
        match self {
            Suit::Honor => 7,
            _ => 9,
        }
    }

    /// Offset of this suit's first rank in the 34-kind ordinal space.
    pub fn offset(self) -> usize {
        match self {
            Suit::Man => 0,
            Suit::Pin => 9,
            Suit::Sou => 18,
            Suit::Honor => 27,
        }
    }

    /// Maps a notation letter to its suit. `h` is an accepted alias for the
    /// honor suit at the input boundary; encoding always emits `z`.
    pub fn from_letter(ch: char) -> Option<Suit> {
        match ch {
            'm' => Some(Suit::Man),
            'p' => Some(Suit::Pin),
            's' => Some(Suit::Sou),
            'z' | 'h' => Some(Suit::Honor),
            _ => None,
        }
    }
}

/// One playing piece. Equality and hashing are by (suit, rank); the rank is
/// always within the suit's cardinality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Tile {
    suit: Suit,
    rank: u8,
}

impl Tile {
    /// Builds a tile, rejecting ranks outside the suit's cardinality.
    pub fn new(suit: Suit, rank: u8) -> Option<Tile> {
        if rank >= 1 && rank <= suit.rank_count() {
            Some(Tile { suit, rank })
        } else {
            None
        }
    }

    pub fn suit(self) -> Suit {
        self.suit
    }

    pub fn rank(self) -> u8 {
        self.rank
    }

    /// Index of this tile kind in `0..TILE_KINDS`.
    pub fn ordinal(self) -> usize {
        self.suit.offset() + (self.rank - 1) as usize
    }

    /// Inverse of [`Tile::ordinal`].
    pub fn from_ordinal(ordinal: usize) -> Option<Tile> {
        let suit = match ordinal {
            0..=8 => Suit::Man,
            9..=17 => Suit::Pin,
            18..=26 => Suit::Sou,
            27..=33 => Suit::Honor,
            _ => return None,
        };
        Tile::new(suit, (ordinal - suit.offset()) as u8 + 1)
    }

    /// A terminal (1 or 9 of a number suit) or any honor.
    pub fn is_terminal_or_honor(self) -> bool {
        self.suit == Suit::Honor || self.rank == 1 || self.rank == 9
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank, self.suit.letter())
    }
}

impl From<Tile> for String {
    fn from(tile: Tile) -> String {
        tile.to_string()
    }
}

impl TryFrom<String> for Tile {
    type Error = String;

    fn try_from(value: String) -> Result<Tile, String> {
        let mut chars = value.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(digit), Some(letter), None) => {
                let rank = digit
                    .to_digit(10)
                    .ok_or_else(|| format!("invalid tile token: {value}"))?
                    as u8;
                let suit = Suit::from_letter(letter)
                    .ok_or_else(|| format!("invalid tile token: {value}"))?;
                Tile::new(suit, rank).ok_or_else(|| format!("rank out of range: {value}"))
            }
            _ => Err(format!("invalid tile token: {value}")),
        }
    }
}

/// Round or seat wind, ranked 1-4 in the bank's wind codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Wind {
    East,
    South,
    West,
    North,
}

impl Wind {
    pub fn from_rank(rank: u8) -> Option<Wind> {
        match rank {
            1 => Some(Wind::East),
            2 => Some(Wind::South),
            3 => Some(Wind::West),
            4 => Some(Wind::North),
            _ => None,
        }
    }

    pub fn rank(self) -> u8 {
        match self {
            Wind::East => 1,
            Wind::South => 2,
            Wind::West => 3,
            Wind::North => 4,
        }
    }

    /// The honor tile carrying this wind.
    pub fn tile(self) -> Tile {
        Tile {
            suit: Suit::Honor,
            rank: self.rank(),
        }
    }
}

/// Scoring variant: selects which oracle ruleset and display table apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleVariant {
    Riichi,
    Guobiao,
}

impl RuleVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            RuleVariant::Riichi => "riichi",
            RuleVariant::Guobiao => "guobiao",
        }
    }

    pub fn parse(raw: &str) -> Option<RuleVariant> {
        match raw {
            "riichi" => Some(RuleVariant::Riichi),
            "guobiao" => Some(RuleVariant::Guobiao),
            _ => None,
        }
    }
}

/// Fixed per-session parameters passed unchanged to every legality check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleContext {
    pub round_wind: Wind,
    pub seat_wind: Wind,
    pub self_draw: bool,
    pub variant: RuleVariant,
}

/// Per-position feedback color, analogous to Wordle's green/yellow/gray.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feedback {
    Exact,
    Present,
    Absent,
}

impl Feedback {
    pub fn as_str(self) -> &'static str {
        match self {
            Feedback::Exact => "exact",
            Feedback::Present => "present",
            Feedback::Absent => "absent",
        }
    }
}

/// Why a submission was rejected. Everything except `SessionNotFound` is
/// recoverable: the caller lets the player retry at no state cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectCode {
    FormatError,
    CountError,
    NotWinningHand,
    NoScoringElement,
    GameFinished,
    SessionNotFound,
}

impl RejectCode {
    pub fn as_str(self) -> &'static str {
        match self {
            RejectCode::FormatError => "FORMAT_ERROR",
            RejectCode::CountError => "COUNT_ERROR",
            RejectCode::NotWinningHand => "NOT_WINNING_HAND",
            RejectCode::NoScoringElement => "NO_SCORING_ELEMENT",
            RejectCode::GameFinished => "GAME_FINISHED",
            RejectCode::SessionNotFound => "SESSION_NOT_FOUND",
        }
    }
}

/// A structured rejection: code, human-readable message and, for
/// `COUNT_ERROR`, the decoded tile count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rejection {
    pub code: RejectCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl Rejection {
    pub fn new(code: RejectCode, message: impl Into<String>) -> Rejection {
        Rejection {
            code,
            message: message.into(),
            count: None,
        }
    }

    pub fn format(message: impl Into<String>) -> Rejection {
        Rejection::new(RejectCode::FormatError, message)
    }

    pub fn count(found: usize) -> Rejection {
        Rejection {
            code: RejectCode::CountError,
            message: format!("expected 14 tiles, got {found}"),
            count: Some(found),
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}
