//! Hand bank: the data source that supplies secret hands. One puzzle per
//! line, inherited format:
//!
//! ```text
//! <13 tiles, fully expanded><'+' if won by discard><winning tile>+<round><seat>
//! ```
//!
//! e.g. `1m2m3m4p5p6p7s8s9s1z1z1z2z+2z+12` — discard win on 2z, round wind
//! east, seat wind south. No `+` before the winning tile means self-draw.
//! The bank only selects; it never invents or validates rules — the oracle
//! does that at session creation.

use std::path::Path;

use rand::Rng;

use crate::engine::codec;
use crate::engine::models::{Tile, Wind};

/// 13 expanded tiles at two characters each.
const HELD_CHARS: usize = 26;

/// One puzzle: 14 tiles (winning tile last) plus its table context.
#[derive(Debug, Clone, PartialEq)]
pub struct BankEntry {
    pub tiles: Vec<Tile>,
    pub self_draw: bool,
    pub round_wind: Wind,
    pub seat_wind: Wind,
}

/// Parses one bank line.
pub fn parse_bank_line(line: &str) -> Result<BankEntry, String> {
    let line = line.trim();
    if !line.is_ascii() {
        return Err("bank line must be ASCII".into());
    }
    if line.len() < HELD_CHARS + 5 {
        return Err(format!("bank line too short: {line}"));
    }

    let (core, winds) = line.split_at(line.len() - 3);
    let wind_digits = winds
        .strip_prefix('+')
        .ok_or_else(|| format!("bank line missing wind suffix: {line}"))?;
    let mut digits = wind_digits.chars().filter_map(|c| c.to_digit(10));
    let round_wind = digits
        .next()
        .and_then(|d| Wind::from_rank(d as u8))
        .ok_or_else(|| format!("bad round wind in bank line: {line}"))?;
    let seat_wind = digits
        .next()
        .and_then(|d| Wind::from_rank(d as u8))
        .ok_or_else(|| format!("bad seat wind in bank line: {line}"))?;

    // Self-draw wins run the winning tile straight on; discard wins separate
    // it with a '+'.
    let (held_text, win_text, self_draw) = if core.len() == HELD_CHARS + 2 {
        (&core[..HELD_CHARS], &core[HELD_CHARS..], true)
    } else if core.len() == HELD_CHARS + 3 && core.as_bytes()[HELD_CHARS] == b'+' {
        (&core[..HELD_CHARS], &core[HELD_CHARS + 1..], false)
    } else {
        return Err(format!("malformed hand body in bank line: {line}"));
    };

    let held = codec::decode(held_text).map_err(|err| format!("bad held tiles: {err}"))?;
    if held.len() != 13 {
        return Err(format!("expected 13 held tiles, got {}", held.len()));
    }
    let win = codec::decode(win_text).map_err(|err| format!("bad winning tile: {err}"))?;
    if win.len() != 1 {
        return Err(format!("expected 1 winning tile, got {}", win.len()));
    }

    let mut tiles = held;
    tiles.extend(win);
    Ok(BankEntry {
        tiles,
        self_draw,
        round_wind,
        seat_wind,
    })
}

/// All entries of one bank file, in file order.
#[derive(Debug)]
pub struct HandBank {
    entries: Vec<BankEntry>,
}

impl HandBank {
    /// Parses bank text; blank lines are skipped, malformed lines are
    /// reported with their line number.
    pub fn parse(content: &str) -> Result<HandBank, String> {
        let mut entries = Vec::new();
        for (idx, raw) in content.lines().enumerate() {
            if raw.trim().is_empty() {
                continue;
            }
            let entry =
                parse_bank_line(raw).map_err(|err| format!("line {}: {err}", idx + 1))?;
            entries.push(entry);
        }
        if entries.is_empty() {
            return Err("hand bank is empty".into());
        }
        Ok(HandBank { entries })
    }

    pub fn load(path: &Path) -> Result<HandBank, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|err| format!("failed to read {}: {err}", path.display()))?;
        HandBank::parse(&content)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&BankEntry> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[BankEntry] {
        &self.entries
    }

    /// Returns the requested entry, or a random one when `index` is absent.
    pub fn pick(&self, index: Option<usize>) -> Result<(usize, &BankEntry), String> {
        let idx = match index {
            Some(idx) => {
                if idx >= self.entries.len() {
                    return Err(format!(
                        "hand index {idx} out of range (bank holds {})",
                        self.entries.len()
                    ));
                }
                idx
            }
            None => rand::thread_rng().gen_range(0..self.entries.len()),
        };
        Ok((idx, &self.entries[idx]))
    }
}
