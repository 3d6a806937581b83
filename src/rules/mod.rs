//! Legality-oracle implementations plus the injected display tables that
//! turn stable term ids into user-facing text. Tables are immutable values
//! handed to the server at startup, never module-global mutable state, so
//! several variants can serve concurrently without cross-talk.

pub mod decompose;
pub mod guobiao;
pub mod riichi;

use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::Lazy;
use serde::Deserialize;

use crate::engine::models::{RuleVariant, Wind};
use crate::engine::oracle::EvaluatorRegistry;

/// Registry holding every shipped evaluator.
pub fn default_registry() -> EvaluatorRegistry {
    let mut registry = EvaluatorRegistry::new();
    registry.register(Box::new(riichi::RiichiEvaluator));
    registry.register(Box::new(guobiao::GuobiaoEvaluator));
    registry
}

/// Display strings for one variant: term names, terms never shown in hints,
/// and the unit of the scoring total ("han"/"fan").
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleTable {
    #[serde(default)]
    pub value_unit: String,
    #[serde(default)]
    pub hidden_terms: Vec<String>,
    #[serde(default)]
    pub terms: HashMap<String, String>,
}

/// All display tables plus shared labels. Loadable from TOML; unknown term
/// ids fall back to their raw id rather than failing.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleTables {
    #[serde(default = "default_winds")]
    pub winds: [String; 4],
    #[serde(default = "default_self_draw")]
    pub self_draw: String,
    #[serde(default = "default_discard")]
    pub discard: String,
    #[serde(default)]
    pub variants: HashMap<String, RuleTable>,
}

fn default_winds() -> [String; 4] {
    ["East", "South", "West", "North"].map(String::from)
}

fn default_self_draw() -> String {
    "self-draw".into()
}

fn default_discard() -> String {
    "discard".into()
}

static EMPTY_TABLE: Lazy<RuleTable> = Lazy::new(RuleTable::default);

static BUILTIN: Lazy<RuleTables> = Lazy::new(builtin_tables);

fn term_map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(id, name)| (id.to_string(), name.to_string()))
        .collect()
}

fn builtin_tables() -> RuleTables {
    let mut variants = HashMap::new();
    variants.insert(
        "riichi".to_string(),
        RuleTable {
            value_unit: "han".into(),
            hidden_terms: vec!["menzen_tsumo".into()],
            terms: term_map(&[
                ("menzen_tsumo", "Menzen Tsumo"),
                ("tanyao", "Tanyao"),
                ("yakuhai_haku", "Yakuhai Haku"),
                ("yakuhai_hatsu", "Yakuhai Hatsu"),
                ("yakuhai_chun", "Yakuhai Chun"),
                ("seat_wind", "Seat Wind"),
                ("round_wind", "Round Wind"),
                ("iipeiko", "Iipeiko"),
                ("ittsuu", "Ittsuu"),
                ("toitoi", "Toitoi"),
                ("honitsu", "Honitsu"),
                ("chinitsu", "Chinitsu"),
                ("chiitoitsu", "Chiitoitsu"),
                ("kokushi_musou", "Kokushi Musou"),
                ("daisangen", "Daisangen"),
            ]),
        },
    );
    variants.insert(
        "guobiao".to_string(),
        RuleTable {
            value_unit: "fan".into(),
            hidden_terms: vec!["concealed_hand".into(), "fully_concealed_hand".into()],
            terms: term_map(&[
                ("all_simples", "All Simples"),
                ("dragon_pung_haku", "Dragon Pung (White)"),
                ("dragon_pung_hatsu", "Dragon Pung (Green)"),
                ("dragon_pung_chun", "Dragon Pung (Red)"),
                ("prevalent_wind", "Prevalent Wind"),
                ("seat_wind", "Seat Wind"),
                ("all_pungs", "All Pungs"),
                ("pure_straight", "Pure Straight"),
                ("full_flush", "Full Flush"),
                ("half_flush", "Half Flush"),
                ("seven_pairs", "Seven Pairs"),
                ("thirteen_orphans", "Thirteen Orphans"),
                ("concealed_hand", "Concealed Hand"),
                ("fully_concealed_hand", "Fully Concealed Hand"),
            ]),
        },
    );
    RuleTables {
        winds: default_winds(),
        self_draw: default_self_draw(),
        discard: default_discard(),
        variants,
    }
}

impl RuleTables {
    /// The compiled-in default tables.
    pub fn builtin() -> &'static RuleTables {
        &BUILTIN
    }

    /// Loads tables from a TOML file, replacing the built-ins wholesale.
    pub fn load(path: &Path) -> Result<RuleTables, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|err| format!("failed to read {}: {err}", path.display()))?;
        toml::from_str(&content).map_err(|err| format!("failed to parse {}: {err}", path.display()))
    }

    pub fn table(&self, variant: RuleVariant) -> &RuleTable {
        self.variants.get(variant.as_str()).unwrap_or(&EMPTY_TABLE)
    }

    pub fn term_name<'a>(&'a self, variant: RuleVariant, id: &'a str) -> &'a str {
        self.table(variant)
            .terms
            .get(id)
            .map(String::as_str)
            .unwrap_or(id)
    }

    pub fn wind_name(&self, wind: Wind) -> &str {
        &self.winds[(wind.rank() - 1) as usize]
    }

    pub fn draw_name(&self, self_draw: bool) -> &str {
        if self_draw {
            &self.self_draw
        } else {
            &self.discard
        }
    }

    /// Space-joined display names of the visible terms.
    pub fn terms_tip(&self, variant: RuleVariant, terms: &[String]) -> String {
        let table = self.table(variant);
        terms
            .iter()
            .filter(|id| !table.hidden_terms.contains(id))
            .map(|id| self.term_name(variant, id))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// E.g. "2 han" or "24 fan".
    pub fn value_tip(&self, variant: RuleVariant, value: u32) -> String {
        let unit = &self.table(variant).value_unit;
        if unit.is_empty() {
            value.to_string()
        } else {
            format!("{value} {unit}")
        }
    }
}
