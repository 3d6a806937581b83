//! Lints a hand bank file: every line must parse, stay within four copies
//! per tile kind, and evaluate as a scoring winning hand under the chosen
//! variant. Exits nonzero when any line fails, for use in data CI.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use mahjong_handle_engine::bank::parse_bank_line;
use mahjong_handle_engine::engine::models::{RuleContext, RuleVariant, TILE_KINDS};
use mahjong_handle_engine::engine::oracle::HandEvaluator;
use mahjong_handle_engine::rules::decompose::counts_of;
use mahjong_handle_engine::rules::default_registry;

#[derive(Parser)]
#[command(name = "validate_bank", about = "Validate a hand bank file")]
struct Cli {
    /// Hand bank file to check
    #[arg(default_value = "hands.txt")]
    path: PathBuf,

    /// Variant whose oracle must accept every hand
    #[arg(long, default_value = "riichi")]
    variant: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let variant = match RuleVariant::parse(&cli.variant) {
        Some(v) => v,
        None => {
            eprintln!("unknown rule variant: {}", cli.variant);
            return ExitCode::FAILURE;
        }
    };
    let registry = default_registry();
    let evaluator = match registry.get(variant) {
        Some(e) => e,
        None => {
            eprintln!("no evaluator for variant: {}", cli.variant);
            return ExitCode::FAILURE;
        }
    };

    let content = match std::fs::read_to_string(&cli.path) {
        Ok(content) => content,
        Err(err) => {
            eprintln!("failed to read {}: {err}", cli.path.display());
            return ExitCode::FAILURE;
        }
    };

    let mut total = 0usize;
    let mut errors: Vec<String> = Vec::new();

    for (idx, raw) in content.lines().enumerate() {
        let line_no = idx + 1;
        if raw.trim().is_empty() {
            continue;
        }
        total += 1;

        let entry = match parse_bank_line(raw) {
            Ok(entry) => entry,
            Err(err) => {
                errors.push(format!("line {line_no}: {err}"));
                continue;
            }
        };

        let counts = counts_of(&entry.tiles);
        if let Some(kind) = (0..TILE_KINDS).find(|&k| counts[k] > 4) {
            errors.push(format!(
                "line {line_no}: tile kind {kind} appears {} times",
                counts[kind]
            ));
            continue;
        }

        let context = RuleContext {
            round_wind: entry.round_wind,
            seat_wind: entry.seat_wind,
            self_draw: entry.self_draw,
            variant,
        };
        let winning_tile = entry.tiles[entry.tiles.len() - 1];
        match evaluator.evaluate(&entry.tiles, winning_tile, &context) {
            Ok(eval) if eval.winning && eval.value > 0 => {}
            Ok(eval) if eval.winning => {
                errors.push(format!("line {line_no}: winning hand has no scoring element"));
            }
            Ok(_) => {
                errors.push(format!("line {line_no}: not a winning hand"));
            }
            Err(err) => {
                errors.push(format!("line {line_no}: evaluation failed: {err}"));
            }
        }
    }

    for err in &errors {
        eprintln!("{err}");
    }
    println!(
        "{}: {total} hands checked, {} bad ({})",
        cli.path.display(),
        errors.len(),
        variant.as_str()
    );

    if errors.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
