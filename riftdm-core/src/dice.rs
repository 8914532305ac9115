//! Dice rolling for player actions.
//!
//! Supports the `<count>d<size>[+|-<modifier>]` formula grammar, a
//! degrade-to-zero path for formulas that fail to parse, and a bonus d20
//! clamped to the natural die range.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for dice formula parsing.
#[derive(Debug, Error)]
pub enum FormulaError {
    #[error("Invalid dice formula: {0}")]
    InvalidFormula(String),
    #[error("Dice count must be at least 1 (in {0})")]
    ZeroCount(String),
    #[error("Die size must be at least 1 (in {0})")]
    ZeroSides(String),
}

/// A parsed dice formula (e.g. 2d6+3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiceFormula {
    pub count: u32,
    pub sides: u32,
    pub modifier: i32,
    pub original: String,
}

impl DiceFormula {
    /// Parse a formula string.
    ///
    /// The grammar covers the whole string: trailing text after the
    /// modifier makes the formula invalid rather than being ignored.
    pub fn parse(formula: &str) -> Result<Self, FormulaError> {
        let invalid = || FormulaError::InvalidFormula(formula.to_string());

        let (count_str, rest) = formula.split_once('d').ok_or_else(invalid)?;
        let (sides_str, modifier) = match rest.find(|c: char| c == '+' || c == '-') {
            Some(pos) => {
                let magnitude = parse_digits(&rest[pos + 1..]).ok_or_else(invalid)?;
                let magnitude = i32::try_from(magnitude).map_err(|_| invalid())?;
                let sign = if rest.as_bytes()[pos] == b'+' { 1 } else { -1 };
                (&rest[..pos], sign * magnitude)
            }
            None => (rest, 0),
        };

        let count = parse_digits(count_str).ok_or_else(invalid)?;
        let sides = parse_digits(sides_str).ok_or_else(invalid)?;

        if count == 0 {
            return Err(FormulaError::ZeroCount(formula.to_string()));
        }
        if sides == 0 {
            return Err(FormulaError::ZeroSides(formula.to_string()));
        }

        Ok(DiceFormula {
            count,
            sides,
            modifier,
            original: formula.to_string(),
        })
    }

    /// Fold an extra bonus into the formula's modifier.
    pub fn with_bonus(mut self, bonus: i32) -> Self {
        self.modifier += bonus;
        self
    }

    /// Canonical notation for the current fields.
    pub fn notation(&self) -> String {
        match self.modifier {
            0 => format!("{}d{}", self.count, self.sides),
            m if m > 0 => format!("{}d{}+{m}", self.count, self.sides),
            m => format!("{}d{}{m}", self.count, self.sides),
        }
    }

    /// Roll the formula.
    pub fn roll(&self) -> RollResult {
        self.roll_with_rng(&mut rand::thread_rng())
    }

    /// Roll with a specific RNG (useful for testing).
    pub fn roll_with_rng<R: Rng>(&self, rng: &mut R) -> RollResult {
        let rolls: Vec<u32> = (0..self.count)
            .map(|_| rng.gen_range(1..=self.sides))
            .collect();
        let total = rolls.iter().sum::<u32>() as i32 + self.modifier;

        RollResult {
            formula: self.notation(),
            rolls,
            modifier: self.modifier,
            total,
        }
    }
}

impl FromStr for DiceFormula {
    type Err = FormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DiceFormula::parse(s)
    }
}

impl fmt::Display for DiceFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.original)
    }
}

fn parse_digits(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Outcome of resolving an action roll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollResult {
    /// Notation of the formula that produced this result.
    pub formula: String,
    /// Individual die outcomes; empty when the formula failed to parse.
    pub rolls: Vec<u32>,
    pub modifier: i32,
    pub total: i32,
}

impl RollResult {
    /// Zero-valued result for an unparseable formula.
    ///
    /// Callers always receive a usable integer; a bad formula is not an
    /// error.
    pub fn degraded(formula: impl Into<String>) -> Self {
        Self {
            formula: formula.into(),
            rolls: Vec::new(),
            modifier: 0,
            total: 0,
        }
    }

    /// True when this result came from the degrade path.
    pub fn is_degraded(&self) -> bool {
        self.rolls.is_empty()
    }
}

impl fmt::Display for RollResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_degraded() {
            return write!(f, "{} = 0 (unrecognized formula)", self.formula);
        }

        let dice = self
            .rolls
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        if self.modifier > 0 {
            write!(f, "[{dice}] + {} = {}", self.modifier, self.total)
        } else if self.modifier < 0 {
            write!(f, "[{dice}] - {} = {}", self.modifier.abs(), self.total)
        } else {
            write!(f, "[{dice}] = {}", self.total)
        }
    }
}

/// Roll a formula string, degrading to a zero result if it does not parse.
pub fn roll_or_zero(formula: &str) -> RollResult {
    roll_or_zero_with_rng(formula, &mut rand::thread_rng())
}

/// Degrade-to-zero roll with a specific RNG.
pub fn roll_or_zero_with_rng<R: Rng>(formula: &str, rng: &mut R) -> RollResult {
    match DiceFormula::parse(formula) {
        Ok(parsed) => parsed.roll_with_rng(rng),
        Err(_) => RollResult::degraded(formula),
    }
}

/// Roll a d20 with a bonus, clamped to the natural die range.
///
/// A large bonus cannot push the shown roll past 20, nor a penalty below 1.
pub fn bonus_d20(bonus: i32) -> i32 {
    bonus_d20_with_rng(bonus, &mut rand::thread_rng())
}

/// Clamped bonus d20 with a specific RNG.
pub fn bonus_d20_with_rng<R: Rng>(bonus: i32, rng: &mut R) -> i32 {
    rng.gen_range(1..=20i32).saturating_add(bonus).clamp(1, 20)
}
