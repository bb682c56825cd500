//! Seeded dice rolling: arbitrary `NdM±K` notation plus the d20 check helper
//! (advantage/disadvantage, crit detection) every other subsystem builds on.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiceError {
    #[error("invalid dice notation: {0}")]
    InvalidNotation(String),
    #[error("dice count must be between 1 and 100, got {0}")]
    CountOutOfRange(i64),
    #[error("die size must be between 2 and 1000, got {0}")]
    SidesOutOfRange(i64),
}

/// Advantage/disadvantage state for a d20 check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Advantage {
    Normal,
    Advantage,
    Disadvantage,
}

/// Result of a single `NdM±K` roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollResult {
    pub notation: String,
    pub rolls: Vec<i64>,
    pub modifier: i64,
    pub total: i64,
}

/// Result of a d20 ability/skill check, including advantage bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct D20Result {
    pub raw_dice: Vec<i64>,
    pub chosen: i64,
    pub modifier: i64,
    pub total: i64,
    pub nat20: bool,
    pub nat1: bool,
}

/// Per-session source of randomness. Seedable so tests and replays are
/// deterministic; the production path seeds from OS entropy.
pub struct Dice {
    rng: ChaCha8Rng,
}

impl Dice {
    /// Seed from OS entropy. Use for live sessions.
    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha8Rng::from_rng(&mut rand::rng()),
        }
    }

    /// Seed deterministically. Use for tests and the `RNG_SEED` env hook.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Roll `NdM±K` notation, e.g. `"2d6+3"`, `"1d20"`, `"4d6-1"`.
    pub fn roll(&mut self, notation: &str) -> Result<RollResult, DiceError> {
        let (count, sides, modifier) = parse_notation(notation)?;
        if !(1..=100).contains(&count) {
            return Err(DiceError::CountOutOfRange(count));
        }
        if !(2..=1000).contains(&sides) {
            return Err(DiceError::SidesOutOfRange(sides));
        }
        let rolls: Vec<i64> = (0..count).map(|_| self.rng.random_range(1..=sides)).collect();
        let total = rolls.iter().sum::<i64>() + modifier;
        Ok(RollResult {
            notation: notation.to_string(),
            rolls,
            modifier,
            total,
        })
    }

    /// Roll 4d6, drop the lowest die. Used for ability-score generation.
    pub fn roll_4d6_drop_lowest(&mut self) -> i64 {
        let mut rolls: Vec<i64> = (0..4).map(|_| self.rng.random_range(1..=6)).collect();
        rolls.sort_unstable();
        rolls[1..].iter().sum()
    }

    /// Roll a single die of `sides` faces.
    pub fn roll_die(&mut self, sides: i64) -> i64 {
        self.rng.random_range(1..=sides)
    }

    /// d20 check with a flat modifier and advantage state. Advantage rolls
    /// two d20s and keeps the higher; disadvantage keeps the lower.
    pub fn roll_d20(&mut self, modifier: i64, advantage: Advantage) -> D20Result {
        let raw_dice: Vec<i64> = match advantage {
            Advantage::Normal => vec![self.rng.random_range(1..=20)],
            Advantage::Advantage | Advantage::Disadvantage => vec![
                self.rng.random_range(1..=20),
                self.rng.random_range(1..=20),
            ],
        };
        let chosen = match advantage {
            Advantage::Normal => raw_dice[0],
            Advantage::Advantage => *raw_dice.iter().max().unwrap(),
            Advantage::Disadvantage => *raw_dice.iter().min().unwrap(),
        };
        D20Result {
            nat20: chosen == 20,
            nat1: chosen == 1,
            total: chosen + modifier,
            raw_dice,
            chosen,
            modifier,
        }
    }

    /// Roll `percent` in `[0.0, 1.0]` probability check, e.g. for spawn chances.
    pub fn chance(&mut self, percent: f64) -> bool {
        self.rng.random_range(0.0..1.0) < percent
    }

    /// Pick a uniformly random index in `0..len`. Panics if `len == 0`.
    pub fn pick_index(&mut self, len: usize) -> usize {
        self.rng.random_range(0..len)
    }
}

fn parse_notation(notation: &str) -> Result<(i64, i64, i64), DiceError> {
    let s = notation.trim();
    let (count_str, rest) = s
        .split_once('d')
        .ok_or_else(|| DiceError::InvalidNotation(notation.to_string()))?;
    let count: i64 = count_str
        .trim()
        .parse()
        .map_err(|_| DiceError::InvalidNotation(notation.to_string()))?;

    let (sides_str, modifier) = if let Some(idx) = rest.find(['+', '-']) {
        let (sides_part, sign_part) = rest.split_at(idx);
        let modifier: i64 = sign_part
            .trim()
            .replace(' ', "")
            .parse()
            .map_err(|_| DiceError::InvalidNotation(notation.to_string()))?;
        (sides_part, modifier)
    } else {
        (rest, 0)
    };
    let sides: i64 = sides_str
        .trim()
        .parse()
        .map_err(|_| DiceError::InvalidNotation(notation.to_string()))?;
    Ok((count, sides, modifier))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_notation() {
        let (count, sides, modifier) = parse_notation("2d6").unwrap();
        assert_eq!((count, sides, modifier), (2, 6, 0));
    }

    #[test]
    fn parses_notation_with_positive_modifier() {
        let (count, sides, modifier) = parse_notation("1d20+5").unwrap();
        assert_eq!((count, sides, modifier), (1, 20, 5));
    }

    #[test]
    fn parses_notation_with_negative_modifier() {
        let (count, sides, modifier) = parse_notation("4d6-1").unwrap();
        assert_eq!((count, sides, modifier), (4, 6, -1));
    }

    #[test]
    fn rejects_garbage_notation() {
        assert!(parse_notation("not-a-roll").is_err());
        assert!(parse_notation("d20").is_err());
    }

    #[test]
    fn roll_total_matches_sum_plus_modifier() {
        let mut dice = Dice::from_seed(42);
        let result = dice.roll("3d6+2").unwrap();
        assert_eq!(result.rolls.len(), 3);
        assert_eq!(result.total, result.rolls.iter().sum::<i64>() + 2);
        for r in &result.rolls {
            assert!((1..=6).contains(r));
        }
    }

    #[test]
    fn advantage_keeps_higher_die() {
        let mut dice = Dice::from_seed(1);
        for _ in 0..200 {
            let result = dice.roll_d20(0, Advantage::Advantage);
            assert_eq!(result.raw_dice.len(), 2);
            assert_eq!(result.chosen, *result.raw_dice.iter().max().unwrap());
        }
    }

    #[test]
    fn disadvantage_keeps_lower_die() {
        let mut dice = Dice::from_seed(2);
        for _ in 0..200 {
            let result = dice.roll_d20(0, Advantage::Disadvantage);
            assert_eq!(result.chosen, *result.raw_dice.iter().min().unwrap());
        }
    }

    #[test]
    fn nat20_and_nat1_detected() {
        let mut dice = Dice::from_seed(7);
        let mut saw_nat20 = false;
        let mut saw_nat1 = false;
        for _ in 0..2000 {
            let result = dice.roll_d20(0, Advantage::Normal);
            if result.chosen == 20 {
                assert!(result.nat20);
                saw_nat20 = true;
            }
            if result.chosen == 1 {
                assert!(result.nat1);
                saw_nat1 = true;
            }
        }
        assert!(saw_nat20 && saw_nat1);
    }

    #[test]
    fn drop_lowest_discards_minimum_of_four() {
        let mut dice = Dice::from_seed(3);
        for _ in 0..100 {
            let total = dice.roll_4d6_drop_lowest();
            assert!((3..=18).contains(&total));
        }
    }

    #[test]
    fn rejects_out_of_range_counts_and_sides() {
        let mut dice = Dice::from_seed(5);
        assert!(matches!(
            dice.roll("0d6"),
            Err(DiceError::CountOutOfRange(0))
        ));
        assert!(matches!(
            dice.roll("1d1"),
            Err(DiceError::SidesOutOfRange(1))
        ));
    }

    proptest::proptest! {
        #[test]
        fn roll_total_always_within_bounds(count in 1i64..20, sides in 2i64..20, modifier in -10i64..10) {
            let notation = if modifier >= 0 {
                format!("{count}d{sides}+{modifier}")
            } else {
                format!("{count}d{sides}{modifier}")
            };
            let mut dice = Dice::from_seed(99);
            let result = dice.roll(&notation).unwrap();
            let min = count + modifier;
            let max = count * sides + modifier;
            proptest::prop_assert!(result.total >= min && result.total <= max);
        }
    }
}
