use serde::{Deserialize, Serialize};

use hollowmere_content::QuestType;

/// Per-session NPC attitude toward the player, clamped to `[-100, 100]`.
/// Every trade-eligibility and price-multiplier rule is a pure function of
/// this one value, so §4.E and §4.F share one source of truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Disposition(i32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispositionTier {
    Hostile,
    Unfriendly,
    Neutral,
    Friendly,
    Trusted,
}

impl Disposition {
    pub const MIN: i32 = -100;
    pub const MAX: i32 = 100;

    pub fn new(value: i32) -> Self {
        Disposition(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn value(&self) -> i32 {
        self.0
    }

    pub fn apply(&mut self, delta: i32) {
        self.0 = (self.0 + delta).clamp(Self::MIN, Self::MAX);
    }

    pub fn tier(&self) -> DispositionTier {
        match self.0 {
            v if v < -50 => DispositionTier::Hostile,
            v if v < -10 => DispositionTier::Unfriendly,
            v if v <= 10 => DispositionTier::Neutral,
            v if v <= 50 => DispositionTier::Friendly,
            _ => DispositionTier::Trusted,
        }
    }

    pub fn can_trade(&self) -> bool {
        self.tier() != DispositionTier::Hostile
    }

    /// Merchant price multiplier by tier: 0.8/0.9/1.0/1.25/∞ for
    /// trusted/friendly/neutral/unfriendly/hostile respectively.
    pub fn price_modifier(&self) -> f64 {
        match self.tier() {
            DispositionTier::Hostile => f64::INFINITY,
            DispositionTier::Unfriendly => 1.25,
            DispositionTier::Neutral => 1.0,
            DispositionTier::Friendly => 0.9,
            DispositionTier::Trusted => 0.8,
        }
    }
}

impl Default for Disposition {
    fn default() -> Self {
        Disposition(0)
    }
}

pub const BUY_OR_SELL_DELTA: i32 = 1;
pub const HAGGLE_SUCCESS_DELTA: i32 = 2;
pub const HAGGLE_FAIL_DELTA: i32 = -5;
pub const STEAL_FAILURE_DELTA: i32 = -30;
pub const STEAL_CRITICAL_FAILURE_DELTA: i32 = -50;

/// Gift-value disposition bands (Open Question #4, resolved band-wise rather
/// than linearly): `0..10 -> +5`, `10..50 -> +10`, `50..200 -> +15`, `200.. -> +20`.
pub fn gift_delta(item_value: u32) -> i32 {
    match item_value {
        0..=9 => 5,
        10..=49 => 10,
        50..=199 => 15,
        _ => 20,
    }
}

/// Quest-completion disposition delta for the giver NPC, by quest type.
pub fn quest_complete_delta(quest_type: QuestType) -> i32 {
    match quest_type {
        QuestType::Main => 25,
        QuestType::Side => 15,
        QuestType::Minor => 10,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_to_range() {
        let mut d = Disposition::new(95);
        d.apply(50);
        assert_eq!(d.value(), 100);
        let mut d = Disposition::new(-95);
        d.apply(-50);
        assert_eq!(d.value(), -100);
    }

    #[test]
    fn tiers_match_the_spec_table() {
        assert_eq!(Disposition::new(-60).tier(), DispositionTier::Hostile);
        assert_eq!(Disposition::new(-20).tier(), DispositionTier::Unfriendly);
        assert_eq!(Disposition::new(0).tier(), DispositionTier::Neutral);
        assert_eq!(Disposition::new(30).tier(), DispositionTier::Friendly);
        assert_eq!(Disposition::new(75).tier(), DispositionTier::Trusted);
    }

    #[test]
    fn hostile_cannot_trade_and_has_infinite_price() {
        let d = Disposition::new(-80);
        assert!(!d.can_trade());
        assert!(d.price_modifier().is_infinite());
    }

    #[test]
    fn gift_bands_step_rather_than_scale_linearly() {
        assert_eq!(gift_delta(0), 5);
        assert_eq!(gift_delta(9), 5);
        assert_eq!(gift_delta(10), 10);
        assert_eq!(gift_delta(49), 10);
        assert_eq!(gift_delta(50), 15);
        assert_eq!(gift_delta(200), 20);
    }

    #[test]
    fn quest_complete_delta_by_type() {
        assert_eq!(quest_complete_delta(QuestType::Main), 25);
        assert_eq!(quest_complete_delta(QuestType::Side), 15);
        assert_eq!(quest_complete_delta(QuestType::Minor), 10);
    }
}
