use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use hollowmere_content::{Npc, QuestType, Scenario, Stock};
use hollowmere_dice::Dice;

use crate::disposition::{
    gift_delta, quest_complete_delta, Disposition, DispositionTier, BUY_OR_SELL_DELTA,
    HAGGLE_FAIL_DELTA, HAGGLE_SUCCESS_DELTA, STEAL_CRITICAL_FAILURE_DELTA, STEAL_FAILURE_DELTA,
};
use crate::error::NpcError;

/// Per-session runtime state for one NPC: disposition, live stock (a mutable
/// copy of the content-defined `shop_inventory`), this-visit haggle discount,
/// and traveling-merchant spawn bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpcRuntime {
    pub disposition: Disposition,
    pub stock: HashMap<String, Stock>,
    /// Multiplier applied on top of the normal price for the remainder of
    /// this shop visit: `0.8` after a successful haggle, `1.10` after a
    /// failed one, reset to `1.0` once the player leaves the shop.
    pub haggle_factor: f64,
    pub present_location: Option<String>,
    pub turns_since_rotation: u32,
}

impl NpcRuntime {
    fn from_content(npc: &Npc) -> Self {
        NpcRuntime {
            disposition: Disposition::default(),
            stock: npc.shop_inventory.clone(),
            haggle_factor: 1.0,
            present_location: if npc.traveling.is_some() {
                None
            } else {
                Some(npc.location_id.clone())
            },
            turns_since_rotation: 0,
        }
    }
}

/// Per-session registry of NPC runtime state, keyed by the NPC's stable
/// content ID. Content (`Npc`) itself never mutates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpcRegistry {
    runtimes: HashMap<String, NpcRuntime>,
}

impl NpcRegistry {
    pub fn new(scenario: &Scenario) -> Self {
        let runtimes = scenario
            .npcs
            .values()
            .map(|npc| (npc.id.clone(), NpcRuntime::from_content(npc)))
            .collect();
        NpcRegistry { runtimes }
    }

    fn runtime(&self, npc_id: &str) -> Result<&NpcRuntime, NpcError> {
        self.runtimes
            .get(npc_id)
            .ok_or_else(|| NpcError::UnknownNpc(npc_id.to_string()))
    }

    fn runtime_mut(&mut self, npc_id: &str) -> Result<&mut NpcRuntime, NpcError> {
        self.runtimes
            .get_mut(npc_id)
            .ok_or_else(|| NpcError::UnknownNpc(npc_id.to_string()))
    }

    pub fn disposition(&self, npc_id: &str) -> Result<Disposition, NpcError> {
        Ok(self.runtime(npc_id)?.disposition)
    }

    pub fn tier(&self, npc_id: &str) -> Result<DispositionTier, NpcError> {
        Ok(self.runtime(npc_id)?.disposition.tier())
    }

    pub fn can_trade(&self, npc_id: &str) -> Result<bool, NpcError> {
        Ok(self.runtime(npc_id)?.disposition.can_trade())
    }

    pub fn price_modifier(&self, npc_id: &str) -> Result<f64, NpcError> {
        Ok(self.runtime(npc_id)?.disposition.price_modifier())
    }

    pub fn haggle_factor(&self, npc_id: &str) -> Result<f64, NpcError> {
        Ok(self.runtime(npc_id)?.haggle_factor)
    }

    pub fn modify_disposition(&mut self, npc_id: &str, delta: i32) -> Result<Disposition, NpcError> {
        let runtime = self.runtime_mut(npc_id)?;
        runtime.disposition.apply(delta);
        debug!(npc_id, delta, new = runtime.disposition.value(), "disposition changed");
        Ok(runtime.disposition)
    }

    pub fn record_trade(&mut self, npc_id: &str) -> Result<(), NpcError> {
        self.modify_disposition(npc_id, BUY_OR_SELL_DELTA)?;
        Ok(())
    }

    pub fn haggle_success(&mut self, npc_id: &str) -> Result<(), NpcError> {
        self.modify_disposition(npc_id, HAGGLE_SUCCESS_DELTA)?;
        self.runtime_mut(npc_id)?.haggle_factor = 0.8;
        Ok(())
    }

    pub fn haggle_fail(&mut self, npc_id: &str) -> Result<(), NpcError> {
        self.modify_disposition(npc_id, HAGGLE_FAIL_DELTA)?;
        self.runtime_mut(npc_id)?.haggle_factor = 1.10;
        Ok(())
    }

    /// Resets the haggle discount/penalty, called when the player leaves a
    /// shop's presence (new location, or combat interrupts the visit).
    pub fn reset_visit(&mut self, npc_id: &str) -> Result<(), NpcError> {
        self.runtime_mut(npc_id)?.haggle_factor = 1.0;
        Ok(())
    }

    pub fn gift(&mut self, npc_id: &str, item_value: u32) -> Result<i32, NpcError> {
        let delta = gift_delta(item_value);
        self.modify_disposition(npc_id, delta)?;
        Ok(delta)
    }

    pub fn quest_completed(&mut self, npc_id: &str, quest_type: QuestType) -> Result<i32, NpcError> {
        let delta = quest_complete_delta(quest_type);
        self.modify_disposition(npc_id, delta)?;
        Ok(delta)
    }

    pub fn steal_failure(&mut self, npc_id: &str, critical: bool) -> Result<(), NpcError> {
        let delta = if critical {
            STEAL_CRITICAL_FAILURE_DELTA
        } else {
            STEAL_FAILURE_DELTA
        };
        self.modify_disposition(npc_id, delta)?;
        Ok(())
    }

    pub fn stock_of(&self, npc_id: &str, item_id: &str) -> Result<Stock, NpcError> {
        Ok(self
            .runtime(npc_id)?
            .stock
            .get(item_id)
            .copied()
            .unwrap_or(Stock::Finite(0)))
    }

    /// Decrements `item_id` stock by `qty`. No-op (succeeds) for infinite
    /// stock. Fails if stock is insufficient.
    pub fn decrement_stock(&mut self, npc_id: &str, item_id: &str, qty: u32) -> Result<(), NpcError> {
        let runtime = self.runtime_mut(npc_id)?;
        match runtime.stock.get_mut(item_id) {
            Some(Stock::Infinite) | None => Ok(()),
            Some(Stock::Finite(n)) => {
                if *n < qty {
                    return Err(NpcError::MissingItem);
                }
                *n -= qty;
                Ok(())
            }
        }
    }

    pub fn present_location(&self, npc_id: &str) -> Result<Option<&str>, NpcError> {
        Ok(self.runtime(npc_id)?.present_location.as_deref())
    }

    /// NPC ids currently physically present at `location_id`: every NPC whose
    /// static `location_id` matches, plus any traveling merchant spawned
    /// there this session.
    pub fn npcs_at<'a>(&self, location_id: &str, scenario: &'a Scenario) -> Vec<&'a Npc> {
        scenario
            .npcs
            .values()
            .filter(|npc| {
                self.runtimes
                    .get(&npc.id)
                    .and_then(|r| r.present_location.as_deref())
                    == Some(location_id)
            })
            .collect()
    }

    /// Rolls traveling-merchant spawn chance for every NPC tagged
    /// `is_traveling` when the player enters `location_id`. A spawned
    /// merchant rotates its stock uniformly from `inventory_pool` and stays
    /// until `cooldown_turns` pass, at which point it is eligible to roll
    /// again (and may relocate or vanish).
    pub fn tick_traveling_merchants(
        &mut self,
        location_id: &str,
        scenario: &Scenario,
        dice: &mut Dice,
    ) {
        for npc in scenario.npcs.values() {
            let Some(traveling) = &npc.traveling else {
                continue;
            };
            if !traveling.is_traveling || !traveling.possible_locations.iter().any(|l| l == location_id) {
                continue;
            }
            let Some(runtime) = self.runtimes.get_mut(&npc.id) else {
                continue;
            };
            runtime.turns_since_rotation += 1;
            if runtime.present_location.as_deref() == Some(location_id) {
                continue;
            }
            if runtime.turns_since_rotation < traveling.cooldown_turns {
                continue;
            }
            if dice.chance(traveling.spawn_chance) {
                runtime.present_location = Some(location_id.to_string());
                runtime.turns_since_rotation = 0;
                if !traveling.inventory_pool.is_empty() {
                    let picked = &traveling.inventory_pool[dice.pick_index(traveling.inventory_pool.len())];
                    runtime.stock = HashMap::from([(picked.clone(), Stock::Finite(5))]);
                }
                info!(npc = %npc.id, location = %location_id, "traveling merchant spawned");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hollowmere_content::ContentCatalog;

    fn scenario() -> Scenario {
        ContentCatalog::bundled().scenario("goblin_cave").unwrap().clone()
    }

    #[test]
    fn fresh_registry_starts_neutral() {
        let registry = NpcRegistry::new(&scenario());
        assert_eq!(registry.disposition("gavin").unwrap().value(), 0);
        assert!(registry.can_trade("gavin").unwrap());
    }

    #[test]
    fn haggle_success_sets_discount_and_raises_disposition() {
        let mut registry = NpcRegistry::new(&scenario());
        registry.haggle_success("gavin").unwrap();
        assert_eq!(registry.disposition("gavin").unwrap().value(), 2);
        assert_eq!(registry.haggle_factor("gavin").unwrap(), 0.8);
    }

    #[test]
    fn haggle_failure_sets_penalty_and_lowers_disposition() {
        let mut registry = NpcRegistry::new(&scenario());
        registry.haggle_fail("gavin").unwrap();
        assert_eq!(registry.disposition("gavin").unwrap().value(), -5);
        assert_eq!(registry.haggle_factor("gavin").unwrap(), 1.10);
    }

    #[test]
    fn disposition_that_goes_hostile_blocks_trade() {
        let mut registry = NpcRegistry::new(&scenario());
        for _ in 0..11 {
            registry.steal_failure("gavin", false).unwrap();
        }
        assert!(!registry.can_trade("gavin").unwrap());
    }

    #[test]
    fn unknown_npc_errors() {
        let registry = NpcRegistry::new(&scenario());
        assert!(matches!(
            registry.disposition("nobody"),
            Err(NpcError::UnknownNpc(_))
        ));
    }

    #[test]
    fn decrement_stock_respects_finite_supply() {
        let mut registry = NpcRegistry::new(&scenario());
        assert!(registry.decrement_stock("gavin", "healing_potion", 3).is_ok());
        assert!(matches!(registry.stock_of("gavin", "healing_potion").unwrap(), Stock::Finite(7)));
        assert!(registry.decrement_stock("gavin", "healing_potion", 999).is_err());
    }
}
