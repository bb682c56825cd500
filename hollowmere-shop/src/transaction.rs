use serde::{Deserialize, Serialize};
use tracing::info;

use hollowmere_character::{modifier, Character};
use hollowmere_content::{Item, Npc, Stock};
use hollowmere_dice::{Advantage, Dice};
use hollowmere_npc::NpcRegistry;

use crate::error::ShopError;
use crate::price::{buy_price, sell_price};

const MIN_QTY: u32 = 1;
const MAX_QTY: u32 = 99;
const HAGGLE_DC: i64 = 12;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyReceipt {
    pub item_id: String,
    pub quantity: u32,
    pub total_cost: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellReceipt {
    pub item_id: String,
    pub quantity: u32,
    pub total_payout: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HaggleOutcome {
    pub success: bool,
    pub roll_total: i64,
}

fn validate_qty(qty: u32) -> Result<(), ShopError> {
    if !(MIN_QTY..=MAX_QTY).contains(&qty) {
        return Err(ShopError::QuantityOutOfRange(qty));
    }
    Ok(())
}

/// Buys `qty` of `item` from `npc`, deducting gold and decrementing stock
/// atomically: if any check fails, nothing is mutated.
pub fn buy(
    character: &mut Character,
    registry: &mut NpcRegistry,
    npc: &Npc,
    item: &Item,
    qty: u32,
) -> Result<BuyReceipt, ShopError> {
    validate_qty(qty)?;
    if !registry.can_trade(&npc.id).unwrap_or(false) {
        return Err(ShopError::Hostile(npc.id.clone()));
    }
    match registry.stock_of(&npc.id, &item.id).unwrap_or(Stock::Finite(0)) {
        Stock::Finite(0) => return Err(ShopError::ItemNotStocked(item.id.clone())),
        Stock::Finite(have) if have < qty => {
            return Err(ShopError::InsufficientStock { wanted: qty, have })
        }
        _ => {}
    }

    let disposition = registry.disposition(&npc.id).unwrap_or_default();
    let haggle_factor = registry.haggle_factor(&npc.id).unwrap_or(1.0);
    let unit_price = buy_price(item, npc.merchant_markup, disposition, haggle_factor);
    let total_cost = unit_price.saturating_mul(qty);

    if character.gold < total_cost {
        return Err(ShopError::InsufficientGold {
            needed: total_cost,
            have: character.gold,
        });
    }

    character.gold -= total_cost;
    character.add_item(&item.id, qty, item.stackable);
    let _ = registry.decrement_stock(&npc.id, &item.id, qty);
    let _ = registry.record_trade(&npc.id);

    info!(npc = %npc.id, item = %item.id, qty, total_cost, "item purchased");
    Ok(BuyReceipt {
        item_id: item.id.clone(),
        quantity: qty,
        total_cost,
    })
}

/// Sells `qty` of `item` from the character's inventory to `npc`.
pub fn sell(
    character: &mut Character,
    registry: &mut NpcRegistry,
    npc: &Npc,
    item: &Item,
    qty: u32,
) -> Result<SellReceipt, ShopError> {
    validate_qty(qty)?;
    if !registry.can_trade(&npc.id).unwrap_or(false) {
        return Err(ShopError::Hostile(npc.id.clone()));
    }
    if character.inventory.quantity_of(&item.id) < qty {
        return Err(ShopError::InsufficientStock {
            wanted: qty,
            have: character.inventory.quantity_of(&item.id),
        });
    }

    let disposition = registry.disposition(&npc.id).unwrap_or_default();
    let unit_price = sell_price(item, disposition);
    let total_payout = unit_price.saturating_mul(qty);

    character
        .remove_item(&item.id, qty)
        .map_err(|_| ShopError::UnknownItem(item.id.clone()))?;
    character.gold += total_payout;
    let _ = registry.record_trade(&npc.id);

    info!(npc = %npc.id, item = %item.id, qty, total_payout, "item sold");
    Ok(SellReceipt {
        item_id: item.id.clone(),
        quantity: qty,
        total_payout,
    })
}

/// Charisma DC 12 check against `npc`. Success grants a 20% discount for the
/// remainder of the visit and +2 disposition; failure sets a 10% penalty and
/// −5 disposition.
pub fn haggle(
    character: &Character,
    registry: &mut NpcRegistry,
    npc_id: &str,
    dice: &mut Dice,
) -> Result<HaggleOutcome, ShopError> {
    if !registry.can_trade(npc_id).unwrap_or(false) {
        return Err(ShopError::Hostile(npc_id.to_string()));
    }
    let cha_mod = modifier(character.abilities.charisma) as i64;
    let check = dice.roll_d20(cha_mod, Advantage::Normal);
    let success = check.total >= HAGGLE_DC;
    if success {
        let _ = registry.haggle_success(npc_id);
    } else {
        let _ = registry.haggle_fail(npc_id);
    }
    Ok(HaggleOutcome {
        success,
        roll_total: check.total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hollowmere_content::ContentCatalog;

    fn setup() -> (Character, NpcRegistry, Npc, Item) {
        let catalog = ContentCatalog::bundled();
        let scenario = catalog.scenario("goblin_cave").unwrap().clone();
        let mut dice = Dice::from_seed(1);
        let character = Character::create(&mut dice, &catalog, "Rowan", "fighter", "human").unwrap();
        let registry = NpcRegistry::new(&scenario);
        let npc = scenario.npcs.get("gavin").unwrap().clone();
        let item = scenario.items.get("shortsword").unwrap().clone();
        (character, registry, npc, item)
    }

    #[test]
    fn buy_deducts_gold_and_adds_item() {
        let (mut character, mut registry, npc, item) = setup();
        character.gold = 100;
        let before_stock = registry.stock_of(&npc.id, &item.id).unwrap();
        let receipt = buy(&mut character, &mut registry, &npc, &item, 1).unwrap();
        assert_eq!(receipt.quantity, 1);
        assert!(character.inventory.has("shortsword"));
        assert_eq!(character.gold, 100 - receipt.total_cost);
        // shortsword stock is infinite, stays unchanged
        assert_eq!(before_stock, registry.stock_of(&npc.id, &item.id).unwrap());
    }

    #[test]
    fn buy_rejects_insufficient_gold() {
        let (mut character, mut registry, npc, item) = setup();
        character.gold = 0;
        assert!(matches!(
            buy(&mut character, &mut registry, &npc, &item, 1),
            Err(ShopError::InsufficientGold { .. })
        ));
    }

    #[test]
    fn buy_rejects_out_of_range_quantity() {
        let (mut character, mut registry, npc, item) = setup();
        character.gold = 10000;
        assert!(matches!(
            buy(&mut character, &mut registry, &npc, &item, 0),
            Err(ShopError::QuantityOutOfRange(0))
        ));
        assert!(matches!(
            buy(&mut character, &mut registry, &npc, &item, 100),
            Err(ShopError::QuantityOutOfRange(100))
        ));
    }

    #[test]
    fn buy_respects_finite_stock() {
        let (mut character, mut registry, npc, _item) = setup();
        character.gold = 100_000;
        let potion = ContentCatalog::bundled()
            .scenario("goblin_cave")
            .unwrap()
            .items
            .get("healing_potion")
            .unwrap()
            .clone();
        assert!(matches!(
            buy(&mut character, &mut registry, &npc, &potion, 50),
            Err(ShopError::InsufficientStock { .. })
        ));
    }

    #[test]
    fn hostile_merchant_refuses_trade() {
        let (mut character, mut registry, npc, item) = setup();
        character.gold = 1000;
        for _ in 0..11 {
            registry.steal_failure(&npc.id, false).unwrap();
        }
        assert!(matches!(
            buy(&mut character, &mut registry, &npc, &item, 1),
            Err(ShopError::Hostile(_))
        ));
    }

    #[test]
    fn sell_pays_half_value_and_removes_item() {
        let (mut character, mut registry, npc, item) = setup();
        character.add_item(&item.id, 1, item.stackable);
        let receipt = sell(&mut character, &mut registry, &npc, &item, 1).unwrap();
        assert_eq!(receipt.total_payout, 5);
        assert!(!character.inventory.has("shortsword"));
    }

    #[test]
    fn haggle_moves_disposition_either_direction() {
        let (character, mut registry, npc, _item) = setup();
        let mut dice = Dice::from_seed(2);
        let outcome = haggle(&character, &mut registry, &npc.id, &mut dice).unwrap();
        let disposition = registry.disposition(&npc.id).unwrap().value();
        if outcome.success {
            assert_eq!(disposition, 2);
            assert_eq!(registry.haggle_factor(&npc.id).unwrap(), 0.8);
        } else {
            assert_eq!(disposition, -5);
            assert_eq!(registry.haggle_factor(&npc.id).unwrap(), 1.10);
        }
    }
}
