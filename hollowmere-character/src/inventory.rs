use serde::{Deserialize, Serialize};

/// One stack of an item the character carries. Stackable items merge into a
/// single slot; non-stackable items each occupy their own slot with
/// `quantity == 1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySlot {
    pub item_id: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Inventory {
    slots: Vec<InventorySlot>,
}

impl Inventory {
    pub fn slots(&self) -> &[InventorySlot] {
        &self.slots
    }

    pub fn quantity_of(&self, item_id: &str) -> u32 {
        self.slots
            .iter()
            .filter(|s| s.item_id == item_id)
            .map(|s| s.quantity)
            .sum()
    }

    pub fn has(&self, item_id: &str) -> bool {
        self.quantity_of(item_id) > 0
    }

    /// Adds `quantity` of `item_id`. When `stackable` is true, merges into an
    /// existing slot; otherwise appends one slot per unit.
    pub fn add(&mut self, item_id: &str, quantity: u32, stackable: bool) {
        if quantity == 0 {
            return;
        }
        if stackable {
            if let Some(slot) = self.slots.iter_mut().find(|s| s.item_id == item_id) {
                slot.quantity += quantity;
                return;
            }
            self.slots.push(InventorySlot {
                item_id: item_id.to_string(),
                quantity,
            });
        } else {
            for _ in 0..quantity {
                self.slots.push(InventorySlot {
                    item_id: item_id.to_string(),
                    quantity: 1,
                });
            }
        }
    }

    /// Removes up to `quantity` units of `item_id`. Returns the number
    /// actually removed (may be less than requested if stock is short).
    pub fn remove(&mut self, item_id: &str, quantity: u32) -> u32 {
        let mut remaining = quantity;
        let mut removed = 0;
        self.slots.retain_mut(|slot| {
            if slot.item_id != item_id || remaining == 0 {
                return true;
            }
            let take = remaining.min(slot.quantity);
            slot.quantity -= take;
            remaining -= take;
            removed += take;
            slot.quantity > 0
        });
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stackable_items_merge_into_one_slot() {
        let mut inv = Inventory::default();
        inv.add("healing_potion", 2, true);
        inv.add("healing_potion", 3, true);
        assert_eq!(inv.slots().len(), 1);
        assert_eq!(inv.quantity_of("healing_potion"), 5);
    }

    #[test]
    fn non_stackable_items_get_separate_slots() {
        let mut inv = Inventory::default();
        inv.add("shortsword", 2, false);
        assert_eq!(inv.slots().len(), 2);
        assert_eq!(inv.quantity_of("shortsword"), 2);
    }

    #[test]
    fn remove_caps_at_available_quantity() {
        let mut inv = Inventory::default();
        inv.add("torch", 2, true);
        let removed = inv.remove("torch", 5);
        assert_eq!(removed, 2);
        assert_eq!(inv.quantity_of("torch"), 0);
        assert!(inv.slots().is_empty());
    }
}
