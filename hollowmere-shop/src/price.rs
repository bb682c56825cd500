use hollowmere_content::Item;
use hollowmere_npc::Disposition;

/// `base_value * merchant.markup * disposition_modifier * haggle_factor`,
/// rounded to the nearest gold piece. `haggle_factor` is the discount
/// (`0.8`) or penalty (`1.10`) flag left over from a prior haggle this visit.
pub fn buy_price(item: &Item, merchant_markup: f64, disposition: Disposition, haggle_factor: f64) -> u32 {
    let price = item.value as f64 * merchant_markup * disposition.price_modifier() * haggle_factor;
    price.round().max(0.0) as u32
}

/// `base_value * 0.5 * disposition_modifier`, rounded to the nearest gold
/// piece. Merchants never pay more than half an item's value back.
pub fn sell_price(item: &Item, disposition: Disposition) -> u32 {
    let price = item.value as f64 * 0.5 * disposition.price_modifier();
    price.round().max(0.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use hollowmere_content::{Item, ItemType, Rarity};

    fn shortsword() -> Item {
        Item {
            id: "shortsword".into(),
            name: "Shortsword".into(),
            item_type: ItemType::Weapon,
            rarity: Rarity::Common,
            value: 10,
            stackable: false,
            damage_dice: Some("1d6".into()),
            ac_bonus: None,
            on_use_effect: None,
        }
    }

    #[test]
    fn matches_the_worked_example_in_the_spec() {
        // Gavin: markup 1.15, disposition +15 -> Friendly (0.9x), no haggle factor.
        let price = buy_price(&shortsword(), 1.15, Disposition::new(15), 1.0);
        assert_eq!(price, 10);
    }

    #[test]
    fn haggle_discount_lowers_price() {
        let price = buy_price(&shortsword(), 1.15, Disposition::new(0), 0.8);
        assert_eq!(price, (10.0 * 1.15 * 1.0 * 0.8_f64).round() as u32);
    }

    #[test]
    fn sell_price_is_half_value_times_disposition() {
        let price = sell_price(&shortsword(), Disposition::new(0));
        assert_eq!(price, 5);
    }
}
