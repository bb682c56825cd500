use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use hollowmere_content::{ClassDef, ContentCatalog, RaceDef};
use hollowmere_dice::Dice;

use crate::abilities::{modifier, Abilities};
use crate::error::CharacterError;
use crate::inventory::Inventory;

/// XP thresholds to *reach* level 2..5, indexed by `level - 2`.
const XP_THRESHOLDS: [u32; 4] = [100, 300, 600, 1000];
const MAX_LEVEL: u32 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    pub race: String,
    pub class: String,
    pub level: u32,
    pub xp: u32,
    pub abilities: Abilities,
    pub max_hp: i32,
    pub current_hp: i32,
    pub base_armor_class: i32,
    pub hit_die: u32,
    pub hit_dice_remaining: u32,
    pub weapon_id: Option<String>,
    pub armor_id: Option<String>,
    pub inventory: Inventory,
    pub gold: u32,
}

/// Outcome of a successful `gain_xp` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XpGain {
    pub new_xp: u32,
    pub can_level_up: bool,
}

impl Character {
    /// Rolls a brand-new character: 4d6-drop-lowest abilities plus race
    /// modifiers, HP from the class hit die + CON modifier, AC from DEX
    /// modifier (armor bonus applied separately on equip), and starting gear
    /// from the class table.
    pub fn create(
        dice: &mut Dice,
        catalog: &ContentCatalog,
        name: &str,
        class_id: &str,
        race_id: &str,
    ) -> Result<Self, CharacterError> {
        let trimmed = name.trim();
        if trimmed.is_empty() || trimmed.chars().count() > 50 || !trimmed.chars().all(|c| !c.is_control()) {
            return Err(CharacterError::InvalidName);
        }
        let class: &ClassDef = catalog
            .classes
            .get(class_id)
            .ok_or_else(|| CharacterError::UnknownClass(class_id.to_string()))?;
        let race: &RaceDef = catalog
            .races
            .get(race_id)
            .ok_or_else(|| CharacterError::UnknownRace(race_id.to_string()))?;

        let mut abilities = Abilities {
            strength: dice.roll_4d6_drop_lowest() as i32,
            dexterity: dice.roll_4d6_drop_lowest() as i32,
            constitution: dice.roll_4d6_drop_lowest() as i32,
            intelligence: dice.roll_4d6_drop_lowest() as i32,
            wisdom: dice.roll_4d6_drop_lowest() as i32,
            charisma: dice.roll_4d6_drop_lowest() as i32,
        };
        for (ability, delta) in &race.ability_modifiers {
            abilities.apply_modifier(ability, *delta);
        }

        let con_mod = modifier(abilities.constitution);
        let dex_mod = modifier(abilities.dexterity);
        let max_hp = (class.hit_die as i32 + con_mod).max(1);
        let base_ac = 10 + dex_mod;

        let mut inventory = Inventory::default();
        for (item_id, qty) in &class.starting_items {
            inventory.add(item_id, *qty, *qty > 1);
        }

        info!(character = trimmed, class = class_id, race = race_id, "character created");

        Ok(Character {
            name: trimmed.to_string(),
            race: race_id.to_string(),
            class: class_id.to_string(),
            level: 1,
            xp: 0,
            abilities,
            max_hp,
            current_hp: max_hp,
            base_armor_class: base_ac,
            hit_die: class.hit_die,
            hit_dice_remaining: 1,
            weapon_id: class.starting_weapon_id.clone(),
            armor_id: class.starting_armor_id.clone(),
            inventory,
            gold: class.starting_gold,
        })
    }

    /// Proficiency bonus: +2 at levels 1-4, +3 at level 5.
    pub fn proficiency_bonus(&self) -> i32 {
        if self.level >= 5 {
            3
        } else {
            2
        }
    }

    /// Armor class = base (10 + DEX mod) plus the equipped armor's bonus,
    /// looked up from content by the caller and passed in here.
    pub fn armor_class(&self, equipped_armor_ac_bonus: i32) -> i32 {
        self.base_armor_class + equipped_armor_ac_bonus
    }

    fn xp_needed_for_next_level(&self) -> Option<u32> {
        if self.level >= MAX_LEVEL {
            return None;
        }
        XP_THRESHOLDS.get((self.level - 1) as usize).copied()
    }

    /// Adds XP from `source` (for logging only) and reports whether the
    /// character has now crossed the threshold to level up. At most one
    /// level-up is ever triggered per call; the caller decides when to
    /// actually apply it via [`Character::level_up`].
    pub fn gain_xp(&mut self, amount: u32, source: &str) -> XpGain {
        self.xp += amount;
        debug!(amount, source, new_xp = self.xp, "xp gained");
        let can_level_up = self
            .xp_needed_for_next_level()
            .is_some_and(|needed| self.xp >= needed);
        XpGain {
            new_xp: self.xp,
            can_level_up,
        }
    }

    /// Levels up once, if the XP threshold for the next level has been met.
    /// +2 max HP every level; a flat +1 CON at levels 2 and 4 (stat boost);
    /// hit dice restored to the new level.
    pub fn level_up(&mut self) -> Result<(), CharacterError> {
        let needed = self
            .xp_needed_for_next_level()
            .ok_or(CharacterError::MaxLevel)?;
        if self.xp < needed {
            return Err(CharacterError::InsufficientXp {
                needed,
                have: self.xp,
            });
        }
        self.level += 1;
        self.max_hp += 2;
        self.current_hp += 2;
        if self.level == 2 || self.level == 4 {
            self.abilities.constitution += 1;
        }
        self.hit_dice_remaining = self.level;
        info!(new_level = self.level, "character leveled up");
        Ok(())
    }

    pub fn add_item(&mut self, item_id: &str, quantity: u32, stackable: bool) {
        self.inventory.add(item_id, quantity, stackable);
    }

    pub fn remove_item(&mut self, item_id: &str, quantity: u32) -> Result<(), CharacterError> {
        if self.inventory.quantity_of(item_id) < quantity {
            return Err(CharacterError::ItemNotFound(item_id.to_string()));
        }
        self.inventory.remove(item_id, quantity);
        Ok(())
    }

    /// Equips `item_id` as the weapon or armor slot, per `item_type`.
    /// `item_type` is `"weapon"` or `"armor"`; anything else is rejected.
    pub fn equip(&mut self, item_id: &str, item_type: &str) -> Result<(), CharacterError> {
        if !self.inventory.has(item_id) {
            return Err(CharacterError::ItemNotFound(item_id.to_string()));
        }
        match item_type {
            "weapon" => self.weapon_id = Some(item_id.to_string()),
            "armor" => self.armor_id = Some(item_id.to_string()),
            _ => return Err(CharacterError::CannotEquip(item_id.to_string())),
        }
        Ok(())
    }

    pub fn take_damage(&mut self, amount: i32) {
        self.current_hp = (self.current_hp - amount.max(0)).max(0);
    }

    pub fn heal(&mut self, amount: i32) {
        self.current_hp = (self.current_hp + amount.max(0)).min(self.max_hp);
    }

    pub fn is_alive(&self) -> bool {
        self.current_hp > 0
    }

    /// Spends one Hit Die to heal `1d6 + CON mod`. Fails during combat, at
    /// full HP, or with no hit dice remaining.
    pub fn short_rest(&mut self, dice: &mut Dice, in_combat: bool) -> Result<i32, CharacterError> {
        if in_combat {
            return Err(CharacterError::CannotRestInCombat);
        }
        if self.current_hp >= self.max_hp {
            return Err(CharacterError::FullHp);
        }
        if self.hit_dice_remaining == 0 {
            return Err(CharacterError::NoHitDice);
        }
        self.hit_dice_remaining -= 1;
        let roll = dice.roll_die(6) as i32 + modifier(self.abilities.constitution);
        let healed = roll.max(0);
        self.heal(healed);
        Ok(healed)
    }

    /// Restores Hit Dice to full, triggered externally when a boss/chief
    /// enemy is defeated.
    pub fn restore_hit_dice(&mut self) {
        self.hit_dice_remaining = self.level;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> ContentCatalog {
        ContentCatalog::bundled()
    }

    #[test]
    fn create_rejects_empty_name() {
        let mut dice = Dice::from_seed(1);
        let err = Character::create(&mut dice, &catalog(), "   ", "fighter", "dwarf").unwrap_err();
        assert_eq!(err, CharacterError::InvalidName);
    }

    #[test]
    fn create_rejects_overlong_name() {
        let mut dice = Dice::from_seed(1);
        let long = "x".repeat(51);
        let err = Character::create(&mut dice, &catalog(), &long, "fighter", "dwarf").unwrap_err();
        assert_eq!(err, CharacterError::InvalidName);
    }

    #[test]
    fn create_rolls_hp_from_class_hit_die_and_con() {
        let mut dice = Dice::from_seed(7);
        let character = Character::create(&mut dice, &catalog(), "Thorin", "fighter", "dwarf").unwrap();
        let expected = 10 + modifier(character.abilities.constitution);
        assert_eq!(character.max_hp, expected.max(1));
        assert_eq!(character.current_hp, character.max_hp);
    }

    #[test]
    fn gain_xp_flags_level_up_at_threshold() {
        let mut dice = Dice::from_seed(1);
        let mut character = Character::create(&mut dice, &catalog(), "Thorin", "fighter", "dwarf").unwrap();
        let gain = character.gain_xp(99, "test");
        assert!(!gain.can_level_up);
        let gain = character.gain_xp(1, "test");
        assert!(gain.can_level_up);
    }

    #[test]
    fn level_up_fails_without_enough_xp() {
        let mut dice = Dice::from_seed(1);
        let mut character = Character::create(&mut dice, &catalog(), "Thorin", "fighter", "dwarf").unwrap();
        assert!(character.level_up().is_err());
    }

    #[test]
    fn level_up_restores_hit_dice_and_increments_level() {
        let mut dice = Dice::from_seed(1);
        let mut character = Character::create(&mut dice, &catalog(), "Thorin", "fighter", "dwarf").unwrap();
        character.gain_xp(100, "test");
        character.level_up().unwrap();
        assert_eq!(character.level, 2);
        assert_eq!(character.hit_dice_remaining, 2);
    }

    #[test]
    fn short_rest_fails_in_combat() {
        let mut dice = Dice::from_seed(1);
        let mut character = Character::create(&mut dice, &catalog(), "Thorin", "fighter", "dwarf").unwrap();
        character.current_hp -= 3;
        let err = character.short_rest(&mut dice, true).unwrap_err();
        assert_eq!(err, CharacterError::CannotRestInCombat);
    }

    #[test]
    fn short_rest_fails_at_full_hp() {
        let mut dice = Dice::from_seed(1);
        let mut character = Character::create(&mut dice, &catalog(), "Thorin", "fighter", "dwarf").unwrap();
        let err = character.short_rest(&mut dice, false).unwrap_err();
        assert_eq!(err, CharacterError::FullHp);
    }

    #[test]
    fn short_rest_consumes_one_hit_die_and_heals() {
        let mut dice = Dice::from_seed(1);
        let mut character = Character::create(&mut dice, &catalog(), "Thorin", "fighter", "dwarf").unwrap();
        character.current_hp -= 5;
        let healed = character.short_rest(&mut dice, false).unwrap();
        assert!(healed >= 0);
        assert_eq!(character.hit_dice_remaining, 0);
    }

    #[test]
    fn take_damage_never_goes_below_zero() {
        let mut dice = Dice::from_seed(1);
        let mut character = Character::create(&mut dice, &catalog(), "Thorin", "fighter", "dwarf").unwrap();
        character.take_damage(9999);
        assert_eq!(character.current_hp, 0);
        assert!(!character.is_alive());
    }

    #[test]
    fn heal_never_exceeds_max_hp() {
        let mut dice = Dice::from_seed(1);
        let mut character = Character::create(&mut dice, &catalog(), "Thorin", "fighter", "dwarf").unwrap();
        character.heal(9999);
        assert_eq!(character.current_hp, character.max_hp);
    }
}
