use serde::{Deserialize, Serialize};
use tracing::info;

use hollowmere_content::{Npc, PartyStats};

use crate::error::NpcError;

/// Gates a recruitment condition string against session state the party
/// crate doesn't otherwise need to depend on. Implemented by the session
/// layer, mirroring `hollowmere_world::ConditionContext`.
pub trait RecruitmentContext {
    fn ability_score(&self, ability: &str) -> i32;
    fn has_item(&self, item_id: &str) -> bool;
    fn gold(&self) -> u32;
    fn objective_complete(&self, quest_id: &str, objective_id: &str) -> bool;
}

/// A recruited companion, built once from the NPC's content-defined
/// `PartyStats` and then tracked independently (HP, ability charges).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartyMember {
    pub npc_id: String,
    pub name: String,
    pub class: String,
    pub level: u32,
    pub max_hp: i32,
    pub current_hp: i32,
    pub armor_class: i32,
    pub attack_bonus: i32,
    pub damage_dice: String,
    pub dex_mod: i32,
    pub special_ability: Option<String>,
    pub ability_uses_remaining: u32,
}

impl PartyMember {
    fn from_npc(npc: &Npc, stats: &PartyStats) -> Self {
        PartyMember {
            npc_id: npc.id.clone(),
            name: npc.name.clone(),
            class: stats.class.clone(),
            level: stats.level,
            max_hp: stats.max_hp,
            current_hp: stats.max_hp,
            armor_class: stats.armor_class,
            attack_bonus: stats.attack_bonus,
            damage_dice: stats.damage_dice.clone(),
            dex_mod: stats.dex_mod,
            special_ability: stats.special_ability.clone(),
            ability_uses_remaining: stats.ability_uses_per_combat,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.current_hp > 0
    }

    pub fn take_damage(&mut self, amount: i32) {
        self.current_hp = (self.current_hp - amount).max(0);
    }

    pub fn heal(&mut self, amount: i32) {
        self.current_hp = (self.current_hp + amount).min(self.max_hp);
    }

    pub fn refresh_ability_uses(&mut self, stats: &PartyStats) {
        self.ability_uses_remaining = stats.ability_uses_per_combat;
    }
}

/// The player's companions. Capped at two alongside the protagonist, per
/// §3's party-size invariant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Party {
    members: Vec<PartyMember>,
}

pub const MAX_COMPANIONS: usize = 2;

impl Party {
    pub fn new() -> Self {
        Party::default()
    }

    pub fn members(&self) -> &[PartyMember] {
        &self.members
    }

    pub fn members_mut(&mut self) -> &mut [PartyMember] {
        &mut self.members
    }

    pub fn member(&self, npc_id: &str) -> Option<&PartyMember> {
        self.members.iter().find(|m| m.npc_id == npc_id)
    }

    pub fn is_member(&self, npc_id: &str) -> bool {
        self.member(npc_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= MAX_COMPANIONS
    }

    /// Attempts recruitment at `current_location_id`. Conditions in
    /// `npc.recruitment_conditions` are OR-combined per §4.E: any single one
    /// satisfied is enough. Recognized forms: `skill:<ability>:<dc>`,
    /// `item:<item_id>`, `gold:<amount>`, `objective:<quest_id>:<objective_id>`.
    pub fn recruit(
        &mut self,
        npc: &Npc,
        current_location_id: &str,
        ctx: &impl RecruitmentContext,
    ) -> Result<&PartyMember, NpcError> {
        let stats = npc
            .party_stats
            .as_ref()
            .ok_or_else(|| NpcError::NotRecruitable(npc.id.clone()))?;

        if let Some(required) = &npc.recruitment_location_id {
            if required != current_location_id {
                return Err(NpcError::WrongLocation(npc.id.clone()));
            }
        }

        if self.is_full() {
            return Err(NpcError::PartyFull);
        }
        if self.is_member(&npc.id) {
            return Err(NpcError::ConditionsNotMet(npc.id.clone()));
        }

        if npc.recruitment_conditions.is_empty() {
            // No conditions authored: recruitment is unconditional once present.
        } else if !npc
            .recruitment_conditions
            .iter()
            .any(|cond| condition_met(cond, ctx))
        {
            return Err(NpcError::ConditionsNotMet(npc.id.clone()));
        }

        let member = PartyMember::from_npc(npc, stats);
        self.members.push(member);
        info!(npc = %npc.id, "recruited into party");
        Ok(self.members.last().unwrap())
    }

    /// Removes `npc_id` from the party. Returns the departing member so the
    /// caller (which also owns the `NpcRegistry`) can apply the associated
    /// disposition penalty.
    pub fn dismiss(&mut self, npc_id: &str) -> Result<PartyMember, NpcError> {
        let idx = self
            .members
            .iter()
            .position(|m| m.npc_id == npc_id)
            .ok_or_else(|| NpcError::NotInParty(npc_id.to_string()))?;
        Ok(self.members.remove(idx))
    }

    pub fn living_members(&self) -> impl Iterator<Item = &PartyMember> {
        self.members.iter().filter(|m| m.is_alive())
    }
}

/// Dismissing a companion costs disposition, same magnitude as a failed
/// haggle — leaving stings, but doesn't burn the relationship outright.
pub const DISMISS_DISPOSITION_DELTA: i32 = -10;

fn condition_met(condition: &str, ctx: &impl RecruitmentContext) -> bool {
    let mut parts = condition.splitn(3, ':');
    match parts.next() {
        Some("skill") => {
            let (Some(ability), Some(dc)) = (parts.next(), parts.next()) else {
                return false;
            };
            let Ok(dc) = dc.parse::<i32>() else {
                return false;
            };
            ctx.ability_score(ability) >= dc
        }
        Some("item") => parts.next().is_some_and(|id| ctx.has_item(id)),
        Some("gold") => parts
            .next()
            .and_then(|n| n.parse::<u32>().ok())
            .is_some_and(|amount| ctx.gold() >= amount),
        Some("objective") => {
            let (Some(quest_id), Some(objective_id)) = (parts.next(), parts.next()) else {
                return false;
            };
            ctx.objective_complete(quest_id, objective_id)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hollowmere_content::{ContentCatalog, NpcRole};

    struct FakeCtx {
        persuasion: i32,
        gold: u32,
        has_potion: bool,
    }

    impl RecruitmentContext for FakeCtx {
        fn ability_score(&self, ability: &str) -> i32 {
            if ability == "persuasion" {
                self.persuasion
            } else {
                0
            }
        }
        fn has_item(&self, item_id: &str) -> bool {
            item_id == "healing_potion" && self.has_potion
        }
        fn gold(&self) -> u32 {
            self.gold
        }
        fn objective_complete(&self, _quest_id: &str, _objective_id: &str) -> bool {
            false
        }
    }

    fn elira() -> Npc {
        ContentCatalog::bundled()
            .scenario("goblin_cave")
            .unwrap()
            .npcs
            .get("elira")
            .unwrap()
            .clone()
    }

    #[test]
    fn recruits_when_any_condition_satisfied() {
        let npc = elira();
        let mut party = Party::new();
        let ctx = FakeCtx {
            persuasion: 5,
            gold: 50,
            has_potion: false,
        };
        let member = party.recruit(&npc, "forest_clearing", &ctx).unwrap();
        assert_eq!(member.npc_id, "elira");
        assert_eq!(party.len(), 1);
    }

    #[test]
    fn rejects_when_no_condition_satisfied() {
        let npc = elira();
        let mut party = Party::new();
        let ctx = FakeCtx {
            persuasion: 5,
            gold: 0,
            has_potion: false,
        };
        assert!(matches!(
            party.recruit(&npc, "forest_clearing", &ctx),
            Err(NpcError::ConditionsNotMet(_))
        ));
    }

    #[test]
    fn rejects_at_wrong_location() {
        let npc = elira();
        let mut party = Party::new();
        let ctx = FakeCtx {
            persuasion: 20,
            gold: 0,
            has_potion: false,
        };
        assert!(matches!(
            party.recruit(&npc, "village_square", &ctx),
            Err(NpcError::WrongLocation(_))
        ));
    }

    #[test]
    fn party_caps_at_two_companions() {
        let mut npc = elira();
        let mut party = Party::new();
        let ctx = FakeCtx {
            persuasion: 20,
            gold: 0,
            has_potion: false,
        };
        npc.id = "a".into();
        party.recruit(&npc, "forest_clearing", &ctx).unwrap();
        npc.id = "b".into();
        party.recruit(&npc, "forest_clearing", &ctx).unwrap();
        npc.id = "c".into();
        assert!(matches!(
            party.recruit(&npc, "forest_clearing", &ctx),
            Err(NpcError::PartyFull)
        ));
    }

    #[test]
    fn non_recruitable_npc_rejected() {
        let mut npc = elira();
        npc.role = NpcRole::Neutral;
        npc.party_stats = None;
        let mut party = Party::new();
        let ctx = FakeCtx {
            persuasion: 20,
            gold: 0,
            has_potion: false,
        };
        assert!(matches!(
            party.recruit(&npc, "forest_clearing", &ctx),
            Err(NpcError::NotRecruitable(_))
        ));
    }

    #[test]
    fn dismiss_removes_member() {
        let npc = elira();
        let mut party = Party::new();
        let ctx = FakeCtx {
            persuasion: 20,
            gold: 0,
            has_potion: false,
        };
        party.recruit(&npc, "forest_clearing", &ctx).unwrap();
        let dismissed = party.dismiss("elira").unwrap();
        assert_eq!(dismissed.npc_id, "elira");
        assert!(party.is_empty());
    }
}
