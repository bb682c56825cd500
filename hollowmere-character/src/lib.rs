//! Player character: abilities, HP/AC, XP and leveling, equipment, and
//! inventory. Owned by a single session; mutated by every subsystem the
//! action pipeline drives.

pub mod abilities;
pub mod character;
pub mod error;
pub mod inventory;

pub use abilities::{modifier, Abilities};
pub use character::{Character, XpGain};
pub use error::CharacterError;
pub use inventory::{Inventory, InventorySlot};
