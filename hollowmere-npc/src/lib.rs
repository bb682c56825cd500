//! NPC reputation and party management. Content (`hollowmere_content::Npc`)
//! describes who an NPC is and what it could sell or say; this crate owns the
//! per-session state that changes as the player interacts with them —
//! disposition, live stock, traveling-merchant rotation — plus the party of
//! recruited companions that travel with the protagonist.

pub mod disposition;
pub mod error;
pub mod party;
pub mod registry;

pub use disposition::{Disposition, DispositionTier};
pub use error::NpcError;
pub use party::{Party, PartyMember, RecruitmentContext, DISMISS_DISPOSITION_DELTA, MAX_COMPANIONS};
pub use registry::{NpcRegistry, NpcRuntime};
