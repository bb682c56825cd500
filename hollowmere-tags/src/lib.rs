//! Grammar for the structured tags a DM's narration embeds in its prose —
//! `[ROLL:]`, `[COMBAT:]`, `[BUY:]`, `[PAY:]`, `[RECRUIT:]`, `[ITEM:]`,
//! `[GOLD:]`, `[XP:]` — plus validation against live scenario content and
//! stripping for tag-injection defense on player-originated text.

pub mod grammar;
pub mod skills;
pub mod validate;

pub use grammar::{parse_tags, scan_tags, strip_tags, ParsedTag, TagMatch};
pub use skills::resolve_skill;
pub use validate::validate_tags;
