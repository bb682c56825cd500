use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::warn;

const KEYWORDS: [&str; 8] = ["ROLL", "COMBAT", "BUY", "PAY", "RECRUIT", "ITEM", "GOLD", "XP"];

/// A single structured tag extracted from DM narration (or, before being
/// stripped, from player input).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParsedTag {
    Roll { skill: String, dc: i32 },
    Combat { enemies: Vec<String>, surprise: bool },
    Buy { item_id: String, price: u32 },
    Pay { amount: u32, reason: String },
    Recruit { npc_id: String },
    Item { item_id: String },
    Gold { amount: u32 },
    Xp { amount: u32, reason: Option<String> },
}

/// A tag plus the byte range of its `[...]` span in the source text, so
/// callers can strip matched tags without re-parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct TagMatch {
    pub range: Range<usize>,
    pub tag: ParsedTag,
}

/// Scans `text` for bracket-delimited tags matching the grammar. Brackets
/// that don't start with one of the known keywords, or whose body fails to
/// parse, are left untouched (not every `[...]` in narration is a tag).
pub fn scan_tags(text: &str) -> Vec<TagMatch> {
    let mut matches = Vec::new();
    let mut cursor = 0usize;
    while let Some(rel_start) = text[cursor..].find('[') {
        let start = cursor + rel_start;
        let Some(rel_end) = text[start..].find(']') else {
            break;
        };
        let end = start + rel_end + 1;
        let inner = &text[start + 1..end - 1];
        if let Some((keyword, body)) = inner.split_once(':') {
            let keyword = keyword.trim();
            if KEYWORDS.contains(&keyword) {
                match parse_body(keyword, body.trim()) {
                    Some(tag) => matches.push(TagMatch { range: start..end, tag }),
                    None => warn!(keyword, body = body.trim(), "malformed tag body, dropping"),
                }
            }
        }
        cursor = end;
    }
    matches
}

/// Convenience wrapper over [`scan_tags`] that discards the spans, in the
/// order the tags appeared in the text.
pub fn parse_tags(text: &str) -> Vec<ParsedTag> {
    scan_tags(text).into_iter().map(|m| m.tag).collect()
}

/// Removes every recognized tag span from `text`, leaving the surrounding
/// prose (and any unrecognized bracket text) intact. Used to scrub tag
/// injection out of player-originated input before it ever reaches the LLM
/// prompt or the tag applier.
pub fn strip_tags(text: &str) -> String {
    let matches = scan_tags(text);
    if matches.is_empty() {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for m in &matches {
        out.push_str(&text[last..m.range.start]);
        last = m.range.end;
    }
    out.push_str(&text[last..]);
    out
}

fn parse_body(keyword: &str, body: &str) -> Option<ParsedTag> {
    match keyword {
        "ROLL" => parse_roll(body),
        "COMBAT" => parse_combat(body),
        "BUY" => parse_buy(body),
        "PAY" => parse_pay(body),
        "RECRUIT" => non_empty(body).map(|npc_id| ParsedTag::Recruit { npc_id }),
        "ITEM" => non_empty(body).map(|item_id| ParsedTag::Item { item_id }),
        "GOLD" => body.parse().ok().map(|amount| ParsedTag::Gold { amount }),
        "XP" => parse_xp(body),
        _ => None,
    }
}

fn non_empty(body: &str) -> Option<String> {
    let trimmed = body.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_roll(body: &str) -> Option<ParsedTag> {
    let dc_idx = body.find("DC")?;
    let skill = non_empty(&body[..dc_idx])?;
    let dc: i32 = body[dc_idx + 2..].trim().parse().ok()?;
    Some(ParsedTag::Roll { skill, dc })
}

fn parse_combat(body: &str) -> Option<ParsedTag> {
    let (enemies_part, flag_part) = match body.split_once('|') {
        Some((a, b)) => (a, Some(b)),
        None => (body, None),
    };
    let enemies: Vec<String> = enemies_part
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if enemies.is_empty() {
        return None;
    }
    let surprise = flag_part.map(|f| f.trim() == "SURPRISE").unwrap_or(false);
    Some(ParsedTag::Combat { enemies, surprise })
}

fn parse_buy(body: &str) -> Option<ParsedTag> {
    let (item_part, price_part) = body.split_once(',')?;
    let item_id = non_empty(item_part)?;
    let price: u32 = price_part.trim().parse().ok()?;
    Some(ParsedTag::Buy { item_id, price })
}

fn parse_pay(body: &str) -> Option<ParsedTag> {
    let (amount_part, reason_part) = body.split_once(',')?;
    let amount: u32 = amount_part.trim().parse().ok()?;
    let reason = non_empty(reason_part)?;
    Some(ParsedTag::Pay { amount, reason })
}

fn parse_xp(body: &str) -> Option<ParsedTag> {
    let (amount_part, reason_part) = match body.split_once('|') {
        Some((a, b)) => (a, non_empty(b)),
        None => (body, None),
    };
    let amount: u32 = amount_part.trim().parse().ok()?;
    Some(ParsedTag::Xp { amount, reason: reason_part })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_roll_tag() {
        let tags = parse_tags("You approach the door. [ROLL: Persuasion DC 14]");
        assert_eq!(tags, vec![ParsedTag::Roll { skill: "Persuasion".to_string(), dc: 14 }]);
    }

    #[test]
    fn parses_combat_tag_with_surprise() {
        let tags = parse_tags("Goblins leap out! [COMBAT: goblin, goblin | SURPRISE]");
        assert_eq!(
            tags,
            vec![ParsedTag::Combat {
                enemies: vec!["goblin".to_string(), "goblin".to_string()],
                surprise: true,
            }]
        );
    }

    #[test]
    fn parses_combat_tag_without_surprise() {
        let tags = parse_tags("[COMBAT: goblin_boss]");
        assert_eq!(
            tags,
            vec![ParsedTag::Combat { enemies: vec!["goblin_boss".to_string()], surprise: false }]
        );
    }

    #[test]
    fn parses_buy_and_pay() {
        let tags = parse_tags("[BUY: healing_potion, 25] [PAY: 10, bribe the guard]");
        assert_eq!(
            tags,
            vec![
                ParsedTag::Buy { item_id: "healing_potion".to_string(), price: 25 },
                ParsedTag::Pay { amount: 10, reason: "bribe the guard".to_string() },
            ]
        );
    }

    #[test]
    fn parses_recruit_item_gold() {
        let tags = parse_tags("[RECRUIT: elira] [ITEM: torch] [GOLD: 15]");
        assert_eq!(
            tags,
            vec![
                ParsedTag::Recruit { npc_id: "elira".to_string() },
                ParsedTag::Item { item_id: "torch".to_string() },
                ParsedTag::Gold { amount: 15 },
            ]
        );
    }

    #[test]
    fn parses_xp_with_and_without_reason() {
        let tags = parse_tags("[XP: 5] [XP: 10 | clever deduction]");
        assert_eq!(
            tags,
            vec![
                ParsedTag::Xp { amount: 5, reason: None },
                ParsedTag::Xp { amount: 10, reason: Some("clever deduction".to_string()) },
            ]
        );
    }

    #[test]
    fn unrecognized_bracket_text_is_ignored() {
        assert!(parse_tags("The sign reads [CLOSED FOR REPAIRS].").is_empty());
    }

    #[test]
    fn lowercase_keyword_is_not_a_tag() {
        assert!(parse_tags("[roll: Stealth DC 10]").is_empty());
    }

    #[test]
    fn malformed_body_is_dropped() {
        assert!(parse_tags("[GOLD: not-a-number]").is_empty());
    }

    #[test]
    fn strip_removes_only_recognized_tags() {
        let text = "You open the chest. [GOLD: 5] The sign reads [WELCOME].";
        let stripped = strip_tags(text);
        assert_eq!(stripped, "You open the chest.  The sign reads [WELCOME].");
    }
}
