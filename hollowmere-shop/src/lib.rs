//! Buying, selling, and haggling with merchant NPCs. Prices are a pure
//! function of the item's base value, the merchant's markup, and the
//! player's standing with them (`hollowmere_npc::Disposition`); this crate
//! owns only that math and the gold/stock/inventory bookkeeping around it.

pub mod error;
pub mod price;
pub mod transaction;

pub use error::ShopError;
pub use price::{buy_price, sell_price};
pub use transaction::{buy, haggle, sell, BuyReceipt, HaggleOutcome, SellReceipt};
