use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShopError {
    #[error("quantity must be between 1 and 99, got {0}")]
    QuantityOutOfRange(u32),
    #[error("merchant {0} refuses to trade")]
    Hostile(String),
    #[error("item {0} not carried by this merchant")]
    ItemNotStocked(String),
    #[error("insufficient stock: wanted {wanted}, have {have}")]
    InsufficientStock { wanted: u32, have: u32 },
    #[error("insufficient gold: need {needed}, have {have}")]
    InsufficientGold { needed: u32, have: u32 },
    #[error("unknown item: {0}")]
    UnknownItem(String),
}
