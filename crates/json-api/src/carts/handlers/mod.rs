//! Cart handlers

pub(crate) mod billing;
pub(crate) mod delete;
pub(crate) mod get;
pub(crate) mod gift_cards;
pub(crate) mod place_order;
pub(crate) mod vouchers;
