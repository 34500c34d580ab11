//! Delivery handlers

pub(crate) mod delete;
pub(crate) mod update;
