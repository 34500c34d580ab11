//! Trolley
//!
//! Trolley is the storefront cart domain: carts, deliveries and lines, their
//! totals, the commands that change them and the decorated projections used to
//! render them.

pub mod cart;
pub mod commands;
pub mod decorated;
pub mod notices;
pub mod orders;
pub mod pricing;
pub mod products;
