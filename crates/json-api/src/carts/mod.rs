//! Cart API

pub(crate) mod deliveries;
pub(crate) mod errors;
mod handlers;
pub(crate) mod items;
mod params;
pub(crate) mod responses;

pub(crate) use handlers::*;
