//! Cart Deliveries

mod handlers;

pub(crate) use handlers::*;
