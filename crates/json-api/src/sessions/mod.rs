//! Sessions

pub(crate) mod middleware;

pub(crate) use middleware::SESSION_ID_HEADER;
