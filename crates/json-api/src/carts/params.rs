//! Request parameter helpers.

use salvo::prelude::{Request, StatusError};

/// A required, non-empty path parameter.
pub(super) fn path_param(req: &Request, name: &str) -> Result<String, StatusError> {
    req.param::<String>(name)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| StatusError::bad_request().brief(format!("missing path parameter {name}")))
}

/// The `couponCode` query parameter shared by voucher and gift card routes.
pub(super) fn coupon_code(req: &Request) -> Result<String, StatusError> {
    req.query::<String>("couponCode")
        .map(|code| code.trim().to_string())
        .filter(|code| !code.is_empty())
        .ok_or_else(|| StatusError::bad_request().brief("couponCode is required"))
}
