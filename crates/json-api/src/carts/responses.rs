//! Cart API response bodies.

use serde::{Deserialize, Serialize};

/// Outcome message, shared by error bodies and plain confirmations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct MessageResponse {
    pub message: String,
    pub message_code: String,
    pub success: bool,
}

impl MessageResponse {
    pub(crate) fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            message_code: String::new(),
            success: true,
        }
    }

    pub(crate) fn failure(message: impl Into<String>, message_code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            message_code: message_code.into(),
            success: false,
        }
    }
}
