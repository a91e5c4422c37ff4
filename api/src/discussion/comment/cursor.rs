use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use super::order::{OrderBy, OrderDirection};

/// Opaque pagination token: the ordering it was issued under, the sibling
/// list it is scoped to (`parent_id`, `None` meaning the discussion root)
/// and the last id that list already delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cursor {
    pub order_by: OrderBy,
    pub order_direction: OrderDirection,
    pub parent_id: Option<i32>,
    pub after_id: i32,
}

impl Cursor {
    pub fn encode(&self) -> String {
        // serializing a plain struct of copyable fields can't fail
        STANDARD.encode(serde_json::to_vec(self).unwrap_or_default())
    }

    /// Clients can hand us anything here. Whatever doesn't decode to a valid
    /// cursor is ignored, the request then runs as if no cursor was given.
    pub fn decode(raw: &str) -> Option<Self> {
        let bytes = match STANDARD.decode(raw.trim()) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!(error = %e, "ignoring cursor with invalid base64");
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(cursor) => Some(cursor),
            Err(e) => {
                tracing::debug!(error = %e, "ignoring cursor with invalid payload");
                None
            }
        }
    }
}
