//! The point-index override signal.
//!
//! Other scripts (laser pointers, teleport, UI) raise both index fingers on
//! the avatar by broadcasting a JSON body on the `"Hifi-Point-Index"`
//! channel. The body is a JSON object; the only recognized field is
//! `pointIndex`. A message may legitimately omit the field, in which case it
//! carries no override and is ignored.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Channel name for the point-index broadcast. Part of the cross-script
/// contract, do not rename.
pub const POINT_INDEX_CHANNEL: &str = "Hifi-Point-Index";

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("Malformed message payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),
}

/// Wire model of a point-index message body.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointIndexMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point_index: Option<bool>,
}

impl PointIndexMessage {
    pub fn new(point_index: bool) -> Self {
        Self {
            point_index: Some(point_index),
        }
    }

    pub fn encode(&self) -> String {
        // Serializing a struct of primitives cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Decodes a message body, returning the override value if one is present.
pub fn decode_point_index(body: &str) -> Result<Option<bool>, MessageError> {
    let message: PointIndexMessage = serde_json::from_str(body)?;
    Ok(message.point_index)
}
