//! Attachment metadata returned by the upload endpoint.

use serde::Deserialize;

use super::deserialize_id;

/// Represents one entry of the upload response array: server-assigned id and stored filename.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Attachment {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub filename: String,
}
