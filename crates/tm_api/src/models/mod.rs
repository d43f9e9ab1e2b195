use std::collections::BTreeMap;

use serde::de::Deserializer;
use serde::Deserialize;
use serde_json::Value;

mod attachment;
mod comment;
mod issue;
mod label;
mod test_case;

pub use attachment::Attachment;
pub use comment::Comment;
pub use issue::TestIssue;
pub use label::LabelAction;
pub use test_case::TestCase;

/// Local attachment path mapped to its browsable link.
pub type AttachmentLinks = BTreeMap<String, String>;

/// Accepts ids sent either as JSON numbers or strings.
pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::String(text) => Ok(text.trim().to_string()),
        Value::Number(number) => Ok(number.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}
