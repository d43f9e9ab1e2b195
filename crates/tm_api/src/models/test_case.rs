use serde::Deserialize;

/// Test-case entity of the test-management namespace; only the status is consumed.
#[derive(Debug, Deserialize, Clone)]
pub struct TestCase {
    #[serde(default)]
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::TestCase;

    #[test]
    fn other_fields_are_ignored() {
        let case: TestCase =
            serde_json::from_str(r#"{"id": 4411, "key": "QA-1", "status": "Pass"}"#).expect("valid case");
        assert_eq!(case.status.as_deref(), Some("Pass"));

        let bare: TestCase = serde_json::from_str("{}").expect("empty case");
        assert!(bare.status.is_none());
    }
}
