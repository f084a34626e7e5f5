//! The synthetic conversation record injected into the client-side database.

use serde::{Deserialize, Serialize};

/// Default label prefix for the injected record
pub const DEFAULT_RECORD_PREFIX: &str = "Heavy Project";

/// Markup repeated to build the oversized mockup payload
pub const MOCKUP_CHUNK: &str = "<h1>LARGE MOCKUP</h1>";

/// Number of times [`MOCKUP_CHUNK`] is repeated
pub const MOCKUP_REPEAT: usize = 100;

/// Database and object store the record is written to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreTarget {
    /// Database name
    pub database: String,
    /// Object store name
    pub store: String,
}

impl StoreTarget {
    /// Create a new store target
    #[must_use]
    pub fn new(database: impl Into<String>, store: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            store: store.into(),
        }
    }
}

impl Default for StoreTarget {
    fn default() -> Self {
        Self::new("IdeaRefineryDB", "conversations")
    }
}

/// One conversation as persisted by the application under test.
///
/// Field names serialize in camelCase to match the stored shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationRecord {
    /// Idea title, also the label shown in the history list
    pub idea: String,
    /// Creation time (unix milliseconds)
    pub timestamp: i64,
    /// Last update time (unix milliseconds)
    pub last_updated: i64,
    /// Blueprint body
    pub blueprint: String,
    /// Clarifying questions
    pub questions: Vec<String>,
    /// Rendered HTML mockup
    pub html_mockup: String,
    /// Whether this record is a summary
    pub is_summary: bool,
}

impl ConversationRecord {
    /// Build the oversized record, labelled `"<prefix> <now_ms>"`.
    #[must_use]
    pub fn heavy(prefix: &str, now_ms: i64) -> Self {
        Self {
            idea: format!("{prefix} {now_ms}"),
            timestamp: now_ms,
            last_updated: now_ms,
            blueprint: "Specific Blueprint Content".to_string(),
            questions: vec!["Q1".to_string()],
            html_mockup: MOCKUP_CHUNK.repeat(MOCKUP_REPEAT),
            is_summary: false,
        }
    }

    /// Label the history list is expected to show for this record
    #[must_use]
    pub fn label(&self) -> &str {
        &self.idea
    }

    /// Whether the record carries a mockup payload
    #[must_use]
    pub fn has_mockup(&self) -> bool {
        !self.html_mockup.is_empty()
    }
}

/// Settled value of the in-page injection promise
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InjectionOutcome {
    /// Whether the put succeeded
    pub ok: bool,
    /// Rejection reason when `ok` is false
    #[serde(default)]
    pub reason: Option<String>,
}

impl InjectionOutcome {
    /// Convert into a result, surfacing the rejection reason
    pub fn into_result(self) -> crate::SmokeResult<()> {
        if self.ok {
            Ok(())
        } else {
            Err(crate::SmokeError::InjectionRejected {
                reason: self
                    .reason
                    .unwrap_or_else(|| "unknown rejection".to_string()),
            })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_heavy_record_shape() {
        let record = ConversationRecord::heavy("Heavy Project", 1_700_000_000_000);
        assert_eq!(record.label(), "Heavy Project 1700000000000");
        assert_eq!(record.timestamp, record.last_updated);
        assert_eq!(record.questions, vec!["Q1".to_string()]);
        assert_eq!(record.html_mockup.len(), MOCKUP_CHUNK.len() * MOCKUP_REPEAT);
        assert!(record.has_mockup());
        assert!(!record.is_summary);
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let record = ConversationRecord::heavy("P", 1);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["lastUpdated"], 1);
        assert_eq!(json["isSummary"], false);
        assert!(json["htmlMockup"].as_str().unwrap().starts_with("<h1>"));
        assert!(json.get("last_updated").is_none());
    }

    #[test]
    fn test_default_store_target() {
        let target = StoreTarget::default();
        assert_eq!(target.database, "IdeaRefineryDB");
        assert_eq!(target.store, "conversations");
    }

    #[test]
    fn test_injection_outcome_ok() {
        let outcome: InjectionOutcome = serde_json::from_str(r#"{"ok":true}"#).unwrap();
        assert!(outcome.into_result().is_ok());
    }

    #[test]
    fn test_injection_outcome_rejected() {
        let outcome: InjectionOutcome =
            serde_json::from_str(r#"{"ok":false,"reason":"Store conversations not found"}"#)
                .unwrap();
        let err = outcome.into_result().unwrap_err();
        assert!(matches!(
            err,
            crate::SmokeError::InjectionRejected { ref reason } if reason == "Store conversations not found"
        ));
    }
}
