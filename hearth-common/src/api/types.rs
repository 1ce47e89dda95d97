//! Request/response types shared by generation functions

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lifecycle of an asynchronous generation job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// Response of a function that starts a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartedJob {
    pub operation_id: String,
}

/// Status request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRequest {
    pub operation_id: String,
}

/// Current state of a job
///
/// # Examples
///
/// ```
/// use hearth_common::api::types::{JobState, JobStatus};
///
/// let state: JobState = serde_json::from_str(
///     r#"{"operationId":"op-1","status":"completed","result":{"title":"Soup"}}"#,
/// ).unwrap();
/// assert_eq!(state.status, JobStatus::Completed);
/// assert_eq!(state.result.unwrap()["title"], "Soup");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobState {
    #[serde(default)]
    pub operation_id: String,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Error body returned by functions on failure
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.error.or(self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_completed_and_failed_are_finished() {
        assert!(JobStatus::Completed.is_finished());
        assert!(JobStatus::Failed.is_finished());
        assert!(!JobStatus::Pending.is_finished());
        assert!(!JobStatus::Running.is_finished());
    }
}
