use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Validated, immutable parameters for one run of the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub uid: String,
    pub email: String,
    pub device_id: String,
    pub interval: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSnapshot {
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub email: String,
    #[serde(rename = "point")]
    pub points: i64,
    #[serde(rename = "totalGame", default)]
    pub total_games: i64,
    #[serde(rename = "codeInvite", default)]
    pub invite_code: Option<String>,
    #[serde(rename = "totalReferral", default)]
    pub total_referrals: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantResponse {
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CycleStage {
    FetchBefore,
    Grant,
    FetchAfter,
}

impl CycleStage {
    pub fn label(&self) -> &'static str {
        match self {
            CycleStage::FetchBefore => "fetch-before",
            CycleStage::Grant => "grant",
            CycleStage::FetchAfter => "fetch-after",
        }
    }
}

impl fmt::Display for CycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Network,
    Protocol,
    Decode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum CycleOutcome {
    Success {
        before: Option<AccountSnapshot>,
        after: Option<AccountSnapshot>,
        delta: i64,
    },
    Failure {
        stage: CycleStage,
        kind: ErrorKind,
        message: String,
        /// Only populated for `FetchAfter` failures.
        #[serde(skip_serializing_if = "Option::is_none")]
        before: Option<AccountSnapshot>,
    },
}

impl CycleOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CycleOutcome::Success { .. })
    }

    pub fn delta(&self) -> Option<i64> {
        match self {
            CycleOutcome::Success { delta, .. } => Some(*delta),
            CycleOutcome::Failure { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunState {
    Idle,
    Running,
}

impl RunState {
    pub fn label(&self) -> &'static str {
        match self {
            RunState::Idle => "Idle",
            RunState::Running => "Running",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_parses_wire_names() {
        let json = r#"{
            "uid": "u1",
            "email": "a@b.com",
            "point": 1234,
            "totalGame": 17,
            "codeInvite": "XYZ9",
            "totalReferral": 3
        }"#;

        let snapshot: AccountSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.uid, "u1");
        assert_eq!(snapshot.points, 1234);
        assert_eq!(snapshot.total_games, 17);
        assert_eq!(snapshot.invite_code.as_deref(), Some("XYZ9"));
        assert_eq!(snapshot.total_referrals, 3);
    }

    #[test]
    fn test_snapshot_tolerates_missing_optional_fields() {
        let snapshot: AccountSnapshot = serde_json::from_str(r#"{"point": 5}"#).unwrap();
        assert_eq!(snapshot.points, 5);
        assert!(snapshot.invite_code.is_none());
        assert_eq!(snapshot.total_games, 0);
    }

    #[test]
    fn test_snapshot_requires_points() {
        let result: Result<AccountSnapshot, _> = serde_json::from_str(r#"{"uid": "u1"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_outcome_delta() {
        let success = CycleOutcome::Success {
            before: None,
            after: None,
            delta: 0,
        };
        assert!(success.is_success());
        assert_eq!(success.delta(), Some(0));

        let failure = CycleOutcome::Failure {
            stage: CycleStage::Grant,
            kind: ErrorKind::Protocol,
            message: "HTTP 500".to_string(),
            before: None,
        };
        assert!(!failure.is_success());
        assert_eq!(failure.delta(), None);
    }

    #[test]
    fn test_stage_labels() {
        assert_eq!(CycleStage::FetchBefore.to_string(), "fetch-before");
        assert_eq!(CycleStage::Grant.to_string(), "grant");
        assert_eq!(CycleStage::FetchAfter.to_string(), "fetch-after");
    }
}
