//! Records held by [`CollectionState`](super::CollectionState).

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::auth::PasswordHash;

/// History text of a case nobody has contacted yet.
pub const NO_CONTACT_HISTORY: &str = "No contact made yet.";
/// History text of a freshly added agent.
pub const NEW_AGENT_HISTORY: &str = "New agent.";
/// Recovery-rate estimate given to new cases.
pub const DEFAULT_CASE_RECOVERY_RATE: f64 = 0.8;

// ── Enums ──────────────────────────────────────────────────────────

/// Where a case is in its lifecycle.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CaseStatus {
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    Paid,
    Defaulted,
}

impl CaseStatus {
    /// Paid and defaulted cases need no further work.
    pub fn is_closed(self) -> bool {
        matches!(self, CaseStatus::Paid | CaseStatus::Defaulted)
    }
}

impl std::fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaseStatus::Pending => write!(f, "Pending"),
            CaseStatus::InProgress => write!(f, "In Progress"),
            CaseStatus::Paid => write!(f, "Paid"),
            CaseStatus::Defaulted => write!(f, "Defaulted"),
        }
    }
}

/// A channel for reaching a debtor.
#[derive(Serialize, Deserialize, JsonSchema, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CommunicationChannel {
    Calling,
    Email,
    Messaging,
}

impl std::fmt::Display for CommunicationChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommunicationChannel::Calling => write!(f, "calling"),
            CommunicationChannel::Email => write!(f, "email"),
            CommunicationChannel::Messaging => write!(f, "messaging"),
        }
    }
}

// ── Records ────────────────────────────────────────────────────────

/// One debt-recovery record.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Case {
    pub id: String,
    pub debtor_name: String,
    pub invoice_no: String,
    pub due_amount: f64,
    pub due_date: NaiveDate,
    pub status: CaseStatus,
    pub priority_score: Option<f64>,
    pub assigned_dca_id: Option<String>,
    /// Days past the due date when the case was opened.
    pub overdue_aging: u32,
    pub recovery_rate: f64,
    /// Number of earlier overdue episodes for this debtor.
    pub has_overdue_history: u32,
    pub communication_history: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_mode: Option<CommunicationChannel>,
}

impl Case {
    pub fn is_assigned_to(&self, dca_id: &str) -> bool {
        self.assigned_dca_id.as_deref() == Some(dca_id)
    }
}

/// A debt collection agent. The credential is never serialized.
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Dca {
    pub id: String,
    pub name: String,
    pub username: String,
    #[serde(skip)]
    pub(crate) credential: PasswordHash,
    pub case_count: u32,
    pub recovery_rate: f64,
    pub case_history: String,
}

/// A scheduled task for one agent.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub id: String,
    pub dca_id: String,
    pub date: NaiveDate,
    /// Wall-clock time as `HH:MM`.
    pub time: String,
    pub task: String,
}

// ── Inputs ─────────────────────────────────────────────────────────

/// Fields an admin supplies when opening a case.
#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NewCase {
    pub debtor_name: String,
    pub invoice_no: String,
    pub due_amount: f64,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub has_overdue_history: u32,
}

/// Fields an admin supplies when adding an agent.
#[derive(Deserialize, Clone, Debug)]
pub struct NewDca {
    pub name: String,
    pub username: String,
    pub password: String,
}

/// Fields for a new schedule entry.
#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NewScheduleEntry {
    pub dca_id: String,
    pub date: NaiveDate,
    pub time: String,
    pub task: String,
}

/// A partial case update; absent fields are left alone.
#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CaseUpdate {
    pub debtor_name: Option<String>,
    pub invoice_no: Option<String>,
    pub due_amount: Option<f64>,
    pub due_date: Option<NaiveDate>,
    pub status: Option<CaseStatus>,
    pub priority_score: Option<f64>,
    pub assigned_dca_id: Option<String>,
    pub recovery_rate: Option<f64>,
    pub has_overdue_history: Option<u32>,
    pub communication_history: Option<String>,
    pub feedback: Option<String>,
    pub response_mode: Option<CommunicationChannel>,
}

/// A partial schedule entry update.
#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ScheduleUpdate {
    pub dca_id: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub task: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_wire_names_match_the_console() {
        assert_eq!(
            serde_json::to_value(CaseStatus::InProgress).unwrap(),
            "In Progress"
        );
        let parsed: CaseStatus = serde_json::from_str("\"Defaulted\"").unwrap();
        assert_eq!(parsed, CaseStatus::Defaulted);
        assert!(CaseStatus::Paid.is_closed());
        assert!(!CaseStatus::InProgress.is_closed());
    }

    #[test]
    fn channel_schema_lists_exactly_three_values() {
        let schema = crate::json_schema_for::<CommunicationChannel>();
        let values: Vec<&str> = schema["enum"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(values, ["calling", "email", "messaging"]);
    }

    #[test]
    fn case_update_accepts_partial_bodies() {
        let update: CaseUpdate =
            serde_json::from_str(r#"{"status":"Paid","priorityScore":55}"#).unwrap();
        assert_eq!(update.status, Some(CaseStatus::Paid));
        assert_eq!(update.priority_score, Some(55.0));
        assert!(update.debtor_name.is_none());
    }

    #[test]
    fn dca_serialization_omits_the_credential() {
        let dca = Dca {
            id: "dca-9".into(),
            name: "Meera".into(),
            username: "meera".into(),
            credential: PasswordHash::default(),
            case_count: 0,
            recovery_rate: 0.0,
            case_history: NEW_AGENT_HISTORY.into(),
        };
        let json = serde_json::to_value(&dca).unwrap();
        assert!(json.get("credential").is_none());
        assert!(json.get("password").is_none());
        assert_eq!(json["caseHistory"], NEW_AGENT_HISTORY);
    }
}
