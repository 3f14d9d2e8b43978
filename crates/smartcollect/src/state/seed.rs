//! Demo dataset loaded by [`CollectionState::seeded`](super::CollectionState::seeded).

use chrono::NaiveDate;

use super::model::{CaseStatus, CommunicationChannel, NO_CONTACT_HISTORY};

pub(super) struct SeedDca {
    pub name: &'static str,
    pub username: &'static str,
    pub password: &'static str,
    pub case_count: u32,
    pub recovery_rate: f64,
    pub case_history: &'static str,
}

pub(super) struct SeedCase {
    pub debtor_name: &'static str,
    pub invoice_no: &'static str,
    pub due_amount: f64,
    pub due_date: (i32, u32, u32),
    pub status: CaseStatus,
    /// Index into [`DCAS`].
    pub assigned: Option<usize>,
    pub overdue_aging: u32,
    pub recovery_rate: f64,
    pub has_overdue_history: u32,
    pub communication_history: &'static str,
    pub feedback: Option<(&'static str, CommunicationChannel)>,
}

pub(super) struct SeedEntry {
    /// Index into [`DCAS`].
    pub dca: usize,
    pub date: (i32, u32, u32),
    pub time: &'static str,
    pub task: &'static str,
}

pub(super) const DCAS: &[SeedDca] = &[
    SeedDca {
        name: "John Doe",
        username: "johndoe",
        password: "password123",
        case_count: 12,
        recovery_rate: 0.75,
        case_history: "- Recovered 9 of 12 cases.\n- Strong phone follow-up, average 18 days to settlement.",
    },
    SeedDca {
        name: "Priya Sharma",
        username: "priyasharma",
        password: "password123",
        case_count: 8,
        recovery_rate: 0.5,
        case_history: "- Recovered 4 of 8 cases.\n- Prefers email; slow on accounts older than 60 days.",
    },
    SeedDca {
        name: "Arjun Mehta",
        username: "arjunmehta",
        password: "password123",
        case_count: 5,
        recovery_rate: 0.8,
        case_history: "- Recovered 4 of 5 cases.\n- Good results over messaging with younger debtors.",
    },
];

pub(super) const CASES: &[SeedCase] = &[
    SeedCase {
        debtor_name: "Rohan Gupta",
        invoice_no: "INV-1001",
        due_amount: 15000.0,
        due_date: (2024, 4, 15),
        status: CaseStatus::InProgress,
        assigned: Some(0),
        overdue_aging: 45,
        recovery_rate: 0.6,
        has_overdue_history: 2,
        communication_history: "- Called on 2024-05-02, promised payment.\n- Email reminder sent 2024-05-20, no reply.",
        feedback: None,
    },
    SeedCase {
        debtor_name: "Anita Desai",
        invoice_no: "INV-1002",
        due_amount: 8200.0,
        due_date: (2024, 5, 1),
        status: CaseStatus::Pending,
        assigned: None,
        overdue_aging: 30,
        recovery_rate: 0.8,
        has_overdue_history: 0,
        communication_history: NO_CONTACT_HISTORY,
        feedback: None,
    },
    SeedCase {
        debtor_name: "Vikram Singh",
        invoice_no: "INV-1003",
        due_amount: 42000.0,
        due_date: (2024, 2, 10),
        status: CaseStatus::Defaulted,
        assigned: Some(1),
        overdue_aging: 110,
        recovery_rate: 0.3,
        has_overdue_history: 4,
        communication_history: "- Three calls unanswered.\n- Registered letter returned.",
        feedback: None,
    },
    SeedCase {
        debtor_name: "Kavya Nair",
        invoice_no: "INV-1004",
        due_amount: 5600.0,
        due_date: (2024, 5, 20),
        status: CaseStatus::Paid,
        assigned: Some(2),
        overdue_aging: 12,
        recovery_rate: 0.9,
        has_overdue_history: 1,
        communication_history: "- Responded to messaging.",
        feedback: Some(("Paid in full after one reminder.", CommunicationChannel::Messaging)),
    },
    SeedCase {
        debtor_name: "Suresh Iyer",
        invoice_no: "INV-1005",
        due_amount: 23750.0,
        due_date: (2024, 3, 28),
        status: CaseStatus::InProgress,
        assigned: Some(2),
        overdue_aging: 62,
        recovery_rate: 0.55,
        has_overdue_history: 1,
        communication_history: "- Messaged twice, read but no reply.\n- Responded to calling.",
        feedback: Some(("Asked for a two-month instalment plan.", CommunicationChannel::Calling)),
    },
];

pub(super) const SCHEDULE: &[SeedEntry] = &[
    SeedEntry {
        dca: 0,
        date: (2024, 6, 3),
        time: "10:00",
        task: "Follow-up call with Rohan Gupta",
    },
    SeedEntry {
        dca: 1,
        date: (2024, 6, 3),
        time: "09:30",
        task: "Review defaulted accounts",
    },
    SeedEntry {
        dca: 2,
        date: (2024, 6, 4),
        time: "14:00",
        task: "Confirm instalment plan with Suresh Iyer",
    },
];

pub(super) fn date((y, m, d): (i32, u32, u32)) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}
