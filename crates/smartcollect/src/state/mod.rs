//! In-memory collection state: cases, agents, schedule and session.
//!
//! [`CollectionState`] is an explicit application-state object. Nothing in
//! this crate keeps it in a global; whoever needs it is handed a reference
//! (the web server shares one behind `Arc<Mutex<_>>`). Every mutation goes
//! through a method here, so cross-record rules live in one place:
//!
//! - marking an assigned case `Paid` credits its agent (case count, recovery
//!   rate, case history);
//! - recording a response mode appends to the case's communication history;
//! - removing an agent unassigns its cases and deletes its schedule entries
//!   in the same call.
//!
//! Data is volatile by design: it lives as long as the process.

mod model;
pub mod notices;
mod seed;
pub mod summary;

pub use model::{
    Case, CaseStatus, CaseUpdate, CommunicationChannel, DEFAULT_CASE_RECOVERY_RATE, Dca,
    NEW_AGENT_HISTORY, NO_CONTACT_HISTORY, NewCase, NewDca, NewScheduleEntry, ScheduleEntry,
    ScheduleUpdate,
};
pub use notices::{Notice, NoticeFeed, NoticeVariant};
pub use summary::{DashboardSummary, DcaWorkload};

use std::sync::Arc;

use chrono::{Local, NaiveDate, NaiveTime};
use tracing::{debug, info};

use crate::auth::{
    AdminAccount, CredentialVerifier, DEFAULT_ADMIN_PASSWORD, DEFAULT_ADMIN_USERNAME,
    LoginOutcome, SessionUser, Sha256Verifier,
};

/// Why a state operation was refused.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StateError {
    #[error("case {0} not found")]
    CaseNotFound(String),
    #[error("DCA {0} not found")]
    DcaNotFound(String),
    #[error("schedule entry {0} not found")]
    EntryNotFound(String),
    #[error("username {0} is already taken")]
    UsernameTaken(String),
    #[error("case {case} is not assigned to {dca}")]
    NotAssigned { case: String, dca: String },
    #[error("no agent is logged in")]
    NotLoggedIn,
    #[error("{0}")]
    Invalid(String),
}

/// What [`CollectionState::remove_dca`] took out.
#[derive(Debug, Clone)]
pub struct RemovedDca {
    pub dca: Dca,
    pub unassigned_cases: usize,
    pub removed_entries: usize,
}

pub struct CollectionState {
    cases: Vec<Case>,
    dcas: Vec<Dca>,
    schedule: Vec<ScheduleEntry>,
    admin: AdminAccount,
    session: Option<SessionUser>,
    notices: NoticeFeed,
    verifier: Arc<dyn CredentialVerifier>,
    sequence: u64,
    today: Option<NaiveDate>,
}

impl Default for CollectionState {
    fn default() -> Self {
        Self::new()
    }
}

impl CollectionState {
    /// Empty state with the default admin account.
    pub fn new() -> Self {
        Self::with_verifier(Arc::new(Sha256Verifier))
    }

    /// Empty state whose credentials are hashed and checked by `verifier`.
    pub fn with_verifier(verifier: Arc<dyn CredentialVerifier>) -> Self {
        let admin = AdminAccount::new(
            DEFAULT_ADMIN_USERNAME,
            DEFAULT_ADMIN_PASSWORD,
            verifier.as_ref(),
        );
        Self {
            cases: Vec::new(),
            dcas: Vec::new(),
            schedule: Vec::new(),
            admin,
            session: None,
            notices: NoticeFeed::default(),
            verifier,
            sequence: 0,
            today: None,
        }
    }

    /// State preloaded with the demo agents, cases and schedule.
    pub fn seeded() -> Self {
        let mut state = Self::new();
        state.load_seed();
        state
    }

    /// Replace the admin credentials. The username must not belong to an
    /// existing agent.
    pub fn with_admin(mut self, username: &str, password: &str) -> Result<Self, StateError> {
        require_text("Admin username", username)?;
        require_text("Admin password", password)?;
        let username = username.trim();
        if self.dcas.iter().any(|d| d.username == username) {
            return Err(StateError::UsernameTaken(username.to_string()));
        }
        self.admin = AdminAccount::new(username, password, self.verifier.as_ref());
        Ok(self)
    }

    /// Pin "today" for overdue-age calculations.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    fn next_id(&mut self, prefix: &str) -> String {
        self.sequence += 1;
        format!("{prefix}-{}", self.sequence)
    }

    // ── Queries ────────────────────────────────────────────────────

    pub fn cases(&self) -> &[Case] {
        &self.cases
    }

    pub fn dcas(&self) -> &[Dca] {
        &self.dcas
    }

    pub fn schedule(&self) -> &[ScheduleEntry] {
        &self.schedule
    }

    pub fn case(&self, id: &str) -> Option<&Case> {
        self.cases.iter().find(|c| c.id == id)
    }

    pub fn dca(&self, id: &str) -> Option<&Dca> {
        self.dcas.iter().find(|d| d.id == id)
    }

    pub fn schedule_entry(&self, id: &str) -> Option<&ScheduleEntry> {
        self.schedule.iter().find(|e| e.id == id)
    }

    /// Cases no agent has responded on yet.
    pub fn unresolved_cases(&self) -> Vec<&Case> {
        self.cases.iter().filter(|c| c.feedback.is_none()).collect()
    }

    /// Cases with agent feedback that are still open.
    pub fn responded_cases(&self) -> Vec<&Case> {
        self.cases
            .iter()
            .filter(|c| c.feedback.is_some() && !c.status.is_closed())
            .collect()
    }

    /// Open cases assigned to one agent.
    pub fn cases_for_dca(&self, dca_id: &str) -> Vec<&Case> {
        self.cases
            .iter()
            .filter(|c| c.is_assigned_to(dca_id) && !c.status.is_closed())
            .collect()
    }

    pub fn schedule_for_dca(&self, dca_id: &str) -> Vec<&ScheduleEntry> {
        let mut entries: Vec<&ScheduleEntry> =
            self.schedule.iter().filter(|e| e.dca_id == dca_id).collect();
        entries.sort_by(|a, b| (a.date, &a.time).cmp(&(b.date, &b.time)));
        entries
    }

    /// Entries on `date`, earliest first.
    pub fn schedule_for_date(&self, date: NaiveDate) -> Vec<&ScheduleEntry> {
        let mut entries: Vec<&ScheduleEntry> =
            self.schedule.iter().filter(|e| e.date == date).collect();
        entries.sort_by(|a, b| a.time.cmp(&b.time));
        entries
    }

    pub fn dashboard(&self) -> DashboardSummary {
        DashboardSummary::compute(&self.cases, &self.dcas)
    }

    // ── Notices ────────────────────────────────────────────────────

    pub fn notices(&self) -> &NoticeFeed {
        &self.notices
    }

    /// Post a notice to the console feed.
    pub fn notify(
        &mut self,
        variant: NoticeVariant,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> u64 {
        self.notices.push(variant, title, description)
    }

    // ── Cases ──────────────────────────────────────────────────────

    /// Open a new case. It starts `Pending`, unassigned and unscored, with
    /// its overdue age measured from the due date to today.
    pub fn add_case(&mut self, new: NewCase) -> Result<Case, StateError> {
        require_text("Debtor name", &new.debtor_name)?;
        require_text("Invoice number", &new.invoice_no)?;
        require_amount(new.due_amount)?;

        let overdue_days = (self.today() - new.due_date).num_days().max(0);
        let id = self.next_id("case");
        let case = Case {
            id,
            debtor_name: new.debtor_name.trim().to_string(),
            invoice_no: new.invoice_no.trim().to_string(),
            due_amount: new.due_amount,
            due_date: new.due_date,
            status: CaseStatus::Pending,
            priority_score: None,
            assigned_dca_id: None,
            overdue_aging: u32::try_from(overdue_days).unwrap_or(u32::MAX),
            recovery_rate: DEFAULT_CASE_RECOVERY_RATE,
            has_overdue_history: new.has_overdue_history,
            communication_history: NO_CONTACT_HISTORY.to_string(),
            feedback: None,
            response_mode: None,
        };
        info!("case {} opened for {}", case.id, case.debtor_name);
        self.notify(
            NoticeVariant::Default,
            "Case Created",
            format!("New case for {} has been added.", case.debtor_name),
        );
        self.cases.push(case.clone());
        Ok(case)
    }

    /// Apply a partial update to a case.
    ///
    /// A new `responseMode` is also logged in the communication history. A
    /// transition to `Paid` credits the assigned agent.
    pub fn update_case(&mut self, id: &str, update: CaseUpdate) -> Result<Case, StateError> {
        let idx = self
            .cases
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| StateError::CaseNotFound(id.to_string()))?;

        if let Some(ref dca_id) = update.assigned_dca_id
            && self.dca(dca_id).is_none()
        {
            return Err(StateError::DcaNotFound(dca_id.clone()));
        }
        if let Some(ref name) = update.debtor_name {
            require_text("Debtor name", name)?;
        }
        if let Some(ref invoice) = update.invoice_no {
            require_text("Invoice number", invoice)?;
        }
        if let Some(amount) = update.due_amount {
            require_amount(amount)?;
        }
        if let Some(score) = update.priority_score {
            require_score(score)?;
        }
        if let Some(rate) = update.recovery_rate
            && !(0.0..=1.0).contains(&rate)
        {
            return Err(StateError::Invalid(
                "Recovery rate must be between 0 and 1".into(),
            ));
        }

        let case = &mut self.cases[idx];
        let was_paid = case.status == CaseStatus::Paid;

        if let Some(v) = update.debtor_name {
            case.debtor_name = v.trim().to_string();
        }
        if let Some(v) = update.invoice_no {
            case.invoice_no = v.trim().to_string();
        }
        if let Some(v) = update.due_amount {
            case.due_amount = v;
        }
        if let Some(v) = update.due_date {
            case.due_date = v;
        }
        if let Some(v) = update.status {
            case.status = v;
        }
        if let Some(v) = update.priority_score {
            case.priority_score = Some(v);
        }
        if let Some(v) = update.assigned_dca_id {
            case.assigned_dca_id = Some(v);
        }
        if let Some(v) = update.recovery_rate {
            case.recovery_rate = v;
        }
        if let Some(v) = update.has_overdue_history {
            case.has_overdue_history = v;
        }
        if let Some(v) = update.communication_history {
            case.communication_history = v;
        }
        if let Some(v) = update.feedback {
            case.feedback = Some(v);
        }
        if let Some(mode) = update.response_mode {
            case.response_mode = Some(mode);
            let entry = format!("- Responded to {mode}.");
            case.communication_history = if case.communication_history == NO_CONTACT_HISTORY {
                entry
            } else {
                format!("{}\n{entry}", case.communication_history)
            };
        }

        let updated = case.clone();
        debug!("case {} updated", updated.id);

        if !was_paid
            && updated.status == CaseStatus::Paid
            && let Some(ref dca_id) = updated.assigned_dca_id
        {
            self.credit_recovery(dca_id, &updated);
        }
        Ok(updated)
    }

    fn credit_recovery(&mut self, dca_id: &str, case: &Case) {
        let Some(dca) = self.dcas.iter_mut().find(|d| d.id == dca_id) else {
            return;
        };
        let solved_before = f64::from(dca.case_count) * dca.recovery_rate;
        dca.case_count += 1;
        dca.recovery_rate = (solved_before + 1.0) / f64::from(dca.case_count);
        dca.case_history.push_str(&format!(
            "\n- Solved case: {}, Amount: \u{20b9}{}, Status: Paid.",
            case.debtor_name, case.due_amount
        ));
        info!(
            "DCA {} credited for case {} (recovery rate now {:.2})",
            dca.id, case.id, dca.recovery_rate
        );
    }

    /// Assign a case to an agent.
    pub fn assign_case(&mut self, case_id: &str, dca_id: &str) -> Result<Case, StateError> {
        let case = self.update_case(
            case_id,
            CaseUpdate {
                assigned_dca_id: Some(dca_id.to_string()),
                ..Default::default()
            },
        )?;
        let agent = self.dca(dca_id).map(|d| d.name.clone()).unwrap_or_default();
        info!("case {} assigned to {}", case.id, dca_id);
        self.notify(
            NoticeVariant::Default,
            "Case Assigned",
            format!("{}'s case has been assigned to {agent}.", case.debtor_name),
        );
        Ok(case)
    }

    pub fn mark_paid(&mut self, case_id: &str) -> Result<Case, StateError> {
        let case = self.update_case(
            case_id,
            CaseUpdate {
                status: Some(CaseStatus::Paid),
                ..Default::default()
            },
        )?;
        self.notify(
            NoticeVariant::Default,
            "Case Updated",
            "The case has been marked as Paid.",
        );
        Ok(case)
    }

    /// Store a priority score returned by the prioritization task.
    pub fn set_priority_score(&mut self, case_id: &str, score: f64) -> Result<Case, StateError> {
        self.update_case(
            case_id,
            CaseUpdate {
                priority_score: Some(score),
                ..Default::default()
            },
        )
    }

    /// Record an agent's response on one of their cases. The case moves to
    /// `In Progress`.
    pub fn submit_feedback(
        &mut self,
        case_id: &str,
        dca_id: &str,
        feedback: &str,
        mode: CommunicationChannel,
    ) -> Result<Case, StateError> {
        require_text("Feedback", feedback)?;
        let case = self
            .case(case_id)
            .ok_or_else(|| StateError::CaseNotFound(case_id.to_string()))?;
        if !case.is_assigned_to(dca_id) {
            return Err(StateError::NotAssigned {
                case: case_id.to_string(),
                dca: dca_id.to_string(),
            });
        }
        let case = self.update_case(
            case_id,
            CaseUpdate {
                feedback: Some(feedback.trim().to_string()),
                response_mode: Some(mode),
                status: Some(CaseStatus::InProgress),
                ..Default::default()
            },
        )?;
        self.notify(
            NoticeVariant::Default,
            "Feedback Submitted",
            format!("Your feedback for case {} has been sent.", case.invoice_no),
        );
        Ok(case)
    }

    // ── Agents ─────────────────────────────────────────────────────

    pub fn add_dca(&mut self, new: NewDca) -> Result<Dca, StateError> {
        require_text("DCA name", &new.name)?;
        require_text("Username", &new.username)?;
        require_text("Password", &new.password)?;
        let username = new.username.trim().to_string();
        if username == self.admin.username || self.dcas.iter().any(|d| d.username == username) {
            return Err(StateError::UsernameTaken(username));
        }

        let id = self.next_id("dca");
        let dca = Dca {
            id,
            name: new.name.trim().to_string(),
            username,
            credential: self.verifier.hash(&new.password),
            case_count: 0,
            recovery_rate: 0.0,
            case_history: NEW_AGENT_HISTORY.to_string(),
        };
        info!("DCA {} added ({})", dca.id, dca.username);
        self.notify(
            NoticeVariant::Default,
            "DCA Added",
            format!("New agent {} has been added.", dca.name),
        );
        self.dcas.push(dca.clone());
        Ok(dca)
    }

    /// Remove an agent together with everything that points at it. Its cases
    /// become unassigned and `Pending`, its schedule entries are deleted and
    /// a logged-in session for the agent ends. Nothing changes if the agent
    /// does not exist.
    pub fn remove_dca(&mut self, dca_id: &str) -> Result<RemovedDca, StateError> {
        let idx = self
            .dcas
            .iter()
            .position(|d| d.id == dca_id)
            .ok_or_else(|| StateError::DcaNotFound(dca_id.to_string()))?;
        let dca = self.dcas.remove(idx);

        let mut unassigned_cases = 0;
        for case in self.cases.iter_mut().filter(|c| c.is_assigned_to(dca_id)) {
            case.assigned_dca_id = None;
            case.status = CaseStatus::Pending;
            unassigned_cases += 1;
        }

        let before = self.schedule.len();
        self.schedule.retain(|e| e.dca_id != dca_id);
        let removed_entries = before - self.schedule.len();

        if self
            .session
            .as_ref()
            .and_then(SessionUser::agent_id)
            .is_some_and(|id| id == dca_id)
        {
            self.session = None;
        }

        info!(
            "DCA {} removed: {} case(s) unassigned, {} schedule entr(ies) deleted",
            dca.id, unassigned_cases, removed_entries
        );
        self.notify(
            NoticeVariant::Default,
            "DCA Removed",
            format!(
                "Agent {} has been removed. Their cases are now unassigned.",
                dca.name
            ),
        );
        Ok(RemovedDca {
            dca,
            unassigned_cases,
            removed_entries,
        })
    }

    // ── Schedule ───────────────────────────────────────────────────

    pub fn add_schedule_entry(&mut self, new: NewScheduleEntry) -> Result<ScheduleEntry, StateError> {
        require_text("Task description", &new.task)?;
        require_time(&new.time)?;
        if self.dca(&new.dca_id).is_none() {
            return Err(StateError::DcaNotFound(new.dca_id));
        }
        let id = self.next_id("task");
        let entry = ScheduleEntry {
            id,
            dca_id: new.dca_id,
            date: new.date,
            time: new.time.trim().to_string(),
            task: new.task.trim().to_string(),
        };
        self.notify(
            NoticeVariant::Default,
            "Task Scheduled",
            format!("New task \"{}\" has been scheduled.", entry.task),
        );
        self.schedule.push(entry.clone());
        Ok(entry)
    }

    pub fn update_schedule_entry(
        &mut self,
        id: &str,
        update: ScheduleUpdate,
    ) -> Result<ScheduleEntry, StateError> {
        if let Some(ref task) = update.task {
            require_text("Task description", task)?;
        }
        if let Some(ref time) = update.time {
            require_time(time)?;
        }
        if let Some(ref dca_id) = update.dca_id
            && self.dca(dca_id).is_none()
        {
            return Err(StateError::DcaNotFound(dca_id.clone()));
        }
        let entry = self
            .schedule
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| StateError::EntryNotFound(id.to_string()))?;

        if let Some(v) = update.dca_id {
            entry.dca_id = v;
        }
        if let Some(v) = update.date {
            entry.date = v;
        }
        if let Some(v) = update.time {
            entry.time = v.trim().to_string();
        }
        if let Some(v) = update.task {
            entry.task = v.trim().to_string();
        }
        let entry = entry.clone();
        self.notify(
            NoticeVariant::Default,
            "Timetable Updated",
            "The task has been successfully updated.",
        );
        Ok(entry)
    }

    pub fn remove_schedule_entry(&mut self, id: &str) -> Result<ScheduleEntry, StateError> {
        let idx = self
            .schedule
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| StateError::EntryNotFound(id.to_string()))?;
        let entry = self.schedule.remove(idx);
        self.notify(
            NoticeVariant::Default,
            "Task Removed",
            format!("Task \"{}\" has been removed from the timetable.", entry.task),
        );
        Ok(entry)
    }

    // ── Session ────────────────────────────────────────────────────

    /// Check credentials and, on success, make the account the session user.
    ///
    /// A known username with the wrong password is `InvalidPassword`, an
    /// unknown one is `NotFound`. The admin account is checked first.
    pub fn login(&mut self, username: &str, password: &str) -> LoginOutcome {
        let username = username.trim();
        if username == self.admin.username {
            if !self.verifier.verify(password, &self.admin.credential) {
                info!("admin login rejected: wrong password");
                self.login_failed("Invalid username or password.");
                return LoginOutcome::InvalidPassword;
            }
            self.session = Some(SessionUser::Admin {
                id: self.admin.username.clone(),
                name: "Admin".into(),
            });
            info!("admin logged in");
            self.notify(
                NoticeVariant::Default,
                "Login Successful",
                "Signed in to the admin console.",
            );
            return LoginOutcome::Admin;
        }

        let Some(dca) = self.dcas.iter().find(|d| d.username == username) else {
            info!("login rejected: unknown username {username}");
            self.login_failed("DCA username not found.");
            return LoginOutcome::NotFound;
        };
        if !self.verifier.verify(password, &dca.credential) {
            info!("login rejected for {username}: wrong password");
            self.login_failed("Invalid password.");
            return LoginOutcome::InvalidPassword;
        }
        let user = SessionUser::Agent {
            id: dca.id.clone(),
            name: dca.name.clone(),
            username: dca.username.clone(),
        };
        let id = dca.id.clone();
        let greeting = format!("Signed in as {}.", dca.name);
        self.session = Some(user);
        info!("DCA {id} logged in");
        self.notify(NoticeVariant::Default, "Login Successful", greeting);
        LoginOutcome::Agent(id)
    }

    fn login_failed(&mut self, reason: &str) {
        self.notify(NoticeVariant::Destructive, "Login Failed", reason);
    }

    pub fn logout(&mut self) {
        if self.session.take().is_some() {
            info!("session ended");
        }
    }

    pub fn session(&self) -> Option<&SessionUser> {
        self.session.as_ref()
    }

    /// The logged-in agent.
    pub fn current_agent(&self) -> Result<&Dca, StateError> {
        let id = self
            .session
            .as_ref()
            .and_then(SessionUser::agent_id)
            .ok_or(StateError::NotLoggedIn)?;
        self.dca(id).ok_or(StateError::NotLoggedIn)
    }

    // ── Seed ───────────────────────────────────────────────────────

    fn load_seed(&mut self) {
        let mut dca_ids = Vec::with_capacity(seed::DCAS.len());
        for s in seed::DCAS {
            let id = self.next_id("dca");
            self.dcas.push(Dca {
                id: id.clone(),
                name: s.name.to_string(),
                username: s.username.to_string(),
                credential: self.verifier.hash(s.password),
                case_count: s.case_count,
                recovery_rate: s.recovery_rate,
                case_history: s.case_history.to_string(),
            });
            dca_ids.push(id);
        }

        for s in seed::CASES {
            let id = self.next_id("case");
            self.cases.push(Case {
                id,
                debtor_name: s.debtor_name.to_string(),
                invoice_no: s.invoice_no.to_string(),
                due_amount: s.due_amount,
                due_date: seed::date(s.due_date),
                status: s.status,
                priority_score: None,
                assigned_dca_id: s.assigned.and_then(|i| dca_ids.get(i).cloned()),
                overdue_aging: s.overdue_aging,
                recovery_rate: s.recovery_rate,
                has_overdue_history: s.has_overdue_history,
                communication_history: s.communication_history.to_string(),
                feedback: s.feedback.map(|(text, _)| text.to_string()),
                response_mode: s.feedback.map(|(_, mode)| mode),
            });
        }

        for s in seed::SCHEDULE {
            let Some(dca_id) = dca_ids.get(s.dca).cloned() else {
                continue;
            };
            let id = self.next_id("task");
            self.schedule.push(ScheduleEntry {
                id,
                dca_id,
                date: seed::date(s.date),
                time: s.time.to_string(),
                task: s.task.to_string(),
            });
        }
        debug!(
            "seeded {} DCA(s), {} case(s), {} schedule entr(ies)",
            self.dcas.len(),
            self.cases.len(),
            self.schedule.len()
        );
    }
}

// ── Validation helpers ─────────────────────────────────────────────

fn require_text(field: &str, value: &str) -> Result<(), StateError> {
    if value.trim().is_empty() {
        Err(StateError::Invalid(format!("{field} is required")))
    } else {
        Ok(())
    }
}

fn require_amount(amount: f64) -> Result<(), StateError> {
    if amount.is_finite() && amount >= 1.0 {
        Ok(())
    } else {
        Err(StateError::Invalid("Due amount must be positive".into()))
    }
}

fn require_score(score: f64) -> Result<(), StateError> {
    if (0.0..=100.0).contains(&score) {
        Ok(())
    } else {
        Err(StateError::Invalid(
            "Priority score must be between 0 and 100".into(),
        ))
    }
}

fn require_time(time: &str) -> Result<(), StateError> {
    NaiveTime::parse_from_str(time.trim(), "%H:%M")
        .map(|_| ())
        .map_err(|_| StateError::Invalid(format!("Time must be HH:MM, got {time:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn state() -> CollectionState {
        CollectionState::seeded().with_today(day(2024, 6, 1))
    }

    fn new_case(due: NaiveDate) -> NewCase {
        NewCase {
            debtor_name: "Meena Pillai".into(),
            invoice_no: "INV-2001".into(),
            due_amount: 12500.0,
            due_date: due,
            has_overdue_history: 1,
        }
    }

    fn first_dca_id(state: &CollectionState) -> String {
        state.dcas()[0].id.clone()
    }

    #[test]
    fn seeded_state_is_consistent() {
        let s = state();
        assert_eq!(s.dcas().len(), 3);
        assert_eq!(s.cases().len(), 5);
        for case in s.cases() {
            if let Some(ref id) = case.assigned_dca_id {
                assert!(s.dca(id).is_some());
            }
        }
        for entry in s.schedule() {
            assert!(s.dca(&entry.dca_id).is_some());
        }
    }

    #[test]
    fn add_case_sets_defaults_and_overdue_age() {
        let mut s = state();
        let case = s.add_case(new_case(day(2024, 5, 2))).unwrap();
        assert_eq!(case.status, CaseStatus::Pending);
        assert_eq!(case.overdue_aging, 30);
        assert_eq!(case.recovery_rate, DEFAULT_CASE_RECOVERY_RATE);
        assert_eq!(case.communication_history, NO_CONTACT_HISTORY);
        assert!(case.priority_score.is_none());
        assert!(case.assigned_dca_id.is_none());
        assert!(s.case(&case.id).is_some());
        assert_eq!(s.notices().latest().unwrap().title, "Case Created");
    }

    #[test]
    fn future_due_date_is_not_overdue() {
        let mut s = state();
        let case = s.add_case(new_case(day(2024, 7, 1))).unwrap();
        assert_eq!(case.overdue_aging, 0);
    }

    #[test]
    fn add_case_rejects_bad_input() {
        let mut s = state();
        let mut bad = new_case(day(2024, 5, 1));
        bad.due_amount = 0.0;
        assert!(matches!(s.add_case(bad), Err(StateError::Invalid(_))));
        let mut bad = new_case(day(2024, 5, 1));
        bad.debtor_name = "  ".into();
        assert!(matches!(s.add_case(bad), Err(StateError::Invalid(_))));
    }

    #[test]
    fn ids_are_unique() {
        let mut s = state();
        let a = s.add_case(new_case(day(2024, 5, 1))).unwrap();
        let b = s.add_case(new_case(day(2024, 5, 1))).unwrap();
        assert_ne!(a.id, b.id);
        assert!(s.cases().iter().filter(|c| c.id == a.id).count() == 1);
    }

    #[test]
    fn response_mode_replaces_placeholder_history_then_appends() {
        let mut s = state();
        let case = s.add_case(new_case(day(2024, 5, 1))).unwrap();
        let case = s
            .update_case(
                &case.id,
                CaseUpdate {
                    response_mode: Some(CommunicationChannel::Email),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(case.communication_history, "- Responded to email.");
        let case = s
            .update_case(
                &case.id,
                CaseUpdate {
                    response_mode: Some(CommunicationChannel::Calling),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(
            case.communication_history,
            "- Responded to email.\n- Responded to calling."
        );
    }

    #[test]
    fn paying_an_assigned_case_credits_the_agent_once() {
        let mut s = state();
        let dca_id = first_dca_id(&s);
        let (count, rate) = {
            let d = s.dca(&dca_id).unwrap();
            (d.case_count, d.recovery_rate)
        };
        let case = s.add_case(new_case(day(2024, 5, 1))).unwrap();
        s.assign_case(&case.id, &dca_id).unwrap();
        s.mark_paid(&case.id).unwrap();

        let d = s.dca(&dca_id).unwrap();
        assert_eq!(d.case_count, count + 1);
        let expected = (f64::from(count) * rate + 1.0) / f64::from(count + 1);
        assert!((d.recovery_rate - expected).abs() < 1e-9);
        assert!(d
            .case_history
            .ends_with("- Solved case: Meena Pillai, Amount: \u{20b9}12500, Status: Paid."));

        // Marking it paid again does not double-count.
        s.mark_paid(&case.id).unwrap();
        assert_eq!(s.dca(&dca_id).unwrap().case_count, count + 1);
    }

    #[test]
    fn paying_an_unassigned_case_credits_nobody() {
        let mut s = state();
        let before: Vec<u32> = s.dcas().iter().map(|d| d.case_count).collect();
        let case = s.add_case(new_case(day(2024, 5, 1))).unwrap();
        s.mark_paid(&case.id).unwrap();
        let after: Vec<u32> = s.dcas().iter().map(|d| d.case_count).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn assigning_to_unknown_dca_fails() {
        let mut s = state();
        let case_id = s.cases()[1].id.clone();
        let err = s.assign_case(&case_id, "dca-404").unwrap_err();
        assert_eq!(err, StateError::DcaNotFound("dca-404".into()));
        assert!(s.case(&case_id).unwrap().assigned_dca_id.is_none());
    }

    #[test]
    fn priority_score_is_range_checked() {
        let mut s = state();
        let case_id = s.cases()[0].id.clone();
        assert!(s.set_priority_score(&case_id, 101.0).is_err());
        let case = s.set_priority_score(&case_id, 64.5).unwrap();
        assert_eq!(case.priority_score, Some(64.5));
    }

    #[test]
    fn remove_dca_cascades_to_cases_and_schedule() {
        let mut s = state();
        let dca_id = first_dca_id(&s);
        let open_before = s.cases_for_dca(&dca_id).len();
        assert!(open_before > 0);
        assert!(!s.schedule_for_dca(&dca_id).is_empty());

        let removed = s.remove_dca(&dca_id).unwrap();
        assert_eq!(removed.dca.id, dca_id);
        assert!(removed.unassigned_cases >= open_before);
        assert_eq!(removed.removed_entries, 1);

        assert!(s.dca(&dca_id).is_none());
        assert!(s.cases().iter().all(|c| !c.is_assigned_to(&dca_id)));
        assert!(s.schedule().iter().all(|e| e.dca_id != dca_id));
        assert_eq!(s.notices().latest().unwrap().title, "DCA Removed");
    }

    #[test]
    fn remove_dca_resets_every_held_case_to_pending() {
        let mut s = state();
        // The third seeded agent holds one paid and one in-progress case.
        let dca_id = s.dcas()[2].id.clone();
        let held: Vec<String> = s
            .cases()
            .iter()
            .filter(|c| c.is_assigned_to(&dca_id))
            .map(|c| c.id.clone())
            .collect();
        assert_eq!(held.len(), 2);

        let removed = s.remove_dca(&dca_id).unwrap();
        assert_eq!(removed.unassigned_cases, 2);
        for id in held {
            let case = s.case(&id).unwrap();
            assert!(case.assigned_dca_id.is_none());
            assert_eq!(case.status, CaseStatus::Pending);
        }
    }

    #[test]
    fn removing_logged_in_agent_ends_session() {
        let mut s = state();
        assert!(matches!(
            s.login("johndoe", "password123"),
            LoginOutcome::Agent(_)
        ));
        let id = s.current_agent().unwrap().id.clone();
        s.remove_dca(&id).unwrap();
        assert!(s.session().is_none());
    }

    #[test]
    fn remove_unknown_dca_changes_nothing() {
        let mut s = state();
        let cases = s.cases().to_vec();
        assert!(s.remove_dca("dca-404").is_err());
        assert_eq!(s.cases(), cases.as_slice());
    }

    #[test]
    fn add_dca_defaults_and_unique_usernames() {
        let mut s = state();
        let dca = s
            .add_dca(NewDca {
                name: "Neha Rao".into(),
                username: "neharao".into(),
                password: "pw".into(),
            })
            .unwrap();
        assert_eq!(dca.case_count, 0);
        assert_eq!(dca.recovery_rate, 0.0);
        assert_eq!(dca.case_history, NEW_AGENT_HISTORY);

        let dup = s.add_dca(NewDca {
            name: "Other".into(),
            username: "neharao".into(),
            password: "pw".into(),
        });
        assert_eq!(dup.unwrap_err(), StateError::UsernameTaken("neharao".into()));
        let admin_clash = s.add_dca(NewDca {
            name: "Other".into(),
            username: DEFAULT_ADMIN_USERNAME.into(),
            password: "pw".into(),
        });
        assert!(admin_clash.is_err());
    }

    #[test]
    fn login_classifies_every_outcome() {
        let mut s = state();
        assert_eq!(
            s.login(DEFAULT_ADMIN_USERNAME, DEFAULT_ADMIN_PASSWORD),
            LoginOutcome::Admin
        );
        assert!(s.session().unwrap().is_admin());
        assert_eq!(
            s.login(DEFAULT_ADMIN_USERNAME, "nope"),
            LoginOutcome::InvalidPassword
        );
        assert_eq!(s.login("johndoe", "wrong"), LoginOutcome::InvalidPassword);
        assert_eq!(s.login("nobody", "x"), LoginOutcome::NotFound);
        let outcome = s.login("johndoe", "password123");
        assert_eq!(outcome, LoginOutcome::Agent(first_dca_id(&s)));
        s.logout();
        assert!(s.session().is_none());
        assert_eq!(s.current_agent().unwrap_err(), StateError::NotLoggedIn);
    }

    #[test]
    fn new_agent_can_log_in_with_their_password() {
        let mut s = state();
        let dca = s
            .add_dca(NewDca {
                name: "Neha Rao".into(),
                username: "neharao".into(),
                password: "letmein".into(),
            })
            .unwrap();
        assert_eq!(s.login("neharao", "letmein"), LoginOutcome::Agent(dca.id));
    }

    #[test]
    fn custom_admin_credentials_replace_the_default() {
        let mut s = CollectionState::new().with_admin(" root ", "toor").unwrap();
        assert_eq!(s.login("root", "toor"), LoginOutcome::Admin);
        assert_eq!(
            s.login(DEFAULT_ADMIN_USERNAME, DEFAULT_ADMIN_PASSWORD),
            LoginOutcome::NotFound
        );
    }

    #[test]
    fn admin_username_cannot_shadow_an_agent() {
        let err = CollectionState::seeded()
            .with_admin("johndoe", "root")
            .err()
            .unwrap();
        assert_eq!(err, StateError::UsernameTaken("johndoe".into()));
        assert!(matches!(
            CollectionState::seeded().with_admin("  ", "root"),
            Err(StateError::Invalid(_))
        ));

        let mut s = CollectionState::seeded().with_admin("root", "toor").unwrap();
        assert!(matches!(
            s.login("johndoe", "password123"),
            LoginOutcome::Agent(_)
        ));
    }

    #[test]
    fn feedback_requires_ownership_and_moves_case_in_progress() {
        let mut s = state();
        let dca_id = first_dca_id(&s);
        let case = s.add_case(new_case(day(2024, 5, 1))).unwrap();
        let err = s
            .submit_feedback(&case.id, &dca_id, "Spoke to debtor", CommunicationChannel::Calling)
            .unwrap_err();
        assert!(matches!(err, StateError::NotAssigned { .. }));

        s.assign_case(&case.id, &dca_id).unwrap();
        let case = s
            .submit_feedback(&case.id, &dca_id, "Spoke to debtor", CommunicationChannel::Calling)
            .unwrap();
        assert_eq!(case.status, CaseStatus::InProgress);
        assert_eq!(case.feedback.as_deref(), Some("Spoke to debtor"));
        assert_eq!(case.response_mode, Some(CommunicationChannel::Calling));
        assert!(s.responded_cases().iter().any(|c| c.id == case.id));
        assert!(!s.unresolved_cases().iter().any(|c| c.id == case.id));
    }

    #[test]
    fn agent_views_exclude_closed_cases() {
        let s = state();
        for dca in s.dcas() {
            for case in s.cases_for_dca(&dca.id) {
                assert!(!case.status.is_closed());
                assert!(case.is_assigned_to(&dca.id));
            }
        }
    }

    #[test]
    fn schedule_crud_and_ordering() {
        let mut s = state();
        let dca_id = first_dca_id(&s);
        let date = day(2024, 6, 3);
        let early = s
            .add_schedule_entry(NewScheduleEntry {
                dca_id: dca_id.clone(),
                date,
                time: "08:15".into(),
                task: "Morning calls".into(),
            })
            .unwrap();
        let times: Vec<&str> = s
            .schedule_for_date(date)
            .iter()
            .map(|e| e.time.as_str())
            .collect();
        let mut sorted = times.clone();
        sorted.sort();
        assert_eq!(times, sorted);
        assert_eq!(times[0], "08:15");

        let moved = s
            .update_schedule_entry(
                &early.id,
                ScheduleUpdate {
                    time: Some("16:45".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(moved.time, "16:45");
        assert_eq!(moved.task, "Morning calls");

        let removed = s.remove_schedule_entry(&early.id).unwrap();
        assert_eq!(removed.id, early.id);
        assert!(s.schedule_entry(&early.id).is_none());
    }

    #[test]
    fn schedule_rejects_bad_time_and_unknown_agent() {
        let mut s = state();
        let dca_id = first_dca_id(&s);
        let bad_time = s.add_schedule_entry(NewScheduleEntry {
            dca_id,
            date: day(2024, 6, 3),
            time: "25:99".into(),
            task: "x".into(),
        });
        assert!(matches!(bad_time, Err(StateError::Invalid(_))));
        let bad_dca = s.add_schedule_entry(NewScheduleEntry {
            dca_id: "dca-404".into(),
            date: day(2024, 6, 3),
            time: "10:00".into(),
            task: "x".into(),
        });
        assert!(matches!(bad_dca, Err(StateError::DcaNotFound(_))));
    }
}
