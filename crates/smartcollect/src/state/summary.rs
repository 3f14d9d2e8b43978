//! Derived dashboard figures. Recomputed on demand, never stored.

use serde::Serialize;

use super::model::{Case, CaseStatus, Dca};

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_cases: usize,
    pub total_dcas: usize,
    /// Sum of `dueAmount` over every case.
    pub total_due: f64,
    /// Cases in progress or defaulted.
    pub overdue_cases: usize,
    pub solved_cases: usize,
    /// Assigned and not yet paid.
    pub assigned_cases: usize,
    pub not_assigned_cases: usize,
    pub dca_workload: Vec<DcaWorkload>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DcaWorkload {
    pub dca_id: String,
    pub name: String,
    /// All cases currently assigned, closed ones included.
    pub assigned_cases: usize,
    pub recovery_rate: f64,
}

impl DashboardSummary {
    pub fn compute(cases: &[Case], dcas: &[Dca]) -> Self {
        let count = |pred: &dyn Fn(&Case) -> bool| cases.iter().filter(|c| pred(c)).count();

        Self {
            total_cases: cases.len(),
            total_dcas: dcas.len(),
            total_due: cases.iter().map(|c| c.due_amount).sum(),
            overdue_cases: count(&|c| {
                matches!(c.status, CaseStatus::InProgress | CaseStatus::Defaulted)
            }),
            solved_cases: count(&|c| c.status == CaseStatus::Paid),
            assigned_cases: count(&|c| c.assigned_dca_id.is_some() && c.status != CaseStatus::Paid),
            not_assigned_cases: count(&|c| c.assigned_dca_id.is_none()),
            dca_workload: dcas
                .iter()
                .map(|d| DcaWorkload {
                    dca_id: d.id.clone(),
                    name: d.name.clone(),
                    assigned_cases: count(&|c| c.is_assigned_to(&d.id)),
                    recovery_rate: d.recovery_rate,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::CollectionState;

    #[test]
    fn empty_state_has_zero_totals() {
        let summary = DashboardSummary::compute(&[], &[]);
        assert_eq!(summary.total_cases, 0);
        assert_eq!(summary.total_due, 0.0);
        assert!(summary.dca_workload.is_empty());
    }

    #[test]
    fn counts_follow_status_and_assignment() {
        let state = CollectionState::seeded();
        let summary = DashboardSummary::compute(state.cases(), state.dcas());

        let cases = state.cases();
        let expected_due: f64 = cases.iter().map(|c| c.due_amount).sum();
        assert_eq!(summary.total_due, expected_due);
        assert_eq!(
            summary.solved_cases,
            cases.iter().filter(|c| c.status == CaseStatus::Paid).count()
        );
        assert_eq!(
            summary.assigned_cases + summary.not_assigned_cases,
            cases
                .iter()
                .filter(|c| !(c.assigned_dca_id.is_some() && c.status == CaseStatus::Paid))
                .count()
        );
        let per_dca: usize = summary.dca_workload.iter().map(|w| w.assigned_cases).sum();
        assert_eq!(per_dca, cases.len() - summary.not_assigned_cases);
    }
}
