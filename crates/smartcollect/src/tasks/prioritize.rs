//! Case prioritization: a 0–100 urgency score for one overdue case.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::PromptTask;
use crate::state::Case;

/// Scores a case from its ageing, amount, recovery rate and overdue history.
pub struct PrioritizeCases;

/// Numbers the prioritization prompt is built from.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PriorityInput {
    /// The number of days the debt is overdue.
    pub overdue_aging: u32,
    /// The total amount of debt due.
    pub due_amount: f64,
    /// The historical recovery rate for similar cases, expressed as a fraction (e.g., 0.75 for 75%).
    pub recovery_rate: f64,
    /// The number of times the debtor has been overdue in the past.
    pub has_overdue_history: u32,
}

impl From<&Case> for PriorityInput {
    fn from(case: &Case) -> Self {
        Self {
            overdue_aging: case.overdue_aging,
            due_amount: case.due_amount,
            recovery_rate: case.recovery_rate,
            has_overdue_history: case.has_overdue_history,
        }
    }
}

/// The model's verdict.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PriorityAssessment {
    /// A numerical score between 0 and 100 indicating the priority of the case (higher value means higher priority).
    #[schemars(range(min = 0, max = 100))]
    pub priority_score: f64,
    /// A brief explanation of why the case was assigned the given priority.
    pub priority_reason: String,
}

impl PromptTask for PrioritizeCases {
    const NAME: &'static str = "prioritizeCases";
    const TEMPLATE: &'static str = "\
You are an AI assistant that prioritizes debt collection cases.

Analyze the following case data to determine its priority. Cases with no prior overdue history (a value of 0) should be marked as high priority.

Overdue Aging: {{overdueAging}} days
Due Amount: {{dueAmount}}
Recovery Rate: {{recoveryRate}}
Previous Overdue Count: {{hasOverdueHistory}}

Based on this information, assign a priority score between 0 and 100 (higher is more urgent) and explain your reasoning.

Consider these guidelines:
- Higher overdue aging and due amount generally increase priority.
- Lower recovery rates increase priority.
- Cases with a higher number of previous overdues should have a higher priority.
- Cases with no overdue history (0) should be prioritized as high.

Ensure the output is in JSON format.";
    type Input = PriorityInput;
    type Output = PriorityAssessment;
}
