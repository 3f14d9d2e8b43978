//! DCA performance analysis.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::PromptTask;
use crate::state::Dca;

/// Summarizes an agent's track record and recommends case assignments.
pub struct AnalyzeDcaPerformance;

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceInput {
    /// The ID of the DCA to analyze.
    pub dca_id: String,
    /// The historical data of cases handled by the DCA, including recovery rates, communication modes, and timelines.
    pub case_history: String,
}

impl From<&Dca> for PerformanceInput {
    fn from(dca: &Dca) -> Self {
        Self {
            dca_id: dca.id.clone(),
            case_history: dca.case_history.clone(),
        }
    }
}

/// Both fields are required and non-empty; a reply with only one of them
/// fails validation as a whole.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceAnalysis {
    /// A summary of the DCA performance analysis, including strengths, weaknesses, and areas for improvement.
    #[schemars(length(min = 1))]
    pub analysis_summary: String,
    /// Recommendations for optimal case assignments based on the DCA performance analysis.
    #[schemars(length(min = 1))]
    pub recommended_assignments: String,
}

impl PromptTask for AnalyzeDcaPerformance {
    const NAME: &'static str = "analyzeDcaPerformance";
    const TEMPLATE: &'static str = "\
You are an AI assistant specialized in analyzing Debt Collection Agency (DCA) performance.

You will analyze the provided case history of a specific DCA and provide a summary of their performance.

Based on the analysis, you will recommend optimal case assignments to improve overall recovery rates.

DCA ID: {{{dcaId}}}
Case History: {{{caseHistory}}}

Analyze the DCA's performance, focusing on recovery rates, communication modes, and timelines.
Provide a summary of the DCA's strengths and weaknesses.
Recommend optimal case assignments based on the analysis.";
    type Input = PerformanceInput;
    type Output = PerformanceAnalysis;
}
