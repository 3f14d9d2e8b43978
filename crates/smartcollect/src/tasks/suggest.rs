//! Communication channel suggestion from a case's reply history.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::PromptTask;
use crate::state::{Case, CommunicationChannel};

pub struct SuggestCommunicationMode;

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelInput {
    /// The past communication history for the case, including channels used and reply patterns.
    pub case_history: String,
}

impl From<&Case> for ChannelInput {
    fn from(case: &Case) -> Self {
        Self {
            case_history: case.communication_history.clone(),
        }
    }
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSuggestion {
    /// The suggested optimal communication channel based on the case history.
    pub suggested_channel: CommunicationChannel,
    /// The AI reasoning behind the suggested communication channel choice.
    pub reasoning: String,
}

impl PromptTask for SuggestCommunicationMode {
    const NAME: &'static str = "suggestCommunicationMode";
    const TEMPLATE: &'static str = "\
You are an AI assistant that suggests the optimal communication channel (calling, email, messaging) for debt collection cases based on their past reply patterns.

Analyze the following case history and suggest the best communication channel to increase engagement. Provide a brief reasoning for your choice.

Case History: {{{caseHistory}}}

Consider past reply patterns, channel effectiveness, and any other relevant information.

Your suggestion should be based on what would most likely result in a response from the debtor.

Ensure that your output matches the following schema: {{outputSchema}}.";
    type Input = ChannelInput;
    type Output = ChannelSuggestion;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ScriptedBackend, ScriptedReply};
    use crate::tasks::{TaskConfig, TaskError, TaskRunner};

    fn sample() -> ChannelInput {
        ChannelInput {
            case_history: "- Called twice, no answer.\n- Responded to messaging.".into(),
        }
    }

    async fn run_with(reply: &str) -> Result<ChannelSuggestion, TaskError> {
        let backend = ScriptedBackend::new().with_reply(ScriptedReply::Text(reply.into()));
        let runner = TaskRunner::new(&backend, TaskConfig::default());
        runner.run::<SuggestCommunicationMode>(&sample()).await
    }

    #[tokio::test]
    async fn each_declared_channel_is_accepted() {
        for (wire, channel) in [
            ("calling", CommunicationChannel::Calling),
            ("email", CommunicationChannel::Email),
            ("messaging", CommunicationChannel::Messaging),
        ] {
            let reply = format!(r#"{{"suggestedChannel":"{wire}","reasoning":"fits"}}"#);
            let out = run_with(&reply).await.unwrap();
            assert_eq!(out.suggested_channel, channel);
        }
    }

    #[tokio::test]
    async fn channel_outside_the_enum_is_rejected() {
        for wire in ["sms", "Email", "letter", ""] {
            let reply = format!(r#"{{"suggestedChannel":"{wire}","reasoning":"fits"}}"#);
            let e = run_with(&reply).await.unwrap_err();
            assert!(
                matches!(e, TaskError::SchemaViolation(_)),
                "{wire:?} should fail validation"
            );
        }
    }

    #[test]
    fn prompt_embeds_history_and_schema() {
        let backend = ScriptedBackend::new();
        let runner = TaskRunner::new(&backend, TaskConfig::default());
        let prompt = runner.render::<SuggestCommunicationMode>(&sample()).unwrap();
        assert!(prompt.contains("Called twice, no answer."));
        assert!(prompt.contains("suggestedChannel"));
        assert!(prompt.contains("messaging"));
    }
}
