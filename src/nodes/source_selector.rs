//! select_sources 节点：决定本轮启用哪些检索源，无明确信号时两者都用

use std::sync::Arc;

use async_trait::async_trait;

use crate::llm::LlmClient;
use crate::nodes::{ask, parse, prompts};
use crate::workflow::{NodeError, NodeName, QueryState, WorkflowNode};

pub struct SourceSelector {
    llm: Arc<dyn LlmClient>,
}

impl SourceSelector {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl WorkflowNode for SourceSelector {
    fn name(&self) -> NodeName {
        NodeName::SelectSources
    }

    async fn run(&self, mut state: QueryState) -> Result<QueryState, NodeError> {
        let request = format!(
            "Query: {}\nCategory: {}",
            state.original_query(),
            state
                .query_category
                .map(|c| c.as_str())
                .unwrap_or("unknown")
        );
        let reply = ask(self.llm.as_ref(), prompts::SELECT_SOURCES_SYSTEM, &[], request).await?;

        let (use_internal, use_web) = parse::parse_source_need(&reply).unwrap_or_else(|| {
            tracing::warn!(reply = %reply.trim(), "unclear source need, using both sources");
            (true, true)
        });
        state.use_internal_source = use_internal;
        state.use_web_source = use_web;

        tracing::debug!(use_internal, use_web, "sources selected");
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedLlmClient;

    async fn select(reply: &str) -> QueryState {
        let llm = Arc::new(ScriptedLlmClient::new().reply(prompts::SELECT_SOURCES_SYSTEM, reply));
        SourceSelector::new(llm)
            .run(QueryState::new("How do I reset my password?"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_source_selection() {
        let state = select("internal_docs").await;
        assert!(state.use_internal_source && !state.use_web_source);

        let state = select("web_data").await;
        assert!(!state.use_internal_source && state.use_web_source);

        let state = select("both").await;
        assert!(state.use_internal_source && state.use_web_source);
    }

    #[tokio::test]
    async fn test_unclear_reply_uses_both() {
        let state = select("hmm, hard to say").await;
        assert!(state.use_internal_source && state.use_web_source);
    }
}
