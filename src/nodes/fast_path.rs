//! fast_path 节点：不检索，直接按类别作答

use std::sync::Arc;

use async_trait::async_trait;

use crate::llm::LlmClient;
use crate::nodes::{ask, prompts};
use crate::workflow::{
    NodeError, NodeName, QueryCategory, QueryState, WorkflowNode, FAST_PATH_SCORE,
};

pub struct FastPathResponder {
    llm: Arc<dyn LlmClient>,
}

impl FastPathResponder {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl WorkflowNode for FastPathResponder {
    fn name(&self) -> NodeName {
        NodeName::FastPath
    }

    async fn run(&self, mut state: QueryState) -> Result<QueryState, NodeError> {
        let category = state
            .query_category
            .ok_or(NodeError::MissingField("query_category"))?;
        let system = match category {
            QueryCategory::Conversational => prompts::FAST_PATH_CONVERSATIONAL_SYSTEM,
            QueryCategory::GeneralKnowledge | QueryCategory::ProductSpecific => {
                prompts::FAST_PATH_GENERAL_SYSTEM
            }
        };

        let answer = ask(
            self.llm.as_ref(),
            system,
            &state.history,
            state.original_query().to_string(),
        )
        .await?;

        state.response_text = Some(answer);
        state.internal_results.clear();
        state.web_results.clear();
        state.selected_sources.clear();
        state.keyword_score = Some(FAST_PATH_SCORE);
        state.llm_score = Some(FAST_PATH_SCORE);
        state.overall_score = Some(FAST_PATH_SCORE);
        state.refinement_needed = false;
        Ok(state)
    }
}
