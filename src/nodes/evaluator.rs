//! evaluate 节点
//!
//! overall = 0.3 × keyword + 0.7 × llm。综合分低于 0.8 且改写次数未达上限时请求优化；
//! 达到上限后一律结束，这是改写环唯一的出口保证。

use std::sync::Arc;

use async_trait::async_trait;

use crate::llm::LlmClient;
use crate::nodes::{ask, parse, prompts};
use crate::workflow::{
    NodeError, NodeName, QueryState, WorkflowNode, KEYWORD_WEIGHT, LLM_WEIGHT, REFINE_THRESHOLD,
    R_MAX,
};

pub struct Evaluator {
    llm: Arc<dyn LlmClient>,
}

impl Evaluator {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

pub fn overall_score(keyword: f64, llm: f64) -> f64 {
    KEYWORD_WEIGHT * keyword + LLM_WEIGHT * llm
}

#[async_trait]
impl WorkflowNode for Evaluator {
    fn name(&self) -> NodeName {
        NodeName::Evaluate
    }

    async fn run(&self, mut state: QueryState) -> Result<QueryState, NodeError> {
        let response = state
            .response_text
            .clone()
            .ok_or(NodeError::MissingField("response_text"))?;

        let keyword = parse::keyword_score(state.original_query(), &response);
        let request = format!(
            "Query: {}\n\nResponse: {}\n\nPlease provide a score between 0.0 and 1.0.",
            state.original_query(),
            response
        );
        let reply = ask(self.llm.as_ref(), prompts::EVALUATE_SYSTEM, &[], request).await?;
        let llm = parse::parse_score(&reply).unwrap_or_else(|| {
            tracing::warn!(reply = %reply.trim(), "no score in evaluation reply, using {}", parse::DEFAULT_LLM_SCORE);
            parse::DEFAULT_LLM_SCORE
        });
        let overall = overall_score(keyword, llm);

        state.keyword_score = Some(keyword);
        state.llm_score = Some(llm);
        state.overall_score = Some(overall);
        state.refinement_needed = overall < REFINE_THRESHOLD && state.refinement_count < R_MAX;

        tracing::info!(
            keyword,
            llm,
            overall,
            pass = state.refinement_count,
            refine = state.refinement_needed,
            "response evaluated"
        );
        Ok(state)
    }
}
