//! generate 节点
//!
//! 合并两源结果，按相关度降序取前 5 条（同分时内部文档在前）作为依据，
//! 只依据这些来源生成回答。快速通道已作答时不做任何事。

use std::sync::Arc;

use async_trait::async_trait;

use crate::llm::LlmClient;
use crate::nodes::{ask, prompts};
use crate::retrieval::SearchResult;
use crate::workflow::{
    NodeError, NodeName, QueryState, QueryType, WorkflowNode, MAX_SELECTED_SOURCES,
};

/// 内部结果在前拼接后做稳定排序，因此同分时内部文档排在 Web 之前
pub fn select_top_sources(
    internal: &[SearchResult],
    web: &[SearchResult],
    limit: usize,
) -> Vec<SearchResult> {
    let mut all: Vec<SearchResult> = internal.iter().chain(web.iter()).cloned().collect();
    all.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));
    all.truncate(limit);
    all
}

fn grounding_block(sources: &[SearchResult]) -> String {
    sources
        .iter()
        .enumerate()
        .map(|(i, s)| format!("Source {}: {}\n{}\n\n", i + 1, s.title, s.body()))
        .collect()
}

pub struct ResponseGenerator {
    llm: Arc<dyn LlmClient>,
}

impl ResponseGenerator {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl WorkflowNode for ResponseGenerator {
    fn name(&self) -> NodeName {
        NodeName::Generate
    }

    async fn run(&self, mut state: QueryState) -> Result<QueryState, NodeError> {
        if state.query_type == QueryType::Simple && state.response_text.is_some() {
            return Ok(state);
        }

        state.selected_sources = select_top_sources(
            &state.internal_results,
            &state.web_results,
            MAX_SELECTED_SOURCES,
        );
        if state.selected_sources.is_empty() {
            tracing::warn!("no sources retrieved, answer will lack grounding");
        }

        let request = format!(
            "Question: {}\n\nSources:\n{}",
            state.original_query(),
            grounding_block(&state.selected_sources)
        );
        let answer = ask(self.llm.as_ref(), prompts::GENERATE_SYSTEM, &state.history, request).await?;
        state.response_text = Some(answer);

        tracing::debug!(sources = state.selected_sources.len(), "response generated");
        Ok(state)
    }
}
