//! rewrite 节点
//!
//! 将原始查询改写为 1-3 个子查询；每次运行 refinement_count 加一。
//! 优化轮次中把上一轮回答与评分一并交给 LLM，使改写针对不足之处。

use std::sync::Arc;

use async_trait::async_trait;

use crate::llm::LlmClient;
use crate::nodes::{ask, parse, prompts};
use crate::workflow::{NodeError, NodeName, QueryState, QueryType, WorkflowNode};

pub struct QueryRewriter {
    llm: Arc<dyn LlmClient>,
}

impl QueryRewriter {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

fn rewrite_request(state: &QueryState) -> String {
    let query_type = match state.query_type {
        QueryType::Simple => "simple",
        QueryType::Complex => "complex",
        QueryType::Unclassified => "unclassified",
    };
    let category = state
        .query_category
        .map(|c| c.as_str())
        .unwrap_or("unknown");
    let mut request = format!(
        "Query: {}\nQuery Type: {}\nCategory: {}",
        state.original_query(),
        query_type,
        category
    );

    if state.refinement_count > 0 {
        if let Some(previous) = &state.response_text {
            request.push_str(&format!(
                "\n\nPrevious Answer: {}\nPrevious Score: {:.2}\nThe previous answer was not good enough; target what it missed.",
                previous,
                state.overall_score.unwrap_or(0.0)
            ));
        }
    }
    request
}

#[async_trait]
impl WorkflowNode for QueryRewriter {
    fn name(&self) -> NodeName {
        NodeName::Rewrite
    }

    async fn run(&self, mut state: QueryState) -> Result<QueryState, NodeError> {
        let reply = ask(
            self.llm.as_ref(),
            prompts::REWRITE_SYSTEM,
            &[],
            rewrite_request(&state),
        )
        .await?;

        state.sub_queries = parse::parse_numbered_list(&reply).unwrap_or_else(|| {
            tracing::warn!("no numbered sub-queries in rewrite reply, using original query");
            vec![state.original_query().to_string()]
        });
        state.refinement_count += 1;

        tracing::info!(
            pass = state.refinement_count,
            sub_queries = ?state.sub_queries,
            "query rewritten"
        );
        Ok(state)
    }
}
