//! retrieve 节点：对启用的来源并行检索全部子查询，覆盖上一轮结果

use async_trait::async_trait;

use crate::retrieval::ParallelRetriever;
use crate::workflow::{NodeError, NodeName, QueryState, WorkflowNode};

pub struct RetrieveNode {
    retriever: ParallelRetriever,
}

impl RetrieveNode {
    pub fn new(retriever: ParallelRetriever) -> Self {
        Self { retriever }
    }
}

#[async_trait]
impl WorkflowNode for RetrieveNode {
    fn name(&self) -> NodeName {
        NodeName::Retrieve
    }

    async fn run(&self, mut state: QueryState) -> Result<QueryState, NodeError> {
        if state.sub_queries.is_empty() {
            return Err(NodeError::MissingField("sub_queries"));
        }

        let outcome = self
            .retriever
            .retrieve(
                &state.sub_queries,
                state.use_internal_source,
                state.use_web_source,
            )
            .await;
        state.internal_results = outcome.internal;
        state.web_results = outcome.web;

        tracing::info!(
            internal = state.internal_results.len(),
            web = state.web_results.len(),
            "retrieval joined"
        );
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::{InternalDocsCatalog, WebSourceCatalog};
    use std::sync::Arc;
    use std::time::Duration;

    fn node() -> RetrieveNode {
        RetrieveNode::new(ParallelRetriever::new(
            Arc::new(InternalDocsCatalog::default()),
            Arc::new(WebSourceCatalog::default()),
            Duration::from_secs(1),
        ))
    }

    #[tokio::test]
    async fn test_disabled_source_stays_empty() {
        let mut state = QueryState::new("reset");
        state.sub_queries = vec!["reset password".to_string()];
        state.use_internal_source = true;
        state.use_web_source = false;

        let state = node().run(state).await.unwrap();
        assert!(!state.internal_results.is_empty());
        assert!(state.web_results.is_empty());
    }

    #[tokio::test]
    async fn test_requires_sub_queries() {
        let err = node().run(QueryState::new("reset")).await.unwrap_err();
        assert!(matches!(err, NodeError::MissingField("sub_queries")));
    }
}
