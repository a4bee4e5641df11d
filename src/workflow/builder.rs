//! 工作流构建器
//!
//! 注入 LLM 客户端与两个检索器，组装七个节点并返回可复用的 WorkflowEngine。
//! 缺少任一依赖时拒绝构建。

use std::sync::Arc;
use std::time::Duration;

use crate::llm::LlmClient;
use crate::nodes::{
    Classifier, Evaluator, FastPathResponder, QueryRewriter, ResponseGenerator, RetrieveNode,
    SourceSelector,
};
use crate::retrieval::{ParallelRetriever, Retriever, SourceType};
use crate::workflow::engine::{WorkflowEngine, WorkflowNodes};
use crate::workflow::types::WorkflowError;

/// 工作流构建器
pub struct WorkflowBuilder {
    llm: Option<Arc<dyn LlmClient>>,
    internal: Option<Arc<dyn Retriever>>,
    web: Option<Arc<dyn Retriever>>,
    retrieval_timeout: Duration,
    fast_match: bool,
}

impl Default for WorkflowBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowBuilder {
    pub fn new() -> Self {
        Self {
            llm: None,
            internal: None,
            web: None,
            retrieval_timeout: Duration::from_secs(10),
            fast_match: true,
        }
    }

    /// 设置 LLM 客户端（必需）
    pub fn llm(mut self, llm: Arc<dyn LlmClient>) -> Self {
        self.llm = Some(llm);
        self
    }

    /// 内部文档检索器（必需）
    pub fn internal_retriever(mut self, retriever: Arc<dyn Retriever>) -> Self {
        self.internal = Some(retriever);
        self
    }

    /// Web 检索器（必需）
    pub fn web_retriever(mut self, retriever: Arc<dyn Retriever>) -> Self {
        self.web = Some(retriever);
        self
    }

    /// 单次检索调用超时
    pub fn retrieval_timeout(mut self, timeout: Duration) -> Self {
        self.retrieval_timeout = timeout;
        self
    }

    /// 是否启用问候语快速匹配
    pub fn fast_match(mut self, enabled: bool) -> Self {
        self.fast_match = enabled;
        self
    }

    pub fn build(self) -> Result<WorkflowEngine, WorkflowError> {
        let llm = self
            .llm
            .ok_or_else(|| WorkflowError::InvalidConfiguration("LLM client is required".to_string()))?;
        if self.retrieval_timeout.is_zero() {
            return Err(WorkflowError::InvalidConfiguration(
                "retrieval timeout must be positive".to_string(),
            ));
        }

        let internal = self.internal.ok_or_else(|| {
            WorkflowError::InvalidConfiguration("internal retriever is required".to_string())
        })?;
        let web = self.web.ok_or_else(|| {
            WorkflowError::InvalidConfiguration("web retriever is required".to_string())
        })?;
        check_source(internal.as_ref(), SourceType::Internal)?;
        check_source(web.as_ref(), SourceType::Web)?;

        let retriever = ParallelRetriever::new(internal, web, self.retrieval_timeout);
        let nodes = WorkflowNodes {
            classify: Arc::new(Classifier::new(llm.clone(), self.fast_match)),
            fast_path: Arc::new(FastPathResponder::new(llm.clone())),
            rewrite: Arc::new(QueryRewriter::new(llm.clone())),
            select_sources: Arc::new(SourceSelector::new(llm.clone())),
            retrieve: Arc::new(RetrieveNode::new(retriever)),
            generate: Arc::new(ResponseGenerator::new(llm.clone())),
            evaluate: Arc::new(Evaluator::new(llm)),
        };
        Ok(WorkflowEngine::new(nodes))
    }
}

fn check_source(retriever: &dyn Retriever, expected: SourceType) -> Result<(), WorkflowError> {
    if retriever.source() != expected {
        return Err(WorkflowError::InvalidConfiguration(format!(
            "{} retriever slot got a {} retriever",
            expected,
            retriever.source()
        )));
    }
    Ok(())
}
