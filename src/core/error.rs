//! 调用边界的错误类型
//!
//! 输入校验失败与工作流失败分开，调用方据此区分「请求不合法」和「处理过程失败」。

use thiserror::Error;

use crate::workflow::{WorkflowError, WorkflowFailure};

/// SupportAgent::process 可能返回的错误
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Query is empty")]
    EmptyQuery,

    #[error("Query too long: {len} chars (max {max})")]
    QueryTooLong { len: usize, max: usize },

    #[error(transparent)]
    Workflow(#[from] WorkflowFailure),

    /// 构建工作流时的配置错误
    #[error("Config error: {0}")]
    Config(#[from] WorkflowError),
}

impl AgentError {
    /// 是否属于调用方输入问题（HTTP 层映射为 400）
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, AgentError::EmptyQuery | AgentError::QueryTooLong { .. })
    }
}
