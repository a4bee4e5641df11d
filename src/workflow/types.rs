//! 工作流类型定义
//!
//! 定义查询状态（QueryState）、节点名、条件路由、终态投影与错误类型。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::llm::LlmError;
use crate::memory::Message;
use crate::retrieval::SearchResult;

/// 优化轮次上限（改写次数）
pub const R_MAX: u32 = 3;
/// 生成答案时最多引用的来源数
pub const MAX_SELECTED_SOURCES: usize = 5;
/// 低于该综合分时请求优化
pub const REFINE_THRESHOLD: f64 = 0.8;
pub const KEYWORD_WEIGHT: f64 = 0.3;
pub const LLM_WEIGHT: f64 = 0.7;
/// 快速通道的固定置信分
pub const FAST_PATH_SCORE: f64 = 0.95;

/// 工作流节点名
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeName {
    Classify,
    FastPath,
    Rewrite,
    SelectSources,
    Retrieve,
    Generate,
    Evaluate,
}

impl NodeName {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeName::Classify => "classify",
            NodeName::FastPath => "fast_path",
            NodeName::Rewrite => "rewrite",
            NodeName::SelectSources => "select_sources",
            NodeName::Retrieve => "retrieve",
            NodeName::Generate => "generate",
            NodeName::Evaluate => "evaluate",
        }
    }
}

impl std::fmt::Display for NodeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 查询类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    #[default]
    Unclassified,
    /// 无需检索，走快速通道
    Simple,
    /// 需要改写、检索与评估
    Complex,
}

/// 查询类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryCategory {
    Conversational,
    GeneralKnowledge,
    ProductSpecific,
}

impl QueryCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryCategory::Conversational => "conversational",
            QueryCategory::GeneralKnowledge => "general_knowledge",
            QueryCategory::ProductSpecific => "product_specific",
        }
    }

    /// 前两类无需检索
    pub fn query_type(&self) -> QueryType {
        match self {
            QueryCategory::Conversational | QueryCategory::GeneralKnowledge => QueryType::Simple,
            QueryCategory::ProductSpecific => QueryType::Complex,
        }
    }
}

/// classify 之后的条件路由
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifyRoute {
    Simple,
    Complex,
}

/// evaluate 之后的条件路由
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluateRoute {
    Refine,
    Complete,
}

/// 单次调用的查询状态：由执行器独占，依次流经各节点
#[derive(Debug, Clone)]
pub struct QueryState {
    session_id: String,
    original_query: String,
    created_at: DateTime<Utc>,
    /// 剪枝后的历史对话
    pub history: Vec<Message>,
    pub sub_queries: Vec<String>,
    pub query_type: QueryType,
    pub query_category: Option<QueryCategory>,
    pub use_internal_source: bool,
    pub use_web_source: bool,
    pub internal_results: Vec<SearchResult>,
    pub web_results: Vec<SearchResult>,
    pub selected_sources: Vec<SearchResult>,
    pub response_text: Option<String>,
    pub keyword_score: Option<f64>,
    pub llm_score: Option<f64>,
    pub overall_score: Option<f64>,
    /// 改写次数，每次改写 +1
    pub refinement_count: u32,
    /// evaluate 的决策
    pub refinement_needed: bool,
    pub updated_at: DateTime<Utc>,
    /// 已执行的节点（按执行顺序）
    pub visited: Vec<NodeName>,
}

impl QueryState {
    pub fn new(query: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            original_query: query.into(),
            created_at: now,
            history: Vec::new(),
            sub_queries: Vec::new(),
            query_type: QueryType::Unclassified,
            query_category: None,
            use_internal_source: false,
            use_web_source: false,
            internal_results: Vec::new(),
            web_results: Vec::new(),
            selected_sources: Vec::new(),
            response_text: None,
            keyword_score: None,
            llm_score: None,
            overall_score: None,
            refinement_count: 0,
            refinement_needed: false,
            updated_at: now,
            visited: Vec::new(),
        }
    }

    /// 指定会话 ID（如 HTTP 层传入）；仅在创建时使用
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    pub fn with_history(mut self, history: Vec<Message>) -> Self {
        self.history = history;
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn original_query(&self) -> &str {
        &self.original_query
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// 执行器在每次节点转移后调用
    pub fn record_transition(&mut self, node: NodeName) {
        self.visited.push(node);
        self.updated_at = Utc::now();
    }

    /// 终态投影
    pub fn into_outcome(self) -> QueryOutcome {
        QueryOutcome {
            session_id: self.session_id,
            content: self.response_text.unwrap_or_default(),
            sources: self.selected_sources,
            scores: Scores {
                overall: self.overall_score.unwrap_or(0.0),
                keyword: self.keyword_score.unwrap_or(0.0),
                llm: self.llm_score.unwrap_or(0.0),
            },
            refinements: self.refinement_count,
            success: true,
        }
    }
}

/// 评估分数
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Scores {
    pub overall: f64,
    pub keyword: f64,
    pub llm: f64,
}

/// 调用边界的返回值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryOutcome {
    pub session_id: String,
    pub content: String,
    pub sources: Vec<SearchResult>,
    pub scores: Scores,
    pub refinements: u32,
    pub success: bool,
}

/// 节点内部的致命错误
#[derive(Error, Debug)]
pub enum NodeError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    /// 上游节点应设置却未设置的状态字段
    #[error("Missing state field: {0}")]
    MissingField(&'static str),
}

/// 一次调用的失败：携带失败节点与原因
#[derive(Error, Debug)]
#[error("Workflow failed at node `{node}`: {cause}")]
pub struct WorkflowFailure {
    pub node: NodeName,
    #[source]
    pub cause: NodeError,
}

impl WorkflowFailure {
    pub fn new(node: NodeName, cause: NodeError) -> Self {
        Self { node, cause }
    }
}

/// 工作流构建错误
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Invalid workflow configuration: {0}")]
    InvalidConfiguration(String),
}

/// 工作流节点：取得状态所有权，返回更新后的状态或致命错误
#[async_trait]
pub trait WorkflowNode: Send + Sync {
    fn name(&self) -> NodeName;

    async fn run(&self, state: QueryState) -> Result<QueryState, NodeError>;
}
