//! 检索类型定义
//!
//! 检索记录、来源类型、检索错误，以及两类检索源（内部文档 / Web）共用的 Retriever trait。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 检索来源类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Internal,
    Web,
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceType::Internal => write!(f, "internal"),
            SourceType::Web => write!(f, "web"),
        }
    }
}

/// 单条检索记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
    /// 相关度，取值 [0, 1]
    pub relevance: f64,
    pub source_type: SourceType,
}

impl SearchResult {
    /// 正文优先，没有正文时用摘要
    pub fn body(&self) -> &str {
        self.content
            .as_deref()
            .or(self.snippet.as_deref())
            .unwrap_or("")
    }

    /// 相关度必须是 [0, 1] 内的有限值
    pub fn is_well_formed(&self) -> bool {
        self.relevance.is_finite() && (0.0..=1.0).contains(&self.relevance)
    }
}

/// 检索错误（对工作流而言均为可隔离的非致命错误）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RetrievalError {
    #[error("Search request failed: {0}")]
    Request(String),

    #[error("Search backend returned HTTP {0}")]
    Status(u16),

    #[error("Malformed search response: {0}")]
    Malformed(String),

    #[error("Search timed out")]
    Timeout,
}

/// 检索端口：search(query) 返回检索记录，顺序无意义，空结果合法
#[async_trait]
pub trait Retriever: Send + Sync {
    /// 该检索器提供的来源类型
    fn source(&self) -> SourceType;

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, RetrievalError>;
}
