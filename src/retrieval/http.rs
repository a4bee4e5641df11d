//! HTTP 检索客户端
//!
//! GET `{endpoint}?query=...`，响应体为检索记录 JSON 数组；记录缺少 source_type 时按检索器自身来源补齐。
//! 非 2xx 状态、请求失败与 JSON 不合法分别映射为 Status / Request / Malformed。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::retrieval::{RetrievalError, Retriever, SearchResult, SourceType};

/// 线上格式：source_type 可缺省
#[derive(Debug, Deserialize)]
struct WireResult {
    title: String,
    url: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    snippet: Option<String>,
    relevance: f64,
    #[serde(default)]
    source_type: Option<SourceType>,
}

impl WireResult {
    fn into_result(self, fallback: SourceType) -> SearchResult {
        SearchResult {
            title: self.title,
            url: self.url,
            content: self.content,
            snippet: self.snippet,
            relevance: self.relevance,
            source_type: self.source_type.unwrap_or(fallback),
        }
    }
}

/// 解析检索端点的响应体
pub fn parse_search_response(
    body: &str,
    source: SourceType,
) -> Result<Vec<SearchResult>, RetrievalError> {
    let wire: Vec<WireResult> =
        serde_json::from_str(body).map_err(|e| RetrievalError::Malformed(e.to_string()))?;
    Ok(wire.into_iter().map(|w| w.into_result(source)).collect())
}

/// 调用远端搜索端点的检索器
pub struct HttpRetriever {
    client: Client,
    endpoint: String,
    source: SourceType,
}

impl HttpRetriever {
    pub fn new(endpoint: impl Into<String>, source: SourceType, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(
                    "HTTP client build failed ({}), using default client without timeout",
                    e
                );
                Client::new()
            });
        Self {
            client,
            endpoint: endpoint.into(),
            source,
        }
    }
}

#[async_trait]
impl Retriever for HttpRetriever {
    fn source(&self) -> SourceType {
        self.source
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, RetrievalError> {
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[("query", query)])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RetrievalError::Timeout
                } else {
                    RetrievalError::Request(e.to_string())
                }
            })?;

        if !resp.status().is_success() {
            return Err(RetrievalError::Status(resp.status().as_u16()));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| RetrievalError::Request(format!("Read body: {}", e)))?;
        parse_search_response(&body, self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fills_missing_source_type() {
        let body = r#"[
            {"title": "Official Support", "url": "https://support.example.com", "snippet": "guide", "relevance": 0.5}
        ]"#;
        let results = parse_search_response(body, SourceType::Web).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source_type, SourceType::Web);
        assert_eq!(results[0].body(), "guide");
    }

    #[test]
    fn test_parse_keeps_declared_source_type() {
        let body = r#"[{"title": "Account Management", "url": "/docs/account-management",
            "content": "Reset Password", "relevance": 0.95, "source_type": "internal"}]"#;
        let results = parse_search_response(body, SourceType::Web).unwrap();
        assert_eq!(results[0].source_type, SourceType::Internal);
    }

    #[test]
    fn test_parse_empty_array_is_valid() {
        assert!(parse_search_response("[]", SourceType::Internal)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_parse_rejects_envelope() {
        let body = r#"{"status": "error", "error_code": 429, "results": []}"#;
        assert!(matches!(
            parse_search_response(body, SourceType::Web),
            Err(RetrievalError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_request_error() {
        let retriever = HttpRetriever::new("http://127.0.0.1:9/search", SourceType::Internal, 2);
        assert_eq!(retriever.source(), SourceType::Internal);
        let err = retriever.search("password").await.unwrap_err();
        assert!(matches!(
            err,
            RetrievalError::Request(_) | RetrievalError::Timeout
        ));
    }
}
