//! 本地检索目录：内部文档与 Web 来源的关键词匹配检索
//!
//! 文档从 JSON 文件加载，文件缺失或格式错误时使用内置文档。
//! 打分规则：
//! - 内部文档：命中词数 m（查询词出现在 标题+正文 中），relevance = min(0.95, 0.5 + m/n × 0.45)，正文截断到 100 字符
//! - Web 来源：每个查询词命中标题 +2，仅命中摘要 +1，relevance = min(score / 2n, 1.0)，保留两位小数
//!
//! 条目 id 为 URL 的最后一段（"/docs/device-reset" → "device-reset"）。

use std::path::Path;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::retrieval::{RetrievalError, Retriever, SearchResult, SourceType};

const CONTENT_PREVIEW_CHARS: usize = 100;

/// 内部文档
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub title: String,
    pub content: String,
    pub url: String,
}

/// Web 来源
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebSource {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

fn default_documents() -> Vec<Document> {
    vec![
        Document {
            title: "Device Reset Guide".to_string(),
            content: "Step 1: Power off device. Step 2: Hold the power button for 10 seconds. Step 3: Release and press power again to restart.".to_string(),
            url: "/docs/device-reset".to_string(),
        },
        Document {
            title: "Account Management".to_string(),
            content: "To reset your password, visit the account settings page and select 'Reset Password'.".to_string(),
            url: "/docs/account-management".to_string(),
        },
        Document {
            title: "Troubleshooting Connection Issues".to_string(),
            content: "If your device won't connect, try: 1) Restart your router, 2) Check WiFi settings, 3) Reset network settings.".to_string(),
            url: "/docs/connectivity".to_string(),
        },
    ]
}

fn default_web_sources() -> Vec<WebSource> {
    vec![
        WebSource {
            title: "Official Support: How to Reset Your Device".to_string(),
            url: "https://support.example.com/device-reset".to_string(),
            snippet: "Official guide for resetting your device. Learn how to perform soft resets, hard resets, and factory resets safely.".to_string(),
        },
        WebSource {
            title: "Community Forum: Account Management Tips".to_string(),
            url: "https://community.example.com/forums/thread/12345".to_string(),
            snippet: "Users share their experiences with account management. Includes tips for password security and account recovery.".to_string(),
        },
        WebSource {
            title: "Tech Blog: Solving Common Connectivity Issues".to_string(),
            url: "https://techblog.example.com/connectivity-solutions".to_string(),
            snippet: "A comprehensive guide to diagnosing and fixing the most common Wi-Fi and mobile data connectivity problems.".to_string(),
        },
    ]
}

/// 读取 JSON 数组文件；不存在或解析失败返回 None（记录日志）
fn load_json<T: DeserializeOwned>(path: &Path) -> Option<Vec<T>> {
    if !path.exists() {
        tracing::warn!("Catalog file not found at {:?}, using built-in entries", path);
        return None;
    }
    let loaded = std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|raw| serde_json::from_str::<Vec<T>>(&raw).map_err(|e| e.to_string()));
    match loaded {
        Ok(items) => {
            tracing::info!("Loaded {} catalog entries from {:?}", items.len(), path);
            Some(items)
        }
        Err(e) => {
            tracing::warn!("Failed to load catalog {:?} ({}), using built-in entries", path, e);
            None
        }
    }
}

/// URL 最后一段作为条目 id
fn entry_id(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

fn query_terms(query: &str) -> Vec<String> {
    query.to_lowercase().split_whitespace().map(String::from).collect()
}

fn sort_by_relevance(results: &mut [SearchResult]) {
    results.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));
}

fn preview(content: &str) -> String {
    if content.chars().count() > CONTENT_PREVIEW_CHARS {
        let head: String = content.chars().take(CONTENT_PREVIEW_CHARS).collect();
        format!("{}...", head)
    } else {
        content.to_string()
    }
}

/// 内部文档目录
#[derive(Debug, Clone)]
pub struct InternalDocsCatalog {
    docs: Vec<Document>,
}

impl InternalDocsCatalog {
    pub fn new(docs: Vec<Document>) -> Self {
        Self { docs }
    }

    /// 从 JSON 文件加载，失败时使用内置文档
    pub fn load(path: Option<&Path>) -> Self {
        let docs = path
            .and_then(load_json::<Document>)
            .unwrap_or_else(default_documents);
        Self::new(docs)
    }

    pub fn documents(&self) -> &[Document] {
        &self.docs
    }

    /// 按 id 查找文档
    pub fn get(&self, id: &str) -> Option<&Document> {
        self.docs.iter().find(|doc| entry_id(&doc.url) == id)
    }

    pub fn search_docs(&self, query: &str) -> Vec<SearchResult> {
        let terms = query_terms(query);
        if terms.is_empty() {
            return Vec::new();
        }

        let mut results: Vec<SearchResult> = self
            .docs
            .iter()
            .filter_map(|doc| {
                let text = format!("{} {}", doc.title, doc.content).to_lowercase();
                let matches = terms.iter().filter(|t| text.contains(t.as_str())).count();
                if matches == 0 {
                    return None;
                }
                let relevance = (0.5 + matches as f64 / terms.len() as f64 * 0.45).min(0.95);
                Some(SearchResult {
                    title: doc.title.clone(),
                    url: doc.url.clone(),
                    content: Some(preview(&doc.content)),
                    snippet: None,
                    relevance,
                    source_type: SourceType::Internal,
                })
            })
            .collect();

        sort_by_relevance(&mut results);
        results
    }
}

impl Default for InternalDocsCatalog {
    fn default() -> Self {
        Self::new(default_documents())
    }
}

#[async_trait]
impl Retriever for InternalDocsCatalog {
    fn source(&self) -> SourceType {
        SourceType::Internal
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, RetrievalError> {
        Ok(self.search_docs(query))
    }
}

/// Web 来源目录
#[derive(Debug, Clone)]
pub struct WebSourceCatalog {
    sources: Vec<WebSource>,
}

impl WebSourceCatalog {
    pub fn new(sources: Vec<WebSource>) -> Self {
        Self { sources }
    }

    pub fn load(path: Option<&Path>) -> Self {
        let sources = path
            .and_then(load_json::<WebSource>)
            .unwrap_or_else(default_web_sources);
        Self::new(sources)
    }

    pub fn sources(&self) -> &[WebSource] {
        &self.sources
    }

    pub fn get(&self, id: &str) -> Option<&WebSource> {
        self.sources.iter().find(|source| entry_id(&source.url) == id)
    }

    pub fn search_web(&self, query: &str) -> Vec<SearchResult> {
        let terms = query_terms(query);
        if terms.is_empty() {
            return Vec::new();
        }

        let mut results: Vec<SearchResult> = self
            .sources
            .iter()
            .filter_map(|source| {
                let title = source.title.to_lowercase();
                let text = format!("{} {}", source.title, source.snippet).to_lowercase();
                let score: usize = terms
                    .iter()
                    .filter(|t| text.contains(t.as_str()))
                    .map(|t| if title.contains(t.as_str()) { 2 } else { 1 })
                    .sum();
                if score == 0 {
                    return None;
                }
                let relevance = (score as f64 / (terms.len() * 2) as f64).min(1.0);
                Some(SearchResult {
                    title: source.title.clone(),
                    url: source.url.clone(),
                    content: None,
                    snippet: Some(source.snippet.clone()),
                    relevance: (relevance * 100.0).round() / 100.0,
                    source_type: SourceType::Web,
                })
            })
            .collect();

        sort_by_relevance(&mut results);
        results
    }
}

impl Default for WebSourceCatalog {
    fn default() -> Self {
        Self::new(default_web_sources())
    }
}

#[async_trait]
impl Retriever for WebSourceCatalog {
    fn source(&self) -> SourceType {
        SourceType::Web
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, RetrievalError> {
        Ok(self.search_web(query))
    }
}
