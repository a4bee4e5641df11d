//! 检索层：检索端口、HTTP 客户端、本地关键词目录与多源并行检索

pub mod catalog;
pub mod http;
pub mod parallel;
pub mod types;

pub use catalog::{Document, InternalDocsCatalog, WebSource, WebSourceCatalog};
pub use http::{parse_search_response, HttpRetriever};
pub use parallel::{ParallelRetriever, RetrievalOutcome};
pub use types::{RetrievalError, Retriever, SearchResult, SourceType};
