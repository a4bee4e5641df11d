//! support-rag - 客服查询工作流引擎
//!
//! 模块划分：
//! - **agent**: 无头客服 Agent（供 CLI / HTTP 调用），按配置组装 LLM 与检索器
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 调用边界错误
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / Mock / Scripted），超时与重试装饰器
//! - **memory**: 短期对话历史
//! - **nodes**: 工作流节点（分类、快速通道、改写、选源、检索、生成、评估）与回复解析
//! - **observability**: tracing 日志初始化
//! - **retrieval**: 检索端口、HTTP 客户端、本地目录、多源并行检索
//! - **workflow**: 查询状态、路由表、执行器与构建器

pub mod agent;
pub mod config;
pub mod core;
pub mod llm;
pub mod memory;
pub mod nodes;
pub mod observability;
pub mod retrieval;
pub mod workflow;

pub use agent::SupportAgent;
pub use workflow::{QueryOutcome, QueryState, WorkflowBuilder, WorkflowEngine};
