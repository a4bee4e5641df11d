//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `SUPPORT__*` 覆盖（双下划线表示嵌套，如 `SUPPORT__LLM__PROVIDER=openai`）。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub llm: LlmSection,
    pub retrieval: RetrievalSection,
    pub workflow: WorkflowSection,
    pub server: ServerSection,
}

/// [app] 段：应用名、对话历史保留轮数
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppSection {
    pub name: Option<String>,
    /// 传入工作流的历史对话轮数上限
    pub max_context_turns: usize,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: None,
            max_context_turns: 10,
        }
    }
}

/// [llm] 段：后端选择、超时与重试
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// 后端：openai / mock；openai 需要 OPENAI_API_KEY，缺失时回退到 mock
    pub provider: String,
    pub model: String,
    pub base_url: Option<String>,
    pub openai: LlmOpenAiSection,
    pub timeouts: LlmTimeoutsSection,
    pub retry: LlmRetrySection,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o".to_string(),
            base_url: None,
            openai: LlmOpenAiSection::default(),
            timeouts: LlmTimeoutsSection::default(),
            retry: LlmRetrySection::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LlmOpenAiSection {
    pub model: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmTimeoutsSection {
    /// 单次 LLM 请求超时（秒）
    pub request: u64,
}

impl Default for LlmTimeoutsSection {
    fn default() -> Self {
        Self { request: 60 }
    }
}

/// [llm.retry] 段：可重试错误（网络、超时）的重试次数与初始退避
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmRetrySection {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
}

impl Default for LlmRetrySection {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff_ms: 500,
        }
    }
}

/// [retrieval] 段：检索超时与两个检索源
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrievalSection {
    /// 单次检索调用超时（秒）
    pub timeout_secs: u64,
    pub internal: SourceSection,
    pub web: SourceSection,
}

impl Default for RetrievalSection {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            internal: SourceSection {
                mode: RetrievalMode::Local,
                endpoint: Some("http://localhost:8000/internal-docs/search".to_string()),
                data_path: Some(PathBuf::from("data/internal_docs.json")),
            },
            web: SourceSection {
                mode: RetrievalMode::Local,
                endpoint: Some("http://localhost:8000/web-data/search".to_string()),
                data_path: Some(PathBuf::from("data/web_sources.json")),
            },
        }
    }
}

/// 检索源模式：local 使用内置关键词目录，http 调用远端搜索端点
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalMode {
    #[default]
    Local,
    Http,
}

/// [retrieval.internal] / [retrieval.web] 段
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SourceSection {
    pub mode: RetrievalMode,
    /// http 模式下的搜索端点（GET ?query=...）
    pub endpoint: Option<String>,
    /// local 模式下的 JSON 文档文件；不存在时使用内置文档
    pub data_path: Option<PathBuf>,
}

/// [workflow] 段
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkflowSection {
    /// 问候语是否走规则匹配（不调用 LLM）
    pub fast_match: bool,
}

impl Default for WorkflowSection {
    fn default() -> Self {
        Self { fast_match: true }
    }
}

/// [server] 段：support-rag-web 监听地址
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
        }
    }
}

/// 从 config 目录加载配置，环境变量 SUPPORT__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 SUPPORT__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("SUPPORT")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.app.max_context_turns, 10);
        assert_eq!(cfg.llm.timeouts.request, 60);
        assert_eq!(cfg.llm.retry.max_retries, 2);
        assert_eq!(cfg.retrieval.internal.mode, RetrievalMode::Local);
        assert!(cfg.workflow.fast_match);
        assert_eq!(cfg.server.bind, "127.0.0.1:8000");
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("temp file");
        writeln!(
            file,
            r#"
[llm]
provider = "mock"

[retrieval]
timeout_secs = 3

[retrieval.web]
mode = "http"
endpoint = "http://search.local/web"

[workflow]
fast_match = false
"#
        )
        .expect("write config");

        let cfg = load_config(Some(file.path().to_path_buf())).expect("load config");
        assert_eq!(cfg.llm.provider, "mock");
        assert_eq!(cfg.retrieval.timeout_secs, 3);
        assert_eq!(cfg.retrieval.web.mode, RetrievalMode::Http);
        assert_eq!(
            cfg.retrieval.web.endpoint.as_deref(),
            Some("http://search.local/web")
        );
        assert!(!cfg.workflow.fast_match);
        // 未出现的键保留默认值
        assert_eq!(cfg.llm.timeouts.request, 60);
        assert_eq!(cfg.app.max_context_turns, 10);
    }
}
