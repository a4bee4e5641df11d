//! support-rag 命令行入口
//!
//! `support-rag [--config <file>] <query...>`：回答一条查询并打印 JSON 结果；
//! 不带查询时进入交互模式，逐行读取 stdin，保留对话历史，输入 exit / quit 退出。

use std::path::PathBuf;

use anyhow::Context;
use support_rag::{
    agent::SupportAgent,
    config::{load_config, AppConfig},
    memory::ConversationMemory,
    observability,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

fn parse_args() -> (Option<PathBuf>, String) {
    let mut config_path = None;
    let mut words = Vec::new();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            config_path = args.next().map(PathBuf::from);
        } else {
            words.push(arg);
        }
    }
    (config_path, words.join(" "))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let (config_path, query) = parse_args();
    let cfg = load_config(config_path).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        AppConfig::default()
    });
    let agent = SupportAgent::from_config(&cfg).context("Failed to build support agent")?;

    if !query.trim().is_empty() {
        let outcome = agent
            .process(&query, None)
            .await
            .context("Failed to process query")?;
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    let mut memory = ConversationMemory::new(cfg.app.max_context_turns);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await.context("Failed to read stdin")? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "quit" {
            break;
        }

        match agent.process(line, Some(memory.messages().to_vec())).await {
            Ok(outcome) => {
                memory.push_turn(line, outcome.content.clone());
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            }
            Err(e) => eprintln!("Error: {}", e),
        }
    }
    Ok(())
}
