//! 查询工作流：状态、路由表、执行器与构建器

pub mod builder;
pub mod engine;
pub mod graph;
pub mod types;

pub use builder::WorkflowBuilder;
pub use engine::{WorkflowEngine, WorkflowNodes};
pub use graph::{Next, WorkflowGraph, ENTRY_NODE};
pub use types::*;
