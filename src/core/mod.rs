//! 核心层：调用边界错误

pub mod error;

pub use error::AgentError;
