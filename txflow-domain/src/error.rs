//! 领域层统一错误定义
//!
//! 聚焦序列化、事件分发、存储与乐观并发控制的最小必要集合，
//! 便于在应用层统一包装为 `AppError`。
//!
use crate::value_object::Version;
use thiserror::Error;

/// 统一错误类型（基础库最小必要集）
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DomainError {
    // --- 序列化 ---
    #[error("serialization error: {source}")]
    Serde {
        #[from]
        source: serde_json::Error,
    },
    #[error("parse error: {reason}")]
    Parse { reason: String },
    #[error("type mismatch: expected={expected}, found={found}")]
    TypeMismatch { expected: String, found: String },

    // --- 事件分发 ---
    #[error("invalid event: {reason}")]
    InvalidEvent { reason: String },
    #[error("event handler error: handler={handler}, reason={reason}")]
    EventHandler { handler: String, reason: String },

    // --- 存储/并发 ---
    #[error("storage error: {reason}")]
    Storage { reason: String },
    #[error(
        "concurrency conflict: {aggregate_type}#{aggregate_id} expected={expected}, actual={actual}"
    )]
    Concurrency {
        aggregate_type: String,
        aggregate_id: String,
        expected: Version,
        actual: Version,
    },
    #[error("not found: {reason}")]
    NotFound { reason: String },

    // --- 领域规则/状态 ---
    #[error("invalid state: {reason}")]
    InvalidState { reason: String },
    #[error("invalid value: {reason}")]
    InvalidValue { reason: String },
}

impl DomainError {
    /// 是否为乐观并发冲突（调用方可重新加载后重试）
    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(self, DomainError::Concurrency { .. })
    }
}

/// 统一 Result 类型别名
pub type DomainResult<T> = Result<T, DomainError>;

impl From<uuid::Error> for DomainError {
    fn from(err: uuid::Error) -> Self {
        DomainError::Parse {
            reason: err.to_string(),
        }
    }
}

impl From<std::num::ParseIntError> for DomainError {
    fn from(err: std::num::ParseIntError) -> Self {
        DomainError::Parse {
            reason: err.to_string(),
        }
    }
}

impl From<chrono::ParseError> for DomainError {
    fn from(err: chrono::ParseError) -> Self {
        DomainError::Parse {
            reason: err.to_string(),
        }
    }
}
