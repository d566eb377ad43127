//! 分发结果（DispatchReport）
//!
//! 处理器失败只记录、不传播：报告按发生顺序收集每一次失败。
//!
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// 单次处理器调用的失败原因
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    #[error("handler failed: {reason}")]
    Failed { reason: String },
    #[error("handler panicked: {reason}")]
    Panicked { reason: String },
    #[error("handler timed out after {timeout:?}")]
    TimedOut { timeout: Duration },
}

/// 失败记录：哪条事件、哪个处理器、什么原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerFailure {
    pub event_id: Uuid,
    pub event_type: String,
    pub handler: String,
    pub error: HandlerError,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// 已分发的事件数
    pub events_dispatched: usize,
    /// 处理器调用总次数（含失败）
    pub handler_invocations: usize,
    pub failures: Vec<HandlerFailure>,
}

impl DispatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// 失败的处理器名称（按失败顺序，可能重复）
    pub fn failed_handlers(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.handler.as_str()).collect()
    }
}

impl std::fmt::Display for DispatchReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} events, {} handler invocations, {} failures",
            self.events_dispatched,
            self.handler_invocations,
            self.failures.len()
        )?;
        if !self.failures.is_empty() {
            write!(f, " [{}]", self.failed_handlers().join(", "))?;
        }
        Ok(())
    }
}
