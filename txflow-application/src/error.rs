use crate::unit_of_work::UowState;
use txflow_domain::error::DomainError;
use txflow_domain::eventing::DispatchReport;

#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("domain: {0}")]
    Domain(#[from] DomainError),

    #[error("invalid transaction state: cannot {operation} while {state}")]
    TransactionState {
        operation: &'static str,
        state: UowState,
    },

    /// 仅在开启 `strict_dispatch` 时出现；事务已提交
    #[error("committed, but event handlers failed: {report}")]
    HandlerFailures { report: DispatchReport },
}

impl AppError {
    /// 是否为乐观并发冲突（调用方可重新加载后重试整个操作）
    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(self, AppError::Domain(e) if e.is_concurrency_conflict())
    }
}

pub type AppResult<T> = Result<T, AppError>;
