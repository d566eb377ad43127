//! 事务化领域事件应用层（txflow-application）
//!
//! - `UnitOfWork`：事务边界，提交成功后才分发事件，失败时回滚并丢弃事件
//! - `Repository`：工作单元内按类型访问聚合的身份映射视图
//! - `ConcurrencyGuard`：提交前的乐观并发检查
//!
pub mod concurrency_guard;
pub mod config;
pub mod error;
pub mod repository;
pub mod tracked;
pub mod unit_of_work;

pub use concurrency_guard::ConcurrencyGuard;
pub use config::{GuardMode, UnitOfWorkConfig};
pub use error::{AppError, AppResult};
pub use repository::Repository;
pub use tracked::TrackedOrigin;
pub use unit_of_work::{UnitOfWork, UowState};
