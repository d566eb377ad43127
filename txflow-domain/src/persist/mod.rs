//! 持久化（persist）
//!
//! 定义实体离开内存后的形态与存储协议：
//! - `SerializedSnapshot`：聚合状态的持久化形态；
//! - `SerializedEvent`：提交后交给分发引擎的类型擦除事件；
//! - `Storage`/`StorageSession`：带期望版本校验的会话式存储；
//! - `InMemoryStorage`：进程内实现。
//!
//! 具体存储后端（如关系数据库）由上层实现 `Storage` 并注入工作单元。
//!
mod serialized_event;
mod serialized_snapshot;
mod storage;
mod storage_inmemory;

pub use serialized_event::{SerializedEvent, drain_events};
pub use serialized_snapshot::SerializedSnapshot;
pub use storage::{EntityKey, ExpectedVersion, Storage, StorageSession};
pub use storage_inmemory::InMemoryStorage;
