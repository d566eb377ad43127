//! 事务化领域事件基础库（txflow-domain）
//!
//! 提供事件收集与分发所需的领域层构件：
//! - 实体（`entity`）与聚合（`aggregate`）：标识、版本与待发布事件队列
//! - 领域事件（`domain_event`）：事件载荷、信封、元数据与业务上下文
//! - 持久化（`persist`）：快照/事件的序列化形态与带期望版本校验的存储协议
//! - 事件分发（`eventing`）：处理器注册表与顺序/并发分发引擎
//! - 值对象（`value_object`）：版本号
//!
//! 事务边界（工作单元）与并发保护位于 `txflow-application`。
//!
//! 典型用法：
//! 1. 用 `#[event]` 定义事件，用 `#[aggregate]` 定义聚合，在聚合操作中 `raise_event` 并 `increment_version`；
//! 2. 在 `HandlerRegistry` 中登记处理器，构建 `EventDispatcher`；
//! 3. 为存储后端实现 `persist::Storage`，或使用 `InMemoryStorage`；
//! 4. 交给应用层的工作单元在提交后分发事件。
//!
pub mod aggregate;
pub mod domain_event;
pub mod entity;
pub mod error;
#[cfg(feature = "eventing")]
pub mod eventing;
pub mod persist;
pub mod value_object;

pub use txflow_macros::{aggregate, entity, entity_id, event};

// 允许在本 crate 内部通过 ::txflow_domain 进行自引用，
// 以便过程宏在本 crate 的单元测试中也能解析到 ::txflow_domain 路径。
extern crate self as txflow_domain;
