//! 领域事件（Domain Event）与待发布事件队列
//!
//! 定义事件载荷需要实现的最小接口（`DomainEvent`），带生成标识与时间戳的
//! 不可变记录 `EventEnvelope`，以及实体持有的有序队列 `EventQueue`。

mod domain_event_trait;
mod event_context;
mod event_envelope;
mod event_queue;
mod metadata;

pub use domain_event_trait::DomainEvent;
pub use event_context::EventContext;
pub use event_envelope::EventEnvelope;
pub use event_queue::EventQueue;
pub use metadata::Metadata;
