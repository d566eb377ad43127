//! 事件分发子系统（eventing）
//!
//! 提交成功后把事件交给已注册的处理器：
//! - `EventHandler`：对事件进行消费处理，`handler_fn`/`typed_handler` 将闭包包装为处理器；
//! - `HandlerRegistry`：按事件类型（或全部事件）有序登记处理器；
//! - `EventDispatcher`：顺序或并发调用处理器，隔离失败并汇总为 `DispatchReport`。
//!
//! 分发不做重试，也不会回头影响已提交的事务。
//!
mod config;
mod dispatcher;
mod handler;
mod registry;
mod report;

pub use config::{DispatchConfig, DispatchMode};
pub use dispatcher::EventDispatcher;
pub use handler::{EventHandler, HandledEventType, handler_fn, typed_handler};
pub use registry::HandlerRegistry;
pub use report::{DispatchReport, HandlerError, HandlerFailure};
