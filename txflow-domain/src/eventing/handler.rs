//! 事件处理器（EventHandler）
//!
//! 定义消费某类/多类/全部事件的处理逻辑与元信息（名称、订阅类型），
//! 以及把异步闭包包装为处理器的适配函数。
//!
use crate::domain_event::DomainEvent;
use crate::persist::SerializedEvent;
use async_trait::async_trait;
use std::{future::Future, marker::PhantomData, sync::Arc};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandledEventType {
    One(String),
    Many(Vec<String>),
    All,
}

/// 事件处理器：处理某一类型的事件
///
/// 处理器之间相互独立，不应假设与其他处理器的执行先后。
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// 处理器名称（用于日志与失败报告）
    fn handler_name(&self) -> &str;

    /// 通过 `HandlerRegistry::add` 注册时使用的订阅类型
    fn handled_event_type(&self) -> HandledEventType {
        HandledEventType::All
    }

    /// 处理事件
    async fn handle(&self, event: &SerializedEvent) -> anyhow::Result<()>;
}

struct FnHandler<F> {
    name: String,
    f: F,
}

#[async_trait]
impl<F, Fut> EventHandler for FnHandler<F>
where
    F: Fn(SerializedEvent) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    fn handler_name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, event: &SerializedEvent) -> anyhow::Result<()> {
        (self.f)(event.clone()).await
    }
}

/// 将接收事件副本的异步闭包包装为处理器
///
/// ```
/// use txflow_domain::eventing::{EventHandler, handler_fn};
///
/// let audit = handler_fn("audit", |event| async move {
///     println!("{} {}", event.event_type(), event.aggregate_id());
///     Ok(())
/// });
/// assert_eq!(audit.handler_name(), "audit");
/// ```
pub fn handler_fn<F, Fut>(name: impl Into<String>, f: F) -> Arc<dyn EventHandler>
where
    F: Fn(SerializedEvent) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(FnHandler {
        name: name.into(),
        f,
    })
}

struct TypedHandler<E, F> {
    name: String,
    f: F,
    _event: PhantomData<fn() -> E>,
}

#[async_trait]
impl<E, F, Fut> EventHandler for TypedHandler<E, F>
where
    E: DomainEvent,
    F: Fn(E) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    fn handler_name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, event: &SerializedEvent) -> anyhow::Result<()> {
        let payload: E = event.decode()?;
        (self.f)(payload).await
    }
}

/// 先将载荷解码为 `E` 再交给闭包；解码失败按处理器失败计
pub fn typed_handler<E, F, Fut>(name: impl Into<String>, f: F) -> Arc<dyn EventHandler>
where
    E: DomainEvent,
    F: Fn(E) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(TypedHandler {
        name: name.into(),
        f,
        _event: PhantomData,
    })
}
