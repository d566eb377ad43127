//! 处理器注册表（HandlerRegistry）
//!
//! 初始化阶段按 `&mut self` 追加注册，之后交给 `EventDispatcher` 冻结在 `Arc` 中只读共享。
//! 解析顺序：先按注册顺序列出指定类型的处理器，再列出订阅全部事件的处理器。
//!
use super::handler::{EventHandler, HandledEventType};
use std::{collections::HashMap, fmt, sync::Arc};

#[derive(Clone, Default)]
pub struct HandlerRegistry {
    by_type: HashMap<String, Vec<Arc<dyn EventHandler>>>,
    all: Vec<Arc<dyn EventHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按处理器自身声明的订阅类型批量注册
    pub fn from_handlers(handlers: impl IntoIterator<Item = Arc<dyn EventHandler>>) -> Self {
        let mut registry = Self::new();
        for h in handlers {
            registry.add(h);
        }
        registry
    }

    /// 按 `handled_event_type()` 注册
    pub fn add(&mut self, handler: Arc<dyn EventHandler>) -> &mut Self {
        let subscription = handler.handled_event_type();
        self.subscribe(subscription, handler)
    }

    /// 为指定事件类型追加处理器；重复注册会导致重复调用
    pub fn register(
        &mut self,
        event_type: impl Into<String>,
        handler: Arc<dyn EventHandler>,
    ) -> &mut Self {
        self.by_type
            .entry(event_type.into())
            .or_default()
            .push(handler);
        self
    }

    /// 注册订阅全部事件的处理器
    pub fn register_all(&mut self, handler: Arc<dyn EventHandler>) -> &mut Self {
        self.all.push(handler);
        self
    }

    pub fn subscribe(
        &mut self,
        subscription: HandledEventType,
        handler: Arc<dyn EventHandler>,
    ) -> &mut Self {
        match subscription {
            HandledEventType::All => self.register_all(handler),
            HandledEventType::One(t) => self.register(t, handler),
            HandledEventType::Many(ts) => {
                for t in ts {
                    self.register(t, handler.clone());
                }
                self
            }
        }
    }

    /// 解析某事件类型的处理器；未注册的类型返回空列表
    pub fn resolve(&self, event_type: &str) -> Vec<Arc<dyn EventHandler>> {
        let mut merged: Vec<Arc<dyn EventHandler>> = Vec::new();
        if let Some(list) = self.by_type.get(event_type) {
            merged.extend(list.iter().cloned());
        }
        merged.extend(self.all.iter().cloned());
        merged
    }

    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty() && self.all.is_empty()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<(&str, Vec<&str>)> = self
            .by_type
            .iter()
            .map(|(t, hs)| (t.as_str(), hs.iter().map(|h| h.handler_name()).collect()))
            .collect();
        types.sort_by(|a, b| a.0.cmp(b.0));
        let all: Vec<&str> = self.all.iter().map(|h| h.handler_name()).collect();

        f.debug_struct("HandlerRegistry")
            .field("by_type", &types)
            .field("all", &all)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eventing::handler_fn;
    use async_trait::async_trait;
    use crate::persist::SerializedEvent;

    fn noop(name: &str) -> Arc<dyn EventHandler> {
        handler_fn(name.to_string(), |_| async { Ok(()) })
    }

    fn names(handlers: &[Arc<dyn EventHandler>]) -> Vec<String> {
        handlers.iter().map(|h| h.handler_name().to_string()).collect()
    }

    struct Projection;

    #[async_trait]
    impl EventHandler for Projection {
        fn handler_name(&self) -> &str {
            "projection"
        }

        fn handled_event_type(&self) -> HandledEventType {
            HandledEventType::Many(vec!["A".into(), "B".into()])
        }

        async fn handle(&self, _event: &SerializedEvent) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn resolve_preserves_registration_order_and_puts_wildcards_last() {
        let mut registry = HandlerRegistry::new();
        registry
            .register_all(noop("audit"))
            .register("A", noop("h1"))
            .register("A", noop("h2"))
            .register("B", noop("h3"));

        assert_eq!(names(&registry.resolve("A")), ["h1", "h2", "audit"]);
        assert_eq!(names(&registry.resolve("B")), ["h3", "audit"]);
        assert_eq!(names(&registry.resolve("C")), ["audit"]);
    }

    #[test]
    fn unknown_type_resolves_empty() {
        let mut registry = HandlerRegistry::new();
        assert!(registry.is_empty());
        registry.register("A", noop("h1"));
        assert!(registry.resolve("Z").is_empty());
    }

    #[test]
    fn duplicate_registration_is_kept() {
        let h = noop("dup");
        let mut registry = HandlerRegistry::new();
        registry.register("A", h.clone()).register("A", h);
        assert_eq!(names(&registry.resolve("A")), ["dup", "dup"]);
    }

    #[test]
    fn add_uses_declared_subscription() {
        let registry =
            HandlerRegistry::from_handlers([Arc::new(Projection) as Arc<dyn EventHandler>, noop("any")]);

        assert_eq!(names(&registry.resolve("A")), ["projection", "any"]);
        assert_eq!(names(&registry.resolve("B")), ["projection", "any"]);
        assert_eq!(names(&registry.resolve("C")), ["any"]);
    }
}
