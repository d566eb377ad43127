//! 聚合（Aggregate）抽象
//!
//! 约束一个聚合的核心行为：
//! - 通过 `Entity` 具备标识与版本；
//! - 通过聚合自身的操作修改状态，同时 `raise_event` 记录事件并 `increment_version`；
//! - 事件只在队列中缓冲，由工作单元在提交成功后排空并分发。
//!
use crate::domain_event::{DomainEvent, EventEnvelope, EventQueue};
use crate::entity::Entity;
use serde::{Serialize, de::DeserializeOwned};

/// 聚合根接口
pub trait Aggregate: Entity + Serialize + DeserializeOwned + 'static {
    /// 聚合类型名（用于存储键与事件元数据）
    const TYPE: &'static str;

    /// 该聚合产生的领域事件类型
    type Event: DomainEvent;

    /// 待发布事件队列
    fn event_queue(&self) -> &EventQueue<Self::Event>;

    fn event_queue_mut(&mut self) -> &mut EventQueue<Self::Event>;

    /// 每次变更调用一次（而不是每个事件一次）
    fn increment_version(&mut self);

    /// 记录事件到队尾，不触发分发
    fn raise_event(&mut self, event: Self::Event) {
        self.event_queue_mut().push(EventEnvelope::new(event));
    }

    /// 取出全部待发布事件并清空队列
    fn flush_events(&mut self) -> Vec<EventEnvelope<Self::Event>> {
        self.event_queue_mut().drain()
    }

    /// 待发布事件的只读视图（不排空）
    fn pending_events(&self) -> &[EventEnvelope<Self::Event>] {
        self.event_queue().events()
    }

    /// 丢弃全部待发布事件（回滚路径），返回丢弃数量
    fn discard_events(&mut self) -> usize {
        self.event_queue_mut().clear()
    }
}

#[cfg(test)]
mod tests {
    use super::Aggregate;
    use crate::domain_event::DomainEvent;
    use crate::entity::Entity;
    use crate::error::{DomainError, DomainResult};
    use crate::value_object::Version;
    use txflow_macros::{aggregate, event};

    #[event(version = 1)]
    enum CounterEvent {
        Added { amount: i32 },
        #[event(event_type = "counter.reset", event_version = 2)]
        Reset,
    }

    #[aggregate(id = String, event = CounterEvent, name = "counter")]
    #[derive(Clone)]
    struct Counter {
        value: i32,
    }

    impl Counter {
        fn add(&mut self, amount: i32) -> DomainResult<()> {
            if amount <= 0 {
                return Err(DomainError::InvalidValue {
                    reason: "amount must be > 0".into(),
                });
            }
            self.value += amount;
            self.raise_event(CounterEvent::Added { amount });
            self.increment_version();
            Ok(())
        }

        fn add_twice_then_reset(&mut self, amount: i32) {
            self.value = 0;
            self.raise_event(CounterEvent::Added { amount });
            self.raise_event(CounterEvent::Added { amount });
            self.raise_event(CounterEvent::Reset);
            self.increment_version();
        }
    }

    #[test]
    fn raise_event_buffers_without_dispatch_and_bumps_version_once_per_mutation() {
        let mut c = Counter::new("c-1".to_string());
        assert_eq!(c.version(), Version::new());

        c.add(3).unwrap();
        c.add(2).unwrap();
        c.add_twice_then_reset(1);

        assert_eq!(c.version(), Version::from_value(3));
        assert_eq!(c.pending_events().len(), 5);
        assert_eq!(c.value, 0);
    }

    #[test]
    fn flush_is_exactly_once() {
        let mut c = Counter::new("c-2".to_string());
        c.add(1).unwrap();
        c.add(4).unwrap();

        let first = c.flush_events();
        let second = c.flush_events();

        assert_eq!(first.len(), 2);
        assert!(second.is_empty());
        assert_eq!(first[0].payload(), &CounterEvent::Added { amount: 1 });
        assert_eq!(first[1].payload(), &CounterEvent::Added { amount: 4 });
        assert_ne!(first[0].event_id(), first[1].event_id());
    }

    #[test]
    fn failed_operation_raises_nothing() {
        let mut c = Counter::new("c-3".to_string());
        assert!(c.add(0).is_err());
        assert!(c.pending_events().is_empty());
        assert_eq!(c.version(), Version::new());
    }

    #[test]
    fn discard_drops_pending_events() {
        let mut c = Counter::new("c-4".to_string());
        c.add(1).unwrap();
        assert_eq!(c.discard_events(), 1);
        assert!(c.flush_events().is_empty());
    }

    #[test]
    fn event_type_and_version_overrides() {
        assert_eq!(Counter::TYPE, "counter");
        let added = CounterEvent::Added { amount: 1 };
        assert_eq!(added.event_type(), "CounterEvent.Added");
        assert_eq!(added.event_version(), 1);
        assert_eq!(CounterEvent::Reset.event_type(), "counter.reset");
        assert_eq!(CounterEvent::Reset.event_version(), 2);
    }

    #[test]
    fn pending_events_are_not_serialized() {
        let mut c = Counter::new("c-5".to_string());
        c.add(5).unwrap();

        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json, serde_json::json!({"id": "c-5", "version": 1, "value": 5}));

        let restored: Counter = serde_json::from_value(json).unwrap();
        assert_eq!(restored.value, 5);
        assert_eq!(restored.version(), Version::from_value(1));
        assert!(restored.pending_events().is_empty());
    }
}
