use std::ops::Deref;
use std::slice::Iter;
use std::vec::IntoIter;

use super::domain_event_trait::DomainEvent;
use super::event_envelope::EventEnvelope;

/// 实体的待发布事件队列，按产生顺序排列
///
/// 只能在尾部追加，只能通过排空（`drain`）或丢弃（`clear`）清空；
/// 同一实体上的多次操作产生的事件按产生顺序拼接。
#[derive(Debug, Clone)]
pub struct EventQueue<E>
where
    E: DomainEvent,
{
    events: Vec<EventEnvelope<E>>,
}

impl<E> Default for EventQueue<E>
where
    E: DomainEvent,
{
    fn default() -> Self {
        Self { events: Vec::new() }
    }
}

impl<E> EventQueue<E>
where
    E: DomainEvent,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加到队尾
    pub fn push(&mut self, envelope: EventEnvelope<E>) {
        self.events.push(envelope);
    }

    /// 取出全部事件并清空队列
    pub fn drain(&mut self) -> Vec<EventEnvelope<E>> {
        std::mem::take(&mut self.events)
    }

    /// 丢弃全部事件，返回丢弃的数量
    pub fn clear(&mut self) -> usize {
        let n = self.events.len();
        self.events.clear();
        n
    }

    /// 获取事件列表的不可变引用
    pub fn events(&self) -> &[EventEnvelope<E>] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// 迭代事件引用（不消费队列）
    pub fn iter(&self) -> Iter<'_, EventEnvelope<E>> {
        self.events.iter()
    }
}

impl<E> IntoIterator for EventQueue<E>
where
    E: DomainEvent,
{
    type Item = EventEnvelope<E>;
    type IntoIter = IntoIter<EventEnvelope<E>>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

impl<'a, E> IntoIterator for &'a EventQueue<E>
where
    E: DomainEvent,
{
    type Item = &'a EventEnvelope<E>;
    type IntoIter = Iter<'a, EventEnvelope<E>>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

impl<E> Deref for EventQueue<E>
where
    E: DomainEvent,
{
    type Target = [EventEnvelope<E>];

    fn deref(&self) -> &Self::Target {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use txflow_macros::event;

    #[event]
    enum Tick {
        Tocked { n: u32 },
    }

    fn tick(n: u32) -> EventEnvelope<Tick> {
        EventEnvelope::new(Tick::Tocked { n })
    }

    #[test]
    fn drain_returns_in_order_then_empty() {
        let mut q = EventQueue::new();
        q.push(tick(1));
        q.push(tick(2));
        assert_eq!(q.len(), 2);

        let drained: Vec<Tick> = q.drain().into_iter().map(|e| e.into_payload()).collect();
        assert_eq!(drained, vec![Tick::Tocked { n: 1 }, Tick::Tocked { n: 2 }]);
        assert!(q.is_empty());
        assert!(q.drain().is_empty());
    }

    #[test]
    fn interleaved_push_and_drain_loses_nothing() {
        let mut q = EventQueue::new();
        q.push(tick(1));
        let first = q.drain();
        q.push(tick(2));
        q.push(tick(3));
        let second = q.drain();

        assert_eq!(first.len(), 1);
        let ns: Vec<u32> = second
            .iter()
            .map(|e| match e.payload() {
                Tick::Tocked { n } => *n,
            })
            .collect();
        assert_eq!(ns, vec![2, 3]);
    }

    #[test]
    fn clear_reports_discarded_count() {
        let mut q = EventQueue::new();
        q.push(tick(1));
        q.push(tick(2));
        assert_eq!(q.clear(), 2);
        assert_eq!(q.iter().count(), 0);
    }
}
