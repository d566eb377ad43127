//! 工作单元内的实体登记项
//!
//! 工作单元以类型擦除的方式持有被触碰的聚合，按首次触碰顺序保存，
//! 提交时通过 `Tracked` 统一完成快照、事件排空与丢弃。
//!
use std::any::Any;
use txflow_domain::aggregate::Aggregate;
use txflow_domain::domain_event::EventContext;
use txflow_domain::entity::Entity;
use txflow_domain::error::DomainResult;
use txflow_domain::persist::{EntityKey, SerializedEvent, SerializedSnapshot, drain_events};
use txflow_domain::value_object::Version;

/// 实体进入工作单元的方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackedOrigin {
    /// 从存储加载，携带加载时的持久化版本
    Loaded(Version),
    /// 新加入，存储中应尚不存在
    Added,
}

pub(crate) trait Tracked: Send + Sync {
    fn key(&self) -> &EntityKey;

    fn origin(&self) -> TrackedOrigin;

    /// 是否需要写回存储
    fn is_dirty(&self) -> bool;

    fn snapshot(&self) -> DomainResult<SerializedSnapshot>;

    fn drain_events(&mut self, context: &EventContext) -> DomainResult<Vec<SerializedEvent>>;

    fn discard_events(&mut self) -> usize;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

pub(crate) struct TrackedAggregate<A>
where
    A: Aggregate,
{
    key: EntityKey,
    origin: TrackedOrigin,
    aggregate: A,
}

impl<A> TrackedAggregate<A>
where
    A: Aggregate,
{
    pub(crate) fn new(key: EntityKey, origin: TrackedOrigin, aggregate: A) -> Self {
        Self {
            key,
            origin,
            aggregate,
        }
    }

    pub(crate) fn aggregate_mut(&mut self) -> &mut A {
        &mut self.aggregate
    }
}

impl<A> Tracked for TrackedAggregate<A>
where
    A: Aggregate,
{
    fn key(&self) -> &EntityKey {
        &self.key
    }

    fn origin(&self) -> TrackedOrigin {
        self.origin
    }

    fn is_dirty(&self) -> bool {
        match self.origin {
            TrackedOrigin::Added => true,
            TrackedOrigin::Loaded(v) => self.aggregate.version() != v,
        }
    }

    fn snapshot(&self) -> DomainResult<SerializedSnapshot> {
        SerializedSnapshot::from_aggregate(&self.aggregate)
    }

    fn drain_events(&mut self, context: &EventContext) -> DomainResult<Vec<SerializedEvent>> {
        drain_events(&mut self.aggregate, context)
    }

    fn discard_events(&mut self) -> usize {
        self.aggregate.discard_events()
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
