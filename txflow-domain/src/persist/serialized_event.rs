//! 事件分发模型（SerializedEvent）
//!
//! 定义事件离开实体后的标准形态：类型擦除的载荷（JSON）加上聚合与业务上下文，
//! 分发引擎与处理器只面向这一形态工作，使不同聚合的事件可以按提交顺序拼接。
//!
use crate::{
    aggregate::Aggregate,
    domain_event::{DomainEvent, EventContext, EventEnvelope},
    entity::Entity,
    error::{DomainError, DomainResult},
    value_object::Version,
};
use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Builder, PartialEq, Serialize, Deserialize)]
pub struct SerializedEvent {
    /// 事件唯一标识符
    event_id: Uuid,
    /// 事件类型，用于解析处理器
    event_type: String,
    /// 事件载荷版本
    event_version: usize,
    /// 聚合 ID，标识事件所属的聚合实例
    aggregate_id: String,
    /// 聚合类型
    aggregate_type: String,
    /// 与事件一同提交的聚合版本
    aggregate_version: Version,
    /// 关联 ID，用于将多个事件关联到同一个业务操作
    correlation_id: Option<String>,
    /// 因果 ID，用于表示事件的触发来源
    causation_id: Option<String>,
    /// 触发事件的主体类型（如用户、系统等）
    actor_type: Option<String>,
    /// 触发事件的主体 ID
    actor_id: Option<String>,
    /// 事件发生时间
    occurred_at: DateTime<Utc>,
    /// 事件负载
    payload: Value,
    /// 业务上下文信息
    context: Value,
}

impl SerializedEvent {
    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn event_version(&self) -> usize {
        self.event_version
    }

    pub fn aggregate_id(&self) -> &str {
        &self.aggregate_id
    }

    pub fn aggregate_type(&self) -> &str {
        &self.aggregate_type
    }

    pub fn aggregate_version(&self) -> Version {
        self.aggregate_version
    }

    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    pub fn causation_id(&self) -> Option<&str> {
        self.causation_id.as_deref()
    }

    pub fn actor_type(&self) -> Option<&str> {
        self.actor_type.as_deref()
    }

    pub fn actor_id(&self) -> Option<&str> {
        self.actor_id.as_deref()
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn context(&self) -> &Value {
        &self.context
    }

    /// 以聚合当前（提交时）状态与业务上下文封装一条事件
    pub fn from_envelope<A>(
        aggregate: &A,
        envelope: &EventEnvelope<A::Event>,
        context: &EventContext,
    ) -> DomainResult<Self>
    where
        A: Aggregate,
    {
        Ok(SerializedEvent {
            event_id: envelope.event_id(),
            event_type: envelope.event_type().to_string(),
            event_version: envelope.payload().event_version(),
            aggregate_id: aggregate.id().to_string(),
            aggregate_type: A::TYPE.to_string(),
            aggregate_version: aggregate.version(),
            correlation_id: context.correlation_id().map(|s| s.to_string()),
            causation_id: context.causation_id().map(|s| s.to_string()),
            actor_type: context.actor_type().map(|s| s.to_string()),
            actor_id: context.actor_id().map(|s| s.to_string()),
            occurred_at: *envelope.metadata().occurred_at(),
            payload: serde_json::to_value(envelope.payload())?,
            context: serde_json::to_value(context)?,
        })
    }

    /// 将载荷还原为具体事件类型；载荷类型与事件类型不符时返回 `TypeMismatch`
    pub fn decode<E>(&self) -> DomainResult<E>
    where
        E: DomainEvent,
    {
        let event: E = serde_json::from_value(self.payload.clone())?;
        if event.event_type() != self.event_type {
            return Err(DomainError::TypeMismatch {
                expected: self.event_type.clone(),
                found: event.event_type().to_string(),
            });
        }
        Ok(event)
    }
}

/// 排空聚合的待发布事件，并按产生顺序封装为分发形态
pub fn drain_events<A>(aggregate: &mut A, context: &EventContext) -> DomainResult<Vec<SerializedEvent>>
where
    A: Aggregate,
{
    let envelopes = aggregate.flush_events();

    envelopes
        .iter()
        .map(|env| SerializedEvent::from_envelope(&*aggregate, env, context))
        .collect()
}
