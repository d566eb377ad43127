use super::domain_event_trait::DomainEvent;
use super::metadata::Metadata;
use uuid::Uuid;

/// 事件信封：事件载荷与生成时分配的元数据（标识、发生时间）
///
/// 创建后不可变；所有权先属于产生它的实体，排空后转交分发引擎。
#[derive(Debug, Clone, PartialEq)]
pub struct EventEnvelope<E>
where
    E: DomainEvent,
{
    metadata: Metadata,
    payload: E,
}

impl<E> EventEnvelope<E>
where
    E: DomainEvent,
{
    pub fn new(payload: E) -> Self {
        Self {
            metadata: Metadata::builder().build(),
            payload,
        }
    }

    pub fn with_metadata(metadata: Metadata, payload: E) -> Self {
        Self { metadata, payload }
    }

    pub fn event_id(&self) -> Uuid {
        self.metadata.event_id()
    }

    pub fn event_type(&self) -> &str {
        self.payload.event_type()
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}
