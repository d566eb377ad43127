use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 元数据：事件生成时分配，之后不再变化
#[derive(Builder, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[builder(default = Uuid::now_v7())]
    event_id: Uuid,
    #[builder(default = Utc::now())]
    occurred_at: DateTime<Utc>,
}

impl Metadata {
    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn occurred_at(&self) -> &DateTime<Utc> {
        &self.occurred_at
    }
}
