use crate::{
    aggregate::Aggregate,
    entity::Entity,
    error::{DomainError, DomainResult as Result},
    value_object::Version,
};
use bon::Builder;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// 聚合的持久化形态：类型、标识、已提交版本与状态载荷
#[derive(Debug, Clone, Builder, PartialEq, Serialize, Deserialize)]
pub struct SerializedSnapshot {
    aggregate_id: String,
    aggregate_type: String,
    aggregate_version: Version,
    payload: Value,
}

impl SerializedSnapshot {
    pub fn aggregate_id(&self) -> &str {
        &self.aggregate_id
    }

    pub fn aggregate_type(&self) -> &str {
        &self.aggregate_type
    }

    pub fn aggregate_version(&self) -> Version {
        self.aggregate_version
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// 以 `base` 为基准重算版本，保留自 `loaded` 以来的变更次数
    ///
    /// 载荷中的 `version` 字段同步更新，保持与 `aggregate_version` 一致。
    pub fn rebase(&mut self, base: Version, loaded: Version) {
        let rebased = Version::from_value(base.value() + self.aggregate_version.since(loaded));
        self.aggregate_version = rebased;
        if let Some(version) = self.payload.get_mut("version") {
            *version = json!(rebased.value());
        }
    }

    /// 将持久化形态反序列化为聚合实例
    pub fn to_aggregate<A>(&self) -> Result<A>
    where
        A: Aggregate,
    {
        if A::TYPE != self.aggregate_type {
            return Err(DomainError::TypeMismatch {
                expected: A::TYPE.to_string(),
                found: self.aggregate_type.clone(),
            });
        }

        let aggregate: A = serde_json::from_value(self.payload.clone())?;
        if aggregate.version() != self.aggregate_version {
            return Err(DomainError::InvalidState {
                reason: format!(
                    "{}#{} payload version {} differs from stored version {}",
                    self.aggregate_type,
                    self.aggregate_id,
                    aggregate.version(),
                    self.aggregate_version
                ),
            });
        }
        Ok(aggregate)
    }

    /// 从聚合实例创建持久化形态（待发布事件不参与序列化）
    pub fn from_aggregate<A>(aggregate: &A) -> Result<Self>
    where
        A: Aggregate,
    {
        Ok(Self {
            aggregate_id: aggregate.id().to_string(),
            aggregate_type: A::TYPE.to_string(),
            aggregate_version: aggregate.version(),
            payload: serde_json::to_value(aggregate)?,
        })
    }
}
