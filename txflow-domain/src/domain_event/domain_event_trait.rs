use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;

/// 领域事件载荷需要满足的通用能力边界
pub trait DomainEvent:
    Clone + PartialEq + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// 事件类型（形如 `OrderEvent.LineAdded` 或自定义类型名），分发时据此解析处理器
    fn event_type(&self) -> &str;

    /// 事件载荷版本（用于版本兼容）
    fn event_version(&self) -> usize;
}
