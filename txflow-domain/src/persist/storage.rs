//! 存储协议（Storage / StorageSession）
//!
//! 工作单元只依赖这两个 trait：
//! - `Storage::begin` 获取一个独占会话；
//! - 会话内的写入在 `commit` 之前对外不可见，`rollback` 或直接丢弃会话即放弃全部写入。
//!
use crate::error::DomainResult;
use crate::persist::SerializedSnapshot;
use crate::value_object::Version;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 存储键：聚合类型 + 聚合标识
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityKey {
    aggregate_type: String,
    aggregate_id: String,
}

impl EntityKey {
    pub fn new(aggregate_type: impl Into<String>, aggregate_id: impl Into<String>) -> Self {
        Self {
            aggregate_type: aggregate_type.into(),
            aggregate_id: aggregate_id.into(),
        }
    }

    pub fn aggregate_type(&self) -> &str {
        &self.aggregate_type
    }

    pub fn aggregate_id(&self) -> &str {
        &self.aggregate_id
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.aggregate_type, self.aggregate_id)
    }
}

impl From<&SerializedSnapshot> for EntityKey {
    fn from(snapshot: &SerializedSnapshot) -> Self {
        Self::new(snapshot.aggregate_type(), snapshot.aggregate_id())
    }
}

/// 保存时对已持久化版本的期望
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpectedVersion {
    /// 不做检查（最后写入者胜出）
    #[default]
    Any,
    /// 要求该键尚未持久化
    Absent,
    /// 要求已持久化版本恰好等于给定值
    Exact(Version),
    /// 不做检查，但提交时以当前持久化版本为基准重算版本：
    /// 基准 + 快照相对给定加载版本的变更次数，版本因此不会回退
    Rebase(Version),
}

impl ExpectedVersion {
    /// 以当前持久化版本校验期望；不满足时返回期望值与实际值（缺失视为 v0）
    pub fn check(&self, actual: Option<Version>) -> Result<(), (Version, Version)> {
        let found = actual.unwrap_or_default();
        match (self, actual) {
            (ExpectedVersion::Any | ExpectedVersion::Rebase(_), _) => Ok(()),
            (ExpectedVersion::Absent, None) => Ok(()),
            (ExpectedVersion::Absent, Some(_)) => Err((Version::new(), found)),
            (ExpectedVersion::Exact(v), Some(a)) if *v == a => Ok(()),
            (ExpectedVersion::Exact(v), _) => Err((*v, found)),
        }
    }
}

/// 存储后端：按需开启独占会话
#[async_trait]
pub trait Storage: Send + Sync {
    async fn begin(&self) -> DomainResult<Box<dyn StorageSession>>;
}

/// 存储会话：一次逻辑操作内的读取与暂存写入
///
/// 实现方须保证丢弃未提交的会话等同于 `rollback`。
#[async_trait]
pub trait StorageSession: Send {
    /// 读取已持久化的快照；不存在时返回 `None`
    async fn load(&mut self, key: &EntityKey) -> DomainResult<Option<SerializedSnapshot>>;

    /// 当前已持久化的版本；不存在时返回 `None`
    async fn version(&mut self, key: &EntityKey) -> DomainResult<Option<Version>>;

    async fn exists(&mut self, key: &EntityKey) -> DomainResult<bool> {
        Ok(self.version(key).await?.is_some())
    }

    /// 暂存一次写入，提交时按 `expected` 校验
    async fn save(
        &mut self,
        snapshot: SerializedSnapshot,
        expected: ExpectedVersion,
    ) -> DomainResult<()>;

    /// 原子地应用全部暂存写入；任一期望版本不满足则全部放弃并返回 `Concurrency`
    async fn commit(&mut self) -> DomainResult<()>;

    /// 放弃全部暂存写入
    async fn rollback(&mut self) -> DomainResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expected_version_check() {
        let v2 = Version::from_value(2);
        assert!(ExpectedVersion::Any.check(Some(v2)).is_ok());
        assert!(ExpectedVersion::Any.check(None).is_ok());
        assert!(ExpectedVersion::Rebase(v2).check(Some(Version::new())).is_ok());
        assert!(ExpectedVersion::Absent.check(None).is_ok());
        assert_eq!(
            ExpectedVersion::Absent.check(Some(v2)),
            Err((Version::new(), v2))
        );
        assert!(ExpectedVersion::Exact(v2).check(Some(v2)).is_ok());
        assert_eq!(
            ExpectedVersion::Exact(v2).check(Some(Version::from_value(3))),
            Err((v2, Version::from_value(3)))
        );
        assert_eq!(
            ExpectedVersion::Exact(v2).check(None),
            Err((v2, Version::new()))
        );
    }

    #[test]
    fn entity_key_display() {
        assert_eq!(EntityKey::new("Order", "42").to_string(), "Order#42");
    }
}
