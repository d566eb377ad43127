//! 实体（Entity）基础抽象
//!
//! 为实体与聚合提供统一的标识（Id）与版本（optimistic locking）能力。
//! 实体的相等性仅由标识决定，与字段或待发布事件无关；`#[entity]`/`#[aggregate]`
//! 会据此生成 `PartialEq`/`Eq`/`Hash`。
//!
use crate::value_object::Version;
use std::{fmt::Display, hash::Hash, str::FromStr};

/// 具备唯一标识与版本的实体抽象
pub trait Entity: Send + Sync {
    /// 实体标识类型，要求可解析、可显示、可比较与可哈希
    type Id: FromStr + Clone + Display + Eq + Hash + Send + Sync + 'static;

    /// 使用给定标识创建新实体（版本为 0，尚未持久化）
    fn new(id: Self::Id) -> Self;

    /// 获取实体标识
    fn id(&self) -> &Self::Id;

    /// 获取当前版本（用于乐观锁与并发控制）
    fn version(&self) -> Version;
}
