//! 值对象（Value Object）
//!
//! 无标识、以值相等为准的对象，用于封装不可变的概念性值与校验逻辑。
//!

use serde::{Deserialize, Serialize};
use std::fmt;

/// 版本号（用于乐观锁和并发控制）
///
/// 0 表示尚未持久化；每次提交的变更递增 1，不会回退。
///
/// # 示例
///
/// ```
/// use txflow_domain::value_object::Version;
///
/// let v1 = Version::new();
/// assert_eq!(v1.value(), 0);
///
/// let v2 = v1.next();
/// assert_eq!(v2.value(), 1);
/// assert!(v2 > v1);
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(usize);

impl Version {
    /// 创建初始版本（版本号为 0）
    pub const fn new() -> Self {
        Self(0)
    }

    /// 从值创建版本号
    ///
    /// ```
    /// use txflow_domain::value_object::Version;
    ///
    /// let v = Version::from_value(5);
    /// assert_eq!(v.value(), 5);
    /// ```
    pub const fn from_value(value: usize) -> Self {
        Self(value)
    }

    /// 获取下一个版本号
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// 获取版本号的值
    pub const fn value(&self) -> usize {
        self.0
    }

    /// 从 `from` 到当前版本之间提交的变更次数
    pub fn since(&self, from: Version) -> usize {
        self.0.saturating_sub(from.0)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl From<usize> for Version {
    fn from(value: usize) -> Self {
        Self::from_value(value)
    }
}

impl From<Version> for usize {
    fn from(version: Version) -> Self {
        version.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_new() {
        let v = Version::new();
        assert_eq!(v.value(), 0);
        assert_eq!(v, Version::default());
    }

    #[test]
    fn test_version_next_is_strictly_greater() {
        let v1 = Version::from_value(10);
        let v2 = v1.next();

        assert_eq!(v1.value(), 10);
        assert_eq!(v2.value(), 11);
        assert!(v2 > v1);
    }

    #[test]
    fn test_version_since() {
        let loaded = Version::from_value(1);
        let committed = loaded.next().next();
        assert_eq!(committed.since(loaded), 2);
        assert_eq!(loaded.since(committed), 0);
    }

    #[test]
    fn test_version_display() {
        assert_eq!(format!("{}", Version::new()), "v0");
        assert_eq!(format!("{}", Version::from_value(5)), "v5");
    }

    #[test]
    fn test_version_conversions() {
        let v: Version = 42.into();
        assert_eq!(v.value(), 42);
        let num: usize = v.into();
        assert_eq!(num, 42);
    }

    #[test]
    fn test_version_serde() {
        let v = Version::from_value(42);

        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, "42");

        let deserialized: Version = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, v);
    }
}
