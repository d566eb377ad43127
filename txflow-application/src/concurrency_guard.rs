//! 乐观并发保护（ConcurrencyGuard）
//!
//! 提交前比较每个被触碰实体的捕获版本与当前持久化版本，任一不一致即整体失败，
//! 此时尚未写入任何数据。存储实现在 `commit` 内还会对期望版本做一次原子复核。
//!
use crate::config::GuardMode;
use crate::tracked::TrackedOrigin;
use tracing::warn;
use txflow_domain::error::{DomainError, DomainResult};
use txflow_domain::persist::{EntityKey, ExpectedVersion, StorageSession};
use txflow_domain::value_object::Version;

#[derive(Debug, Clone, Copy, Default)]
pub struct ConcurrencyGuard {
    mode: GuardMode,
}

impl ConcurrencyGuard {
    pub fn new(mode: GuardMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> GuardMode {
        self.mode
    }

    /// 保存时交给存储复核的期望版本
    pub fn expected_version(&self, origin: TrackedOrigin) -> ExpectedVersion {
        match (self.mode, origin) {
            (GuardMode::Disabled, TrackedOrigin::Loaded(v)) => ExpectedVersion::Rebase(v),
            (GuardMode::Disabled, TrackedOrigin::Added) => ExpectedVersion::Rebase(Version::new()),
            (GuardMode::Enabled, TrackedOrigin::Loaded(v)) => ExpectedVersion::Exact(v),
            (GuardMode::Enabled, TrackedOrigin::Added) => ExpectedVersion::Absent,
        }
    }

    /// 逐个校验；返回第一个冲突
    pub async fn check<'a, I>(&self, session: &mut dyn StorageSession, entries: I) -> DomainResult<()>
    where
        I: IntoIterator<Item = (&'a EntityKey, TrackedOrigin)>,
    {
        if self.mode == GuardMode::Disabled {
            return Ok(());
        }

        for (key, origin) in entries {
            let actual = session.version(key).await?;
            if let Err((expected, actual)) = self.expected_version(origin).check(actual) {
                warn!(
                    aggregate_type = key.aggregate_type(),
                    aggregate_id = key.aggregate_id(),
                    %expected,
                    %actual,
                    "concurrency conflict"
                );
                return Err(DomainError::Concurrency {
                    aggregate_type: key.aggregate_type().to_string(),
                    aggregate_id: key.aggregate_id().to_string(),
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }
}
