//! 内存存储（InMemoryStorage）
//!
//! 以进程内 `HashMap` 保存快照，会话内写入先暂存，`commit` 时在同一把锁内
//! 重新校验全部期望版本后整体应用，校验与写入之间不存在竞态窗口。
//! `Rebase` 写入同样在锁内按当前持久化版本重算版本。
//! 适用于测试与原型装配。
//!
use super::storage::{EntityKey, ExpectedVersion, Storage, StorageSession};
use crate::error::{DomainError, DomainResult};
use crate::persist::SerializedSnapshot;
use crate::value_object::Version;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

type Table = HashMap<EntityKey, SerializedSnapshot>;

#[derive(Clone, Default)]
pub struct InMemoryStorage {
    table: Arc<Mutex<Table>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// 直接写入一条快照（不经过会话，用于预置数据）
    pub fn seed(&self, snapshot: SerializedSnapshot) -> DomainResult<()> {
        let key = EntityKey::from(&snapshot);
        lock(&self.table)?.insert(key, snapshot);
        Ok(())
    }

    pub fn persisted_version(&self, key: &EntityKey) -> DomainResult<Option<Version>> {
        Ok(lock(&self.table)?
            .get(key)
            .map(|s| s.aggregate_version()))
    }

    pub fn snapshot(&self, key: &EntityKey) -> DomainResult<Option<SerializedSnapshot>> {
        Ok(lock(&self.table)?.get(key).cloned())
    }

    pub fn len(&self) -> DomainResult<usize> {
        Ok(lock(&self.table)?.len())
    }

    pub fn is_empty(&self) -> DomainResult<bool> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn begin(&self) -> DomainResult<Box<dyn StorageSession>> {
        Ok(Box::new(InMemorySession {
            table: self.table.clone(),
            staged: Vec::new(),
        }))
    }
}

struct InMemorySession {
    table: Arc<Mutex<Table>>,
    staged: Vec<(SerializedSnapshot, ExpectedVersion)>,
}

#[async_trait]
impl StorageSession for InMemorySession {
    async fn load(&mut self, key: &EntityKey) -> DomainResult<Option<SerializedSnapshot>> {
        Ok(lock(&self.table)?.get(key).cloned())
    }

    async fn version(&mut self, key: &EntityKey) -> DomainResult<Option<Version>> {
        Ok(lock(&self.table)?
            .get(key)
            .map(|s| s.aggregate_version()))
    }

    async fn save(
        &mut self,
        snapshot: SerializedSnapshot,
        expected: ExpectedVersion,
    ) -> DomainResult<()> {
        self.staged.push((snapshot, expected));
        Ok(())
    }

    async fn commit(&mut self) -> DomainResult<()> {
        let staged = std::mem::take(&mut self.staged);
        let mut table = lock(&self.table)?;

        for (snapshot, expected) in &staged {
            let key = EntityKey::from(snapshot);
            let actual = table.get(&key).map(|s| s.aggregate_version());
            if let Err((expected, actual)) = expected.check(actual) {
                return Err(DomainError::Concurrency {
                    aggregate_type: key.aggregate_type().to_string(),
                    aggregate_id: key.aggregate_id().to_string(),
                    expected,
                    actual,
                });
            }
        }

        for (mut snapshot, expected) in staged {
            let key = EntityKey::from(&snapshot);
            if let ExpectedVersion::Rebase(loaded) = expected {
                let base = table
                    .get(&key)
                    .map(|s| s.aggregate_version())
                    .unwrap_or_default();
                snapshot.rebase(base, loaded);
            }
            table.insert(key, snapshot);
        }
        Ok(())
    }

    async fn rollback(&mut self) -> DomainResult<()> {
        self.staged.clear();
        Ok(())
    }
}

fn lock(table: &Mutex<Table>) -> DomainResult<MutexGuard<'_, Table>> {
    table.lock().map_err(|e| DomainError::Storage {
        reason: format!("in-memory table poisoned: {e}"),
    })
}
