use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use txflow_application::{AppError, UnitOfWork, UowState};
use txflow_domain::aggregate::Aggregate;
use txflow_domain::entity::Entity;
use txflow_domain::error::{DomainError, DomainResult};
use txflow_domain::eventing::{DispatchConfig, EventDispatcher, HandlerRegistry, handler_fn};
use txflow_domain::persist::{
    EntityKey, ExpectedVersion, InMemoryStorage, SerializedSnapshot, Storage, StorageSession,
};
use txflow_domain::value_object::Version;
use txflow_domain::{aggregate, event};

#[event]
enum TicketEvent {
    Opened,
}

#[aggregate(id = String, event = TicketEvent, name = "Ticket")]
struct Ticket {}

/// 读取走内存存储，提交总是失败，并记录回滚次数
struct BrokenStorage {
    inner: InMemoryStorage,
    rollbacks: Arc<AtomicUsize>,
}

struct BrokenSession {
    inner: Box<dyn StorageSession>,
    rollbacks: Arc<AtomicUsize>,
}

#[async_trait]
impl Storage for BrokenStorage {
    async fn begin(&self) -> DomainResult<Box<dyn StorageSession>> {
        Ok(Box::new(BrokenSession {
            inner: self.inner.begin().await?,
            rollbacks: self.rollbacks.clone(),
        }))
    }
}

#[async_trait]
impl StorageSession for BrokenSession {
    async fn load(&mut self, key: &EntityKey) -> DomainResult<Option<SerializedSnapshot>> {
        self.inner.load(key).await
    }

    async fn version(&mut self, key: &EntityKey) -> DomainResult<Option<Version>> {
        self.inner.version(key).await
    }

    async fn save(
        &mut self,
        snapshot: SerializedSnapshot,
        expected: ExpectedVersion,
    ) -> DomainResult<()> {
        self.inner.save(snapshot, expected).await
    }

    async fn commit(&mut self) -> DomainResult<()> {
        Err(DomainError::Storage {
            reason: "disk full".into(),
        })
    }

    async fn rollback(&mut self) -> DomainResult<()> {
        self.rollbacks.fetch_add(1, Ordering::SeqCst);
        self.inner.rollback().await
    }
}

#[tokio::test]
async fn storage_commit_failure_rolls_back_and_dispatches_nothing() {
    let inner = InMemoryStorage::new();
    let rollbacks = Arc::new(AtomicUsize::new(0));
    let storage = Arc::new(BrokenStorage {
        inner: inner.clone(),
        rollbacks: rollbacks.clone(),
    });

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let mut registry = HandlerRegistry::new();
    registry.register_all(handler_fn("sink", move |ev| {
        let sink = sink.clone();
        async move {
            sink.lock().unwrap().push(ev.event_id());
            Ok(())
        }
    }));

    let mut uow = UnitOfWork::new(
        storage,
        Some(EventDispatcher::new(registry, DispatchConfig::default())),
    );
    uow.begin().await.unwrap();
    {
        let mut tickets = uow.repository::<Ticket>().unwrap();
        let t = tickets.add(Ticket::new("t-1".to_string())).unwrap();
        t.raise_event(TicketEvent::Opened);
        t.increment_version();
    }

    let err = uow.commit().await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Domain(DomainError::Storage { ref reason }) if reason == "disk full"
    ));
    assert!(!err.is_concurrency_conflict());
    assert_eq!(uow.state(), UowState::RolledBack);
    assert_eq!(rollbacks.load(Ordering::SeqCst), 1);
    assert!(seen.lock().unwrap().is_empty());
    assert!(inner.is_empty().unwrap());

    // 回滚后的重复回滚为空操作
    uow.rollback().await.unwrap();
    assert_eq!(rollbacks.load(Ordering::SeqCst), 1);
}
