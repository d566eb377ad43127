//! 工作单元（UnitOfWork）
//!
//! 一次逻辑操作的事务边界，状态机 `Idle → Active → {Committed, RolledBack}`，一次性使用：
//! - `begin` 获取独占的存储会话；
//! - 通过 `repository::<A>()` 加载/新增的聚合按首次触碰顺序登记，同一实体只保留一个实例；
//! - `commit` 依次完成并发检查、暂存写入、排空事件、提交会话，成功后才分发事件；
//! - 任何一步失败都会回滚会话并丢弃本次产生的全部事件。
//!
//! 处理器失败不会改变已提交的结果，只体现在返回的 `DispatchReport` 中
//! （开启 `strict_dispatch` 时以 `AppError::HandlerFailures` 返回）。
//!
use crate::concurrency_guard::ConcurrencyGuard;
use crate::config::UnitOfWorkConfig;
use crate::error::{AppError, AppResult};
use crate::repository::Repository;
use crate::tracked::{Tracked, TrackedAggregate};
use bon::Builder;
use futures_util::future::BoxFuture;
use std::{collections::HashMap, fmt, sync::Arc};
use tracing::{debug, warn};
use txflow_domain::aggregate::Aggregate;
use txflow_domain::domain_event::EventContext;
use txflow_domain::error::{DomainError, DomainResult};
use txflow_domain::eventing::{DispatchReport, EventDispatcher};
use txflow_domain::persist::{EntityKey, SerializedEvent, Storage, StorageSession};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UowState {
    #[default]
    Idle,
    Active,
    Committed,
    RolledBack,
}

impl fmt::Display for UowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UowState::Idle => "idle",
            UowState::Active => "active",
            UowState::Committed => "committed",
            UowState::RolledBack => "rolled back",
        };
        f.write_str(s)
    }
}

#[derive(Builder)]
pub struct UnitOfWork {
    storage: Arc<dyn Storage>,
    /// 未配置时事件照常排空，但不分发
    dispatcher: Option<EventDispatcher>,
    #[builder(default)]
    config: UnitOfWorkConfig,
    /// 附加到本次提交的每一条事件上
    #[builder(default)]
    context: EventContext,
    #[builder(skip)]
    state: UowState,
    #[builder(skip)]
    session: Option<Box<dyn StorageSession>>,
    #[builder(skip)]
    tracked: Vec<Box<dyn Tracked>>,
    #[builder(skip)]
    index: HashMap<EntityKey, usize>,
}

impl UnitOfWork {
    pub fn new(storage: Arc<dyn Storage>, dispatcher: Option<EventDispatcher>) -> Self {
        Self::builder()
            .storage(storage)
            .maybe_dispatcher(dispatcher)
            .build()
    }

    pub fn state(&self) -> UowState {
        self.state
    }

    /// 已登记的实体数量
    pub fn tracked_len(&self) -> usize {
        self.tracked.len()
    }

    pub fn context(&self) -> &EventContext {
        &self.context
    }

    pub fn set_context(&mut self, context: EventContext) {
        self.context = context;
    }

    pub async fn begin(&mut self) -> AppResult<()> {
        if self.state != UowState::Idle {
            return Err(self.state_error("begin"));
        }

        let session = self.storage.begin().await?;
        self.session = Some(session);
        self.state = UowState::Active;
        debug!(correlation_id = ?self.context.correlation_id(), "unit of work began");
        Ok(())
    }

    /// 获取某类聚合的仓储视图；仅在 Active 状态可用
    pub fn repository<A>(&mut self) -> AppResult<Repository<'_, A>>
    where
        A: Aggregate,
    {
        self.ensure_active("use repository")?;
        Ok(Repository::new(self))
    }

    pub async fn commit(&mut self) -> AppResult<DispatchReport> {
        self.ensure_active("commit")?;

        let events = match self.persist().await {
            Ok(events) => events,
            Err(err) => {
                if let Err(rollback_err) = self.abort().await {
                    warn!(error = %rollback_err, "session rollback failed after commit error");
                }
                debug!(error = %err, "unit of work commit failed");
                return Err(err.into());
            }
        };

        self.state = UowState::Committed;
        self.session = None;
        debug!(
            entities = self.tracked.len(),
            events = events.len(),
            "unit of work committed"
        );

        let report = match &self.dispatcher {
            Some(dispatcher) => dispatcher.dispatch(&events).await?,
            None => {
                debug!(events = events.len(), "no dispatcher configured; events dropped");
                DispatchReport::default()
            }
        };

        if self.config.strict_dispatch && !report.is_success() {
            return Err(AppError::HandlerFailures { report });
        }
        Ok(report)
    }

    /// 回滚：丢弃事件并回滚会话；已回滚时为空操作，已提交时报错
    pub async fn rollback(&mut self) -> AppResult<()> {
        match self.state {
            UowState::Committed => Err(self.state_error("rollback")),
            UowState::RolledBack => Ok(()),
            UowState::Idle => {
                self.state = UowState::RolledBack;
                Ok(())
            }
            UowState::Active => Ok(self.abort().await?),
        }
    }

    /// 在作用域内执行：开始、执行闭包，`Ok` 时提交，`Err` 时回滚
    ///
    /// ```no_run
    /// # use std::sync::Arc;
    /// # use txflow_application::{AppResult, UnitOfWork};
    /// # use txflow_domain::persist::InMemoryStorage;
    /// # async fn demo() -> AppResult<()> {
    /// let mut uow = UnitOfWork::new(Arc::new(InMemoryStorage::new()), None);
    /// let (value, report) = uow
    ///     .run(|uow| Box::pin(async move { Ok(uow.tracked_len()) }))
    ///     .await?;
    /// assert_eq!(value, 0);
    /// assert!(report.is_success());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run<T, F>(&mut self, f: F) -> AppResult<(T, DispatchReport)>
    where
        T: Send,
        F: for<'u> FnOnce(&'u mut UnitOfWork) -> BoxFuture<'u, AppResult<T>> + Send,
    {
        self.begin().await?;

        match f(&mut *self).await {
            Ok(value) => {
                let report = self.commit().await?;
                Ok((value, report))
            }
            Err(err) => {
                if let Err(rollback_err) = self.rollback().await {
                    warn!(error = %rollback_err, "rollback failed after scope error");
                }
                Err(err)
            }
        }
    }

    // -------- 内部 --------

    /// 并发检查 → 暂存写入 → 排空事件 → 提交会话
    async fn persist(&mut self) -> DomainResult<Vec<SerializedEvent>> {
        let guard = ConcurrencyGuard::new(self.config.concurrency_guard);
        let session = self
            .session
            .as_deref_mut()
            .ok_or_else(|| DomainError::InvalidState {
                reason: "active unit of work has no session".into(),
            })?;

        guard
            .check(session, self.tracked.iter().map(|t| (t.key(), t.origin())))
            .await?;

        for t in self.tracked.iter().filter(|t| t.is_dirty()) {
            session
                .save(t.snapshot()?, guard.expected_version(t.origin()))
                .await?;
        }

        let mut events = Vec::new();
        for t in self.tracked.iter_mut() {
            events.extend(t.drain_events(&self.context)?);
        }
        if let Some(bad) = events.iter().find(|e| e.event_type().trim().is_empty()) {
            return Err(DomainError::InvalidEvent {
                reason: format!(
                    "{}#{} raised an event with an empty event_type",
                    bad.aggregate_type(),
                    bad.aggregate_id()
                ),
            });
        }

        session.commit().await?;
        Ok(events)
    }

    async fn abort(&mut self) -> DomainResult<()> {
        let discarded: usize = self.tracked.iter_mut().map(|t| t.discard_events()).sum();
        self.state = UowState::RolledBack;
        debug!(discarded, "unit of work rolled back");

        match self.session.take() {
            Some(mut session) => session.rollback().await,
            None => Ok(()),
        }
    }

    fn ensure_active(&self, operation: &'static str) -> AppResult<()> {
        if self.state == UowState::Active {
            Ok(())
        } else {
            Err(self.state_error(operation))
        }
    }

    fn state_error(&self, operation: &'static str) -> AppError {
        AppError::TransactionState {
            operation,
            state: self.state,
        }
    }

    pub(crate) fn session_mut(&mut self) -> AppResult<&mut (dyn StorageSession + 'static)> {
        let state = self.state;
        match self.session.as_deref_mut() {
            Some(session) => Ok(session),
            None => Err(AppError::TransactionState {
                operation: "access storage",
                state,
            }),
        }
    }

    pub(crate) fn tracked_index(&self, key: &EntityKey) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub(crate) fn track<A>(&mut self, entry: TrackedAggregate<A>) -> usize
    where
        A: Aggregate,
    {
        let idx = self.tracked.len();
        self.index.insert(entry.key().clone(), idx);
        self.tracked.push(Box::new(entry));
        idx
    }

    pub(crate) fn tracked_mut<A>(&mut self, idx: usize) -> AppResult<&mut A>
    where
        A: Aggregate,
    {
        let entry = self
            .tracked
            .get_mut(idx)
            .ok_or_else(|| DomainError::InvalidState {
                reason: format!("no tracked entity at {idx}"),
            })?;
        let found = entry.key().aggregate_type().to_string();

        entry
            .as_any_mut()
            .downcast_mut::<TrackedAggregate<A>>()
            .map(|t| t.aggregate_mut())
            .ok_or_else(|| {
                DomainError::TypeMismatch {
                    expected: A::TYPE.to_string(),
                    found,
                }
                .into()
            })
    }
}

impl fmt::Debug for UnitOfWork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<String> = self.tracked.iter().map(|t| t.key().to_string()).collect();
        f.debug_struct("UnitOfWork")
            .field("state", &self.state)
            .field("config", &self.config)
            .field("context", &self.context)
            .field("tracked", &keys)
            .finish()
    }
}

impl Drop for UnitOfWork {
    fn drop(&mut self) {
        if self.state == UowState::Active {
            let discarded: usize = self.tracked.iter_mut().map(|t| t.discard_events()).sum();
            warn!(discarded, "unit of work dropped while active; session released without commit");
        }
    }
}
