//! 工作单元内的仓储视图（Repository）
//!
//! 对同一聚合的重复触碰返回同一个实例（身份映射），首次加载时记录持久化版本，
//! 供提交时的并发检查使用。
//!
use crate::error::{AppError, AppResult};
use crate::tracked::{TrackedAggregate, TrackedOrigin};
use crate::unit_of_work::UnitOfWork;
use std::marker::PhantomData;
use txflow_domain::aggregate::Aggregate;
use txflow_domain::entity::Entity;
use txflow_domain::error::DomainError;
use txflow_domain::persist::EntityKey;

pub struct Repository<'u, A>
where
    A: Aggregate,
{
    uow: &'u mut UnitOfWork,
    _aggregate: PhantomData<fn() -> A>,
}

impl<'u, A> Repository<'u, A>
where
    A: Aggregate,
{
    pub(crate) fn new(uow: &'u mut UnitOfWork) -> Self {
        Self {
            uow,
            _aggregate: PhantomData,
        }
    }

    fn key(id: &A::Id) -> EntityKey {
        EntityKey::new(A::TYPE, id.to_string())
    }

    /// 加载聚合；不存在时返回 `NotFound`
    pub async fn load(&mut self, id: &A::Id) -> AppResult<&mut A> {
        self.get(id).await?.ok_or_else(|| {
            DomainError::NotFound {
                reason: format!("{}#{id}", A::TYPE),
            }
            .into()
        })
    }

    /// 获取聚合；已登记时直接返回同一实例，否则从存储加载并登记
    pub async fn get(&mut self, id: &A::Id) -> AppResult<Option<&mut A>> {
        let key = Self::key(id);
        if let Some(idx) = self.uow.tracked_index(&key) {
            return self.uow.tracked_mut::<A>(idx).map(Some);
        }

        let Some(snapshot) = self.uow.session_mut()?.load(&key).await? else {
            return Ok(None);
        };
        let aggregate: A = snapshot.to_aggregate()?;
        let origin = TrackedOrigin::Loaded(snapshot.aggregate_version());

        let idx = self
            .uow
            .track(TrackedAggregate::new(key, origin, aggregate));
        self.uow.tracked_mut::<A>(idx).map(Some)
    }

    /// 登记新聚合；同一标识已登记时返回 `InvalidState`
    pub fn add(&mut self, aggregate: A) -> AppResult<&mut A> {
        let key = Self::key(aggregate.id());
        if self.uow.tracked_index(&key).is_some() {
            return Err(AppError::Domain(DomainError::InvalidState {
                reason: format!("{key} is already tracked by this unit of work"),
            }));
        }

        let idx = self
            .uow
            .track(TrackedAggregate::new(key, TrackedOrigin::Added, aggregate));
        self.uow.tracked_mut::<A>(idx)
    }

    /// 已登记或已持久化
    pub async fn exists(&mut self, id: &A::Id) -> AppResult<bool> {
        let key = Self::key(id);
        if self.uow.tracked_index(&key).is_some() {
            return Ok(true);
        }
        Ok(self.uow.session_mut()?.exists(&key).await?)
    }
}
