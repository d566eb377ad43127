//! 事件分发引擎（EventDispatcher）
//!
//! 按给定顺序逐条分发事件，每条事件解析出全部处理器后：
//! - 顺序模式：按注册顺序逐个调用；
//! - 并发模式：同时启动（设置 `max_concurrency` 时受其限制），全部结束后才处理下一条事件。
//!
//! 每次调用都运行在独立的 tokio 任务中，超时在任务之外计时，
//! 因此阻塞线程的处理器也会按时记为超时。
//! 处理器返回错误、panic 或超时都会被捕获、记录到 `DispatchReport`，
//! 不影响同一事件的其他处理器，也不影响后续事件。
//!
use super::config::{DispatchConfig, DispatchMode};
use super::handler::EventHandler;
use super::registry::HandlerRegistry;
use super::report::{DispatchReport, HandlerError, HandlerFailure};
use crate::error::{DomainError, DomainResult};
use crate::persist::SerializedEvent;
use futures_util::{StreamExt, stream};
use std::{sync::Arc, time::Duration};
use tokio::task::JoinError;
use tracing::{debug, error, warn};

#[derive(Clone, Debug)]
pub struct EventDispatcher {
    registry: Arc<HandlerRegistry>,
    config: DispatchConfig,
}

impl EventDispatcher {
    pub fn new(registry: HandlerRegistry, config: DispatchConfig) -> Self {
        Self {
            registry: Arc::new(registry),
            config,
        }
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// 分发一批事件
    ///
    /// 只有整批中存在 `event_type` 为空的事件时返回错误，此时不会调用任何处理器。
    /// 需要在 tokio 运行时中调用。
    pub async fn dispatch(&self, events: &[SerializedEvent]) -> DomainResult<DispatchReport> {
        if let Some(bad) = events.iter().find(|e| e.event_type().trim().is_empty()) {
            return Err(DomainError::InvalidEvent {
                reason: format!(
                    "event {} of {}#{} has an empty event_type",
                    bad.event_id(),
                    bad.aggregate_type(),
                    bad.aggregate_id()
                ),
            });
        }

        let mut report = DispatchReport::default();
        let timeout = self.config.handler_timeout();

        for event in events {
            let handlers = self.registry.resolve(event.event_type());
            report.events_dispatched += 1;
            report.handler_invocations += handlers.len();

            if handlers.is_empty() {
                debug!(event_type = %event.event_type(), "no handler registered");
                continue;
            }

            let outcomes: Vec<(String, Result<(), HandlerError>)> = match self.config.mode {
                DispatchMode::Sequential => {
                    let mut outcomes = Vec::with_capacity(handlers.len());
                    for h in handlers {
                        outcomes.push(invoke(h, event, timeout).await);
                    }
                    outcomes
                }
                DispatchMode::Concurrent => {
                    let limit = self.config.effective_concurrency(handlers.len());
                    // buffered 保持注册顺序输出结果
                    stream::iter(handlers)
                        .map(|h| invoke(h, event, timeout))
                        .buffered(limit)
                        .collect()
                        .await
                }
            };

            for (handler, outcome) in outcomes {
                if let Err(error) = outcome {
                    report.failures.push(HandlerFailure {
                        event_id: event.event_id(),
                        event_type: event.event_type().to_string(),
                        handler,
                        error,
                    });
                }
            }
        }

        debug!(
            mode = ?self.config.mode,
            events = report.events_dispatched,
            invocations = report.handler_invocations,
            failures = report.failures.len(),
            "dispatch finished"
        );
        Ok(report)
    }
}

/// 在独立任务中运行一个处理器，并在任务之外等待结果
async fn invoke(
    handler: Arc<dyn EventHandler>,
    event: &SerializedEvent,
    timeout: Option<Duration>,
) -> (String, Result<(), HandlerError>) {
    let name = handler.handler_name().to_string();
    let owned = event.clone();
    let mut task = tokio::spawn(async move { handler.handle(&owned).await });

    let joined = match timeout {
        Some(limit) => match tokio::time::timeout(limit, &mut task).await {
            Ok(joined) => joined,
            Err(_) => {
                task.abort();
                let timeout_ms = limit.as_millis() as u64;
                warn!(
                    handler = %name,
                    event_type = %event.event_type(),
                    event_id = %event.event_id(),
                    timeout_ms,
                    "event handler timed out"
                );
                return (name, Err(HandlerError::TimedOut { timeout: limit }));
            }
        },
        None => task.await,
    };

    let outcome = match joined {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => {
            warn!(
                handler = %name,
                event_type = %event.event_type(),
                event_id = %event.event_id(),
                error = %err,
                "event handler failed"
            );
            Err(HandlerError::Failed {
                reason: format!("{err:#}"),
            })
        }
        Err(join_err) => {
            let reason = join_failure_reason(join_err);
            error!(
                handler = %name,
                event_type = %event.event_type(),
                event_id = %event.event_id(),
                panic = %reason,
                "event handler panicked"
            );
            Err(HandlerError::Panicked { reason })
        }
    };
    (name, outcome)
}

fn join_failure_reason(err: JoinError) -> String {
    match err.try_into_panic() {
        Ok(panic_info) => extract_panic_message(&panic_info),
        Err(err) => err.to_string(),
    }
}

fn extract_panic_message(panic_info: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
