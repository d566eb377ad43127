use bon::Builder;
use serde::Deserialize;
use std::time::Duration;

/// 同一事件的多个处理器的执行方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// 按注册顺序逐个执行
    #[default]
    Sequential,
    /// 同时执行，全部结束后再处理下一个事件
    Concurrent,
}

/// 分发引擎配置
#[derive(Debug, Clone, Builder, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    #[builder(default)]
    pub mode: DispatchMode,
    /// 并发模式下单个事件同时运行的处理器上限，未设置则全部同时启动
    pub max_concurrency: Option<usize>,
    /// 单个处理器的超时时间（毫秒），未设置则不限时
    pub handler_timeout_ms: Option<u64>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            mode: DispatchMode::Sequential,
            max_concurrency: None,
            handler_timeout_ms: None,
        }
    }
}

impl DispatchConfig {
    pub fn handler_timeout(&self) -> Option<Duration> {
        self.handler_timeout_ms.map(Duration::from_millis)
    }

    /// 解析出 `handlers` 个处理器时，同一时刻最多运行的数量
    pub(crate) fn effective_concurrency(&self, handlers: usize) -> usize {
        self.max_concurrency.unwrap_or(handlers).clamp(1, handlers.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = DispatchConfig::default();
        assert_eq!(c.mode, DispatchMode::Sequential);
        assert_eq!(c.max_concurrency, None);
        assert!(c.handler_timeout().is_none());

        let b = DispatchConfig::builder().build();
        assert_eq!(b.mode, DispatchMode::Sequential);
        assert_eq!(b.max_concurrency, None);
        assert_eq!(b.effective_concurrency(12), 12);
    }

    #[test]
    fn deserialize_partial() {
        let c: DispatchConfig =
            serde_json::from_str(r#"{"mode":"concurrent","handler_timeout_ms":250}"#).unwrap();
        assert_eq!(c.mode, DispatchMode::Concurrent);
        assert_eq!(c.max_concurrency, None);
        assert_eq!(c.handler_timeout(), Some(Duration::from_millis(250)));

        let capped: DispatchConfig = serde_json::from_str(r#"{"max_concurrency":3}"#).unwrap();
        assert_eq!(capped.max_concurrency, Some(3));
        assert_eq!(capped.effective_concurrency(10), 3);
        assert_eq!(capped.effective_concurrency(2), 2);
    }

    #[test]
    fn zero_concurrency_is_clamped() {
        let c = DispatchConfig::builder()
            .mode(DispatchMode::Concurrent)
            .max_concurrency(0)
            .build();
        assert_eq!(c.effective_concurrency(5), 1);
        assert_eq!(c.effective_concurrency(0), 1);
    }
}
