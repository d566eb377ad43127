use bon::Builder;
use serde::Deserialize;

/// 提交时是否执行乐观并发检查
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardMode {
    #[default]
    Enabled,
    /// 不检查版本，最后写入者胜出
    Disabled,
}

/// 工作单元配置
#[derive(Debug, Clone, Default, Builder, Deserialize)]
#[serde(default)]
pub struct UnitOfWorkConfig {
    #[builder(default)]
    pub concurrency_guard: GuardMode,
    /// 为 true 时，提交后任一处理器失败都以 `AppError::HandlerFailures` 返回
    #[builder(default)]
    pub strict_dispatch: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_guard_on_and_lenient_dispatch() {
        let c = UnitOfWorkConfig::default();
        assert_eq!(c.concurrency_guard, GuardMode::Enabled);
        assert!(!c.strict_dispatch);
    }

    #[test]
    fn deserialize_from_json() {
        let c: UnitOfWorkConfig =
            serde_json::from_str(r#"{"concurrency_guard":"disabled","strict_dispatch":true}"#)
                .unwrap();
        assert_eq!(c.concurrency_guard, GuardMode::Disabled);
        assert!(c.strict_dispatch);

        let partial: UnitOfWorkConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(partial.concurrency_guard, GuardMode::Enabled);
    }
}
