use serde::{Deserialize, Serialize};

/// 页面可见性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Visible,
    Hidden,
}

/// 宿主环境的生命周期信号
///
/// 对应浏览器的 `visibilitychange` 与 `beforeunload`。
/// 由宿主注入,测试可以直接构造信号模拟切后台与卸载。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "state", rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// 可见性变化,切到 `Hidden` 时立即刷新
    VisibilityChanged(Visibility),
    /// 即将卸载,之后不保证任何异步任务还能运行
    Teardown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_event_json() {
        let event: LifecycleEvent =
            serde_json::from_str(r#"{"event":"visibility_changed","state":"hidden"}"#).unwrap();
        assert_eq!(event, LifecycleEvent::VisibilityChanged(Visibility::Hidden));

        let event: LifecycleEvent = serde_json::from_str(r#"{"event":"teardown"}"#).unwrap();
        assert_eq!(event, LifecycleEvent::Teardown);
    }
}
