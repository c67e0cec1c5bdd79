use crate::models::{ConfigError, LoggerConfig};
use crate::services::{ClientLogger, MemorySessionStore, StaticNavigation, StoredEnrichment};
use std::sync::Arc;

/// 中继进程全局状态
///
/// 每个字段代表一个单一来源:
/// - logger: 唯一的日志管道实例
/// - navigation: 当前页面路径,`@path` 行会更新它
pub struct RelayState {
    /// 日志管道
    pub logger: Arc<ClientLogger>,

    /// 导航上下文: 条目来源标识的唯一依据
    pub navigation: Arc<StaticNavigation>,
}

impl RelayState {
    /// 初始化中继状态
    ///
    /// # 参数
    /// - `config`: 管道配置
    /// - `store`: 预置的会话存储 (身份来源)
    /// - `user_agent`: 宿主User-Agent (设备描述来源)
    ///
    /// # 错误处理
    /// - 不在tokio运行时内或HTTP客户端构建失败时返回 `ConfigError`
    pub fn new(
        config: LoggerConfig,
        store: MemorySessionStore,
        user_agent: String,
    ) -> Result<Self, ConfigError> {
        let navigation = Arc::new(StaticNavigation::default());
        let logger = ClientLogger::builder(config)
            .with_enrichment(Arc::new(StoredEnrichment::new(store, user_agent)))
            .with_navigation(navigation.clone())
            .build()?;

        Ok(Self { logger, navigation })
    }

    /// 使用已构建的管道 (测试注入模拟传输层时使用)
    pub fn from_parts(logger: Arc<ClientLogger>, navigation: Arc<StaticNavigation>) -> Self {
        Self { logger, navigation }
    }
}
