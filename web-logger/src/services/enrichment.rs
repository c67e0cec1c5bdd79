//! 增强数据源
//!
//! 在准入时同步读取身份、角色与设备信息,附加到投递记录上。
//! 本管道对会话存储只读,任何读取或解析失败都映射为哨兵值:
//! 用户字段为 `None`,角色为 `UNKNOWN`。

use std::collections::HashMap;
use std::sync::RwLock;

use crate::models::{IdentityError, StoredUserData, UserRole};
use crate::utils::page_source::source_from_path;
use crate::utils::user_agent::describe_device;

/// 存储键: 登录用户名
pub const KEY_USERNAME: &str = "bgu_username";
/// 存储键: 演讲者会话数据
pub const KEY_SEMSCAN_USER_DATA: &str = "semscan_user_data";
/// 存储键: 通用用户数据
pub const KEY_USER_DATA: &str = "user_data";

/// 会话存储
///
/// 类似浏览器 `localStorage` 的字符串键值存储,由登录流程维护。
pub trait SessionStore: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;
}

/// 内存会话存储
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    items: RwLock<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_item(&self, key: impl Into<String>, value: impl Into<String>) {
        let mut items = self.items.write().unwrap_or_else(|e| e.into_inner());
        items.insert(key.into(), value.into());
    }

    pub fn remove_item(&self, key: &str) {
        let mut items = self.items.write().unwrap_or_else(|e| e.into_inner());
        items.remove(key);
    }
}

impl SessionStore for MemorySessionStore {
    fn get_item(&self, key: &str) -> Option<String> {
        let items = self.items.read().unwrap_or_else(|e| e.into_inner());
        items.get(key).cloned()
    }
}

impl<S: SessionStore + ?Sized> SessionStore for std::sync::Arc<S> {
    fn get_item(&self, key: &str) -> Option<String> {
        (**self).get_item(key)
    }
}

/// 增强数据源
///
/// 所有访问器都是同步、不可失败的,缺失时返回哨兵值。
pub trait EnrichmentSource: Send + Sync {
    fn user_id(&self) -> Option<String>;
    fn user_display_name(&self) -> Option<String>;
    fn user_role(&self) -> UserRole;
    fn device_descriptor(&self) -> String;
}

/// 导航上下文
///
/// 提供当前页面路径,用于推导条目的来源标识。
pub trait NavigationContext: Send + Sync {
    fn current_path(&self) -> Option<String>;

    /// 来源标识,路径缺失时为 `INDEX`
    fn current_source(&self) -> String {
        source_from_path(self.current_path().as_deref().unwrap_or_default())
    }
}

/// 可更新的固定导航上下文
#[derive(Debug, Default)]
pub struct StaticNavigation {
    path: RwLock<Option<String>>,
}

impl StaticNavigation {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: RwLock::new(Some(path.into())),
        }
    }

    /// 页面跳转后更新路径
    pub fn navigate(&self, path: impl Into<String>) {
        let mut current = self.path.write().unwrap_or_else(|e| e.into_inner());
        *current = Some(path.into());
    }
}

impl NavigationContext for StaticNavigation {
    fn current_path(&self) -> Option<String> {
        self.path.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

/// 基于会话存储的增强数据源
pub struct StoredEnrichment<S: SessionStore> {
    store: S,
    user_agent: String,
}

impl<S: SessionStore> StoredEnrichment<S> {
    /// # 参数
    /// - `store`: 只读的会话存储
    /// - `user_agent`: 宿主的 User-Agent,用于推导设备描述
    pub fn new(store: S, user_agent: impl Into<String>) -> Self {
        Self {
            store,
            user_agent: user_agent.into(),
        }
    }

    /// 读取并解析一个存储键
    fn read_user_data(&self, key: &str) -> Result<StoredUserData, IdentityError> {
        let raw = self
            .store
            .get_item(key)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| IdentityError::Missing(key.to_string()))?;
        StoredUserData::parse(key, &raw)
    }

    /// 读取失败只记调试日志,缺失不是异常
    fn read_or_log(&self, key: &str) -> Option<StoredUserData> {
        match self.read_user_data(key) {
            Ok(data) => Some(data),
            Err(IdentityError::Missing(_)) => None,
            Err(e) => {
                tracing::debug!(error = %e, "会话数据格式错误,使用哨兵值");
                None
            }
        }
    }
}

impl<S: SessionStore> EnrichmentSource for StoredEnrichment<S> {
    fn user_id(&self) -> Option<String> {
        self.store.get_item(KEY_USERNAME).filter(|v| !v.is_empty())
    }

    /// 演讲者会话数据优先,其次通用用户数据
    ///
    /// 每个键独立解析: 损坏的 `semscan_user_data` 不会让查找整体返回空,
    /// 而是继续回落到 `user_data`。
    fn user_display_name(&self) -> Option<String> {
        self.read_or_log(KEY_SEMSCAN_USER_DATA)
            .and_then(|data| data.presenter_display_name())
            .or_else(|| {
                self.read_or_log(KEY_USER_DATA)
                    .and_then(|data| data.display_name())
            })
    }

    fn user_role(&self) -> UserRole {
        self.read_or_log(KEY_USER_DATA)
            .map(|data| data.role())
            .unwrap_or_default()
    }

    fn device_descriptor(&self) -> String {
        describe_device(&self.user_agent)
    }
}
