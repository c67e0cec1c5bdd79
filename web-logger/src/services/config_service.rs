use crate::models::{ConfigError, LoggerConfig};
use crate::services::enrichment::{
    MemorySessionStore, KEY_SEMSCAN_USER_DATA, KEY_USERNAME, KEY_USER_DATA,
};
use std::collections::HashMap;
use std::env;
use std::io::Read;
use std::path::{Path, PathBuf};

/// 会话预置: 环境变量 → 会话存储键
const SESSION_SEED_KEYS: [(&str, &str); 3] = [
    ("SEMSCAN_SESSION_USERNAME", KEY_USERNAME),
    ("SEMSCAN_SESSION_USER_DATA", KEY_USER_DATA),
    ("SEMSCAN_SESSION_SEMSCAN_USER_DATA", KEY_SEMSCAN_USER_DATA),
];

/// 配置服务
///
/// 只负责读取,职责单一:
/// - 从 .env 文件与进程环境变量加载日志管道配置
/// - 进程环境变量优先于 .env 文件
pub struct ConfigService;

impl ConfigService {
    fn current_dir() -> Result<PathBuf, ConfigError> {
        env::current_dir().map_err(|e| ConfigError::IoError(format!("无法获取当前目录: {}", e)))
    }

    /// 获取 .env 文件路径
    ///
    /// 查找顺序:
    /// 1. 当前工作目录的 .env
    /// 2. 上层目录的 .env (在 web-logger/ 内执行的情况)
    fn env_file_path(cwd: &Path) -> Option<PathBuf> {
        let env_path = cwd.join(".env");
        if env_path.exists() {
            return Some(env_path);
        }

        cwd.parent()
            .map(|parent| parent.join(".env"))
            .filter(|parent_env| parent_env.exists())
    }

    /// 解析 .env 内容
    ///
    /// 语法 (引号、注释、`export` 前缀) 交给 dotenvy 处理,
    /// 不修改进程环境变量。
    fn parse_env<R: Read>(reader: R) -> Result<HashMap<String, String>, ConfigError> {
        let mut vars = HashMap::new();
        for item in dotenvy::from_read_iter(reader) {
            let (key, value) = item?;
            vars.insert(key, value);
        }
        Ok(vars)
    }

    /// 读取 .env 文件,文件不存在时为空
    fn load_env_file(cwd: &Path) -> Result<HashMap<String, String>, ConfigError> {
        let Some(env_path) = Self::env_file_path(cwd) else {
            tracing::info!("配置文件不存在,仅使用环境变量");
            return Ok(HashMap::new());
        };

        let file = std::fs::File::open(&env_path)?;
        let vars = Self::parse_env(file)?;
        tracing::debug!(path = %env_path.display(), count = vars.len(), "已读取 .env 文件");
        Ok(vars)
    }

    fn lookup_with<'a>(file_vars: &'a HashMap<String, String>) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| env::var(key).ok().or_else(|| file_vars.get(key).cloned())
    }

    /// 加载日志管道配置
    ///
    /// 读取的键见 [`LoggerConfig::from_lookup`]。缺失的键取默认值。
    ///
    /// # 错误处理
    /// - 文件不存在时使用默认配置 (不报错)
    /// - 文件读取或解析失败时返回 IoError
    /// - 值无法解析时返回 InvalidValue
    pub fn load_logger_config() -> Result<LoggerConfig, ConfigError> {
        Self::load_logger_config_in(&Self::current_dir()?)
    }

    fn load_logger_config_in(cwd: &Path) -> Result<LoggerConfig, ConfigError> {
        let file_vars = Self::load_env_file(cwd)?;
        let config = LoggerConfig::from_lookup(Self::lookup_with(&file_vars))?;

        tracing::info!(config = %config.summary_for_logging(), "已加载日志管道配置");
        Ok(config)
    }

    /// 从配置预置会话存储
    ///
    /// 没有浏览器存储的宿主 (如中继进程) 用它提供身份:
    /// - `SEMSCAN_SESSION_USERNAME` → `bgu_username`
    /// - `SEMSCAN_SESSION_USER_DATA` → `user_data`
    /// - `SEMSCAN_SESSION_SEMSCAN_USER_DATA` → `semscan_user_data`
    pub fn load_session_seed() -> Result<MemorySessionStore, ConfigError> {
        Self::load_session_seed_in(&Self::current_dir()?)
    }

    fn load_session_seed_in(cwd: &Path) -> Result<MemorySessionStore, ConfigError> {
        let file_vars = Self::load_env_file(cwd)?;
        let store = Self::seed_store(Self::lookup_with(&file_vars));
        Ok(store)
    }

    /// 宿主User-Agent (`SEMSCAN_USER_AGENT`),缺省为空
    pub fn load_user_agent() -> Result<String, ConfigError> {
        Self::load_user_agent_in(&Self::current_dir()?)
    }

    fn load_user_agent_in(cwd: &Path) -> Result<String, ConfigError> {
        let file_vars = Self::load_env_file(cwd)?;
        let lookup = Self::lookup_with(&file_vars);
        let user_agent = lookup("SEMSCAN_USER_AGENT").unwrap_or_default();
        Ok(user_agent)
    }

    fn seed_store<F>(lookup: F) -> MemorySessionStore
    where
        F: Fn(&str) -> Option<String>,
    {
        let store = MemorySessionStore::new();
        for (env_key, store_key) in SESSION_SEED_KEYS {
            if let Some(value) = lookup(env_key).filter(|v| !v.is_empty()) {
                store.set_item(store_key, value);
            }
        }
        store
    }
}
