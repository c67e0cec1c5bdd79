use std::io;
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 日志文件名前缀
const LOG_FILE_PREFIX: &str = "semscan-web-logger";

/// 初始化诊断日志系统
///
/// 管道自身的诊断输出 (重新入队、信标失败、状态转换) 与镜像到控制台的
/// 客户端条目都走这里:
/// - JSON格式: 便于机器解析和日志分析
/// - 按天轮转: 每天一个新文件,目录见 [`default_log_dir`]
/// - 双输出: 控制台(开发) + 文件(生产)
/// - 环境变量控制: RUST_LOG=debug 可调整日志级别
///
/// # 示例日志
/// ```json
/// {
///   "timestamp": "2025-10-05T10:30:45.123Z",
///   "level": "WARN",
///   "target": "semscan_logger::services::client_logger",
///   "fields": {
///     "count": 3,
///     "error": "HTTP错误 500: Internal Server Error",
///     "message": "日志投递失败,已重新入队"
///   }
/// }
/// ```
pub fn init() -> Result<(), io::Error> {
    init_with_dir(&default_log_dir())
}

/// 使用指定目录初始化
///
/// 重复初始化返回 `AlreadyExists`,不会panic。
pub fn init_with_dir(log_dir: &Path) -> Result<(), io::Error> {
    // 文件命名格式: semscan-web-logger.2025-10-05.log
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .build(log_dir)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

    // 默认: INFO级别,可通过 RUST_LOG=debug 覆盖
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // 文件层: JSON格式
    let file_layer = fmt::layer()
        .json()
        .with_writer(file_appender)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false);

    // 控制台层: 人类可读格式
    let console_layer = fmt::layer()
        .with_writer(io::stdout)
        .with_target(true)
        .with_level(true)
        .with_ansi(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::AlreadyExists, e))
}

/// 默认日志目录
///
/// 优先使用系统本地数据目录,回退到当前目录
/// - Linux: `~/.local/share/semscan-web-logger/logs/`
/// - macOS: `~/Library/Application Support/semscan-web-logger/logs/`
/// - Windows: `C:\Users\<user>\AppData\Local\semscan-web-logger\logs\`
pub fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|p| p.join(LOG_FILE_PREFIX))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("logs")
}
