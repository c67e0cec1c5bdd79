//! 中继命令
//!
//! 把文本行翻译成日志管道调用,供没有浏览器的宿主使用。
//!
//! 行格式:
//! - `LEVEL TAG message...`: 记录一条日志
//! - `@path`: 切换当前页面,影响之后条目的来源标识
//! - `!hidden` / `!visible`: 可见性变化
//! - 空行与 `#` 开头的行被忽略

use crate::models::{LifecycleEvent, LogLevel, Visibility};
use crate::state::RelayState;

/// 解析后的一行
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayCommand {
    Log {
        level: LogLevel,
        tag: String,
        message: String,
    },
    Navigate(String),
    Lifecycle(LifecycleEvent),
    Skip,
}

/// 解析一行输入
///
/// # 错误
/// 级别无法识别、缺少标签或未知的 `!` 指令
pub fn parse_log_line(line: &str) -> Result<RelayCommand, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(RelayCommand::Skip);
    }

    if let Some(path) = line.strip_prefix('@') {
        return Ok(RelayCommand::Navigate(path.trim().to_string()));
    }

    if let Some(directive) = line.strip_prefix('!') {
        let visibility = match directive.trim().to_ascii_lowercase().as_str() {
            "hidden" => Visibility::Hidden,
            "visible" => Visibility::Visible,
            other => return Err(format!("未知指令: !{}", other)),
        };
        return Ok(RelayCommand::Lifecycle(LifecycleEvent::VisibilityChanged(
            visibility,
        )));
    }

    let mut parts = line.splitn(3, char::is_whitespace);
    let level = parts
        .next()
        .unwrap_or_default()
        .parse::<LogLevel>()
        .map_err(|e| format!("无法解析日志级别: {}", e))?;
    let tag = parts
        .next()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| format!("缺少标签: {}", line))?;
    let message = parts.next().unwrap_or_default().trim();

    Ok(RelayCommand::Log {
        level,
        tag: tag.to_string(),
        message: message.to_string(),
    })
}

/// 执行单行
pub fn relay_line(state: &RelayState, line: &str) -> Result<(), String> {
    match parse_log_line(line)? {
        RelayCommand::Log {
            level,
            tag,
            message,
        } => state.logger.log(level, tag, message, None),
        RelayCommand::Navigate(path) => {
            tracing::debug!(path = %path, "切换页面");
            state.navigation.navigate(path);
        }
        RelayCommand::Lifecycle(event) => state.logger.handle_lifecycle(event),
        RelayCommand::Skip => {}
    }
    Ok(())
}

/// 执行单行,失败只记警告
///
/// 返回该行是否成功。流式宿主逐行调用,坏行不会中断输入。
pub fn relay_line_or_skip(state: &RelayState, line: &str) -> bool {
    match relay_line(state, line) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(line = %line, error = %e, "中继行无法解析,已跳过");
            false
        }
    }
}

/// 批量执行
///
/// 每行独立处理,单行失败不影响其他行。返回失败行数。
pub fn relay_batch<'a, I>(state: &RelayState, lines: I) -> usize
where
    I: IntoIterator<Item = &'a str>,
{
    lines
        .into_iter()
        .filter(|line| !relay_line_or_skip(state, line))
        .count()
}
