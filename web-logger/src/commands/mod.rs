/// 命令模块
///
/// 宿主可调用的命令:
/// - relay_commands: 文本行 → 日志管道调用
pub mod relay_commands;

pub use relay_commands::{
    parse_log_line, relay_batch, relay_line, relay_line_or_skip, RelayCommand,
};
