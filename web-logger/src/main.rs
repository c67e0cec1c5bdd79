use std::sync::Arc;
use std::time::Duration;

use semscan_logger::commands::relay_line_or_skip;
use semscan_logger::models::LifecycleEvent;
use semscan_logger::services::{ClientLogger, ConfigService};
use semscan_logger::state::RelayState;
use semscan_logger::utils::logger;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// 退出前等待信标发送的最长时间
const BEACON_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志系统
    logger::init()?;

    let config = ConfigService::load_logger_config()?;
    let store = ConfigService::load_session_seed()?;
    let user_agent = ConfigService::load_user_agent()?;
    let state = RelayState::new(config, store, user_agent)?;

    let (lifecycle_tx, lifecycle_rx) = mpsc::channel(8);
    let listener = ClientLogger::spawn_lifecycle_listener(Arc::clone(&state.logger), lifecycle_rx);

    tracing::info!("日志中继已启动,从标准输入读取日志行");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    relay_line_or_skip(&state, &line);
                }
                Ok(None) => {
                    tracing::info!("标准输入已关闭");
                    break;
                }
                Err(e) => {
                    tracing::error!(error = %e, "读取标准输入失败");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("收到中断信号");
                break;
            }
        }
    }

    // 卸载: 经由生命周期通道,与浏览器的 beforeunload 同一路径
    if lifecycle_tx.send(LifecycleEvent::Teardown).await.is_err() {
        state.logger.teardown();
    }
    ClientLogger::join_lifecycle_listener(listener).await;

    let logger = Arc::clone(&state.logger);
    let drained = tokio::task::spawn_blocking(move || logger.shutdown(BEACON_DRAIN_TIMEOUT)).await?;
    if !drained {
        tracing::warn!(timeout_secs = BEACON_DRAIN_TIMEOUT.as_secs(), "信标未在超时内发送完毕");
    }

    Ok(())
}
