use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::env::{EnvConfig, DEBUG_ENV_VAR};

/// 日志配置
pub struct LoggingConfig;

impl LoggingConfig {
    /// 初始化日志系统
    ///
    /// 支持通过环境变量配置：
    /// - RUST_LOG: 设置日志级别（error, warn, info, debug, trace）
    /// - CLIPSIGHT_DEBUG: 启用详细调试输出
    ///
    /// 重复调用时保留第一次安装的订阅者。
    pub fn init() {
        let is_debug = Self::is_debug();

        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => {
                if is_debug {
                    EnvFilter::new("clipsight=debug,info")
                } else {
                    EnvFilter::new("clipsight=info,warn")
                }
            }
        };

        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(is_debug)
            .with_file(is_debug)
            .with_line_number(is_debug)
            .with_thread_ids(is_debug);

        let installed = tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .is_ok();

        if installed && is_debug {
            tracing::debug!("{} set, verbose logging enabled", DEBUG_ENV_VAR);
        }
    }

    pub fn is_debug() -> bool {
        EnvConfig::is_debug_mode()
    }
}
