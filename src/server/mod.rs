//! 服务器模块
//!
//! - 配置管理 (config.rs)
//! - HTTP服务器设置 (http.rs)
//! - 单连接处理与超时 (conn.rs)
//!
//! 使用示例：
//! ```no_run
//! use release_info::server::ServerBootstrap;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let server = ServerBootstrap::new()?;
//! server.start().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
mod conn;
pub mod http;

pub use config::ConfigManager;
pub use http::{HttpServer, ServerError, ServerManager};

use crate::build_info;
use crate::util::config::AppConfig;
use crate::util::log::LogGuards;
use crate::util::logging::standards::events;
use crate::AppState;
use anyhow::Result;
use tracing::{error, info};

/// 服务器引导程序 - 统一的服务器启动入口
pub struct ServerBootstrap {
    config: AppConfig,
    _log_guards: LogGuards,
}

impl ServerBootstrap {
    /// 加载配置并初始化日志
    pub fn new() -> Result<Self> {
        let config = ConfigManager::load();
        let log_guards = ConfigManager::initialize_logging(&config)?;

        Ok(Self {
            config,
            _log_guards: log_guards,
        })
    }

    /// 启动服务器，阻塞直到关闭
    ///
    /// 绑定或运行失败会记录错误日志后返回 `Err`；收到关闭信号属于正常退出。
    pub async fn start(self) -> Result<()> {
        let result = self.run().await;
        if let Err(e) = &result {
            error!(event = events::SERVER_FAILED, error = %e, "服务器异常退出");
        }
        result.map_err(Into::into)
    }

    async fn run(&self) -> Result<(), ServerError> {
        // 版本信息只在这里构造一次，之后只读共享
        let version_info = self.config.release.clone().into_version_info();
        let app_state = AppState::new(version_info);

        let server = ServerManager::create_server(&self.config.server, app_state.clone()).await?;

        let info = &app_state.version_info;
        let timeouts = &self.config.server.timeouts;
        info!(
            event = events::RELEASE_RESOLVED,
            address = %server.local_addr(),
            version = info.version(),
            git_sha = info.git_sha(),
            built_at = info.built_at(),
            channel = info.channel(),
            binary = %build_info::summary(),
            read_timeout_ms = timeouts.read.as_millis() as u64,
            read_header_timeout_ms = timeouts.read_header.as_millis() as u64,
            write_timeout_ms = timeouts.write.as_millis() as u64,
            idle_timeout_ms = timeouts.idle.as_millis() as u64,
            "listening on {} [{}] version {} (sha:{})",
            server.local_addr(),
            info.channel(),
            info.version(),
            info.short_sha()
        );

        ServerManager::start_server(server).await
    }
}

/// `version` 子命令：输出解析后的版本信息，不启动服务
pub fn print_version() -> Result<()> {
    let info = ConfigManager::load().release.into_version_info();
    println!("{}", serde_json::to_string_pretty(&info)?);
    println!("{}", build_info::summary());
    Ok(())
}
