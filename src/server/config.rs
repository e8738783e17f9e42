//! 配置管理模块
//! 负责从环境变量加载配置并初始化日志

use crate::util::config::{AppConfig, ConfigLoader};
use crate::util::log::{log_init, LogGuards};
use anyhow::{Context, Result};

/// 配置管理器
pub struct ConfigManager;

impl ConfigManager {
    /// 加载配置；缺失的环境变量全部回退到默认值，不会失败
    pub fn load() -> AppConfig {
        ConfigLoader::from_env().load()
    }

    /// 初始化日志系统
    pub fn initialize_logging(config: &AppConfig) -> Result<LogGuards> {
        log_init(&config.logging).context("日志系统初始化失败")
    }
}
