//! 配置加载模块
//! 所有配置均来自环境变量；缺失或为空时回退到默认值，不会失败

use super::types::*;
use chrono::{SecondsFormat, Utc};

/// 环境变量名
pub mod keys {
    pub const VERSION: &str = "VERSION";
    pub const GIT_SHA: &str = "GIT_SHA";
    pub const BUILD_TIME: &str = "BUILD_TIME";
    pub const CHANNEL: &str = "CHANNEL";

    pub const RUST_LOG: &str = "RUST_LOG";
    pub const LOG_LEVEL: &str = "LOG_LEVEL";
    pub const LOG_FORMAT: &str = "LOG_FORMAT";
    pub const LOG_DIR: &str = "LOG_DIR";
}

/// 配置加载器
pub struct ConfigLoader<F> {
    lookup: F,
}

impl ConfigLoader<fn(&str) -> Option<String>> {
    /// 读取当前进程的环境变量
    pub fn from_env() -> Self {
        fn process_env(key: &str) -> Option<String> {
            std::env::var(key).ok()
        }
        Self {
            lookup: process_env,
        }
    }
}

impl<F> ConfigLoader<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// 使用自定义查找函数（测试中用来模拟环境）
    pub fn from_lookup(lookup: F) -> Self {
        Self { lookup }
    }

    /// 非空值才算设置
    fn get(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|v| !v.is_empty())
    }

    fn get_or(&self, key: &str, default: impl FnOnce() -> String) -> String {
        self.get(key).unwrap_or_else(default)
    }

    pub fn load(&self) -> AppConfig {
        AppConfig {
            release: self.load_release(),
            server: ServerConfig::default(),
            logging: self.load_logging(),
        }
    }

    /// 解析四项版本元数据
    ///
    /// `BUILD_TIME` 的默认值是调用时刻的 UTC 时间，因此不同时间启动的进程默认值不同。
    pub fn load_release(&self) -> VersionSettings {
        VersionSettings {
            version: self.get_or(keys::VERSION, || DEFAULT_VERSION.to_string()),
            git_sha: self.get_or(keys::GIT_SHA, || DEFAULT_GIT_SHA.to_string()),
            build_time: self.get_or(keys::BUILD_TIME, default_build_time),
            channel: self.get_or(keys::CHANNEL, || DEFAULT_CHANNEL.to_string()),
        }
    }

    pub fn load_logging(&self) -> LoggingConfig {
        let defaults = LoggingConfig::default();
        LoggingConfig {
            level: self.get_or(keys::LOG_LEVEL, || defaults.level),
            filter: self.get(keys::RUST_LOG),
            format: self
                .get(keys::LOG_FORMAT)
                .map(|v| LogFormat::parse(&v))
                .unwrap_or_default(),
            directory: self.get(keys::LOG_DIR),
        }
    }
}

/// 当前 UTC 时间，RFC 3339 秒级精度，带 `Z` 时区标识
pub fn default_build_time() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
