//! 配置数据结构定义

use std::time::Duration;

/// 服务固定监听端口
pub const DEFAULT_PORT: u16 = 8080;

pub const DEFAULT_VERSION: &str = "0.0.0";
pub const DEFAULT_GIT_SHA: &str = "dev";
pub const DEFAULT_CHANNEL: &str = "unknown";

/// 进程级配置，启动时解析一次
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub release: VersionSettings,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

/// 对外暴露的四项版本元数据，均已完成默认值填充
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionSettings {
    pub version: String,
    pub git_sha: String,
    pub build_time: String,
    pub channel: String,
}

/// HTTP服务器配置
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub timeouts: ServerTimeouts,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            timeouts: ServerTimeouts::default(),
        }
    }
}

/// 服务器超时设置，限制慢速或恶意客户端占用的资源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerTimeouts {
    /// 读取请求体
    pub read: Duration,
    pub read_header: Duration,
    /// 处理器生成完整响应
    pub write: Duration,
    pub idle: Duration,
}

impl Default for ServerTimeouts {
    fn default() -> Self {
        Self {
            read: Duration::from_secs(5),
            read_header: Duration::from_secs(5),
            write: Duration::from_secs(10),
            idle: Duration::from_secs(60),
        }
    }
}

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    /// 仅识别 `json`（忽略大小写），其余一律按文本处理
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// 未设置 `RUST_LOG` 时使用的过滤表达式
    pub level: String,
    /// 显式的 `RUST_LOG`，优先于 `level`
    pub filter: Option<String>,
    pub format: LogFormat,
    /// 设置后额外按天滚动写入文件
    pub directory: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            filter: None,
            format: LogFormat::Text,
            directory: None,
        }
    }
}
