//! 配置管理模块
//!
//! - types: 配置数据结构定义
//! - loader: 环境变量读取与默认值处理

pub mod loader;
pub mod types;

pub use loader::ConfigLoader;
pub use types::*;

use crate::model::VersionInfo;

impl VersionSettings {
    /// 转换为只读的版本信息
    pub fn into_version_info(self) -> VersionInfo {
        VersionInfo::new(self.version, self.git_sha, self.build_time, self.channel)
    }
}
