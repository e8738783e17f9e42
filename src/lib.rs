use std::sync::Arc;

pub mod api;
pub mod build_info;
pub mod model;
pub mod server;
pub mod util;

use model::VersionInfo;

/// 应用状态结构
///
/// 版本信息在启动时构造一次，之后所有请求只读共享。
#[derive(Clone)]
pub struct AppState {
    pub version_info: Arc<VersionInfo>,
}

impl AppState {
    pub fn new(version_info: VersionInfo) -> Self {
        Self {
            version_info: Arc::new(version_info),
        }
    }
}
