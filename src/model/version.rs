//! 版本元数据模型
//! 进程启动时构造一次，之后只读共享给所有请求处理器

use serde::Serialize;

/// 页面与日志中展示的修订号长度
pub const SHORT_SHA_LEN: usize = 7;

/// 部署时确定的版本信息
///
/// 字段私有，只能通过 [`VersionInfo::new`] 构造并通过访问器读取，
/// 启动后放入 `Arc` 共享，不存在任何修改入口。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionInfo {
    version: String,
    git_sha: String,
    built_at: String,
    channel: String,
}

/// `/env` 调试接口的输出形式，键名与环境变量保持一致
#[derive(Debug, Serialize)]
pub struct EnvView<'a> {
    #[serde(rename = "VERSION")]
    pub version: &'a str,
    #[serde(rename = "GIT_SHA")]
    pub git_sha: &'a str,
    #[serde(rename = "BUILD_TIME")]
    pub build_time: &'a str,
    #[serde(rename = "CHANNEL")]
    pub channel: &'a str,
}

impl VersionInfo {
    pub fn new(
        version: impl Into<String>,
        git_sha: impl Into<String>,
        built_at: impl Into<String>,
        channel: impl Into<String>,
    ) -> Self {
        Self {
            version: version.into(),
            git_sha: git_sha.into(),
            built_at: built_at.into(),
            channel: channel.into(),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn git_sha(&self) -> &str {
        &self.git_sha
    }

    pub fn built_at(&self) -> &str {
        &self.built_at
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// 截断后的修订号，用于首页横幅
    pub fn short_sha(&self) -> &str {
        short_sha(&self.git_sha, SHORT_SHA_LEN)
    }

    /// 首页横幅：`[<channel>] hello <version> (sha:<short sha>)`
    pub fn banner(&self) -> String {
        format!(
            "[{}] hello {} (sha:{})\n",
            self.channel,
            self.version,
            self.short_sha()
        )
    }

    pub fn env_view(&self) -> EnvView<'_> {
        EnvView {
            version: &self.version,
            git_sha: &self.git_sha,
            build_time: &self.built_at,
            channel: &self.channel,
        }
    }
}

/// 取前 `n` 个字符；不足 `n` 时原样返回，`n == 0` 返回空串
///
/// 按字符边界切分，多字节输入同样不会 panic。
pub fn short_sha(sha: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    match sha.char_indices().nth(n) {
        Some((end, _)) => &sha[..end],
        None => sha,
    }
}
