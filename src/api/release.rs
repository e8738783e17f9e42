//! 版本信息与存活探针接口
//!
//! 所有接口接受任意方法，忽略请求体和查询参数。

use crate::model::VersionInfo;
use crate::util::logging::standards::events;
use crate::AppState;
use axum::extract::State;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::warn;

pub const X_RELEASE_CHANNEL: HeaderName = HeaderName::from_static("x-release-channel");

/// `/`：纯文本横幅
pub async fn index(State(app_state): State<AppState>) -> Response {
    let info: &VersionInfo = &app_state.version_info;
    let mut response = info.banner().into_response();
    insert_channel_header(&mut response, info.channel());
    response
}

/// `/version`
pub async fn version(State(app_state): State<AppState>) -> Response {
    let info: &VersionInfo = &app_state.version_info;
    let mut response = Json(info).into_response();
    insert_channel_header(&mut response, info.channel());
    response
}

/// `/healthz`：只要进程能处理请求就返回 ok
pub async fn healthz() -> &'static str {
    "ok"
}

/// `/env`：调试用，键名与环境变量一致
pub async fn env(State(app_state): State<AppState>) -> Response {
    Json(app_state.version_info.env_view()).into_response()
}

pub async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "404 page not found\n")
}

// 渠道名包含非法头字符时不设置响应头，正文中仍然保留
fn insert_channel_header(response: &mut Response, channel: &str) {
    match HeaderValue::from_str(channel) {
        Ok(value) => {
            response.headers_mut().insert(X_RELEASE_CHANNEL, value);
        }
        Err(_) => {
            warn!(
                event = events::RELEASE_HEADER_INVALID,
                channel = %channel.escape_debug(),
                "渠道名无法作为响应头输出"
            );
        }
    }
}
