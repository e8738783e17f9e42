use crate::util::logging::standards::{events, ACCESS_TARGET};
use axum::{
    extract::Request,
    http::{Method, StatusCode},
    middleware::Next,
    response::Response,
};
use std::fmt;
use std::time::{Duration, Instant};

/// 单个请求的访问记录
#[derive(Debug, Clone)]
pub struct AccessRecord {
    pub method: Method,
    pub path: String,
    /// 内层处理器实际返回的状态码；未显式设置时为 200
    pub status: StatusCode,
    pub latency: Duration,
}

impl AccessRecord {
    /// 按状态码分级输出一行访问日志
    pub fn emit(&self) {
        let status = self.status.as_u16();
        let duration_ms = self.latency.as_secs_f64() * 1000.0;

        if self.status.is_server_error() {
            tracing::error!(
                target: ACCESS_TARGET,
                event = events::REQUEST_ERROR,
                method = %self.method,
                path = %self.path,
                status,
                duration_ms,
                "{}",
                self
            );
        } else if self.status.is_client_error() {
            tracing::warn!(
                target: ACCESS_TARGET,
                event = events::REQUEST_COMPLETE,
                method = %self.method,
                path = %self.path,
                status,
                duration_ms,
                "{}",
                self
            );
        } else {
            tracing::info!(
                target: ACCESS_TARGET,
                event = events::REQUEST_COMPLETE,
                method = %self.method,
                path = %self.path,
                status,
                duration_ms,
                "{}",
                self
            );
        }
    }
}

/// `<method> <path> <status> <duration>`
impl fmt::Display for AccessRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {:?}",
            self.method,
            self.path,
            self.status.as_u16(),
            self.latency
        )
    }
}

/// 统一请求日志中间件
///
/// 只读取内层返回的响应，不做任何改写；包括未命中路由的请求在内，每个请求恰好一行日志。
///
/// 日志在内层返回 `Response` 时输出，此时响应体尚未由 hyper 写出：
/// 耗时不含发送响应体的时间，客户端中途断开也不会改变记录的状态码。
pub async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let start_time = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    AccessRecord {
        method,
        path,
        status: response.status(),
        latency: start_time.elapsed(),
    }
    .emit();

    response
}
