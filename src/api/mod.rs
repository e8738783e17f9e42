mod release;

pub use release::X_RELEASE_CHANNEL;

use crate::util::config::ServerTimeouts;
use crate::util::middleware;
use crate::AppState;
use axum::middleware::from_fn;
use axum::routing::any;
use axum::Router;
use tower_http::timeout::{RequestBodyTimeoutLayer, TimeoutLayer};

pub fn routes(app_state: AppState, timeouts: &ServerTimeouts) -> Router {
    let handlers = Router::new()
        .route("/", any(release::index))
        .route("/version", any(release::version))
        .route("/healthz", any(release::healthz))
        .route("/env", any(release::env))
        .fallback(release::not_found)
        .with_state(app_state);

    with_layers(handlers, timeouts)
}

/// 全局中间件栈，对包括 fallback 在内的所有路由生效
fn with_layers(router: Router, timeouts: &ServerTimeouts) -> Router {
    router
        // 超时层：读请求体与生成响应分别限时，超时返回 408
        .layer(RequestBodyTimeoutLayer::new(timeouts.read))
        .layer(TimeoutLayer::new(timeouts.write))
        // 放在最外层以便超时响应同样被记录
        .layer(from_fn(middleware::request_logging_middleware))
}
