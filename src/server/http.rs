//! HTTP服务器设置模块
//! 负责绑定端口、组装路由并运行接收循环

use super::conn::serve_connection;
use crate::api::routes;
use crate::util::config::{ServerConfig, ServerTimeouts};
use crate::util::logging::standards::events;
use crate::AppState;
use axum::Router;
use std::future::Future;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::signal::ctrl_c;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// 服务器层面的致命错误；正常关闭不属于错误
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("端口 {port} 绑定失败: {source}")]
    Bind {
        port: u16,
        #[source]
        source: io::Error,
    },
    #[error("读取监听地址失败: {0}")]
    LocalAddr(#[source] io::Error),
}

/// 已绑定端口、尚未开始服务的HTTP服务器
pub struct HttpServer {
    listener: TcpListener,
    app_routes: Router,
    local_addr: SocketAddr,
    timeouts: ServerTimeouts,
}

impl HttpServer {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

/// HTTP服务器管理器
pub struct ServerManager;

impl ServerManager {
    /// 创建HTTP服务器
    pub async fn create_server(
        config: &ServerConfig,
        app_state: AppState,
    ) -> Result<HttpServer, ServerError> {
        let listener = Self::bind_listener(config.port).await?;
        let local_addr = listener.local_addr().map_err(ServerError::LocalAddr)?;
        let app_routes = routes(app_state, &config.timeouts);

        Ok(HttpServer {
            listener,
            app_routes,
            local_addr,
            timeouts: config.timeouts,
        })
    }

    /// 绑定监听端口
    ///
    /// 优先IPv6通配（双栈环境下同时接受IPv4），失败再降级IPv4。
    async fn bind_listener(port: u16) -> Result<TcpListener, ServerError> {
        let v6_addr = SocketAddr::from((Ipv6Addr::UNSPECIFIED, port));
        match TcpListener::bind(v6_addr).await {
            Ok(listener) => {
                info!(
                    target: "server.http",
                    event = events::SERVER_BIND,
                    protocol = "ipv6",
                    address = %v6_addr
                );
                Ok(listener)
            }
            Err(e6) => {
                warn!("IPv6绑定失败: {}，尝试IPv4", e6);
                let v4_addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
                let listener = TcpListener::bind(v4_addr)
                    .await
                    .map_err(|source| ServerError::Bind { port, source })?;
                info!(
                    target: "server.http",
                    event = events::SERVER_BIND,
                    protocol = "ipv4",
                    address = %v4_addr
                );
                Ok(listener)
            }
        }
    }

    /// 启动服务器，收到 SIGINT/SIGTERM 后优雅关闭
    pub async fn start_server(server: HttpServer) -> Result<(), ServerError> {
        Self::serve_until(server, Self::shutdown_signal()).await
    }

    /// 运行服务器直到 `signal` 完成
    ///
    /// `signal` 完成后不再接受新连接，已建立的连接处理完当前请求后关闭。
    pub async fn serve_until<F>(server: HttpServer, signal: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let HttpServer {
            listener,
            app_routes,
            local_addr,
            timeouts,
        } = server;

        info!(
            target: "server.http",
            event = events::SERVER_START,
            address = %local_addr
        );

        let (closing_tx, closing_rx) = watch::channel(false);
        let mut connections = JoinSet::new();
        tokio::pin!(signal);

        loop {
            tokio::select! {
                _ = &mut signal => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, remote_addr)) => {
                        connections.spawn(serve_connection(
                            stream,
                            remote_addr,
                            app_routes.clone(),
                            timeouts,
                            closing_rx.clone(),
                        ));
                    }
                    Err(e) => {
                        // 多为文件描述符耗尽之类的暂时性错误，稍后重试
                        warn!(target: "server.http", event = events::ACCEPT_ERROR, error = %e);
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                },
                Some(joined) = connections.join_next(), if !connections.is_empty() => {
                    Self::log_join(joined);
                }
            }
        }

        drop(listener);
        closing_tx.send_replace(true);
        while let Some(joined) = connections.join_next().await {
            Self::log_join(joined);
        }

        info!(
            target: "server.http",
            event = events::SERVER_STOPPED,
            "HTTP服务器已关闭"
        );
        Ok(())
    }

    fn log_join(joined: Result<(), tokio::task::JoinError>) {
        if let Err(e) = joined {
            error!(target: "server.http", event = events::CONNECTION_ERROR, error = %e, "连接任务异常结束");
        }
    }

    async fn shutdown_signal() {
        let interrupt = async {
            match ctrl_c().await {
                Ok(()) => {}
                Err(e) => Self::never_fires("SIGINT", e).await,
            }
        };

        tokio::select! {
            _ = interrupt => {
                info!(target: "server.http", event = events::SERVER_SIGNAL, signal = "SIGINT");
            }
            _ = Self::wait_for_sigterm() => {
                info!(target: "server.http", event = events::SERVER_SIGNAL, signal = "SIGTERM");
            }
        }
    }

    /// 等待 SIGTERM 信号；监听注册失败时永不返回
    async fn wait_for_sigterm() {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            let installed = signal(SignalKind::terminate()).map(|mut term_signal| async move {
                term_signal.recv().await;
            });
            Self::recv_or_pending("SIGTERM", installed).await
        }
        #[cfg(not(unix))]
        {
            // 非Unix系统，永远等待
            std::future::pending::<()>().await
        }
    }

    /// 信号监听注册成功时等待信号，失败时记录告警后永远等待
    ///
    /// 注册失败不能被当作收到信号，否则服务器会在启动后立刻关闭。
    async fn recv_or_pending<R>(name: &'static str, installed: io::Result<R>)
    where
        R: Future<Output = ()>,
    {
        match installed {
            Ok(received) => received.await,
            Err(e) => Self::never_fires(name, e).await,
        }
    }

    async fn never_fires(name: &'static str, e: io::Error) {
        warn!(
            target: "server.http",
            event = events::SIGNAL_UNAVAILABLE,
            signal = name,
            error = %e,
            "信号监听注册失败，该信号不会触发关闭"
        );
        std::future::pending::<()>().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::VersionInfo;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::sync::oneshot;
    use tokio::time::timeout;

    fn ephemeral() -> ServerConfig {
        ServerConfig {
            port: 0,
            ..ServerConfig::default()
        }
    }

    fn ephemeral_with(timeouts: ServerTimeouts) -> ServerConfig {
        ServerConfig {
            port: 0,
            timeouts,
        }
    }

    fn state() -> AppState {
        AppState::new(VersionInfo::new("9.9.9", "0123456789abc", "now", "test"))
    }

    fn loopback(addr: SocketAddr) -> SocketAddr {
        if addr.is_ipv6() {
            SocketAddr::from((Ipv6Addr::LOCALHOST, addr.port()))
        } else {
            SocketAddr::from((Ipv4Addr::LOCALHOST, addr.port()))
        }
    }

    async fn spawn_server(
        config: &ServerConfig,
    ) -> (
        SocketAddr,
        oneshot::Sender<()>,
        tokio::task::JoinHandle<Result<(), ServerError>>,
    ) {
        let server = ServerManager::create_server(config, state()).await.unwrap();
        let addr = loopback(server.local_addr());
        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(ServerManager::serve_until(server, async {
            let _ = rx.await;
        }));
        (addr, tx, handle)
    }

    async fn raw_get(addr: SocketAddr, path: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).await.unwrap();
        String::from_utf8(buf).unwrap()
    }

    // 读到对端关闭为止；连接被重置也算关闭
    async fn read_until_closed(stream: &mut TcpStream, limit: Duration) -> String {
        let mut buf = Vec::new();
        let read = timeout(limit, stream.read_to_end(&mut buf)).await;
        assert!(read.is_ok(), "connection still open after {limit:?}");
        String::from_utf8_lossy(&buf).into_owned()
    }

    #[tokio::test]
    async fn test_serves_until_shutdown() {
        let (addr, tx, handle) = spawn_server(&ephemeral()).await;

        let health = raw_get(addr, "/healthz").await;
        assert!(health.starts_with("HTTP/1.1 200 OK"), "{health}");
        assert!(health.ends_with("\r\n\r\nok"), "{health}");

        let banner = raw_get(addr, "/").await;
        assert!(banner.to_lowercase().contains("x-release-channel: test"), "{banner}");
        assert!(banner.ends_with("[test] hello 9.9.9 (sha:0123456)\n"), "{banner}");

        tx.send(()).unwrap();
        assert!(handle.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_bind_conflict_is_error() {
        let first = ServerManager::create_server(&ephemeral(), state())
            .await
            .unwrap();
        let taken = ServerConfig {
            port: first.local_addr().port(),
            ..ServerConfig::default()
        };

        match ServerManager::create_server(&taken, state()).await {
            Err(ServerError::Bind { port, .. }) => assert_eq!(port, taken.port),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(server) => panic!("bound twice on {}", server.local_addr()),
        }
    }

    #[tokio::test]
    async fn test_incomplete_headers_are_dropped() {
        let config = ephemeral_with(ServerTimeouts {
            read_header: Duration::from_millis(200),
            ..ServerTimeouts::default()
        });
        let (addr, tx, handle) = spawn_server(&config).await;

        let mut stream = TcpStream::connect(addr).await.unwrap();
        // 缺少结尾空行，请求头永远不完整
        stream
            .write_all(b"GET /healthz HTTP/1.1\r\nHost: x\r\n")
            .await
            .unwrap();

        let received = read_until_closed(&mut stream, Duration::from_secs(3)).await;
        assert!(!received.contains("200 OK"), "{received}");

        tx.send(()).unwrap();
        assert!(handle.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_idle_keep_alive_connection_is_closed() {
        let config = ephemeral_with(ServerTimeouts {
            idle: Duration::from_millis(300),
            ..ServerTimeouts::default()
        });
        let (addr, tx, handle) = spawn_server(&config).await;

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /healthz HTTP/1.1\r\nHost: x\r\n\r\n")
            .await
            .unwrap();

        let mut response = Vec::new();
        let mut chunk = [0u8; 1024];
        while !response.ends_with(b"\r\n\r\nok") {
            let n = timeout(Duration::from_secs(3), stream.read(&mut chunk))
                .await
                .unwrap()
                .unwrap();
            assert!(n > 0, "closed before the response arrived");
            response.extend_from_slice(&chunk[..n]);
        }

        // 保持连接但不再发送请求
        let leftover = read_until_closed(&mut stream, Duration::from_secs(3)).await;
        assert!(leftover.is_empty(), "{leftover}");

        tx.send(()).unwrap();
        assert!(handle.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_shutdown_closes_idle_keep_alive_connections() {
        let (addr, tx, handle) = spawn_server(&ephemeral()).await;

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /healthz HTTP/1.1\r\nHost: x\r\n\r\n")
            .await
            .unwrap();
        let mut chunk = [0u8; 1024];
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0);

        tx.send(()).unwrap();
        let stopped = timeout(Duration::from_secs(3), handle).await;
        assert!(stopped.is_ok(), "idle keep-alive connection blocked shutdown");
        assert!(stopped.unwrap().unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_failed_signal_registration_never_fires() {
        let installed: io::Result<std::future::Ready<()>> =
            Err(io::Error::other("signal driver unavailable"));
        let waited = timeout(
            Duration::from_millis(100),
            ServerManager::recv_or_pending("SIGTERM", installed),
        )
        .await;
        assert!(waited.is_err(), "registration failure was treated as a signal");
    }

    #[tokio::test]
    async fn test_registered_signal_is_awaited() {
        let installed: io::Result<std::future::Ready<()>> = Ok(std::future::ready(()));
        let waited = timeout(
            Duration::from_millis(100),
            ServerManager::recv_or_pending("SIGTERM", installed),
        )
        .await;
        assert!(waited.is_ok());
    }
}
