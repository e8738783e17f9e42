//! 单连接处理：请求头读取超时、空闲超时与优雅关闭

use crate::util::config::ServerTimeouts;
use crate::util::logging::standards::events;
use axum::Router;
use hyper::server::conn::http1;
use hyper_util::rt::{TokioIo, TokioTimer};
use hyper_util::service::TowerToHyperService;
use std::io;
use std::net::SocketAddr;
use std::pin::{pin, Pin};
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

/// 连接最近一次读写的时间
#[derive(Clone)]
pub(crate) struct Activity(Arc<Mutex<Instant>>);

impl Activity {
    pub(crate) fn new() -> Self {
        Self(Arc::new(Mutex::new(Instant::now())))
    }

    fn touch(&self) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    fn last(&self) -> Instant {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 连续 `limit` 时长没有任何读写时返回
    pub(crate) async fn idle_for(&self, limit: Duration) {
        loop {
            let deadline = self.last() + limit;
            if Instant::now() >= deadline {
                return;
            }
            sleep_until(deadline).await;
        }
    }
}

/// 读写成功时刷新活跃时间的 TCP 流
pub(crate) struct TrackedStream {
    inner: TcpStream,
    activity: Activity,
}

impl TrackedStream {
    pub(crate) fn new(inner: TcpStream, activity: Activity) -> Self {
        Self { inner, activity }
    }
}

impl AsyncRead for TrackedStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let before = buf.filled().len();
        let poll = Pin::new(&mut self.inner).poll_read(cx, buf);
        if matches!(poll, Poll::Ready(Ok(()))) && buf.filled().len() > before {
            self.activity.touch();
        }
        poll
    }
}

impl AsyncWrite for TrackedStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let poll = Pin::new(&mut self.inner).poll_write(cx, buf);
        if matches!(poll, Poll::Ready(Ok(n)) if n > 0) {
            self.activity.touch();
        }
        poll
    }

    fn poll_write_vectored(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[io::IoSlice<'_>],
    ) -> Poll<io::Result<usize>> {
        let poll = Pin::new(&mut self.inner).poll_write_vectored(cx, bufs);
        if matches!(poll, Poll::Ready(Ok(n)) if n > 0) {
            self.activity.touch();
        }
        poll
    }

    fn is_write_vectored(&self) -> bool {
        self.inner.is_write_vectored()
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}

/// 处理单个 HTTP/1 连接
///
/// 请求头须在 `read_header` 内读完，否则连接被断开；连续 `idle` 无读写、
/// 或服务器开始关闭时，等正在处理的请求完成后关闭连接。
pub(crate) async fn serve_connection(
    stream: TcpStream,
    remote_addr: SocketAddr,
    router: Router,
    timeouts: ServerTimeouts,
    mut shutdown: watch::Receiver<bool>,
) {
    let activity = Activity::new();
    let io = TokioIo::new(TrackedStream::new(stream, activity.clone()));

    let mut builder = http1::Builder::new();
    builder
        .timer(TokioTimer::new())
        .header_read_timeout(timeouts.read_header);

    let mut conn = pin!(builder.serve_connection(io, TowerToHyperService::new(router)));

    tokio::select! {
        result = conn.as_mut() => {
            if let Err(e) = result {
                debug!(
                    target: "server.http",
                    event = events::CONNECTION_ERROR,
                    remote = %remote_addr,
                    error = %e
                );
            }
            return;
        }
        _ = shutdown.wait_for(|closing| *closing) => {}
        _ = activity.idle_for(timeouts.idle) => {
            debug!(
                target: "server.http",
                event = events::CONNECTION_IDLE,
                remote = %remote_addr,
                idle_ms = timeouts.idle.as_millis() as u64
            );
        }
    }

    conn.as_mut().graceful_shutdown();
    if let Err(e) = conn.await {
        debug!(
            target: "server.http",
            event = events::CONNECTION_ERROR,
            remote = %remote_addr,
            error = %e
        );
    }
}
