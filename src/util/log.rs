use crate::util::config::{LogFormat, LoggingConfig};
use crate::util::logging::standards::events;
use std::io;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::daily;
use tracing_subscriber::fmt::{layer, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{filter::EnvFilter, Layer, Registry};

/// 日志文件名前缀，按天滚动后形如 `release-info.log.2024-01-02`
pub const LOG_FILE_PREFIX: &str = "release-info.log";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// 持有后台写线程，drop 时刷新缓冲
pub struct LogGuards {
    _console: WorkerGuard,
    _file: Option<WorkerGuard>,
}

/// 初始化全局日志
///
/// 控制台始终输出；配置了日志目录时额外写入按天滚动的文件。
pub fn log_init(config: &LoggingConfig) -> anyhow::Result<LogGuards> {
    let filter = build_env_filter(config);

    let (console_writer, console_guard) = tracing_appender::non_blocking(io::stdout());
    let mut layers: Vec<BoxedLayer> = vec![fmt_layer(config.format, console_writer, true)];

    let file_guard = match config.directory.as_deref() {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let (file_writer, guard) = tracing_appender::non_blocking(daily(dir, LOG_FILE_PREFIX));
            layers.push(fmt_layer(config.format, file_writer, false));
            Some(guard)
        }
        None => None,
    };

    Registry::default().with(layers).with(filter).try_init()?;

    tracing::info!(
        event = events::LOG_INIT,
        level = %config.level,
        filter = config.filter.as_deref().unwrap_or(""),
        structured = config.format == LogFormat::Json,
        file = file_guard.is_some(),
        directory = config.directory.as_deref().unwrap_or("")
    );

    Ok(LogGuards {
        _console: console_guard,
        _file: file_guard,
    })
}

fn fmt_layer<W>(format: LogFormat, writer: W, ansi: bool) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Json => layer()
            .json()
            .with_target(false)
            .with_ansi(false)
            .with_writer(writer)
            .boxed(),
        LogFormat::Text => layer()
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_ansi(ansi)
            .with_writer(writer)
            .boxed(),
    }
}

/// `RUST_LOG` 优先；无效或未设置时退回到 `LOG_LEVEL`
fn build_env_filter(config: &LoggingConfig) -> EnvFilter {
    let fallback = level_filter_to_str(parse_level(&config.level));

    match config.filter.as_deref() {
        Some(expr) => EnvFilter::try_new(expr).unwrap_or_else(|_| EnvFilter::new(fallback)),
        None => EnvFilter::new(fallback),
    }
}

fn parse_level(level: &str) -> LevelFilter {
    match level.trim().to_lowercase().as_str() {
        "off" => LevelFilter::OFF,
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" | "warning" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => LevelFilter::INFO,
    }
}

fn level_filter_to_str(level: LevelFilter) -> &'static str {
    match level {
        LevelFilter::OFF => "off",
        LevelFilter::ERROR => "error",
        LevelFilter::WARN => "warn",
        LevelFilter::INFO => "info",
        LevelFilter::DEBUG => "debug",
        LevelFilter::TRACE => "trace",
    }
}
