//! 日志基础设施

use std::{backtrace::Backtrace, io, panic};
use tracing::error;
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::LoggingConfig;

pub struct Logger;

impl Logger {
    /// 在正式日志初始化之前运行 `f`，期间的日志写到标准错误
    ///
    /// 加载配置时产生的告警因此不会丢失。
    pub fn bootstrap<T>(f: impl FnOnce() -> T) -> T {
        Self::bootstrap_with_writer(io::stderr, f)
    }

    pub fn bootstrap_with_writer<W, T>(writer: W, f: impl FnOnce() -> T) -> T
    where
        W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        let subscriber = tracing_subscriber::registry()
            .with(EnvFilter::new("info"))
            .with(fmt::layer().with_writer(writer).with_ansi(false));
        tracing::subscriber::with_default(subscriber, f)
    }

    /// 初始化 tracing：控制台输出，配置了日志目录时额外按日期写文件
    ///
    /// 返回的 guard 必须存活到进程退出，否则文件日志会丢失尾部内容。
    pub fn init(config: &LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.effective_level()));

        let (file_layer, guard) = match &config.log_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                let appender = rolling::daily(dir, &config.file_prefix);
                let (writer, guard) = tracing_appender::non_blocking(appender);
                let layer = fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false) // 文件中不使用颜色
                    .with_target(false)
                    .with_thread_names(true);
                (Some(layer), Some(guard))
            }
            None => (None, None),
        };

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(io::stdout))
            .with(file_layer)
            .try_init()?;

        Ok(guard)
    }

    /// 将 panic 信息连同调用栈写入日志
    pub fn install_panic_hook() {
        panic::set_hook(Box::new(|info| {
            let backtrace = Backtrace::force_capture();
            error!("panic: {}\n{}", info, backtrace);
        }));
    }
}
