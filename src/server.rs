//! 服务器模块：路由装配与生命周期
//!
//! `Server` 在启动时构建一次，持有存储句柄、写锁、耗时日志通道和在途计数，
//! 并通过构造函数传入处理器与服务，不使用全局状态。

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::{net::TcpListener, signal};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::app::user::{
    handler::{self, UserHandler},
    service::UserService,
    store::UserStore,
};
use crate::common::{
    middleware::{admission_middleware, request_logging_middleware, AdmissionGate},
    pending::PendingWork,
};
use crate::config::Config;
use crate::infrastructure::duration_logger::DurationLogger;

/// 创建路由
pub fn build_router(handler: UserHandler, gate: AdmissionGate, debug: bool) -> Router {
    let router = Router::new()
        .route("/users", post(handler::add_user))
        .route(
            "/users/:id",
            get(handler::get_user)
                .put(handler::update_user)
                .delete(handler::delete_user),
        )
        .with_state(handler)
        .layer(middleware::from_fn_with_state(gate, admission_middleware));

    let router = if debug {
        router.layer(middleware::from_fn(request_logging_middleware))
    } else {
        router
    };

    router.layer(
        ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        ),
    )
}

pub struct Server {
    config: Config,
    handler: UserHandler,
    gate: AdmissionGate,
    pending: PendingWork,
    durations: DurationLogger,
}

impl Server {
    /// 必须在 tokio 运行时中调用：会启动耗时日志处理器
    pub fn new(config: Config, store: Arc<dyn UserStore>) -> Self {
        info!("使用 {} 个并发请求名额...", config.http.max_in_flight);

        let durations = DurationLogger::start(
            config.logging.duration_workers,
            config.logging.duration_buffer,
        );
        let pending = PendingWork::new();
        let handler = UserHandler::new(UserService::new(store), durations.sink(), pending.clone());
        let gate = AdmissionGate::new(config.http.max_in_flight);

        Self {
            config,
            handler,
            gate,
            pending,
            durations,
        }
    }

    pub fn router(&self) -> Router {
        build_router(
            self.handler.clone(),
            self.gate.clone(),
            self.config.logging.debug,
        )
    }

    pub fn pending(&self) -> &PendingWork {
        &self.pending
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.config.http.bind_address, self.config.http.port)
    }

    /// 监听配置的地址，直到收到关闭信号
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = TcpListener::bind(self.address()).await?;
        self.serve(listener, shutdown_signal()).await
    }

    /// 在给定监听器上服务，`shutdown` 完成后停止接收新连接并按序关闭
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        info!("Starting REST server on {}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;

        let handled = self.shutdown().await;
        info!("服务器已关闭，共记录 {} 条请求耗时", handled);
        Ok(())
    }

    /// 等待在途请求的耗时消息全部入队，再关闭通道并等待处理器消费完
    pub async fn shutdown(self) -> usize {
        self.pending.wait_idle().await;
        self.durations.shutdown().await
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("无法监听 Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("无法监听 SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
