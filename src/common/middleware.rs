//! 核心中间件模块

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::{sync::Arc, time::Instant};
use tokio::sync::Semaphore;
use tracing::{error, info};
use uuid::Uuid;

use super::error::CoreError;

/// 准入闸门：限制同时在途的请求数量，超出的请求等待空闲名额
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    permits: Arc<Semaphore>,
    capacity: usize,
}

impl AdmissionGate {
    pub fn new(capacity: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 当前空闲名额
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}

/// 准入闸门中间件
pub async fn admission_middleware(
    State(gate): State<AdmissionGate>,
    req: Request,
    next: Next,
) -> Response {
    let _permit = match gate.permits.acquire().await {
        Ok(permit) => permit,
        Err(e) => {
            error!("准入闸门已关闭: {}", e);
            return CoreError::ServerFailure.into_response();
        }
    };

    next.run(req).await
}

/// 请求日志中间件（调试模式启用）
pub async fn request_logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let request_id = Uuid::new_v4();
    let method = req.method().clone();
    let uri = req.uri().clone();
    let user_agent = req
        .headers()
        .get("user-agent")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string());

    let response = next.run(req).await;
    let status = response.status();
    let duration = start.elapsed();

    info!(
        "[{}] {} {} - {} - {}ms - User-Agent: {:?}",
        request_id,
        method,
        uri,
        status,
        duration.as_millis(),
        user_agent
    );

    response
}
