//! 用户请求处理器
//!
//! 每个请求依次经过：登记在途工作 → 输入校验 → 获取全局写锁 → 调用服务
//! → 映射状态码。写锁由四个操作共享，读写之间不做区分。
//! 请求在独立任务中运行到结束，客户端断开不会中断处理；无论成功、
//! 业务错误还是 panic，都会释放写锁并记录一条耗时消息。

use axum::{
    body::{to_bytes, Body},
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::{any::Any, future::Future, sync::Arc, time::Instant};
use tokio::sync::Mutex;
use tracing::{error, warn};

use super::{
    model::User,
    service::{ServiceError, UserService},
    store::StoreError,
};
use crate::common::{error::CoreError, pending::PendingWork, response::Envelope};
use crate::infrastructure::duration_logger::DurationSink;

const ADD_USER: &str = "AddUser";
const GET_USER: &str = "GetUser";
const UPDATE_USER: &str = "UpdateUser";
const DELETE_USER: &str = "DeleteUser";

/// 路由共享状态
#[derive(Clone)]
pub struct UserHandler {
    service: UserService,
    write_lock: Arc<Mutex<()>>,
    durations: DurationSink,
    pending: PendingWork,
}

impl UserHandler {
    pub fn new(service: UserService, durations: DurationSink, pending: PendingWork) -> Self {
        Self {
            service,
            write_lock: Arc::new(Mutex::new(())),
            durations,
            pending,
        }
    }

    /// 请求边界：在独立任务中计时并执行 `work`，捕获 panic，
    /// 耗时消息入队后才释放在途计数
    async fn instrument<F, Fut>(&self, operation: &'static str, work: F) -> Response
    where
        F: FnOnce(UserHandler) -> Fut,
        Fut: Future<Output = Result<Response, CoreError>> + Send + 'static,
    {
        let admission = self.pending.admit();
        let start = Instant::now();
        let work = tokio::spawn(work(self.clone()));
        let durations = self.durations.clone();

        let request = tokio::spawn(async move {
            let response = match work.await {
                Ok(Ok(response)) => response,
                Ok(Err(err)) => err.into_response(),
                Err(e) if e.is_panic() => {
                    error!(
                        "Request {} panicked: {}",
                        operation,
                        panic_message(e.into_panic().as_ref())
                    );
                    CoreError::ServerFailure.into_response()
                }
                Err(e) => {
                    error!("Request {} was cancelled: {}", operation, e);
                    CoreError::ServerFailure.into_response()
                }
            };

            durations.record(operation, start.elapsed()).await;
            drop(admission);
            response
        });

        match request.await {
            Ok(response) => response,
            Err(e) => {
                error!("Request {} accounting task failed: {}", operation, e);
                CoreError::ServerFailure.into_response()
            }
        }
    }

    async fn create(&self, body: Body) -> Result<Response, CoreError> {
        let user = decode_user(body).await?;

        let _guard = self.write_lock.lock().await;
        self.service.create(&user).await.map_err(|e| {
            error!("创建用户失败: {}", e);
            CoreError::ServerFailure
        })?;

        Ok(Envelope::created("User Created").into_response())
    }

    async fn update(&self, raw_id: &str, body: Body) -> Result<Response, CoreError> {
        let id = parse_user_id(raw_id)?;
        let mut user = decode_user(body).await?;
        user.id = id;

        let _guard = self.write_lock.lock().await;
        self.service
            .update(&user)
            .await
            .map_err(service_error_to_core)?;

        Ok(Envelope::ok("User Updated").into_response())
    }

    async fn delete(&self, raw_id: &str) -> Result<Response, CoreError> {
        let id = parse_user_id(raw_id)?;

        let _guard = self.write_lock.lock().await;
        self.service
            .delete(id)
            .await
            .map_err(service_error_to_core)?;

        Ok(Envelope::ok("User Deleted").into_response())
    }

    async fn get(&self, raw_id: &str) -> Result<Response, CoreError> {
        let id = parse_user_id(raw_id)?;

        let _guard = self.write_lock.lock().await;
        let user = self.service.get(id).await.map_err(|e| {
            log_lookup_failure(id, &e);
            CoreError::NotFound
        })?;

        Ok((StatusCode::OK, Json(user)).into_response())
    }
}

/// POST /users
pub async fn add_user(State(handler): State<UserHandler>, body: Body) -> Response {
    handler
        .instrument(ADD_USER, move |h| async move { h.create(body).await })
        .await
}

/// GET /users/:id
pub async fn get_user(State(handler): State<UserHandler>, Path(id): Path<String>) -> Response {
    handler
        .instrument(GET_USER, move |h| async move { h.get(&id).await })
        .await
}

/// PUT /users/:id
pub async fn update_user(
    State(handler): State<UserHandler>,
    Path(id): Path<String>,
    body: Body,
) -> Response {
    handler
        .instrument(UPDATE_USER, move |h| async move { h.update(&id, body).await })
        .await
}

/// DELETE /users/:id
pub async fn delete_user(State(handler): State<UserHandler>, Path(id): Path<String>) -> Response {
    handler
        .instrument(DELETE_USER, move |h| async move { h.delete(&id).await })
        .await
}

/// 读取完整请求体并解码，不限制长度
async fn decode_user(body: Body) -> Result<User, CoreError> {
    let bytes = to_bytes(body, usize::MAX).await.map_err(|e| {
        warn!("无法读取请求体: {}", e);
        CoreError::InvalidInput
    })?;

    serde_json::from_slice(&bytes).map_err(|e| {
        warn!("无法解析请求体: {}", e);
        CoreError::InvalidInput
    })
}

fn parse_user_id(raw: &str) -> Result<i32, CoreError> {
    raw.parse().map_err(|e| {
        warn!("无效的用户 ID {:?}: {}", raw, e);
        CoreError::InvalidUserId
    })
}

/// 存在性检查失败一律视为 404，写入失败视为 500
fn service_error_to_core(err: ServiceError) -> CoreError {
    match err {
        ServiceError::Missing { id, source } => {
            log_lookup_failure(id, &source);
            CoreError::NotFound
        }
        ServiceError::Store(e) => {
            error!("写入用户失败: {}", e);
            CoreError::ServerFailure
        }
    }
}

fn log_lookup_failure(id: i32, err: &StoreError) {
    if !err.is_not_found() {
        warn!("读取用户 {} 失败，按不存在处理: {}", id, err);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
