//! 集成测试公共工具：可编程的存储替身与请求辅助函数
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use std::collections::BTreeMap;
use std::sync::{
    atomic::{AtomicBool, AtomicI32, AtomicU64, AtomicUsize, Ordering},
    Arc, Mutex,
};
use std::time::Duration;
use tower::ServiceExt;

use user_manager::{
    build_router,
    common::{middleware::AdmissionGate, pending::PendingWork},
    infrastructure::duration_logger::DurationSink,
    StoreError, User, UserHandler, UserService, UserStore,
};

/// 存储调用记录
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Add(User),
    Get(i32),
    Update(User),
    Delete(i32),
}

/// 内存存储替身：记录调用，可注入失败与 panic
#[derive(Default)]
pub struct MockUserStore {
    rows: Mutex<BTreeMap<i32, User>>,
    last_id: AtomicI32,
    calls: Mutex<Vec<Call>>,
    pub fail_writes: AtomicBool,
    pub fail_lookups: AtomicBool,
    pub panic_on_get: AtomicBool,
    /// 读取前等待的毫秒数，模拟慢速后端
    pub get_delay_ms: AtomicU64,
}

impl MockUserStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_users(users: Vec<User>) -> Arc<Self> {
        let store = Self::default();
        {
            let mut rows = store.rows.lock().unwrap();
            for user in users {
                store.last_id.fetch_max(user.id, Ordering::SeqCst);
                rows.insert(user.id, user);
            }
        }
        Arc::new(store)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn rows(&self) -> Vec<User> {
        self.rows.lock().unwrap().values().cloned().collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn check_write(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(StoreError::Backend("write rejected".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl UserStore for MockUserStore {
    async fn add_user(&self, user: &User) -> Result<(), StoreError> {
        self.record(Call::Add(user.clone()));
        self.check_write()?;
        let id = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.rows
            .lock()
            .unwrap()
            .insert(id, user.clone().with_id(id));
        Ok(())
    }

    async fn get_user(&self, id: i32) -> Result<User, StoreError> {
        self.record(Call::Get(id));
        let delay = self.get_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.panic_on_get.load(Ordering::SeqCst) {
            panic!("injected fault while reading user {}", id);
        }
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("connection reset".to_string()));
        }
        self.rows
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn update_user(&self, user: &User) -> Result<(), StoreError> {
        self.record(Call::Update(user.clone()));
        self.check_write()?;
        self.rows.lock().unwrap().insert(user.id, user.clone());
        Ok(())
    }

    async fn delete_user(&self, id: i32) -> Result<(), StoreError> {
        self.record(Call::Delete(id));
        self.check_write()?;
        self.rows.lock().unwrap().remove(&id);
        Ok(())
    }
}

/// 检测存储调用是否重叠的包装
pub struct SerialCheckStore {
    inner: Arc<MockUserStore>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl SerialCheckStore {
    pub fn new(inner: Arc<MockUserStore>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn enter(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        // 让出执行权，放大重叠窗口
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    fn exit(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl UserStore for SerialCheckStore {
    async fn add_user(&self, user: &User) -> Result<(), StoreError> {
        self.enter().await;
        let result = self.inner.add_user(user).await;
        self.exit();
        result
    }

    async fn get_user(&self, id: i32) -> Result<User, StoreError> {
        self.enter().await;
        let result = self.inner.get_user(id).await;
        self.exit();
        result
    }

    async fn update_user(&self, user: &User) -> Result<(), StoreError> {
        self.enter().await;
        let result = self.inner.update_user(user).await;
        self.exit();
        result
    }

    async fn delete_user(&self, id: i32) -> Result<(), StoreError> {
        self.enter().await;
        let result = self.inner.delete_user(id).await;
        self.exit();
        result
    }
}

/// 路由与其耗时消息接收端、在途计数
pub struct TestApp {
    pub router: Router,
    pub timings: async_channel::Receiver<String>,
    pub pending: PendingWork,
}

impl TestApp {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        let (tx, rx) = async_channel::bounded(1024);
        let pending = PendingWork::new();
        let handler = UserHandler::new(
            UserService::new(store),
            DurationSink::new(tx),
            pending.clone(),
        );

        Self {
            router: build_router(handler, AdmissionGate::new(5000), false),
            timings: rx,
            pending,
        }
    }

    pub async fn send(&self, method: Method, uri: &str, body: Option<&str>) -> (StatusCode, Vec<u8>) {
        send(&self.router, method, uri, body).await
    }

    /// 取出当前已入队的全部耗时消息
    pub fn drain_timings(&self) -> Vec<String> {
        let mut messages = Vec::new();
        while let Ok(message) = self.timings.try_recv() {
            messages.push(message);
        }
        messages
    }
}

pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<&str>,
) -> (StatusCode, Vec<u8>) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = router
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

pub fn json(bytes: &[u8]) -> serde_json::Value {
    serde_json::from_slice(bytes).unwrap()
}
