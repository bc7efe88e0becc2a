//! 请求耗时日志工作池
//!
//! 固定数量的 worker 竞争消费同一个通道中的耗时消息，每条消息只会被
//! 一个 worker 写入日志。通道关闭是唯一的退出信号：关闭后已入队的消息
//! 仍会被消费完，随后 worker 正常退出。

use async_channel::{bounded, Receiver, Sender};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// 生成耗时消息文本
pub fn timing_message(operation: &str, elapsed: Duration) -> String {
    format!("Request {} took {:?}", operation, elapsed)
}

/// 耗时消息的发送端，由请求处理器持有
#[derive(Debug, Clone)]
pub struct DurationSink {
    sender: Sender<String>,
}

impl DurationSink {
    pub fn new(sender: Sender<String>) -> Self {
        Self { sender }
    }

    /// 将一条耗时消息入队，通道已满时等待空位
    pub async fn record(&self, operation: &str, elapsed: Duration) {
        let message = timing_message(operation, elapsed);
        if let Err(e) = self.sender.send(message).await {
            warn!("耗时日志通道已关闭，丢弃消息: {}", e.0);
        }
    }
}

/// 单个消费者
struct DurationWorker {
    id: usize,
    rx: Receiver<String>,
}

impl DurationWorker {
    fn new(id: usize, rx: Receiver<String>) -> Self {
        Self { id, rx }
    }

    /// 消费直到通道关闭且清空，返回处理的消息数
    async fn run(self) -> usize {
        let mut handled = 0;
        while let Ok(message) = self.rx.recv().await {
            info!(worker = self.id, "{}", message);
            handled += 1;
        }
        handled
    }
}

/// 耗时日志工作池
pub struct DurationLogger {
    sender: Sender<String>,
    workers: Vec<JoinHandle<usize>>,
}

impl DurationLogger {
    /// 启动 `worker_count` 个消费者，通道容量为 `capacity`
    pub fn start(worker_count: usize, capacity: usize) -> Self {
        let (sender, rx) = bounded(capacity.max(1));

        info!("启动耗时日志处理器，共 {} 个实例...", worker_count);

        let workers = (0..worker_count)
            .map(|id| tokio::spawn(DurationWorker::new(id, rx.clone()).run()))
            .collect();

        Self { sender, workers }
    }

    pub fn sink(&self) -> DurationSink {
        DurationSink::new(self.sender.clone())
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// 关闭通道并等待所有 worker 消费完剩余消息，返回处理的消息总数
    pub async fn shutdown(self) -> usize {
        self.sender.close();

        let mut total = 0;
        for (id, worker) in self.workers.into_iter().enumerate() {
            match worker.await {
                Ok(handled) => total += handled,
                Err(e) => error!("耗时日志处理器 {} 异常退出: {:?}", id, e),
            }
        }
        total
    }
}
