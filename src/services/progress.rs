//! 后台任务进度监听（SSE）
//!
//! 订阅 `/api/v1/{tool}/tasks/{id}/stream`，逐条解析 `data:` 中的 `{status, progress}` /
//! `{status: "failed", error_message}` 并回调；遇到 completed / failed、取消、流错误或空闲超时即返回，
//! 返回时丢弃字节流，连接随之关闭。

use std::time::Duration;

use eventsource_stream::Eventsource;
use futures_util::{Stream, StreamExt};
use serde::Deserialize;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use crate::api::HttpClient;
use crate::config::AppConfig;
use crate::core::{ApiError, ServiceError};

pub const STATUS_COMPLETED: &str = "completed";
pub const STATUS_FAILED: &str = "failed";

/// 一条进度事件
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProgressEvent {
    pub status: String,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl ProgressEvent {
    pub fn is_completed(&self) -> bool {
        self.status == STATUS_COMPLETED
    }

    pub fn is_failed(&self) -> bool {
        self.status == STATUS_FAILED
    }

    pub fn is_terminal(&self) -> bool {
        self.is_completed() || self.is_failed()
    }

    /// 形如 `downloading: 42%` 的提示文本
    pub fn summary(&self) -> String {
        match self.progress {
            Some(p) => format!("{}: {}%", self.status, p),
            None => self.status.clone(),
        }
    }
}

/// SSE 进度监听器
#[derive(Debug, Clone)]
pub struct ProgressWatcher {
    http: HttpClient,
    idle_timeout: Option<Duration>,
}

impl ProgressWatcher {
    pub fn new(http: HttpClient, idle_timeout: Option<Duration>) -> Self {
        Self { http, idle_timeout }
    }

    pub fn from_config(http: HttpClient, cfg: &AppConfig) -> Self {
        let idle = cfg.progress.idle_timeout_secs;
        Self::new(http, (idle > 0).then(|| Duration::from_secs(idle)))
    }

    /// 监听直到任务结束：completed 返回该事件，failed 返回 TaskFailed
    pub async fn watch<F>(
        &self,
        path: &str,
        cancel: CancellationToken,
        mut on_event: F,
    ) -> Result<ProgressEvent, ServiceError>
    where
        F: FnMut(&ProgressEvent),
    {
        let resp = self.http.open_stream(path).await?;
        let mut stream = Box::pin(resp.bytes_stream().eventsource());
        tracing::debug!(path, "progress stream opened");

        loop {
            let item = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!(path, "progress stream cancelled");
                    return Err(ServiceError::Cancelled);
                }
                item = next_within(&mut stream, self.idle_timeout) => item?,
            };

            let event = match item {
                Some(Ok(event)) => event,
                Some(Err(e)) => return Err(ApiError::Stream(e.to_string()).into()),
                None => {
                    return Err(ApiError::Stream("stream closed before task finished".into()).into())
                }
            };
            if event.data.trim().is_empty() {
                continue;
            }
            let progress: ProgressEvent = match serde_json::from_str(&event.data) {
                Ok(p) => p,
                Err(e) => {
                    tracing::warn!(path, error = %e, data = %event.data, "skipping malformed progress event");
                    continue;
                }
            };

            on_event(&progress);
            if progress.is_completed() {
                tracing::info!(path, "task completed");
                return Ok(progress);
            }
            if progress.is_failed() {
                let message = progress
                    .error_message
                    .clone()
                    .unwrap_or_else(|| "unknown error".to_string());
                tracing::warn!(path, error = %message, "task failed");
                return Err(ServiceError::TaskFailed(message));
            }
        }
    }
}

async fn next_within<S>(stream: &mut S, idle: Option<Duration>) -> Result<Option<S::Item>, ServiceError>
where
    S: Stream + Unpin,
{
    match idle {
        Some(d) => timeout(d, stream.next())
            .await
            .map_err(|_| ApiError::Stream("idle timeout waiting for progress".into()).into()),
        None => Ok(stream.next().await),
    }
}
