//! 视频下载（yt-dlp）客户端：获取视频信息、发起下载、监听进度

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::api::{HttpClient, TaskId};
use crate::core::ServiceError;
use crate::services::progress::{ProgressEvent, ProgressWatcher};

/// 视频的一个可选格式
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VideoFormat {
    pub format_id: String,
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default)]
    pub ext: Option<String>,
}

/// fetch-info 响应
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VideoInfo {
    pub title: String,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub formats: Vec<VideoFormat>,
}

impl VideoInfo {
    /// 画质下拉框选项：只保留带分辨率的格式
    pub fn quality_options(&self) -> Vec<&VideoFormat> {
        self.formats
            .iter()
            .filter(|f| f.resolution.as_deref().is_some_and(|r| !r.is_empty()))
            .collect()
    }
}

/// download-request 请求体
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadRequest {
    pub url: String,
    pub format_id: String,
    pub audio_only: bool,
    pub audio_format: Option<String>,
}

#[derive(Serialize)]
struct FetchInfoRequest<'a> {
    url: &'a str,
}

#[derive(Deserialize)]
struct DownloadAccepted {
    task_id: TaskId,
}

fn require_url(url: &str) -> Result<&str, ServiceError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(ServiceError::InvalidInput("Please enter a YouTube URL.".into()));
    }
    Ok(url)
}

/// yt-dlp 服务客户端
#[derive(Debug, Clone)]
pub struct YtdlClient {
    http: HttpClient,
    watcher: ProgressWatcher,
}

impl YtdlClient {
    pub fn new(http: HttpClient, watcher: ProgressWatcher) -> Self {
        Self { http, watcher }
    }

    pub async fn fetch_info(&self, url: &str) -> Result<VideoInfo, ServiceError> {
        let url = require_url(url)?;
        Ok(self
            .http
            .post_json("/api/v1/ytdl/fetch-info", &FetchInfoRequest { url })
            .await?)
    }

    /// 发起后台下载，返回任务 ID
    pub async fn request_download(&self, request: &DownloadRequest) -> Result<TaskId, ServiceError> {
        require_url(&request.url)?;
        let accepted: DownloadAccepted = self
            .http
            .post_json("/api/v1/ytdl/download-request", request)
            .await?;
        tracing::info!(task_id = %accepted.task_id, audio_only = request.audio_only, "download requested");
        Ok(accepted.task_id)
    }

    pub fn stream_path(task_id: &TaskId) -> String {
        format!("/api/v1/ytdl/tasks/{task_id}/stream")
    }

    pub fn download_url(&self, task_id: &TaskId) -> String {
        self.http.url(&format!("/api/v1/ytdl/download/{task_id}"))
    }

    /// 监听下载进度，完成后返回文件下载地址
    pub async fn wait<F>(
        &self,
        task_id: &TaskId,
        cancel: CancellationToken,
        on_event: F,
    ) -> Result<String, ServiceError>
    where
        F: FnMut(&ProgressEvent),
    {
        self.watcher
            .watch(&Self::stream_path(task_id), cancel, on_event)
            .await?;
        Ok(self.download_url(task_id))
    }
}
