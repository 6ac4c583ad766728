//! 媒体转换（ffmpeg）客户端
//!
//! 上传 → 选择输出格式与参数 → 发起转换 → 通过 SSE 监听进度 → 完成后给出下载地址。

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::api::{HttpClient, TaskId, UploadFile};
use crate::core::ServiceError;
use crate::services::progress::{ProgressEvent, ProgressWatcher};

/// 输出类别：视频或音频
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputCategory {
    Video,
    Audio,
}

/// 可选输出格式（value 为发给服务端的值，label 为展示名）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputFormat {
    pub value: &'static str,
    pub label: &'static str,
}

pub const VIDEO_FORMATS: &[OutputFormat] = &[
    OutputFormat { value: "mp4", label: "MP4" },
    OutputFormat { value: "mkv", label: "MKV" },
    OutputFormat { value: "webm", label: "WebM" },
    OutputFormat { value: "mov", label: "MOV" },
    OutputFormat { value: "gif", label: "Animated GIF" },
];

pub const AUDIO_FORMATS: &[OutputFormat] = &[
    OutputFormat { value: "mp3", label: "MP3" },
    OutputFormat { value: "m4a", label: "M4A" },
    OutputFormat { value: "wav", label: "WAV" },
    OutputFormat { value: "ogg", label: "OGG" },
    OutputFormat { value: "flac", label: "FLAC" },
    OutputFormat { value: "aac", label: "AAC" },
];

impl OutputCategory {
    pub fn formats(&self) -> &'static [OutputFormat] {
        match self {
            Self::Video => VIDEO_FORMATS,
            Self::Audio => AUDIO_FORMATS,
        }
    }

    /// 根据格式值反查类别
    pub fn of(format: &str) -> Option<Self> {
        [Self::Video, Self::Audio]
            .into_iter()
            .find(|c| c.formats().iter().any(|f| f.value.eq_ignore_ascii_case(format)))
    }
}

/// 上传响应
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MediaUpload {
    pub task_id: TaskId,
    #[serde(default)]
    pub filename: Option<String>,
}

/// 转换参数
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConvertOptions {
    pub output_format: String,
    pub extract_audio: bool,
    pub resolution: Option<String>,
    pub quality: Option<String>,
    pub bitrate: Option<String>,
}

impl ConvertOptions {
    pub fn new(output_format: impl Into<String>) -> Self {
        Self {
            output_format: output_format.into(),
            ..Self::default()
        }
    }
}

#[derive(Serialize)]
struct ConvertRequest<'a> {
    task_id: &'a TaskId,
    #[serde(flatten)]
    options: &'a ConvertOptions,
}

#[derive(Debug, Deserialize)]
struct ConvertAccepted {
    #[serde(default)]
    message: Option<String>,
}

/// ffmpeg 转换服务客户端
#[derive(Debug, Clone)]
pub struct MediaClient {
    http: HttpClient,
    watcher: ProgressWatcher,
}

impl MediaClient {
    pub fn new(http: HttpClient, watcher: ProgressWatcher) -> Self {
        Self { http, watcher }
    }

    pub async fn upload(&self, file: UploadFile) -> Result<MediaUpload, ServiceError> {
        Ok(self.http.upload("/api/v1/ffmpeg/upload", file, &[]).await?)
    }

    /// 发起后台转换；格式须在视频或音频目录中
    pub async fn convert(&self, task_id: &TaskId, options: &ConvertOptions) -> Result<(), ServiceError> {
        if OutputCategory::of(&options.output_format).is_none() {
            return Err(ServiceError::InvalidInput(format!(
                "unsupported output format: {}",
                options.output_format
            )));
        }
        let body = ConvertRequest { task_id, options };
        let accepted: ConvertAccepted = self.http.post_json("/api/v1/ffmpeg/convert", &body).await?;
        tracing::info!(
            task_id = %task_id,
            format = %options.output_format,
            message = accepted.message.as_deref().unwrap_or(""),
            "conversion started"
        );
        Ok(())
    }

    pub fn stream_path(task_id: &TaskId) -> String {
        format!("/api/v1/ffmpeg/tasks/{task_id}/stream")
    }

    pub fn download_url(&self, task_id: &TaskId) -> String {
        self.http.url(&format!("/api/v1/ffmpeg/download/{task_id}"))
    }

    /// 监听转换进度，完成后返回下载地址
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
