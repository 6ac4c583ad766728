//! 错误类型与服务端诊断信息
//!
//! 三层错误：ApiError（传输 / HTTP / 解码 / SSE）、EditorError（图片编辑会话）、
//! ServiceError（PDF / 媒体 / 下载 / 格式化等协作服务）。所有错误都在 UI 边界本地恢复，不致命。

use serde::Deserialize;
use thiserror::Error;

/// 服务端错误响应中附带的诊断载荷（原样展示，不做解释）
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ErrorDiagnostics {
    pub error_id: String,
    #[serde(default)]
    pub timestamp: String,
}

impl ErrorDiagnostics {
    /// 渲染诊断面板文本；tool 为当前工具名（如 image-editor），空串时记为 dashboard
    pub fn report(&self, tool: &str) -> String {
        let tool = if tool.trim().is_empty() { "dashboard" } else { tool };
        format!(
            "--- NexusKit Diagnostic Info ---\nError ID: {}\nTimestamp (UTC): {}\nTool: {}\nApp Version: {}",
            self.error_id,
            self.timestamp,
            tool,
            env!("CARGO_PKG_VERSION"),
        )
    }
}

/// HTTP 层错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// 请求未能发出或超时（fetch rejected）
    #[error("Request failed: {0}")]
    Transport(String),

    /// 非 2xx 响应；body 中的 error_id/timestamp 与 detail 一并保留
    #[error("HTTP error! status: {status}")]
    Http {
        status: u16,
        diagnostics: Option<ErrorDiagnostics>,
        detail: Option<String>,
    },

    /// 2xx 但响应体不是预期 JSON
    #[error("Invalid response body: {0}")]
    Decode(String),

    /// SSE 进度流错误
    #[error("Error receiving updates: {0}")]
    Stream(String),
}

impl ApiError {
    pub fn diagnostics(&self) -> Option<&ErrorDiagnostics> {
        match self {
            Self::Http { diagnostics, .. } => diagnostics.as_ref(),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// 传输失败或 5xx 视为可重试（重新发起同一动作即可）
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Stream(_) => true,
            Self::Http { status, .. } => *status >= 500,
            Self::Decode(_) => false,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// 图片编辑会话错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditorError {
    /// 尚未上传图片（用户可自行纠正）
    #[error("Please upload an image first.")]
    NoActiveSession,

    #[error("Upload failed: {0}")]
    UploadFailed(ApiError),

    #[error("Edit failed: {0}")]
    EditFailed(ApiError),

    /// 服务端拒绝撤销（如服务端历史为空）
    #[error("Undo failed: {0}")]
    UndoFailed(ApiError),

    /// 参数在发出请求前即被本地校验拒绝
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl EditorError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidParams(message.into())
    }

    /// 底层 HTTP 错误（若有）
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::UploadFailed(e) | Self::EditFailed(e) | Self::UndoFailed(e) => Some(e),
            _ => None,
        }
    }

    pub fn diagnostics(&self) -> Option<&ErrorDiagnostics> {
        self.api_error().and_then(ApiError::diagnostics)
    }

    pub fn is_retryable(&self) -> bool {
        self.api_error().is_some_and(ApiError::is_retryable)
    }
}

impl From<std::io::Error> for EditorError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(format!("{} (kind: {:?})", err, err.kind()))
    }
}

/// 协作服务（PDF / 媒体 / 下载 / 格式化）错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("{0}")]
    InvalidInput(String),

    /// 后台任务以 failed 结束
    #[error("Task failed: {0}")]
    TaskFailed(String),

    /// 调用方取消了进度监听
    #[error("Cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ServiceError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(format!("{} (kind: {:?})", err, err.kind()))
    }
}
