//! 图片编辑接口的线上数据结构
//!
//! TaskId 标识服务端一份工作副本；ArtifactRef 只是当前渲染结果的 URL，仅用于展示与缓存失效，不作身份。

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// 服务端下发的不透明任务 ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 当前渲染图片的引用（URL，通常是服务端相对路径）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactRef(String);

impl ArtifactRef {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 展示用 URL：追加 `t=<millis>` 以绕过浏览器/代理缓存
    pub fn display_url(&self, now_millis: i64) -> String {
        let sep = if self.0.contains('?') { '&' } else { '?' };
        format!("{}{}t={}", self.0, sep, now_millis)
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 待上传的文件（文件名 + 内容）
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// 从磁盘读取；文件名取路径最后一段
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.bin".to_string());
        Ok(Self { file_name, bytes })
    }
}

/// `POST /api/v1/image/upload` 响应
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UploadResponse {
    pub task_id: TaskId,
    pub image_url: ArtifactRef,
    #[serde(default)]
    pub filename: Option<String>,
}

/// `POST /api/v1/image/edit` 请求体
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditRequest {
    pub task_id: TaskId,
    pub action: String,
    pub params: serde_json::Value,
}

/// `POST /api/v1/image/undo` 请求体
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UndoRequest {
    pub task_id: TaskId,
}

/// edit / undo 的响应
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EditResponse {
    pub image_url: ArtifactRef,
    #[serde(default)]
    pub task_id: Option<TaskId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_url_appends_cache_buster() {
        let r = ArtifactRef::new("/api/v1/image/view/t1/version_1.png");
        assert_eq!(r.display_url(42), "/api/v1/image/view/t1/version_1.png?t=42");
        let q = ArtifactRef::new("/img?x=1");
        assert_eq!(q.display_url(7), "/img?x=1&t=7");
    }

    #[test]
    fn test_edit_request_wire_shape() {
        let req = EditRequest {
            task_id: TaskId::new("abc"),
            action: "resize".into(),
            params: serde_json::json!({"width": 100, "height": 50}),
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(
            v,
            serde_json::json!({
                "task_id": "abc",
                "action": "resize",
                "params": {"width": 100, "height": 50}
            })
        );
    }

    #[test]
    fn test_upload_response_parses_without_filename() {
        let r: UploadResponse =
            serde_json::from_str(r#"{"task_id":"t9","image_url":"/v/0.png"}"#).unwrap();
        assert_eq!(r.task_id.as_str(), "t9");
        assert_eq!(r.image_url.as_str(), "/v/0.png");
        assert!(r.filename.is_none());
    }

    #[tokio::test]
    async fn test_upload_file_from_path_uses_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cat.png");
        std::fs::write(&path, b"png-bytes").unwrap();
        let file = UploadFile::from_path(&path).await.unwrap();
        assert_eq!(file.file_name, "cat.png");
        assert_eq!(file.bytes, b"png-bytes");
    }
}
