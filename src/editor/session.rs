//! 编辑会话：服务端当前持有哪张图片状态的唯一来源
//!
//! 只有 EditSession 会发起改变服务端状态的请求。apply_edit / undo_last_edit 各恰好一次往返，
//! 成功后更新 current_artifact；失败时状态不变。撤销是服务端操作，客户端不在本地重算上一张图。

use std::sync::Arc;
use std::time::Instant;

use crate::api::{ArtifactRef, EditRequest, ImageApi, TaskId, UploadFile};
use crate::core::EditorError;
use crate::editor::action::EditAction;
use crate::editor::status::{StatusKind, StatusSink};

/// 一次上传对应一个会话；task_id 为 None 表示尚无活动会话
pub struct EditSession {
    api: Arc<dyn ImageApi>,
    status: Arc<dyn StatusSink>,
    task_id: Option<TaskId>,
    current: Option<ArtifactRef>,
}

impl EditSession {
    pub fn new(api: Arc<dyn ImageApi>, status: Arc<dyn StatusSink>) -> Self {
        Self {
            api,
            status,
            task_id: None,
            current: None,
        }
    }

    pub fn task_id(&self) -> Option<&TaskId> {
        self.task_id.as_ref()
    }

    pub fn current_artifact(&self) -> Option<&ArtifactRef> {
        self.current.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.task_id.is_some()
    }

    /// 下载当前图片用的 URL（即最新渲染结果）
    pub fn download_url(&self) -> Option<&str> {
        self.current.as_ref().map(ArtifactRef::as_str)
    }

    /// 新上传或显式重置后重新初始化会话身份；总是成功
    pub fn reset(&mut self, task_id: TaskId, artifact: ArtifactRef) {
        self.task_id = Some(task_id);
        self.current = Some(artifact);
    }

    /// 丢弃会话（新上传开始时）
    pub fn clear(&mut self) {
        self.task_id = None;
        self.current = None;
    }

    fn require_task(&self) -> Result<TaskId, EditorError> {
        match &self.task_id {
            Some(id) => Ok(id.clone()),
            None => {
                self.status
                    .on_status(&EditorError::NoActiveSession.to_string(), StatusKind::Error);
                Err(EditorError::NoActiveSession)
            }
        }
    }

    /// 上传新图片：先清空旧会话，成功后以服务端返回的 task_id / image_url 重建
    pub async fn upload(&mut self, file: UploadFile) -> Result<ArtifactRef, EditorError> {
        self.clear();
        self.status.on_status("Uploading image...", StatusKind::Info);
        let file_name = file.file_name.clone();
        let start = Instant::now();
        match self.api.upload(file).await {
            Ok(resp) => {
                tracing::info!(
                    task_id = %resp.task_id,
                    file = %file_name,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "image uploaded"
                );
                self.reset(resp.task_id, resp.image_url.clone());
                self.status.on_status("Image uploaded.", StatusKind::Success);
                Ok(resp.image_url)
            }
            Err(e) => {
                let err = EditorError::UploadFailed(e);
                tracing::warn!(file = %file_name, error = %err, "image upload failed");
                self.status.on_status(&err.to_string(), StatusKind::Error);
                Err(err)
            }
        }
    }

    /// 在服务端当前图片上应用一次编辑
    pub async fn apply_edit(&mut self, action: &EditAction) -> Result<ArtifactRef, EditorError> {
        let task_id = self.require_task()?;
        let kind = action.kind();
        self.status
            .on_status(&format!("Applying {kind}..."), StatusKind::Info);

        let request = EditRequest {
            task_id: task_id.clone(),
            action: kind.as_str().to_string(),
            params: action.params(),
        };
        let start = Instant::now();
        let result = self.api.edit(&request).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(resp) => {
                tracing::info!(task_id = %task_id, action = %kind, outcome = "ok", duration_ms, "edit applied");
                self.current = Some(resp.image_url.clone());
                self.status
                    .on_status("Edit applied successfully.", StatusKind::Success);
                Ok(resp.image_url)
            }
            Err(e) => {
                let err = EditorError::EditFailed(e);
                tracing::warn!(task_id = %task_id, action = %kind, outcome = "error", duration_ms, error = %err, "edit failed");
                self.status.on_status(&err.to_string(), StatusKind::Error);
                Err(err)
            }
        }
    }

    /// 请求服务端回滚最后一次编辑；以服务端返回的 image_url 为准
    pub async fn undo_last_edit(&mut self) -> Result<ArtifactRef, EditorError> {
        let task_id = self.require_task()?;
        self.status.on_status("Undoing last edit...", StatusKind::Info);

        let start = Instant::now();
        let result = self.api.undo(&task_id).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(resp) => {
                tracing::info!(task_id = %task_id, outcome = "ok", duration_ms, "undo applied");
                self.current = Some(resp.image_url.clone());
                self.status.on_status("Undo successful.", StatusKind::Success);
                Ok(resp.image_url)
            }
            Err(e) => {
                let err = EditorError::UndoFailed(e);
                tracing::warn!(task_id = %task_id, outcome = "error", duration_ms, error = %err, "undo failed");
                self.status.on_status(&err.to_string(), StatusKind::Error);
                Err(err)
            }
        }
    }
}

impl std::fmt::Debug for EditSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditSession")
            .field("task_id", &self.task_id)
            .field("current", &self.current)
            .finish()
    }
}
