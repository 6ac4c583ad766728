//! Mock 图片编辑服务（用于测试与离线演示，无需服务端）
//!
//! 模拟服务端的版本链：上传生成 version_0，每次 edit 追加一个版本，undo 删除最新版本；
//! 已在原图时 undo 返回 version_0（与真实服务端一致）。支持注入下一次 edit/undo/upload 失败。

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::api::types::{ArtifactRef, EditRequest, EditResponse, TaskId, UploadFile, UploadResponse};
use crate::api::ImageApi;
use crate::core::ApiError;

#[derive(Debug, Default)]
struct MockState {
    /// task_id -> 已应用的动作名（version_1..n）
    versions: HashMap<String, Vec<String>>,
    fail_next_upload: Option<ApiError>,
    fail_next_edit: Option<ApiError>,
    fail_next_undo: Option<ApiError>,
    /// 收到的全部 edit 请求（按顺序）
    edit_log: Vec<EditRequest>,
    undo_count: usize,
}

/// Mock 服务：内存中维护每个任务的版本链
#[derive(Debug, Default)]
pub struct MockImageApi {
    state: Mutex<MockState>,
    next_task: AtomicU64,
}

fn image_url(task_id: &str, version: usize) -> ArtifactRef {
    ArtifactRef::new(format!("/api/v1/image/view/{task_id}/version_{version}.png"))
}

fn not_found(task_id: &str) -> ApiError {
    ApiError::Http {
        status: 404,
        diagnostics: None,
        detail: Some(format!("Task not found: {task_id}")),
    }
}

impl MockImageApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn fail_next_upload(&self, err: ApiError) {
        self.lock().fail_next_upload = Some(err);
    }

    pub fn fail_next_edit(&self, err: ApiError) {
        self.lock().fail_next_edit = Some(err);
    }

    pub fn fail_next_undo(&self, err: ApiError) {
        self.lock().fail_next_undo = Some(err);
    }

    /// 服务端视角下该任务已应用的动作名（不含原图）
    pub fn applied_actions(&self, task_id: &TaskId) -> Vec<String> {
        self.lock()
            .versions
            .get(task_id.as_str())
            .cloned()
            .unwrap_or_default()
    }

    pub fn edit_log(&self) -> Vec<EditRequest> {
        self.lock().edit_log.clone()
    }

    pub fn undo_count(&self) -> usize {
        self.lock().undo_count
    }
}

#[async_trait]
impl ImageApi for MockImageApi {
    async fn upload(&self, file: UploadFile) -> Result<UploadResponse, ApiError> {
        let mut state = self.lock();
        if let Some(err) = state.fail_next_upload.take() {
            return Err(err);
        }
        let n = self.next_task.fetch_add(1, Ordering::Relaxed);
        let task_id = format!("mock-task-{n}");
        state.versions.insert(task_id.clone(), Vec::new());
        Ok(UploadResponse {
            image_url: image_url(&task_id, 0),
            task_id: TaskId::new(task_id),
            filename: Some(file.file_name),
        })
    }

    async fn edit(&self, request: &EditRequest) -> Result<EditResponse, ApiError> {
        let mut state = self.lock();
        state.edit_log.push(request.clone());
        if let Some(err) = state.fail_next_edit.take() {
            return Err(err);
        }
        let id = request.task_id.as_str();
        let versions = state.versions.get_mut(id).ok_or_else(|| not_found(id))?;
        if request.action == "reset" {
            versions.clear();
        } else {
            versions.push(request.action.clone());
        }
        Ok(EditResponse {
            image_url: image_url(id, versions.len()),
            task_id: Some(request.task_id.clone()),
        })
    }

    async fn undo(&self, task_id: &TaskId) -> Result<EditResponse, ApiError> {
        let mut state = self.lock();
        state.undo_count += 1;
        if let Some(err) = state.fail_next_undo.take() {
            return Err(err);
        }
        let id = task_id.as_str();
        let versions = state.versions.get_mut(id).ok_or_else(|| not_found(id))?;
        versions.pop();
        Ok(EditResponse {
            image_url: image_url(id, versions.len()),
            task_id: Some(task_id.clone()),
        })
    }
}
