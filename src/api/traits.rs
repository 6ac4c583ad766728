//! 图片编辑服务抽象
//!
//! 所有后端（HTTP / Mock）实现 ImageApi：upload、edit、undo，每个方法恰好一次服务端往返。

use async_trait::async_trait;

use crate::api::types::{EditRequest, EditResponse, TaskId, UploadFile, UploadResponse};
use crate::core::ApiError;

/// 图片编辑服务 trait
#[async_trait]
pub trait ImageApi: Send + Sync {
    /// 上传图片，创建新的服务端工作副本
    async fn upload(&self, file: UploadFile) -> Result<UploadResponse, ApiError>;

    /// 在服务端当前版本上应用一次编辑
    async fn edit(&self, request: &EditRequest) -> Result<EditResponse, ApiError>;

    /// 让服务端回滚它最后一次应用的编辑（与具体命令无关）
    async fn undo(&self, task_id: &TaskId) -> Result<EditResponse, ApiError>;
}
