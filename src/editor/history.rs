//! 撤销/重做历史管理
//!
//! 唯一修改 undo_stack / redo_stack 的组件。历史是线性的：
//! - perform 成功才入 undo 栈，并清空 redo 栈；失败时两个栈都不变
//! - undo 弹出栈顶并请求服务端回滚，成功后移入 redo 栈；失败时放回 undo 栈
//! - redo 以原参数完整重放，成功后回到 undo 栈；失败时放回 redo 栈
//! - reset 成功后清空两个栈（服务端单槽撤销无法撤销一次 reset）
//! - 新上传清空会话与两个栈
//!
//! 方法均取 `&mut self`，同一会话的往返天然串行；跨任务共享时交给 core::orchestrator 排队。

use std::sync::Arc;

use serde::Serialize;

use crate::api::{ArtifactRef, TaskId, UploadFile};
use crate::core::EditorError;
use crate::editor::command::EditCommand;
use crate::editor::session::EditSession;
use crate::editor::status::StatusSink;

/// 历史栈的可序列化快照（供 UI 渲染）
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HistorySnapshot {
    /// 已应用的命令描述，最新在后
    pub undo: Vec<String>,
    /// 已撤销的命令描述，最近撤销在后
    pub redo: Vec<String>,
}

impl HistorySnapshot {
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }
}

/// 命令式历史栈，构建在 EditSession 之上
pub struct HistoryManager {
    session: EditSession,
    status: Arc<dyn StatusSink>,
    undo_stack: Vec<EditCommand>,
    redo_stack: Vec<EditCommand>,
}

impl HistoryManager {
    pub fn new(session: EditSession, status: Arc<dyn StatusSink>) -> Self {
        Self {
            session,
            status,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        }
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub fn undo_stack(&self) -> &[EditCommand] {
        &self.undo_stack
    }

    pub fn redo_stack(&self) -> &[EditCommand] {
        &self.redo_stack
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn snapshot(&self) -> HistorySnapshot {
        HistorySnapshot {
            undo: self.undo_stack.iter().map(|c| c.action().to_string()).collect(),
            redo: self.redo_stack.iter().map(|c| c.action().to_string()).collect(),
        }
    }

    fn notify(&self) {
        self.status
            .on_history_changed(self.can_undo(), self.can_redo());
    }

    fn clear_history(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// 上传新图片：会话与两个栈先全部清空，再以新会话重建；失败时保持无会话
    pub async fn upload(&mut self, file: UploadFile) -> Result<ArtifactRef, EditorError> {
        self.clear_history();
        let result = self.session.upload(file).await;
        self.notify();
        result
    }

    /// 以已有的服务端会话重建（如外部完成上传）；清空历史
    pub fn start_session(&mut self, task_id: TaskId, artifact: ArtifactRef) {
        self.session.reset(task_id, artifact);
        self.clear_history();
        self.notify();
    }

    /// 执行一条新命令
    pub async fn perform(&mut self, command: EditCommand) -> Result<ArtifactRef, EditorError> {
        let url = command.execute(&mut self.session).await?;
        if command.action().is_reset() {
            tracing::debug!("reset applied, clearing history");
            self.clear_history();
        } else {
            self.undo_stack.push(command);
            self.redo_stack.clear();
        }
        self.notify();
        Ok(url)
    }

    /// 撤销；undo 栈为空时为 no-op，返回 Ok(None)
    pub async fn undo(&mut self) -> Result<Option<ArtifactRef>, EditorError> {
        let Some(command) = self.undo_stack.pop() else {
            return Ok(None);
        };
        match command.undo(&mut self.session).await {
            Ok(url) => {
                self.redo_stack.push(command);
                self.notify();
                Ok(Some(url))
            }
            Err(e) => {
                tracing::debug!(command = %command.action(), "undo failed, command restored");
                self.undo_stack.push(command);
                Err(e)
            }
        }
    }

    /// 重做；redo 栈为空时为 no-op，返回 Ok(None)
    pub async fn redo(&mut self) -> Result<Option<ArtifactRef>, EditorError> {
        let Some(command) = self.redo_stack.pop() else {
            return Ok(None);
        };
        match command.execute(&mut self.session).await {
            Ok(url) => {
                self.undo_stack.push(command);
                self.notify();
                Ok(Some(url))
            }
            Err(e) => {
                tracing::debug!(command = %command.action(), "redo failed, command restored");
                self.redo_stack.push(command);
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for HistoryManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryManager")
            .field("session", &self.session)
            .field("undo_stack", &self.undo_stack)
            .field("redo_stack", &self.redo_stack)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockImageApi;
    use crate::core::ApiError;
    use crate::editor::action::{ActionKind, CropRect, DisplayRect, EditAction, ImageGeometry};
    use crate::editor::status::{RecordingStatusSink, StatusEvent};

    struct Fixture {
        history: HistoryManager,
        api: Arc<MockImageApi>,
        sink: Arc<RecordingStatusSink>,
    }

    fn fixture() -> Fixture {
        let api = Arc::new(MockImageApi::new());
        let sink = Arc::new(RecordingStatusSink::new());
        let session = EditSession::new(api.clone(), sink.clone());
        Fixture {
            history: HistoryManager::new(session, sink.clone()),
            api,
            sink,
        }
    }

    async fn uploaded() -> Fixture {
        let mut f = fixture();
        f.history
            .upload(UploadFile::new("photo.png", vec![1, 2, 3]))
            .await
            .expect("upload");
        f
    }

    fn kinds(stack: &[EditCommand]) -> Vec<ActionKind> {
        stack.iter().map(|c| c.action().kind()).collect()
    }

    fn transport() -> ApiError {
        ApiError::Transport("connection refused".into())
    }

    #[tokio::test]
    async fn test_successful_performs_fill_undo_stack() {
        let mut f = uploaded().await;
        let actions = [
            EditAction::Grayscale,
            EditAction::Rotate90Right,
            EditAction::Rotate90Right,
            EditAction::contrast(1.2).unwrap(),
        ];
        for a in actions {
            f.history.perform(EditCommand::new(a)).await.unwrap();
        }
        assert_eq!(f.history.undo_stack().len(), 4);
        assert!(f.history.redo_stack().is_empty());
    }

    #[tokio::test]
    async fn test_grayscale_resize_undo_then_sepia_discards_resize() {
        let mut f = uploaded().await;

        f.history.perform(EditAction::Grayscale.into()).await.unwrap();
        assert_eq!(kinds(f.history.undo_stack()), vec![ActionKind::Grayscale]);
        assert!(f.history.redo_stack().is_empty());

        f.history
            .perform(EditAction::resize(100, 50).unwrap().into())
            .await
            .unwrap();
        assert_eq!(
            kinds(f.history.undo_stack()),
            vec![ActionKind::Grayscale, ActionKind::Resize]
        );
        assert!(f.history.redo_stack().is_empty());

        let url = f.history.undo().await.unwrap();
        assert!(url.is_some());
        assert_eq!(kinds(f.history.undo_stack()), vec![ActionKind::Grayscale]);
        assert_eq!(kinds(f.history.redo_stack()), vec![ActionKind::Resize]);

        f.history.perform(EditAction::Sepia.into()).await.unwrap();
        assert_eq!(
            kinds(f.history.undo_stack()),
            vec![ActionKind::Grayscale, ActionKind::Sepia]
        );
        assert!(f.history.redo_stack().is_empty());

        let task = f.history.session().task_id().unwrap().clone();
        assert_eq!(f.api.applied_actions(&task), vec!["grayscale", "sepia"]);
    }

    #[tokio::test]
    async fn test_new_perform_clears_multiple_redo_entries() {
        let mut f = uploaded().await;
        for a in [EditAction::Grayscale, EditAction::Invert, EditAction::FlipVertical] {
            f.history.perform(a.into()).await.unwrap();
        }
        f.history.undo().await.unwrap();
        f.history.undo().await.unwrap();
        assert_eq!(f.history.redo_stack().len(), 2);

        f.history.perform(EditAction::Sepia.into()).await.unwrap();
        assert!(f.history.redo_stack().is_empty());
        assert_eq!(f.history.undo_stack().len(), 2);
    }

    #[tokio::test]
    async fn test_undo_and_redo_on_empty_stacks_are_noops() {
        let mut f = uploaded().await;
        let before = f.history.session().current_artifact().cloned();

        assert_eq!(f.history.undo().await.unwrap(), None);
        assert_eq!(f.history.redo().await.unwrap(), None);
        assert_eq!(f.api.undo_count(), 0);
        assert!(f.api.edit_log().is_empty());
        assert_eq!(f.history.session().current_artifact().cloned(), before);
        assert!(!f.history.can_undo());
        assert!(!f.history.can_redo());
    }

    #[tokio::test]
    async fn test_failed_perform_leaves_stacks_untouched() {
        let mut f = uploaded().await;
        f.history.perform(EditAction::Grayscale.into()).await.unwrap();
        f.history.perform(EditAction::Invert.into()).await.unwrap();
        f.history.undo().await.unwrap();
        let snapshot = f.history.snapshot();

        f.api.fail_next_edit(transport());
        let err = f.history.perform(EditAction::Sepia.into()).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(f.history.snapshot(), snapshot);
        assert_eq!(f.sink.last_message().unwrap().1, crate::editor::StatusKind::Error);
    }

    #[tokio::test]
    async fn test_failed_undo_restores_command() {
        let mut f = uploaded().await;
        f.history.perform(EditAction::Grayscale.into()).await.unwrap();
        let id = f.history.undo_stack()[0].id();

        f.api.fail_next_undo(ApiError::Http {
            status: 400,
            diagnostics: None,
            detail: Some("nothing to undo".into()),
        });
        let err = f.history.undo().await.unwrap_err();
        assert!(matches!(err, EditorError::UndoFailed(_)));
        assert_eq!(f.history.undo_stack().len(), 1);
        assert_eq!(f.history.undo_stack()[0].id(), id);
        assert!(f.history.redo_stack().is_empty());

        // 恢复后可再次撤销
        assert!(f.history.undo().await.unwrap().is_some());
        assert_eq!(f.history.redo_stack()[0].id(), id);
    }

    #[tokio::test]
    async fn test_redo_replays_original_params() {
        let mut f = uploaded().await;
        let crop = CropRect::from_display(
            DisplayRect { x: 10.0, y: 20.0, width: 100.0, height: 50.0 },
            &ImageGeometry {
                natural_width: 800,
                natural_height: 600,
                display_width: 400.0,
                display_height: 300.0,
            },
        )
        .unwrap();
        f.history.perform(EditAction::crop(crop).into()).await.unwrap();
        f.history.undo().await.unwrap();
        let url = f.history.redo().await.unwrap().expect("redo applied");

        let log = f.api.edit_log();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0], log[1]);
        assert_eq!(
            log[1].params,
            serde_json::json!({"left": 20, "top": 40, "right": 220, "bottom": 140})
        );
        assert_eq!(kinds(f.history.undo_stack()), vec![ActionKind::Crop]);
        assert!(f.history.redo_stack().is_empty());
        assert_eq!(f.history.session().current_artifact(), Some(&url));
    }

    #[tokio::test]
    async fn test_failed_redo_restores_command() {
        let mut f = uploaded().await;
        f.history.perform(EditAction::Grayscale.into()).await.unwrap();
        f.history.undo().await.unwrap();

        f.api.fail_next_edit(transport());
        assert!(f.history.redo().await.is_err());
        assert_eq!(f.history.redo_stack().len(), 1);
        assert!(f.history.undo_stack().is_empty());
    }

    #[tokio::test]
    async fn test_reset_clears_history_on_success_only() {
        let mut f = uploaded().await;
        f.history.perform(EditAction::Grayscale.into()).await.unwrap();
        f.history.perform(EditAction::Invert.into()).await.unwrap();
        f.history.undo().await.unwrap();

        f.api.fail_next_edit(transport());
        assert!(f.history.perform(EditAction::Reset.into()).await.is_err());
        assert_eq!(f.history.undo_stack().len(), 1);
        assert_eq!(f.history.redo_stack().len(), 1);

        let url = f.history.perform(EditAction::Reset.into()).await.unwrap();
        assert!(url.as_str().ends_with("version_0.png"));
        assert!(f.history.undo_stack().is_empty());
        assert!(f.history.redo_stack().is_empty());
    }

    #[tokio::test]
    async fn test_new_upload_resets_session_and_history() {
        let mut f = uploaded().await;
        let old_task = f.history.session().task_id().unwrap().clone();
        f.history.perform(EditAction::Grayscale.into()).await.unwrap();
        f.history.perform(EditAction::Sepia.into()).await.unwrap();
        f.history.undo().await.unwrap();

        let url = f
            .history
            .upload(UploadFile::new("second.png", vec![9]))
            .await
            .unwrap();
        let new_task = f.history.session().task_id().unwrap().clone();
        assert_ne!(old_task, new_task);
        assert!(f.history.undo_stack().is_empty());
        assert!(f.history.redo_stack().is_empty());
        assert_eq!(f.history.session().current_artifact(), Some(&url));
        assert!(url.as_str().contains(new_task.as_str()));
    }

    #[tokio::test]
    async fn test_failed_upload_still_clears_history() {
        let mut f = uploaded().await;
        f.history.perform(EditAction::Grayscale.into()).await.unwrap();
        f.api.fail_next_upload(transport());
        assert!(f.history.upload(UploadFile::new("x.png", vec![])).await.is_err());
        assert!(f.history.undo_stack().is_empty());
        assert!(!f.history.session().is_active());

        let err = f.history.perform(EditAction::Sepia.into()).await.unwrap_err();
        assert_eq!(err, EditorError::NoActiveSession);
        assert!(f.history.undo_stack().is_empty());
    }

    #[tokio::test]
    async fn test_history_notifications_follow_stack_state() {
        let mut f = uploaded().await;
        f.history.perform(EditAction::Grayscale.into()).await.unwrap();
        f.history.undo().await.unwrap();

        let changes: Vec<(bool, bool)> = f
            .sink
            .events()
            .into_iter()
            .filter_map(|e| match e {
                StatusEvent::HistoryChanged { can_undo, can_redo } => Some((can_undo, can_redo)),
                _ => None,
            })
            .collect();
        assert_eq!(changes, vec![(false, false), (true, false), (false, true)]);
    }

    #[tokio::test]
    async fn test_start_session_adopts_external_upload() {
        let mut f = fixture();
        f.history
            .start_session(TaskId::new("external"), ArtifactRef::new("/v/0.png"));
        assert!(f.history.session().is_active());
        assert_eq!(f.history.snapshot(), HistorySnapshot::default());
    }
}
