//! 编辑器编排器：主控循环
//!
//! 负责：建立 cmd/state/status 三通道，在后台任务中独占 HistoryManager，
//! 逐条消费前端命令（Upload/Apply/Undo/Redo/Quit）。同一时刻只有一个往返在途，
//! 其间 UiState.busy 为 true；期间到达的命令排队，按到达顺序执行。

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;

use crate::api::{ImageApi, UploadFile};
use crate::config::AppConfig;
use crate::core::{EditorError, UiState};
use crate::editor::{ChannelStatusSink, EditAction, EditCommand, EditSession, HistoryManager, StatusEvent};

/// 从前端发往编排器的用户命令
#[derive(Debug, Clone, PartialEq)]
pub enum EditorCommand {
    /// 上传本地图片，开启新会话
    Upload(PathBuf),
    /// 执行一次编辑
    Apply(EditAction),
    Undo,
    Redo,
    /// 退出后台任务
    Quit,
}

async fn run_command(history: &mut HistoryManager, cmd: EditorCommand) -> Result<(), EditorError> {
    match cmd {
        EditorCommand::Upload(path) => {
            let file = UploadFile::from_path(&path).await?;
            history.upload(file).await?;
        }
        EditorCommand::Apply(action) => {
            history.perform(EditCommand::new(action)).await?;
        }
        EditorCommand::Undo => {
            history.undo().await?;
        }
        EditorCommand::Redo => {
            history.redo().await?;
        }
        EditorCommand::Quit => {}
    }
    Ok(())
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// 在后台任务中运行已构建好的 HistoryManager；返回命令发送端、状态接收端与任务句柄
pub fn spawn_editor(
    mut history: HistoryManager,
    cache_bust: bool,
) -> (
    mpsc::UnboundedSender<EditorCommand>,
    watch::Receiver<UiState>,
    JoinHandle<()>,
) {
    let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel::<EditorCommand>();
    let (state_tx, state_rx) = watch::channel(UiState::project(
        &history,
        false,
        0,
        None,
        cache_bust,
        now_millis(),
    ));

    let handle = tokio::spawn(async move {
        let mut completed: u64 = 0;
        while let Some(cmd) = cmd_rx.recv().await {
            if cmd == EditorCommand::Quit {
                tracing::info!("editor shutting down");
                break;
            }

            let _ = state_tx.send(UiState::project(
                &history,
                true,
                completed,
                None,
                cache_bust,
                now_millis(),
            ));

            let result = run_command(&mut history, cmd).await;
            completed += 1;
            let error = result.err();
            if let Some(ref e) = error {
                tracing::warn!(error = %e, retryable = e.is_retryable(), "editor command failed");
            }

            let _ = state_tx.send(UiState::project(
                &history,
                false,
                completed,
                error.as_ref(),
                cache_bust,
                now_millis(),
            ));
        }
    });

    (cmd_tx, state_rx, handle)
}

/// 创建编辑器运行时：状态消息经 broadcast 推给前端。
/// 发送 Quit 后 await 返回的句柄，排在 Quit 之前的命令会先执行完。
pub fn create_editor(
    api: Arc<dyn ImageApi>,
    cfg: &AppConfig,
) -> (
    mpsc::UnboundedSender<EditorCommand>,
    watch::Receiver<UiState>,
    broadcast::Receiver<StatusEvent>,
    JoinHandle<()>,
) {
    let (status_tx, status_rx) = broadcast::channel::<StatusEvent>(64);
    let sink = Arc::new(ChannelStatusSink::new(status_tx));
    let session = EditSession::new(api, sink.clone());
    let history = HistoryManager::new(session, sink);
    let (cmd_tx, state_rx, handle) = spawn_editor(history, cfg.editor.cache_bust);
    (cmd_tx, state_rx, status_rx, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockImageApi;
    use crate::editor::ActionKind;

    #[tokio::test]
    async fn test_apply_without_session_reports_error() {
        let api = Arc::new(MockImageApi::new());
        let (tx, mut state_rx, _status, _task) = create_editor(api.clone(), &AppConfig::default());

        tx.send(EditorCommand::Apply(EditAction::simple(ActionKind::Grayscale).unwrap()))
            .unwrap();
        let state = state_rx
            .wait_for(|s| s.completed_commands == 1 && !s.busy)
            .await
            .unwrap()
            .clone();
        assert_eq!(state.error_message.as_deref(), Some("Please upload an image first."));
        assert!(api.edit_log().is_empty());
    }

    #[tokio::test]
    async fn test_quit_stops_task() {
        let status = Arc::new(crate::editor::RecordingStatusSink::new());
        let session = EditSession::new(Arc::new(MockImageApi::new()), status.clone());
        let (tx, _state, handle) = spawn_editor(HistoryManager::new(session, status), false);
        tx.send(EditorCommand::Quit).unwrap();
        handle.await.unwrap();
        assert!(tx.send(EditorCommand::Undo).is_err());
    }

    #[tokio::test]
    async fn test_join_after_quit_drains_queued_commands() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("cat.png");
        std::fs::write(&image, b"png").unwrap();

        let api = Arc::new(MockImageApi::new());
        let (tx, state_rx, _status, handle) = create_editor(api.clone(), &AppConfig::default());
        tx.send(EditorCommand::Upload(image)).unwrap();
        tx.send(EditorCommand::Apply(EditAction::simple(ActionKind::Sepia).unwrap()))
            .unwrap();
        tx.send(EditorCommand::Quit).unwrap();

        tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .expect("editor task did not stop")
            .unwrap();
        let state = state_rx.borrow().clone();
        assert_eq!(state.completed_commands, 2);
        assert!(!state.busy);
        assert_eq!(state.history.undo, vec!["sepia"]);
        assert_eq!(api.edit_log().len(), 1);
    }
}
