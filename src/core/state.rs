//! 状态定义：UiState 投影
//!
//! 前端只持有轻量的 UiState（忙碌标记、当前图片、历史栈摘要、最近错误）；完整状态由编排器持有的 HistoryManager 维护并投影到 UiState。

use serde::Serialize;

use crate::core::EditorError;
use crate::editor::{HistoryManager, HistorySnapshot};

/// UI 看到的「投影」状态，轻量且易于渲染
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct UiState {
    /// 有往返未完成；前端据此禁用触发按钮
    pub busy: bool,
    pub task_id: Option<String>,
    /// 展示用 URL（可能带缓存破坏参数）
    pub image_url: Option<String>,
    /// 下载用 URL（原始 artifact 引用）
    pub download_url: Option<String>,
    pub history: HistorySnapshot,
    pub can_undo: bool,
    pub can_redo: bool,
    /// 已处理完的命令数
    pub completed_commands: u64,
    pub error_message: Option<String>,
    /// 服务端返回 error_id 时的诊断报告
    pub diagnostics_report: Option<String>,
}

impl UiState {
    /// 由历史管理器当前状态投影出 UiState
    pub fn project(
        history: &HistoryManager,
        busy: bool,
        completed_commands: u64,
        error: Option<&EditorError>,
        cache_bust: bool,
        now_millis: i64,
    ) -> Self {
        let session = history.session();
        let image_url = session.current_artifact().map(|a| {
            if cache_bust {
                a.display_url(now_millis)
            } else {
                a.as_str().to_string()
            }
        });
        Self {
            busy,
            task_id: session.task_id().map(|t| t.to_string()),
            image_url,
            download_url: session.download_url().map(str::to_string),
            history: history.snapshot(),
            can_undo: history.can_undo(),
            can_redo: history.can_redo(),
            completed_commands,
            error_message: error.map(|e| e.to_string()),
            diagnostics_report: error
                .and_then(EditorError::diagnostics)
                .map(|d| d.report("image-editor")),
        }
    }
}
