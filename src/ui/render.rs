//! 状态渲染
//!
//! 把 UiState 与状态事件格式化为终端文本：当前图片、撤销/重做可用性、历史栈、错误与诊断报告。

use crate::core::UiState;
use crate::editor::{StatusEvent, StatusKind};

fn flag(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}

/// 状态消息前缀（对应 info / success / danger 三种提示样式）
pub fn render_status(event: &StatusEvent) -> Option<String> {
    match event {
        StatusEvent::Message { text, kind } => {
            let tag = match kind {
                StatusKind::Info => "[..]",
                StatusKind::Success => "[ok]",
                StatusKind::Error => "[!!]",
            };
            Some(format!("{tag} {text}"))
        }
        StatusEvent::HistoryChanged { .. } => None,
    }
}

/// 多行状态摘要
pub fn render_state(state: &UiState) -> String {
    let mut out = Vec::new();
    match (&state.task_id, &state.image_url) {
        (Some(task), Some(url)) => {
            out.push(format!("task:   {task}"));
            out.push(format!("image:  {url}"));
        }
        _ => out.push("no image loaded".to_string()),
    }
    if let Some(download) = &state.download_url {
        out.push(format!("save:   {download}"));
    }
    out.push(format!(
        "undo:   {} ({})   redo: {} ({})",
        flag(state.can_undo),
        state.history.undo.len(),
        flag(state.can_redo),
        state.history.redo.len()
    ));
    if !state.history.undo.is_empty() {
        out.push(format!("applied: {}", state.history.undo.join(" > ")));
    }
    if state.busy {
        out.push("working...".to_string());
    }
    if let Some(err) = &state.error_message {
        out.push(format!("error:  {err}"));
    }
    if let Some(report) = &state.diagnostics_report {
        out.push(report.clone());
    }
    out.join("\n")
}
