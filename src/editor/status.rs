//! 状态输出接口：会话与历史管理器通过 StatusSink 报告进度，不直接写 UI
//!
//! 实现：TracingStatusSink（写日志）、ChannelStatusSink（broadcast 给前端）、RecordingStatusSink（测试用记录）。

use std::sync::Mutex;

use serde::Serialize;
use tokio::sync::broadcast;

/// 状态消息级别（对应 info / success / danger 三种提示）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

/// 一条状态消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StatusEvent {
    Message { text: String, kind: StatusKind },
    /// 撤销/重做按钮可用性变化
    HistoryChanged { can_undo: bool, can_redo: bool },
}

/// 状态输出 trait
pub trait StatusSink: Send + Sync {
    fn on_status(&self, message: &str, kind: StatusKind);

    /// 历史栈变化后通知 UI 更新按钮状态；默认忽略
    fn on_history_changed(&self, _can_undo: bool, _can_redo: bool) {}
}

/// 写入 tracing 日志
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingStatusSink;

impl StatusSink for TracingStatusSink {
    fn on_status(&self, message: &str, kind: StatusKind) {
        match kind {
            StatusKind::Error => tracing::warn!(status = ?kind, "{message}"),
            _ => tracing::info!(status = ?kind, "{message}"),
        }
    }
}

/// 通过 broadcast 通道转发给前端；无订阅者时静默丢弃
#[derive(Debug, Clone)]
pub struct ChannelStatusSink {
    tx: broadcast::Sender<StatusEvent>,
}

impl ChannelStatusSink {
    pub fn new(tx: broadcast::Sender<StatusEvent>) -> Self {
        Self { tx }
    }
}

impl StatusSink for ChannelStatusSink {
    fn on_status(&self, message: &str, kind: StatusKind) {
        let _ = self.tx.send(StatusEvent::Message {
            text: message.to_string(),
            kind,
        });
    }

    fn on_history_changed(&self, can_undo: bool, can_redo: bool) {
        let _ = self.tx.send(StatusEvent::HistoryChanged { can_undo, can_redo });
    }
}

/// 记录全部事件（测试与调试）
#[derive(Debug, Default)]
pub struct RecordingStatusSink {
    events: Mutex<Vec<StatusEvent>>,
}

impl RecordingStatusSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<StatusEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// 最近一条文本消息
    pub fn last_message(&self) -> Option<(String, StatusKind)> {
        self.events().into_iter().rev().find_map(|e| match e {
            StatusEvent::Message { text, kind } => Some((text, kind)),
            StatusEvent::HistoryChanged { .. } => None,
        })
    }

    fn push(&self, event: StatusEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl StatusSink for RecordingStatusSink {
    fn on_status(&self, message: &str, kind: StatusKind) {
        self.push(StatusEvent::Message {
            text: message.to_string(),
            kind,
        });
    }

    fn on_history_changed(&self, can_undo: bool, can_redo: bool) {
        self.push(StatusEvent::HistoryChanged { can_undo, can_redo });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_sink_forwards_events() {
        let (tx, mut rx) = broadcast::channel(8);
        let sink = ChannelStatusSink::new(tx);
        sink.on_status("Uploading image...", StatusKind::Info);
        sink.on_history_changed(true, false);

        assert_eq!(
            rx.try_recv().unwrap(),
            StatusEvent::Message {
                text: "Uploading image...".into(),
                kind: StatusKind::Info
            }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            StatusEvent::HistoryChanged { can_undo: true, can_redo: false }
        );
    }

    #[test]
    fn test_channel_sink_without_subscribers_is_silent() {
        let (tx, rx) = broadcast::channel::<StatusEvent>(1);
        drop(rx);
        ChannelStatusSink::new(tx).on_status("nobody listening", StatusKind::Error);
    }

    #[test]
    fn test_status_event_json_shape() {
        let e = StatusEvent::Message { text: "ok".into(), kind: StatusKind::Success };
        assert_eq!(
            serde_json::to_value(&e).unwrap(),
            serde_json::json!({"type": "message", "text": "ok", "kind": "success"})
        );
    }
}
