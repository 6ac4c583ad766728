//! 核心层：错误与诊断、状态投影、编辑器主控循环

pub mod error;
pub mod orchestrator;
pub mod state;

pub use error::{ApiError, EditorError, ErrorDiagnostics, ServiceError};
pub use orchestrator::{create_editor, spawn_editor, EditorCommand};
pub use state::UiState;
