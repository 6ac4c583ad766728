//! 编辑命令：把一次用户动作（种类 + 参数）绑定为可重放、可撤销的单元
//!
//! execute 委托 EditSession::apply_edit（重做时以原参数完整重放）；
//! undo 委托 EditSession::undo_last_edit，与本命令参数无关，总是让服务端回滚它自己的最后一步。
//! 命令不保存结果图片引用，历史是「待重放的动作序列」而非快照。

use uuid::Uuid;

use crate::api::ArtifactRef;
use crate::core::EditorError;
use crate::editor::action::EditAction;
use crate::editor::session::EditSession;

/// 一条用户编辑命令；id 用于栈内记账
#[derive(Debug, Clone, PartialEq)]
pub struct EditCommand {
    id: Uuid,
    action: EditAction,
}

impl EditCommand {
    pub fn new(action: EditAction) -> Self {
        Self {
            id: Uuid::new_v4(),
            action,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn action(&self) -> &EditAction {
        &self.action
    }

    pub async fn execute(&self, session: &mut EditSession) -> Result<ArtifactRef, EditorError> {
        session.apply_edit(&self.action).await
    }

    pub async fn undo(&self, session: &mut EditSession) -> Result<ArtifactRef, EditorError> {
        session.undo_last_edit().await
    }
}

impl From<EditAction> for EditCommand {
    fn from(action: EditAction) -> Self {
        Self::new(action)
    }
}
