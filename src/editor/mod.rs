//! 图片编辑核心：动作、会话、命令、撤销/重做历史、状态输出

pub mod action;
pub mod command;
pub mod history;
pub mod session;
pub mod status;

pub use action::{
    ActionKind, AspectRatio, CropRect, DisplayRect, EditAction, ImageGeometry, SliderSpec,
};
pub use command::EditCommand;
pub use history::{HistoryManager, HistorySnapshot};
pub use session::EditSession;
pub use status::{
    ChannelStatusSink, RecordingStatusSink, StatusEvent, StatusKind, StatusSink,
    TracingStatusSink,
};
