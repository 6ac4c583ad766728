//! 终端界面：REPL 主循环（app）、输入解析（input）、状态渲染（render）、一次性工具子命令（tools）

pub mod app;
pub mod input;
pub mod render;
pub mod tools;

pub use app::run_repl;
pub use input::{parse_line, InputLine};
pub use render::{render_state, render_status};
