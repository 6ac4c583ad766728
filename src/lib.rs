//! NexusKit - 多工具面板的客户端控制层
//!
//! 模块划分：
//! - **cli**: clap 命令行参数与工具子命令
//! - **api**: 服务端接口抽象与实现（reqwest HTTP / 内存 Mock）
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误与诊断、UI 状态投影、编辑器编排
//! - **editor**: 图片编辑会话、命令与撤销/重做历史
//! - **observability**: tracing 初始化
//! - **services**: PDF / 媒体转换 / 视频下载 / 格式化客户端与 SSE 进度监听
//! - **ui**: 终端 REPL

pub mod api;
pub mod cli;
pub mod config;
pub mod core;
pub mod editor;
pub mod observability;
pub mod services;
pub mod ui;
