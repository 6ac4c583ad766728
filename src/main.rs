//! NexusKit - 多工具面板终端客户端
//!
//! 入口：初始化日志、解析命令行、加载配置。无子命令（或 `edit`）时运行图片编辑 REPL；
//! `format` / `convert` / `ytdl` / `pdf` 子命令各执行一次对应工具后退出。

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use nexuskit::api::{HttpClient, HttpImageApi, ImageApi, MockImageApi};
use nexuskit::cli::{Cli, ToolCommand};
use nexuskit::config::{load_config, AppConfig};
use nexuskit::core::create_editor;
use nexuskit::observability;
use nexuskit::services::{
    ConvertOptions, FormatterClient, MediaClient, PdfClient, ProgressEvent, ProgressWatcher,
    YtdlClient,
};
use nexuskit::ui::run_repl;
use nexuskit::ui::tools::{self, PdfEdits};
use tokio_util::sync::CancellationToken;

async fn run_editor(cfg: &AppConfig, offline: bool) -> anyhow::Result<()> {
    let api: Arc<dyn ImageApi> = if offline {
        tracing::info!("Offline mode, using in-memory image server");
        Arc::new(MockImageApi::new())
    } else {
        tracing::info!(base_url = %cfg.server.base_url, "Using image server");
        Arc::new(HttpImageApi::new(HttpClient::from_config(cfg)))
    };

    // 创建编辑器：返回命令发送端、状态接收端、状态消息接收端与后台任务句柄
    let (cmd_tx, state_rx, status_rx, editor) = create_editor(api, cfg);

    // run_repl 退出时发送 Quit；等待已排队的命令执行完
    run_repl(state_rx, status_rx, cmd_tx)
        .await
        .context("REPL run failed")?;
    editor.await.context("Editor task failed")?;
    Ok(())
}

/// Ctrl-C 时取消进度监听
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            child.cancel();
        }
    });
    token
}

fn print_progress(event: &ProgressEvent) {
    println!("  {}", event.summary());
}

async fn run(cfg: &AppConfig, offline: bool, command: ToolCommand) -> anyhow::Result<()> {
    let http = HttpClient::from_config(cfg);
    let watcher = ProgressWatcher::from_config(http.clone(), cfg);

    match command {
        ToolCommand::Edit => return run_editor(cfg, offline).await,
        ToolCommand::Format { file, format_type } => {
            let client = FormatterClient::new(http);
            let text = tools::run_format(&client, &file, format_type).await?;
            println!("{text}");
        }
        ToolCommand::Convert {
            file,
            to,
            extract_audio,
            resolution,
            quality,
            bitrate,
        } => {
            let client = MediaClient::new(http, watcher);
            let options = ConvertOptions {
                extract_audio,
                resolution,
                quality,
                bitrate,
                ..ConvertOptions::new(to)
            };
            let url =
                tools::run_convert(&client, &file, &options, cancel_on_ctrl_c(), print_progress)
                    .await?;
            println!("Download: {url}");
        }
        ToolCommand::Ytdl {
            url,
            info,
            format_id,
            audio,
        } => {
            let client = YtdlClient::new(http, watcher);
            if info {
                let info = client.fetch_info(&url).await?;
                println!("{}", tools::render_video_info(&info));
            } else {
                let link = tools::run_ytdl(
                    &client,
                    &url,
                    format_id.as_deref(),
                    audio.as_deref(),
                    cancel_on_ctrl_c(),
                    print_progress,
                )
                .await?;
                println!("Download: {link}");
            }
        }
        ToolCommand::Pdf {
            file,
            add_blank,
            delete,
            reorder,
            out,
        } => {
            let client = PdfClient::new(http);
            let out: PathBuf = out.unwrap_or_else(|| tools::default_pdf_output(&file));
            let edits = PdfEdits {
                add_blank,
                delete,
                reorder,
            };
            let doc = tools::run_pdf(&client, &file, &edits, &out).await?;
            println!("Saved {} ({} pages)", out.display(), doc.num_pages);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 日志：默认 info，可通过 RUST_LOG 覆盖
    observability::init();

    let cli = Cli::parse();
    let cfg = load_config(cli.config).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        AppConfig::default()
    });

    let command = cli.command.unwrap_or(ToolCommand::Edit);
    run(&cfg, cli.offline, command).await
}
