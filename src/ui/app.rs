//! REPL 主循环
//!
//! 逐行读取 stdin，解析为 EditorCommand 发送给编排器；同时打印状态消息，
//! 并在每条命令处理完后渲染一次 UiState。

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{broadcast, mpsc, watch};

use crate::core::{EditorCommand, UiState};
use crate::editor::StatusEvent;
use crate::ui::input::{parse_line, InputLine, HELP};
use crate::ui::render::{render_state, render_status};

/// 运行 REPL，直到 quit / EOF / 编排器退出
pub async fn run_repl(
    mut state_rx: watch::Receiver<UiState>,
    mut status_rx: broadcast::Receiver<StatusEvent>,
    cmd_tx: mpsc::UnboundedSender<EditorCommand>,
) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last_completed = state_rx.borrow().completed_commands;
    println!("{HELP}");

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_line(&line) {
                    Ok(InputLine::Empty) => {}
                    Ok(InputLine::Help) => println!("{HELP}"),
                    Ok(InputLine::Status) => println!("{}", render_state(&state_rx.borrow())),
                    Ok(InputLine::Quit) => break,
                    Ok(InputLine::Editor(cmd)) => {
                        if state_rx.borrow().busy {
                            println!("(queued)");
                        }
                        if cmd_tx.send(cmd).is_err() {
                            break;
                        }
                    }
                    Err(e) => println!("[!!] {e}"),
                }
            }
            event = status_rx.recv() => match event {
                Ok(event) => {
                    if let Some(text) = render_status(&event) {
                        println!("{text}");
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "status events lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = state_rx.borrow_and_update().clone();
                if !state.busy && state.completed_commands != last_completed {
                    last_completed = state.completed_commands;
                    println!("{}", render_state(&state));
                }
            }
        }
    }

    let _ = cmd_tx.send(EditorCommand::Quit);
    Ok(())
}
