//! 输入解析
//!
//! 把 REPL 的一行文本转为 EditorCommand 或本地指令（help / status / quit）。
//! 参数在此处就按 EditAction 的规则校验，非法输入不会进入命令队列。

use std::path::PathBuf;

use crate::core::{EditorCommand, EditorError};
use crate::editor::{ActionKind, AspectRatio, CropRect, DisplayRect, EditAction, ImageGeometry};

/// 一行输入的解析结果
#[derive(Debug, Clone, PartialEq)]
pub enum InputLine {
    Empty,
    Help,
    /// 打印当前状态
    Status,
    Quit,
    Editor(EditorCommand),
}

pub const HELP: &str = "\
commands:
  upload <path>                        upload an image and start a new session
  <action>                             grayscale, sepia, invert, rotate_90_left, rotate_90_right,
                                       rotate_180, flip_horizontal, flip_vertical,
                                       remove_white_background, remove_black_background, reset
  brightness <0-200> | contrast <0-200> slider value, 100 = unchanged
  blur <0-10>                          blur radius
  crop <left> <top> <right> <bottom>   crop in source pixels
  crop-view <x> <y> <w> <h> <view_w> <view_h> <natural_w> <natural_h>
                                       crop a box drawn on a scaled preview
  resize <w> <h>                       resize to exact size
  resize <w> keep <natural_w> <natural_h>
                                       resize keeping the aspect ratio
  undo | redo | status | help | quit
other tools run as subcommands: nexuskit format | convert | ytdl | pdf --help";

fn arg<T: std::str::FromStr>(args: &[&str], index: usize, name: &str) -> Result<T, EditorError> {
    let raw = args
        .get(index)
        .ok_or_else(|| EditorError::invalid(format!("missing {name}")))?;
    raw.parse()
        .map_err(|_| EditorError::invalid(format!("invalid {name}: {raw}")))
}

fn expect_args(args: &[&str], count: usize, usage: &str) -> Result<(), EditorError> {
    if args.len() != count {
        return Err(EditorError::invalid(format!("usage: {usage}")));
    }
    Ok(())
}

fn parse_action(kind: ActionKind, args: &[&str]) -> Result<EditAction, EditorError> {
    match kind {
        ActionKind::Brightness | ActionKind::Contrast | ActionKind::Blur => {
            expect_args(args, 1, &format!("{kind} <value>"))?;
            EditAction::from_slider(kind, arg(args, 0, "value")?)
        }
        ActionKind::Crop => {
            expect_args(args, 4, "crop <left> <top> <right> <bottom>")?;
            Ok(EditAction::crop(CropRect::new(
                arg(args, 0, "left")?,
                arg(args, 1, "top")?,
                arg(args, 2, "right")?,
                arg(args, 3, "bottom")?,
            )?))
        }
        ActionKind::Resize => parse_resize(args),
        _ => {
            expect_args(args, 0, kind.as_str())?;
            EditAction::simple(kind)
        }
    }
}

fn parse_resize(args: &[&str]) -> Result<EditAction, EditorError> {
    match args {
        [_, _] => EditAction::resize(arg(args, 0, "width")?, arg(args, 1, "height")?),
        [_, "keep", _, _] => {
            let width: u32 = arg(args, 0, "width")?;
            let ratio = AspectRatio::from_natural(
                arg(args, 2, "natural width")?,
                arg(args, 3, "natural height")?,
            )
            .ok_or_else(|| EditorError::invalid("natural size must be non-zero"))?;
            EditAction::resize(width, ratio.height_for_width(width))
        }
        _ => Err(EditorError::invalid(
            "usage: resize <w> <h> | resize <w> keep <natural_w> <natural_h>",
        )),
    }
}

fn parse_crop_view(args: &[&str]) -> Result<EditAction, EditorError> {
    expect_args(
        args,
        8,
        "crop-view <x> <y> <w> <h> <view_w> <view_h> <natural_w> <natural_h>",
    )?;
    let rect = DisplayRect {
        x: arg(args, 0, "x")?,
        y: arg(args, 1, "y")?,
        width: arg(args, 2, "w")?,
        height: arg(args, 3, "h")?,
    };
    let geometry = ImageGeometry {
        display_width: arg(args, 4, "view_w")?,
        display_height: arg(args, 5, "view_h")?,
        natural_width: arg(args, 6, "natural_w")?,
        natural_height: arg(args, 7, "natural_h")?,
    };
    Ok(EditAction::crop(CropRect::from_display(rect, &geometry)?))
}

/// 解析一行输入
pub fn parse_line(line: &str) -> Result<InputLine, EditorError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(InputLine::Empty);
    };
    let args: Vec<&str> = words.collect();

    let cmd = match head.to_ascii_lowercase().as_str() {
        "help" | "?" => return Ok(InputLine::Help),
        "status" => return Ok(InputLine::Status),
        "quit" | "exit" => return Ok(InputLine::Quit),
        "undo" => EditorCommand::Undo,
        "redo" => EditorCommand::Redo,
        "upload" => {
            let path = line.trim()[head.len()..].trim();
            if path.is_empty() {
                return Err(EditorError::invalid("usage: upload <path>"));
            }
            EditorCommand::Upload(PathBuf::from(path))
        }
        "crop-view" => EditorCommand::Apply(parse_crop_view(&args)?),
        other => {
            let kind: ActionKind = other.parse()?;
            EditorCommand::Apply(parse_action(kind, &args)?)
        }
    };
    Ok(InputLine::Editor(cmd))
}
