//! 命令行参数
//!
//! 不带子命令时进入交互式图片编辑器；其余工具各有一个一次性子命令。

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::services::FormatType;

/// NexusKit 多工具面板客户端
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(version, about)]
pub struct Cli {
    /// Extra config file layered over config/default.toml.
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Use the in-memory image server instead of the HTTP one.
    #[arg(long, default_value_t = false)]
    pub offline: bool,

    #[command(subcommand)]
    pub command: Option<ToolCommand>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum ToolCommand {
    /// Interactive image editor with undo/redo (the default).
    Edit,

    /// Pretty-print a JSON or YAML file.
    Format {
        file: PathBuf,
        #[arg(long = "type", short = 't', default_value = "json")]
        format_type: FormatType,
    },

    /// Convert a media file and print the download URL.
    Convert {
        file: PathBuf,
        /// Output format, e.g. mp4, webm, mp3, flac.
        #[arg(long)]
        to: String,
        #[arg(long, default_value_t = false)]
        extract_audio: bool,
        #[arg(long)]
        resolution: Option<String>,
        #[arg(long)]
        quality: Option<String>,
        #[arg(long)]
        bitrate: Option<String>,
    },

    /// Download a video (or only its audio) and print the download URL.
    Ytdl {
        url: String,
        /// Print title and available qualities, then exit.
        #[arg(long, default_value_t = false)]
        info: bool,
        /// Format to download; defaults to the first quality offered.
        #[arg(long)]
        format_id: Option<String>,
        /// Audio-only download in the given format, e.g. mp3.
        #[arg(long, value_name = "FORMAT")]
        audio: Option<String>,
    },

    /// Edit a PDF: add a blank page, delete pages, reorder pages (0-based indexes).
    Pdf {
        file: PathBuf,
        #[arg(long, default_value_t = false)]
        add_blank: bool,
        #[arg(long, value_delimiter = ',')]
        delete: Vec<usize>,
        #[arg(long, value_delimiter = ',')]
        reorder: Vec<usize>,
        /// Where to save the edited document.
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
    },
}
