//! 协作服务客户端：PDF、媒体转换、视频下载、文本格式化，以及共用的 SSE 进度监听

pub mod formatter;
pub mod media;
pub mod pdf;
pub mod progress;
pub mod ytdl;

pub use formatter::{FormatType, FormatterClient};
pub use media::{ConvertOptions, MediaClient, MediaUpload, OutputCategory, OutputFormat};
pub use pdf::{move_page, PdfClient, PdfDocument, Signature};
pub use progress::{ProgressEvent, ProgressWatcher};
pub use ytdl::{DownloadRequest, VideoFormat, VideoInfo, YtdlClient};
