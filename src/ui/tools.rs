//! 一次性工具子命令：格式化、媒体转换、视频下载、PDF 编辑
//!
//! 每个函数串起对应客户端的完整流程，结果交给 main 打印。

use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;

use crate::api::UploadFile;
use crate::core::ServiceError;
use crate::services::{
    ConvertOptions, DownloadRequest, FormatType, FormatterClient, MediaClient, PdfClient,
    PdfDocument, ProgressEvent, VideoInfo, YtdlClient,
};

/// 读取文件并格式化
pub async fn run_format(
    client: &FormatterClient,
    file: &Path,
    format_type: FormatType,
) -> Result<String, ServiceError> {
    let text = tokio::fs::read_to_string(file).await?;
    client.format(&text, format_type).await
}

/// 上传 → 转换 → 等待完成，返回下载地址
pub async fn run_convert<F>(
    client: &MediaClient,
    file: &Path,
    options: &ConvertOptions,
    cancel: CancellationToken,
    on_event: F,
) -> Result<String, ServiceError>
where
    F: FnMut(&ProgressEvent),
{
    let upload = client.upload(UploadFile::from_path(file).await?).await?;
    tracing::info!(task_id = %upload.task_id, "media uploaded");
    client.convert(&upload.task_id, options).await?;
    client.wait(&upload.task_id, cancel, on_event).await
}

/// 未指定格式时取画质列表第一项，与下拉框默认选中一致
pub async fn run_ytdl<F>(
    client: &YtdlClient,
    url: &str,
    format_id: Option<&str>,
    audio_format: Option<&str>,
    cancel: CancellationToken,
    on_event: F,
) -> Result<String, ServiceError>
where
    F: FnMut(&ProgressEvent),
{
    let format_id = match format_id {
        Some(id) => id.to_string(),
        None => {
            let info = client.fetch_info(url).await?;
            info.quality_options()
                .first()
                .map(|f| f.format_id.clone())
                .ok_or_else(|| ServiceError::InvalidInput("no downloadable formats".into()))?
        }
    };
    let request = DownloadRequest {
        url: url.trim().to_string(),
        format_id,
        audio_only: audio_format.is_some(),
        audio_format: audio_format.map(str::to_string),
    };
    let task_id = client.request_download(&request).await?;
    client.wait(&task_id, cancel, on_event).await
}

pub fn render_video_info(info: &VideoInfo) -> String {
    let mut out = format!("Title: {}", info.title);
    let options = info.quality_options();
    if options.is_empty() {
        out.push_str("\n(no quality options)");
    }
    for f in options {
        out.push_str(&format!(
            "\n  {:<8} {} {}",
            f.format_id,
            f.resolution.as_deref().unwrap_or(""),
            f.ext.as_deref().unwrap_or("")
        ));
    }
    out
}

/// 按顺序应用的 PDF 编辑：加空白页、删页、重排
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PdfEdits {
    pub add_blank: bool,
    pub delete: Vec<usize>,
    pub reorder: Vec<usize>,
}

/// `report.pdf` → `report_edited.pdf`
pub fn default_pdf_output(file: &Path) -> PathBuf {
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    file.with_file_name(format!("{stem}_edited.pdf"))
}

pub async fn run_pdf(
    client: &PdfClient,
    file: &Path,
    edits: &PdfEdits,
    out: &Path,
) -> Result<PdfDocument, ServiceError> {
    let mut doc = client.upload(UploadFile::from_path(file).await?).await?;
    if edits.add_blank {
        doc = client.add_blank_page(&doc).await?;
    }
    if !edits.delete.is_empty() {
        doc = client.delete_pages(&doc, &edits.delete).await?;
    }
    if !edits.reorder.is_empty() {
        doc = client.reorder_pages(&doc, &edits.reorder).await?;
    }
    let bytes = client.download(&doc.task_id).await?;
    tokio::fs::write(out, &bytes).await?;
    tracing::info!(task_id = %doc.task_id, pages = doc.num_pages, out = %out.display(), "pdf saved");
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::HttpClient;
    use crate::services::ProgressWatcher;
    use crate::services::VideoFormat;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn http(server: &MockServer) -> HttpClient {
        HttpClient::new(server.uri(), 5, 5, "test")
    }

    async fn mount_stream(server: &MockServer, stream_path: &str) {
        Mock::given(method("GET"))
            .and(path(stream_path))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                "data: {\"status\":\"processing\",\"progress\":40}\n\n\
                 data: {\"status\":\"completed\",\"progress\":100}\n\n",
                "text/event-stream",
            ))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_run_format_reads_file() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/formatter/format"))
            .and(body_json(serde_json::json!({"text": "{\"a\":1}", "format_type": "json"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "formatted_text": "{\n  \"a\": 1\n}"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("in.json");
        std::fs::write(&file, "{\"a\":1}").unwrap();
        let out = run_format(&FormatterClient::new(http(&server)), &file, FormatType::Json)
            .await
            .unwrap();
        assert_eq!(out, "{\n  \"a\": 1\n}");
    }

    #[tokio::test]
    async fn test_run_format_missing_file_sends_nothing() {
        let server = MockServer::start().await;
        let err = run_format(
            &FormatterClient::new(http(&server)),
            Path::new("/definitely/not/here.json"),
            FormatType::Json,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Io(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_run_convert_end_to_end() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/ffmpeg/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "task_id": "m1",
                "filename": "clip.mov"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/ffmpeg/convert"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": "Conversion started",
                "task_id": "m1"
            })))
            .expect(1)
            .mount(&server)
            .await;
        mount_stream(&server, "/api/v1/ffmpeg/tasks/m1/stream").await;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("clip.mov");
        std::fs::write(&file, b"movie").unwrap();

        let http = http(&server);
        let client = MediaClient::new(http.clone(), ProgressWatcher::new(http, None));
        let mut seen = Vec::new();
        let url = run_convert(
            &client,
            &file,
            &ConvertOptions::new("mp4"),
            CancellationToken::new(),
            |e| seen.push(e.summary()),
        )
        .await
        .unwrap();
        assert_eq!(url, format!("{}/api/v1/ffmpeg/download/m1", server.uri()));
        assert_eq!(seen, vec!["processing: 40%", "completed: 100%"]);
    }

    #[tokio::test]
    async fn test_run_ytdl_defaults_to_first_quality() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/ytdl/fetch-info"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "title": "Clip",
                "formats": [
                    {"format_id": "140", "ext": "m4a"},
                    {"format_id": "22", "resolution": "1280x720", "ext": "mp4"},
                    {"format_id": "18", "resolution": "640x360", "ext": "mp4"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/ytdl/download-request"))
            .and(body_json(serde_json::json!({
                "url": "https://youtu.be/abc",
                "format_id": "22",
                "audio_only": false,
                "audio_format": null
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "task_id": "y1"
            })))
            .expect(1)
            .mount(&server)
            .await;
        mount_stream(&server, "/api/v1/ytdl/tasks/y1/stream").await;

        let http = http(&server);
        let client = YtdlClient::new(http.clone(), ProgressWatcher::new(http, None));
        let url = run_ytdl(
            &client,
            " https://youtu.be/abc ",
            None,
            None,
            CancellationToken::new(),
            |_| {},
        )
        .await
        .unwrap();
        assert_eq!(url, format!("{}/api/v1/ytdl/download/y1", server.uri()));
    }

    #[tokio::test]
    async fn test_run_ytdl_audio_with_explicit_format_skips_info() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/ytdl/download-request"))
            .and(body_json(serde_json::json!({
                "url": "https://youtu.be/abc",
                "format_id": "140",
                "audio_only": true,
                "audio_format": "mp3"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "task_id": "y2"
            })))
            .expect(1)
            .mount(&server)
            .await;
        mount_stream(&server, "/api/v1/ytdl/tasks/y2/stream").await;

        let http = http(&server);
        let client = YtdlClient::new(http.clone(), ProgressWatcher::new(http, None));
        run_ytdl(
            &client,
            "https://youtu.be/abc",
            Some("140"),
            Some("mp3"),
            CancellationToken::new(),
            |_| {},
        )
        .await
        .unwrap();
    }

    #[test]
    fn test_render_video_info_lists_qualities() {
        let info = VideoInfo {
            title: "Clip".into(),
            thumbnail: String::new(),
            formats: vec![
                VideoFormat {
                    format_id: "140".into(),
                    resolution: None,
                    ext: Some("m4a".into()),
                },
                VideoFormat {
                    format_id: "22".into(),
                    resolution: Some("1280x720".into()),
                    ext: Some("mp4".into()),
                },
            ],
        };
        let text = render_video_info(&info);
        assert!(text.starts_with("Title: Clip"));
        assert!(text.contains("22"));
        assert!(text.contains("1280x720"));
        assert!(!text.contains("140"));
    }

    #[test]
    fn test_default_pdf_output() {
        assert_eq!(
            default_pdf_output(Path::new("/tmp/report.pdf")),
            PathBuf::from("/tmp/report_edited.pdf")
        );
    }

    #[tokio::test]
    async fn test_run_pdf_applies_edits_in_order_and_saves() {
        let server = MockServer::start().await;
        let doc = |pages: usize| {
            serde_json::json!({
                "task_id": "p1",
                "num_pages": pages,
                "pages": (0..pages).map(|i| format!("page_{i}.png")).collect::<Vec<_>>()
            })
        };
        Mock::given(method("POST"))
            .and(path("/api/v1/pdf/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(doc(3)))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/pdf/p1/add-blank-page"))
            .respond_with(ResponseTemplate::new(200).set_body_json(doc(4)))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/pdf/p1/delete-pages"))
            .and(body_json(serde_json::json!({"pages": [3]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(doc(3)))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/pdf/p1/reorder-pages"))
            .and(body_json(serde_json::json!({"page_order": [2, 0, 1]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(doc(3)))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/pdf/p1/download"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.7".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("doc.pdf");
        std::fs::write(&file, b"%PDF-1.4").unwrap();
        let out = default_pdf_output(&file);
        let edits = PdfEdits {
            add_blank: true,
            delete: vec![3],
            reorder: vec![2, 0, 1],
        };
        let doc = run_pdf(&PdfClient::new(http(&server)), &file, &edits, &out)
            .await
            .unwrap();
        assert_eq!(doc.num_pages, 3);
        assert_eq!(std::fs::read(&out).unwrap(), b"%PDF-1.7");
    }
}
