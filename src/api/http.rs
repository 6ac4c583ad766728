//! HTTP 传输层：所有工具共用的 reqwest 客户端
//!
//! 统一处理 JSON POST / GET、multipart 上传、二进制下载与 SSE 长连接；
//! 非 2xx 响应解析 `{error_id, timestamp}` 诊断载荷与 `{detail}`，转为 ApiError::Http。
//! HttpImageApi 在其上实现 ImageApi。

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::api::types::{
    EditRequest, EditResponse, TaskId, UndoRequest, UploadFile, UploadResponse,
};
use crate::api::ImageApi;
use crate::config::AppConfig;
use crate::core::{ApiError, ErrorDiagnostics};

pub const IMAGE_UPLOAD_PATH: &str = "/api/v1/image/upload";
pub const IMAGE_EDIT_PATH: &str = "/api/v1/image/edit";
pub const IMAGE_UNDO_PATH: &str = "/api/v1/image/undo";

/// 共享 HTTP 客户端：base_url + 普通请求客户端 + 无总超时的流客户端
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    /// SSE 长连接不能受总超时限制，只设连接超时
    stream_client: Client,
    base_url: String,
    upload_timeout: Duration,
}

impl HttpClient {
    pub fn new(
        base_url: impl Into<String>,
        request_timeout_secs: u64,
        upload_timeout_secs: u64,
        user_agent: &str,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(request_timeout_secs.max(1)))
            .user_agent(user_agent)
            .build()
            .unwrap_or_default();
        let stream_client = Client::builder()
            .connect_timeout(Duration::from_secs(request_timeout_secs.max(1)))
            .user_agent(user_agent)
            .build()
            .unwrap_or_default();
        Self {
            client,
            stream_client,
            base_url: base_url.into(),
            upload_timeout: Duration::from_secs(upload_timeout_secs.max(1)),
        }
    }

    pub fn from_config(cfg: &AppConfig) -> Self {
        Self::new(
            cfg.server.base_url.clone(),
            cfg.http.request_timeout_secs,
            cfg.http.upload_timeout_secs,
            &cfg.http.user_agent,
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// 绝对 URL 原样返回；相对路径拼接到 base_url 上
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let base = self.base_url.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let req = self.client.post(self.url(path)).json(body);
        self.send_json("POST", path, req).await
    }

    /// 无请求体的 POST（如 add-blank-page）
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let req = self.client.post(self.url(path));
        self.send_json("POST", path, req).await
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let req = self.client.get(self.url(path));
        self.send_json("GET", path, req).await
    }

    /// multipart 上传：文件字段名为 `file`，fields 为附加文本字段
    pub async fn upload<T: DeserializeOwned>(
        &self,
        path: &str,
        file: UploadFile,
        fields: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let part = Part::bytes(file.bytes).file_name(file.file_name);
        let mut form = Form::new().part("file", part);
        for (name, value) in fields {
            form = form.text(name.to_string(), value.clone());
        }
        let req = self
            .client
            .post(self.url(path))
            .timeout(self.upload_timeout)
            .multipart(form);
        self.send_json("UPLOAD", path, req).await
    }

    /// 下载二进制内容（PDF / 转换结果等）
    pub async fn get_bytes(&self, path: &str) -> Result<Vec<u8>, ApiError> {
        let resp = self
            .client
            .get(self.url(path))
            .timeout(self.upload_timeout)
            .send()
            .await?;
        let resp = check_status(resp).await?;
        Ok(resp.bytes().await?.to_vec())
    }

    /// 打开 SSE 长连接，返回已校验状态码的响应（由调用方消费字节流）
    pub async fn open_stream(&self, path: &str) -> Result<Response, ApiError> {
        let resp = self
            .stream_client
            .get(self.url(path))
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await?;
        check_status(resp).await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: &str,
        path: &str,
        req: RequestBuilder,
    ) -> Result<T, ApiError> {
        let start = Instant::now();
        let result: Result<T, ApiError> = async {
            let resp = check_status(req.send().await?).await?;
            let text = resp.text().await?;
            serde_json::from_str::<T>(&text).map_err(|e| ApiError::Decode(e.to_string()))
        }
        .await;
        let duration_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => tracing::debug!(method, path, duration_ms, "api request ok"),
            Err(e) => tracing::warn!(method, path, duration_ms, error = %e, "api request failed"),
        }
        result
    }
}

/// 非 2xx 时读取响应体，提取诊断载荷后返回 ApiError::Http
async fn check_status(resp: Response) -> Result<Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(http_error(status.as_u16(), &body))
}

pub(crate) fn http_error(status: u16, body: &str) -> ApiError {
    let value: Option<Value> = serde_json::from_str(body).ok();
    let diagnostics = value
        .as_ref()
        .filter(|v| v.get("error_id").is_some())
        .and_then(|v| serde_json::from_value::<ErrorDiagnostics>(v.clone()).ok());
    let detail = value.as_ref().and_then(|v| match v.get("detail") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
        None => None,
    });
    if let Some(d) = &diagnostics {
        tracing::warn!(status, error_id = %d.error_id, timestamp = %d.timestamp, "server reported error");
    }
    ApiError::Http {
        status,
        diagnostics,
        detail,
    }
}

/// 基于 HTTP 的图片编辑服务
#[derive(Debug, Clone)]
pub struct HttpImageApi {
    http: HttpClient,
}

impl HttpImageApi {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }
}

#[async_trait]
impl ImageApi for HttpImageApi {
    async fn upload(&self, file: UploadFile) -> Result<UploadResponse, ApiError> {
        self.http.upload(IMAGE_UPLOAD_PATH, file, &[]).await
    }

    async fn edit(&self, request: &EditRequest) -> Result<EditResponse, ApiError> {
        self.http.post_json(IMAGE_EDIT_PATH, request).await
    }

    async fn undo(&self, task_id: &TaskId) -> Result<EditResponse, ApiError> {
        let body = UndoRequest {
            task_id: task_id.clone(),
        };
        self.http.post_json(IMAGE_UNDO_PATH, &body).await
    }
}
