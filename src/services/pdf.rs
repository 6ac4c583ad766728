//! PDF 编辑客户端：上传、加空白页、删除页、重排页、签名、下载
//!
//! 每个修改操作都以当前 PdfDocument 为输入，在本地校验页码后发请求，返回服务端的新文档状态。

use serde::{Deserialize, Serialize};

use crate::api::{HttpClient, TaskId, UploadFile};
use crate::core::ServiceError;

/// 服务端 PDF 文档状态（页数与各页预览图）
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PdfDocument {
    pub task_id: TaskId,
    pub num_pages: usize,
    #[serde(default)]
    pub pages: Vec<String>,
}

/// 签名放置参数（坐标单位由服务端约定）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signature {
    pub page_index: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    /// `data:image/png;base64,...`
    pub signature_data_url: String,
}

#[derive(Serialize)]
struct DeletePages<'a> {
    pages: &'a [usize],
}

#[derive(Serialize)]
struct ReorderPages<'a> {
    page_order: &'a [usize],
}

/// 拖拽重排：把 from 位置的页移动到 to 位置，返回新顺序
pub fn move_page(order: &[usize], from: usize, to: usize) -> Option<Vec<usize>> {
    if from >= order.len() || to >= order.len() {
        return None;
    }
    let mut order = order.to_vec();
    let page = order.remove(from);
    order.insert(to, page);
    Some(order)
}

fn check_page(doc: &PdfDocument, index: usize) -> Result<(), ServiceError> {
    if index >= doc.num_pages {
        return Err(ServiceError::InvalidInput(format!(
            "page {index} out of range (document has {} pages)",
            doc.num_pages
        )));
    }
    Ok(())
}

/// PDF 服务客户端
#[derive(Debug, Clone)]
pub struct PdfClient {
    http: HttpClient,
}

impl PdfClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn upload(&self, file: UploadFile) -> Result<PdfDocument, ServiceError> {
        let doc: PdfDocument = self.http.upload("/api/v1/pdf/upload", file, &[]).await?;
        tracing::info!(task_id = %doc.task_id, pages = doc.num_pages, "pdf uploaded");
        Ok(doc)
    }

    pub async fn add_blank_page(&self, doc: &PdfDocument) -> Result<PdfDocument, ServiceError> {
        let path = format!("/api/v1/pdf/{}/add-blank-page", doc.task_id);
        Ok(self.http.post_empty(&path).await?)
    }

    pub async fn delete_pages(
        &self,
        doc: &PdfDocument,
        pages: &[usize],
    ) -> Result<PdfDocument, ServiceError> {
        if pages.is_empty() {
            return Err(ServiceError::InvalidInput("no pages selected".into()));
        }
        for &p in pages {
            check_page(doc, p)?;
        }
        if pages.len() >= doc.num_pages {
            return Err(ServiceError::InvalidInput("cannot delete every page".into()));
        }
        let path = format!("/api/v1/pdf/{}/delete-pages", doc.task_id);
        Ok(self.http.post_json(&path, &DeletePages { pages }).await?)
    }

    /// 新顺序必须是 0..num_pages 的一个排列
    pub async fn reorder_pages(
        &self,
        doc: &PdfDocument,
        page_order: &[usize],
    ) -> Result<PdfDocument, ServiceError> {
        let mut sorted = page_order.to_vec();
        sorted.sort_unstable();
        if sorted != (0..doc.num_pages).collect::<Vec<_>>() {
            return Err(ServiceError::InvalidInput(
                "page order must contain every page exactly once".into(),
            ));
        }
        let path = format!("/api/v1/pdf/{}/reorder-pages", doc.task_id);
        Ok(self.http.post_json(&path, &ReorderPages { page_order }).await?)
    }

    pub async fn add_signature(
        &self,
        doc: &PdfDocument,
        signature: &Signature,
    ) -> Result<PdfDocument, ServiceError> {
        check_page(doc, signature.page_index)?;
        if !signature.signature_data_url.starts_with("data:image/") {
            return Err(ServiceError::InvalidInput(
                "signature must be an image data URL".into(),
            ));
        }
        let path = format!("/api/v1/pdf/{}/add-signature", doc.task_id);
        Ok(self.http.post_json(&path, signature).await?)
    }

    pub fn download_url(&self, task_id: &TaskId) -> String {
        self.http.url(&format!("/api/v1/pdf/{task_id}/download"))
    }

    pub async fn download(&self, task_id: &TaskId) -> Result<Vec<u8>, ServiceError> {
        Ok(self
            .http
            .get_bytes(&format!("/api/v1/pdf/{task_id}/download"))
            .await?)
    }
}
