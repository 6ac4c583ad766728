//! 文本格式化客户端（JSON / YAML）

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::api::HttpClient;
use crate::core::{ApiError, ServiceError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatType {
    Json,
    Yaml,
}

impl fmt::Display for FormatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => f.write_str("json"),
            Self::Yaml => f.write_str("yaml"),
        }
    }
}

impl FromStr for FormatType {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => Err(ServiceError::InvalidInput(format!("unknown format type: {other}"))),
        }
    }
}

#[derive(Serialize)]
struct FormatRequest<'a> {
    text: &'a str,
    format_type: FormatType,
}

#[derive(Deserialize)]
struct FormatResponse {
    formatted_text: String,
}

#[derive(Debug, Clone)]
pub struct FormatterClient {
    http: HttpClient,
}

impl FormatterClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// 空白输入在本地拒绝；服务端 4xx 的 detail 作为输入错误返回
    pub async fn format(&self, text: &str, format_type: FormatType) -> Result<String, ServiceError> {
        if text.trim().is_empty() {
            return Err(ServiceError::InvalidInput("Input text cannot be empty.".into()));
        }
        let result = self
            .http
            .post_json::<_, FormatResponse>(
                "/api/v1/formatter/format",
                &FormatRequest { text, format_type },
            )
            .await;
        match result {
            Ok(resp) => Ok(resp.formatted_text),
            Err(ApiError::Http {
                status: 400..=499,
                detail: Some(detail),
                ..
            }) => Err(ServiceError::InvalidInput(format!("Error: {detail}"))),
            Err(e) => Err(e.into()),
        }
    }
}
