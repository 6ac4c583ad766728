//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `NEXUSKIT__*` 覆盖（双下划线表示嵌套，如 `NEXUSKIT__SERVER__BASE_URL=http://host:8000`）。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub http: HttpSection,
    #[serde(default)]
    pub progress: ProgressSection,
    #[serde(default)]
    pub editor: EditorSection,
}

/// [server] 段：NexusKit 服务端地址
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

/// [http] 段：请求超时（秒）与 User-Agent
#[derive(Debug, Clone, Deserialize)]
pub struct HttpSection {
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// 上传 / 下载大文件的超时
    #[serde(default = "default_upload_timeout")]
    pub upload_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
            upload_timeout_secs: default_upload_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_request_timeout() -> u64 {
    60
}

fn default_upload_timeout() -> u64 {
    300
}

fn default_user_agent() -> String {
    format!("nexuskit/{}", env!("CARGO_PKG_VERSION"))
}

/// [progress] 段：SSE 进度流
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProgressSection {
    /// 两条事件之间的最长等待（秒）；0 表示不设客户端超时
    #[serde(default)]
    pub idle_timeout_secs: u64,
}

/// [editor] 段：图片编辑器
#[derive(Debug, Clone, Deserialize)]
pub struct EditorSection {
    /// 展示 URL 是否追加 `?t=<millis>`
    #[serde(default = "default_cache_bust")]
    pub cache_bust: bool,
}

impl Default for EditorSection {
    fn default() -> Self {
        Self {
            cache_bust: default_cache_bust(),
        }
    }
}

fn default_cache_bust() -> bool {
    true
}

/// 从 config 目录加载配置，环境变量 NEXUSKIT__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 NEXUSKIT__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("NEXUSKIT")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}
