//! 服务端接口层：抽象与实现（HTTP / Mock）

pub mod http;
pub mod mock;
pub mod traits;
pub mod types;

pub use http::{HttpClient, HttpImageApi};
pub use mock::MockImageApi;
pub use traits::ImageApi;
pub use types::{ArtifactRef, EditRequest, EditResponse, TaskId, UploadFile, UploadResponse};
