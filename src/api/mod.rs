//! HTTP 接口层
//!
//! 每个流程动作对应一个端点；操作者身份由上游网关通过请求头传入。

pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use error::{ApiError, ApiResult, ErrorResponse};
pub use router::create_router;
pub use state::AppState;
