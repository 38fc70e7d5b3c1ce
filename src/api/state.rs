//! 处理函数共享的应用状态

use std::sync::Arc;

use crate::orchestrator::WorkflowService;

#[derive(Clone)]
pub struct AppState {
    /// 考核流程服务
    pub service: Arc<WorkflowService>,

    /// 服务版本
    pub version: String,

    /// 启动时间
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(service: Arc<WorkflowService>) -> Self {
        Self {
            service,
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: chrono::Utc::now(),
        }
    }

    /// 运行时长（秒）
    pub fn uptime_secs(&self) -> i64 {
        (chrono::Utc::now() - self.started_at).num_seconds()
    }
}
