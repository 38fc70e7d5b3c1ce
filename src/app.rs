//! 应用生命周期：加载名册 → 构建服务 → 启动 HTTP 服务

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::warn;

use crate::api::{create_router, AppState};
use crate::config::Config;
use crate::models::load_all_roster_files;
use crate::orchestrator::WorkflowService;
use crate::services::AuditWriter;
use crate::utils::logging;

/// 应用主结构
pub struct App {
    config: Config,
    service: Arc<WorkflowService>,
}

impl App {
    /// 初始化应用：读取名册并为每位教师创建 Pending 记录
    pub async fn initialize(config: Config) -> Result<Self> {
        logging::log_startup(&config);

        let service = WorkflowService::in_memory()
            .with_audit(AuditWriter::with_path(config.audit_log_file.clone()));

        let rosters = match load_all_roster_files(&config.roster_folder).await {
            Ok(rosters) => rosters,
            Err(e) => {
                warn!("⚠️ 名册加载失败: {:#}", e);
                Vec::new()
            }
        };
        let mut onboarded = 0;
        let mut rejected = 0;
        let departments = rosters.len();
        for roster in rosters {
            let department = roster.department.clone();
            for record in roster.into_records() {
                match service.onboard(record) {
                    Ok(()) => onboarded += 1,
                    Err(e) => {
                        warn!("⚠️ 名册 {} 中的记录被跳过: {}", department, e);
                        rejected += 1;
                    }
                }
            }
        }
        logging::log_roster_loaded(departments, onboarded, rejected);

        Ok(Self {
            config,
            service: Arc::new(service),
        })
    }

    pub fn service(&self) -> Arc<WorkflowService> {
        self.service.clone()
    }

    /// 运行 HTTP 服务，直到收到 Ctrl+C
    pub async fn run(self) -> Result<()> {
        let router = create_router(AppState::new(self.service.clone()));
        let listener = TcpListener::bind(&self.config.listen_addr)
            .await
            .with_context(|| format!("无法监听地址: {}", self.config.listen_addr))?;

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("HTTP 服务异常退出")?;

        logging::log_shutdown();
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("⚠️ 无法监听停止信号: {}", e);
    }
}
