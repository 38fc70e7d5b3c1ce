//! 审计写入服务 - 业务能力层
//!
//! 只负责"追加一行审计记录"的能力，不关心流程

use anyhow::Result;
use std::fs::OpenOptions;
use std::io::Write;
use tracing::debug;

use crate::models::{Marks, Status};
use crate::workflow::ActorCtx;

/// 一条已提交修改的审计记录
#[derive(Debug, Clone)]
pub struct AuditEntry<'a> {
    pub actor: &'a ActorCtx,
    pub faculty_id: &'a str,
    pub action: &'a str,
    pub from: Status,
    pub to: Status,
    pub grand_total: Marks,
}

/// 审计写入服务
///
/// 职责：
/// - 每次成功提交后追加一行
/// - 写入失败由调用方决定如何处理（不会回滚已提交的修改）
pub struct AuditWriter {
    audit_file_path: String,
}

impl AuditWriter {
    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            audit_file_path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.audit_file_path
    }

    /// 追加审计记录
    pub fn write(&self, entry: &AuditEntry<'_>) -> Result<()> {
        debug!(
            "写入审计: 教师 {} | 操作 {} | {} → {}",
            entry.faculty_id, entry.action, entry.from, entry.to
        );

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.audit_file_path)?;

        let line = format!(
            "{} | {} | 教师 {} | {} | {} → {} | 总分 {}\n",
            chrono::Utc::now().format("%Y-%m-%d %H:%M:%S"),
            entry.actor,
            entry.faculty_id,
            entry.action,
            entry.from,
            entry.to,
            entry.grand_total
        );

        file.write_all(line.as_bytes())?;

        Ok(())
    }
}

impl Default for AuditWriter {
    fn default() -> Self {
        Self::with_path("audit.log")
    }
}
