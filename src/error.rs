use thiserror::Error;

use crate::models::{Marks, Status};
use crate::workflow::Action;

/// 考核流程错误
///
/// 所有错误都直接返回给调用方；引擎内部不做重试。
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkflowError {
    /// 当前状态或角色不允许该操作（不会产生任何修改）
    #[error("非法状态转移: 状态 {status} 下不允许 {action} ({reason})")]
    InvalidTransition {
        status: Status,
        action: Action,
        reason: String,
    },

    /// 提交的分数超过类别 / 职称上限
    #[error("分数超出上限: {field} = {value}，上限 {ceiling}")]
    CeilingExceeded {
        field: String,
        value: Marks,
        ceiling: Marks,
    },

    /// 分数为负或不是有限数
    #[error("分数无效: {field} = {value}")]
    NegativeMarks { field: String, value: Marks },

    /// 教师已被分配给其他评审
    #[error("教师 {faculty_id} 已分配给 {holder}")]
    AlreadyAssigned { faculty_id: String, holder: String },

    /// 外部评审已绑定院长，批量分配被锁定
    #[error("外部评审 {external_id} 已绑定院长 {dean_id}，只能逐个移除后重新分配")]
    AssignmentLocked { external_id: String, dean_id: String },

    /// 记录已冻结
    #[error("记录 {faculty_id} 已冻结 (状态: {status})")]
    RecordFrozen { faculty_id: String, status: Status },

    /// 缺少必填分数
    #[error("缺少必填项: {missing}")]
    IncompleteInput { missing: String },

    /// 非记录转移类操作（如分配关系维护）的越权
    #[error("无权操作: {reason}")]
    Unauthorized { reason: String },

    #[error("找不到教师记录: {faculty_id}")]
    RecordNotFound { faculty_id: String },

    #[error("教师记录已存在: {faculty_id}")]
    DuplicateRecord { faculty_id: String },

    /// 持久化失败，内存中的记录保持原样
    #[error("持久化失败: {0}")]
    PersistFailed(String),
}

impl WorkflowError {
    /// 创建非法转移错误
    pub fn invalid(status: Status, action: Action, reason: impl Into<String>) -> Self {
        WorkflowError::InvalidTransition {
            status,
            action,
            reason: reason.into(),
        }
    }

    /// 创建缺失输入错误
    pub fn incomplete(missing: impl Into<String>) -> Self {
        WorkflowError::IncompleteInput {
            missing: missing.into(),
        }
    }

    /// 稳定的错误代码，供 API 返回
    pub fn code(&self) -> &'static str {
        match self {
            WorkflowError::InvalidTransition { .. } => "INVALID_TRANSITION",
            WorkflowError::CeilingExceeded { .. } => "CEILING_EXCEEDED",
            WorkflowError::NegativeMarks { .. } => "NEGATIVE_MARKS",
            WorkflowError::AlreadyAssigned { .. } => "ALREADY_ASSIGNED",
            WorkflowError::AssignmentLocked { .. } => "ASSIGNMENT_LOCKED",
            WorkflowError::RecordFrozen { .. } => "RECORD_FROZEN",
            WorkflowError::IncompleteInput { .. } => "INCOMPLETE_INPUT",
            WorkflowError::Unauthorized { .. } => "UNAUTHORIZED",
            WorkflowError::RecordNotFound { .. } => "NOT_FOUND",
            WorkflowError::DuplicateRecord { .. } => "DUPLICATE_RECORD",
            WorkflowError::PersistFailed(_) => "PERSIST_FAILED",
        }
    }
}

/// 持久化协作方返回的错误
#[derive(Debug, Error)]
#[error("{0}")]
pub struct PersistError(pub String);

impl From<PersistError> for WorkflowError {
    fn from(err: PersistError) -> Self {
        WorkflowError::PersistFailed(err.0)
    }
}

/// 考核流程结果类型
pub type WorkflowResult<T> = Result<T, WorkflowError>;
