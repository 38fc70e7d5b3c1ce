//! 操作者上下文
//!
//! 封装"谁、以什么角色、在哪个系"发起了这次操作

use std::fmt::Display;

use crate::models::Role;

/// 操作者上下文
///
/// 身份由上游网关认证后传入，本系统只做角色与分配关系的校验。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorCtx {
    /// 操作者 ID（教师 / 委员 / 评审等）
    pub actor_id: String,

    /// 本次操作使用的角色
    pub role: Role,

    /// 操作者所在的系
    pub department: String,
}

impl ActorCtx {
    /// 创建新的操作者上下文
    pub fn new(actor_id: impl Into<String>, role: Role, department: impl Into<String>) -> Self {
        Self {
            actor_id: actor_id.into(),
            role,
            department: department.into(),
        }
    }
}

impl Display for ActorCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[操作者 ID#{} 角色#{} 系#{}]",
            self.actor_id, self.role, self.department
        )
    }
}
