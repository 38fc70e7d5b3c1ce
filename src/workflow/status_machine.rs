//! 考核状态机 - 流程层
//!
//! 核心职责：定义"一条考核记录"在什么状态下、允许谁、做什么
//!
//! 主线：
//! 1. Pending → VerificationPending（教师提交）
//! 2. → AuthorityVerificationPending（核查委员核查 B 类）
//! 3. → InteractionPending（系主任确认）
//! 4. → Done / PortfolioMarkPending（互动评价齐全后按层级分流）
//! 5. → PortfolioMarkDeanPending → Done（系主任、院长依次给档案打分）
//!
//! 旁路：提交后的任意未冻结状态，校长都可以上报（SentToDirector），再由校长确认冻结。
//!
//! 状态机只做判断，不写任何数据；写入由 WorkflowService 在克隆的记录上完成。

use serde::Serialize;

use crate::error::{WorkflowError, WorkflowResult};
use crate::models::{Category, Designation, FacultyRecord, Role, Status};
use crate::services::score_aggregator;
use crate::services::AssignmentGraph;
use crate::workflow::ActorCtx;

/// 操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Action {
    /// 保存自评分 / 档案明细（不推进状态）
    SaveClaims,
    Submit,
    VerifySectionB,
    ConfirmAuthority,
    /// 录入互动评价，齐全后自动推进
    Evaluate,
    HodMark,
    DeanMark,
    Escalate,
    DirectorConfirm,
}

impl Action {
    pub const ALL: [Action; 9] = [
        Action::SaveClaims,
        Action::Submit,
        Action::VerifySectionB,
        Action::ConfirmAuthority,
        Action::Evaluate,
        Action::HodMark,
        Action::DeanMark,
        Action::Escalate,
        Action::DirectorConfirm,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Action::SaveClaims => "save-claims",
            Action::Submit => "submit",
            Action::VerifySectionB => "verify-section-b",
            Action::ConfirmAuthority => "verify-authority",
            Action::Evaluate => "evaluate",
            Action::HodMark => "hod-mark",
            Action::DeanMark => "dean-mark",
            Action::Escalate => "escalate",
            Action::DirectorConfirm => "director-confirm",
        }
    }
}

impl Action {
    /// 只能由记录本人执行的操作
    pub fn is_owner_action(self) -> bool {
        matches!(self, Action::SaveClaims | Action::Submit)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

const FACULTY_ONLY: &[Role] = &[Role::Faculty];
const COMMITTEE_ONLY: &[Role] = &[Role::CommitteeMember];
/// 系级核查 / 系级档案评分：按被考核人的层级由系主任、院长或校长负责
const AUTHORITIES: &[Role] = &[Role::Hod, Role::Dean, Role::Director];
const DIRECTOR_ONLY: &[Role] = &[Role::Director];
const EVALUATORS: &[Role] = &[Role::Dean, Role::ExternalReviewer, Role::Director];
const INSTITUTE_MARKERS: &[Role] = &[Role::Dean, Role::Director];

/// 转移表：(状态, 操作) → 允许的角色
///
/// 不在表中的组合一律拒绝。
pub fn permitted_roles(status: Status, action: Action) -> Option<&'static [Role]> {
    use Action::*;

    match (status, action) {
        (Status::Pending, SaveClaims) | (Status::Pending, Submit) => Some(FACULTY_ONLY),
        (Status::VerificationPending, VerifySectionB) => Some(COMMITTEE_ONLY),
        (Status::AuthorityVerificationPending, ConfirmAuthority) => Some(AUTHORITIES),
        (Status::InteractionPending, Evaluate) => Some(EVALUATORS),
        (Status::PortfolioMarkPending, HodMark) => Some(AUTHORITIES),
        (Status::PortfolioMarkDeanPending, DeanMark) => Some(INSTITUTE_MARKERS),
        (s, Escalate) if s.is_in_review_chain() => Some(DIRECTOR_ONLY),
        (Status::SentToDirector, Evaluate) | (Status::SentToDirector, DirectorConfirm) => {
            Some(DIRECTOR_ONLY)
        }
        _ => None,
    }
}

/// 系级核查与系级档案评分的负责角色：普通教师归系主任，系主任归院长，院长归校长
pub fn authority_of(designation: Designation) -> Role {
    match designation {
        Designation::Faculty => Role::Hod,
        Designation::Hod => Role::Dean,
        Designation::Dean => Role::Director,
    }
}

/// 考核状态机
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusMachine;

impl StatusMachine {
    pub fn new() -> Self {
        Self
    }

    /// 校验操作是否被允许：记录未冻结、在转移表中、角色与身份匹配
    pub fn authorize(
        &self,
        record: &FacultyRecord,
        actor: &ActorCtx,
        action: Action,
        graph: &AssignmentGraph,
    ) -> WorkflowResult<()> {
        let status = record.status;
        if status.is_terminal() {
            return Err(WorkflowError::RecordFrozen {
                faculty_id: record.faculty_id.clone(),
                status,
            });
        }

        let roles = permitted_roles(status, action)
            .ok_or_else(|| WorkflowError::invalid(status, action, "当前状态不接受该操作"))?;
        if !roles.contains(&actor.role) {
            return Err(WorkflowError::invalid(
                status,
                action,
                format!("角色 {} 无权操作", actor.role),
            ));
        }

        self.check_identity(record, actor, action, graph)
    }

    /// 身份校验：本人、已分配的委员、同系系主任、授权评价人
    fn check_identity(
        &self,
        record: &FacultyRecord,
        actor: &ActorCtx,
        action: Action,
        graph: &AssignmentGraph,
    ) -> WorkflowResult<()> {
        let status = record.status;
        let deny = |reason: &str| Err(WorkflowError::invalid(status, action, reason));

        if !action.is_owner_action() && actor.actor_id == record.faculty_id {
            return deny("不能评审本人的记录");
        }

        match action {
            Action::SaveClaims | Action::Submit => {
                if actor.actor_id != record.faculty_id {
                    return deny("只能由教师本人操作");
                }
            }
            Action::VerifySectionB => {
                let assigned = graph.committee_member_of(&record.department, &record.faculty_id);
                if assigned != Some(actor.actor_id.as_str()) {
                    return deny("不是该教师的核查委员");
                }
            }
            Action::ConfirmAuthority | Action::HodMark => {
                let authority = authority_of(record.designation);
                if actor.role != authority {
                    return deny(&format!("该层级由 {} 负责核查", authority));
                }
                if authority == Role::Hod && actor.department != record.department {
                    return deny("不是本系系主任");
                }
            }
            Action::Evaluate => {
                if record.interactions.contains_key(&actor.actor_id) {
                    return deny("该评价人已录入过互动评价");
                }
                if !self.is_authorized_evaluator(record, actor, graph) {
                    return deny("不是该记录的授权评价人");
                }
            }
            Action::DeanMark => {
                let marker = match record.designation {
                    Designation::Dean => Role::Director,
                    _ => record.portfolio.institute_marker(),
                };
                if actor.role != marker {
                    return deny("院级档案评分角色不匹配");
                }
            }
            Action::Escalate | Action::DirectorConfirm => {}
        }
        Ok(())
    }

    /// 互动评价人授权
    ///
    /// - 上报校长后：只有校长
    /// - 普通教师：分配给该教师的外部评审，以及该评审绑定的院长
    /// - 系主任：院长
    /// - 院长：校长
    pub fn is_authorized_evaluator(
        &self,
        record: &FacultyRecord,
        actor: &ActorCtx,
        graph: &AssignmentGraph,
    ) -> bool {
        if record.status == Status::SentToDirector {
            return actor.role == Role::Director;
        }

        match record.designation {
            Designation::Faculty => {
                let Some(external) = graph.external_of(&record.faculty_id) else {
                    return false;
                };
                match actor.role {
                    Role::ExternalReviewer => external == actor.actor_id,
                    Role::Dean => graph.dean_of(external) == Some(actor.actor_id.as_str()),
                    _ => false,
                }
            }
            Designation::Hod => actor.role == Role::Dean,
            Designation::Dean => actor.role == Role::Director,
        }
    }

    /// 互动评价是否齐全
    pub fn interaction_complete(&self, record: &FacultyRecord, graph: &AssignmentGraph) -> bool {
        match record.designation {
            Designation::Faculty => {
                let Some(external) = graph.external_of(&record.faculty_id) else {
                    return false;
                };
                let dean_done = graph
                    .dean_of(external)
                    .map_or(true, |dean| record.interactions.contains_key(dean));
                record.interactions.contains_key(external) && dean_done
            }
            Designation::Hod => record.has_interaction_from_role(Role::Dean),
            Designation::Dean => record.has_interaction_from_role(Role::Director),
        }
    }

    /// 就绪检查并计算目标状态
    ///
    /// 调用前必须已经通过 `authorize`，且输入已写入（克隆的）记录。
    pub fn advance(
        &self,
        record: &FacultyRecord,
        action: Action,
        graph: &AssignmentGraph,
    ) -> WorkflowResult<Status> {
        let next = match action {
            Action::SaveClaims => record.status,
            Action::Submit => {
                let mut missing = Vec::new();
                for category in Category::CLAIMED_ON_SUBMIT {
                    match record.section(category).claimed {
                        Some(value) => {
                            score_aggregator::check_claim(category, record.cadre, value)?
                        }
                        None => missing.push(category.code()),
                    }
                }
                if !missing.is_empty() {
                    return Err(WorkflowError::incomplete(format!(
                        "自评分 {}",
                        missing.join(", ")
                    )));
                }
                Status::VerificationPending
            }
            Action::VerifySectionB => {
                if record.section(Category::B).verified.is_none() {
                    return Err(WorkflowError::incomplete("B 类核查分"));
                }
                Status::AuthorityVerificationPending
            }
            Action::ConfirmAuthority => {
                let missing: Vec<&str> = Category::CLAIMED_ON_SUBMIT
                    .iter()
                    .filter(|c| record.section(**c).verified.is_none())
                    .map(|c| c.code())
                    .collect();
                if !missing.is_empty() || record.authority_total.is_none() {
                    return Err(WorkflowError::incomplete(format!(
                        "系主任核查分 {}",
                        missing.join(", ")
                    )));
                }
                Status::InteractionPending
            }
            Action::Evaluate => {
                if record.status == Status::SentToDirector
                    || !self.interaction_complete(record, graph)
                {
                    record.status
                } else if !record.designation.needs_portfolio_marks() {
                    Status::Done
                } else if !record.portfolio.portfolio_type.needs_department() {
                    Status::PortfolioMarkDeanPending
                } else {
                    Status::PortfolioMarkPending
                }
            }
            Action::HodMark => {
                if record.portfolio.department_marks.is_none() {
                    return Err(WorkflowError::incomplete("系级档案评分"));
                }
                if record.portfolio.portfolio_type.needs_institute() {
                    Status::PortfolioMarkDeanPending
                } else {
                    Status::Done
                }
            }
            Action::DeanMark => {
                if record.portfolio.institute_marks.is_none() {
                    return Err(WorkflowError::incomplete("院级档案评分"));
                }
                Status::Done
            }
            Action::Escalate => Status::SentToDirector,
            Action::DirectorConfirm => {
                if !record.has_interaction_from_role(Role::Director) {
                    return Err(WorkflowError::incomplete("校长互动评价"));
                }
                Status::Done
            }
        };
        Ok(next)
    }
}
