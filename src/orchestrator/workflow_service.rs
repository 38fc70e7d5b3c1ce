//! 考核流程服务 - 编排层
//!
//! ## 职责
//!
//! 对外唯一入口：接收操作者的动作（提交、核查、评价、打分、冻结），
//! 交给状态机校验，写入分数，重新计算总分，并通过持久化协作方落盘。
//!
//! ## 原子性
//!
//! 每个动作在单条记录的锁内完成"读取 → 校验 → 写入 → 持久化"；
//! 读取分配关系时先拿分配图的读锁，再拿记录锁（顺序固定，不会死锁）。
//! 失败时记录保持原样，不存在部分写入。

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::{WorkflowError, WorkflowResult};
use crate::infrastructure::{InMemoryPersister, RecordPersister, RecordStore};
use crate::models::{
    Cadre, Category, Designation, FacultyRecord, InteractionScore, Marks, PortfolioType, Role,
    Status,
};
use crate::services::score_aggregator::{self, ScoreBreakdown};
use crate::services::{AssignmentGraph, AuditEntry, AuditWriter};
use crate::workflow::{Action, ActorCtx, StatusMachine};

/// 动作结果：新状态 + 新总分
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    pub status: Status,
    pub grand_total: Marks,
}

/// 教师自评分（A–E，D 为档案自评部分）
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ClaimedMarks {
    #[serde(rename = "A")]
    pub a: Option<Marks>,
    #[serde(rename = "B")]
    pub b: Option<Marks>,
    #[serde(rename = "C")]
    pub c: Option<Marks>,
    #[serde(rename = "D")]
    pub d: Option<Marks>,
    #[serde(rename = "E")]
    pub e: Option<Marks>,
}

impl ClaimedMarks {
    fn entries(&self) -> [(Category, Option<Marks>); 5] {
        [
            (Category::A, self.a),
            (Category::B, self.b),
            (Category::C, self.c),
            (Category::D, self.d),
            (Category::E, self.e),
        ]
    }
}

/// 系主任核查分；B 类可不填，沿用核查委员的结果
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct AuthorityMarks {
    #[serde(rename = "A")]
    pub a: Option<Marks>,
    #[serde(rename = "B")]
    pub b: Option<Marks>,
    #[serde(rename = "C")]
    pub c: Option<Marks>,
    #[serde(rename = "E")]
    pub e: Option<Marks>,
}

/// 档案（D 类）请求体，按当前状态决定哪些字段有效
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioInput {
    pub self_awarded: Option<Marks>,
    #[serde(rename = "type")]
    pub portfolio_type: Option<PortfolioType>,
    pub administrative_role: Option<bool>,
    pub institute_marks: Option<Marks>,
    pub department_marks: Option<Marks>,
}

/// 互动评价请求体
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionInput {
    pub knowledge: Marks,
    pub skills: Marks,
    pub attributes: Marks,
    pub outcomes_initiatives: Marks,
    pub self_branching: Marks,
    pub team_performance: Marks,
}

/// 状态投影
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusView {
    pub faculty_id: String,
    pub department: String,
    pub cadre: Cadre,
    pub designation: Designation,
    pub status: Status,
}

/// 分数投影
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalMarksView {
    pub faculty_id: String,
    pub status: Status,
    #[serde(flatten)]
    pub breakdown: ScoreBreakdown,
}

/// 外部评审分配投影
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalAssignmentView {
    pub external_id: String,
    pub dean_id: Option<String>,
    pub faculty_ids: Vec<String>,
}

/// 委员会队列投影
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitteeQueueView {
    pub department: String,
    pub member_id: String,
    pub faculty_ids: Vec<String>,
}

/// 考核流程服务
pub struct WorkflowService {
    store: RecordStore,
    graph: RwLock<AssignmentGraph>,
    machine: StatusMachine,
    audit: Option<AuditWriter>,
}

impl WorkflowService {
    /// 创建新的流程服务
    pub fn new(persister: Arc<dyn RecordPersister>) -> Self {
        Self {
            store: RecordStore::new(persister),
            graph: RwLock::new(AssignmentGraph::new()),
            machine: StatusMachine::new(),
            audit: None,
        }
    }

    /// 使用内存持久化创建（测试 / 单机运行）
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryPersister::new()))
    }

    /// 启用审计日志
    pub fn with_audit(mut self, audit: AuditWriter) -> Self {
        self.audit = Some(audit);
        self
    }

    /// 入职：写入一条新的 Pending 记录
    pub fn onboard(&self, record: FacultyRecord) -> WorkflowResult<()> {
        info!(
            "📋 入职记录: {} ({}, {}, {})",
            record.faculty_id, record.department, record.cadre, record.designation
        );
        self.store.insert(record)
    }

    pub fn record_count(&self) -> usize {
        self.store.len()
    }

    // ========== 记录转移 ==========

    /// 保存自评分草稿（仅 Pending）
    pub async fn save_claims(
        &self,
        actor: &ActorCtx,
        department: &str,
        faculty_id: &str,
        claims: ClaimedMarks,
    ) -> WorkflowResult<Outcome> {
        self.transition(actor, department, faculty_id, Action::SaveClaims, |record, _| {
            write_claims(record, &claims)
        })
        .await
    }

    /// 教师提交（可同时携带最终的自评分）
    pub async fn submit(
        &self,
        actor: &ActorCtx,
        department: &str,
        faculty_id: &str,
        claims: Option<ClaimedMarks>,
    ) -> WorkflowResult<Outcome> {
        self.transition(actor, department, faculty_id, Action::Submit, |record, _| {
            match claims {
                Some(claims) => write_claims(record, &claims),
                None => Ok(()),
            }
        })
        .await
    }

    /// 核查委员写入 B 类核查分
    pub async fn verify_section_b(
        &self,
        actor: &ActorCtx,
        department: &str,
        faculty_id: &str,
        verified: Marks,
    ) -> WorkflowResult<Outcome> {
        self.transition(actor, department, faculty_id, Action::VerifySectionB, |record, _| {
            score_aggregator::check_claim(Category::B, record.cadre, verified)?;
            record.section_mut(Category::B).verified = Some(verified);
            Ok(())
        })
        .await
    }

    /// 系主任写入核查分并确认
    pub async fn verify_authority(
        &self,
        actor: &ActorCtx,
        department: &str,
        faculty_id: &str,
        marks: AuthorityMarks,
    ) -> WorkflowResult<Outcome> {
        self.transition(actor, department, faculty_id, Action::ConfirmAuthority, |record, _| {
            let entries = [
                (Category::A, marks.a),
                (Category::B, marks.b),
                (Category::C, marks.c),
                (Category::E, marks.e),
            ];
            for (category, value) in entries {
                if let Some(value) = value {
                    score_aggregator::check_claim(category, record.cadre, value)?;
                }
            }
            for (category, value) in entries {
                if let Some(value) = value {
                    record.section_mut(category).verified = Some(value);
                }
            }
            record.authority_total = Some(score_aggregator::grand_total(record));
            Ok(())
        })
        .await
    }

    /// 录入一份互动评价；所需评价齐全后自动推进
    pub async fn record_interaction(
        &self,
        actor: &ActorCtx,
        department: &str,
        faculty_id: &str,
        evaluator_id: &str,
        input: InteractionInput,
    ) -> WorkflowResult<Outcome> {
        self.transition(actor, department, faculty_id, Action::Evaluate, |record, _| {
            if evaluator_id != actor.actor_id {
                return Err(WorkflowError::invalid(
                    record.status,
                    Action::Evaluate,
                    "评价人与操作者不一致",
                ));
            }
            let score = InteractionScore {
                evaluator_id: evaluator_id.to_string(),
                evaluator_role: actor.role,
                knowledge: input.knowledge,
                skills: input.skills,
                attributes: input.attributes,
                outcomes_initiatives: input.outcomes_initiatives,
                self_branching: input.self_branching,
                team_performance: input.team_performance,
            };
            score_aggregator::check_interaction(&score)?;
            record.interactions.insert(score.evaluator_id.clone(), score);
            Ok(())
        })
        .await
    }

    /// 档案（D 类）：Pending 时由教师填写明细，之后由系主任、院长依次打分
    pub async fn mark_portfolio(
        &self,
        actor: &ActorCtx,
        department: &str,
        faculty_id: &str,
        input: PortfolioInput,
    ) -> WorkflowResult<Outcome> {
        let select = |record: &FacultyRecord| match record.status {
            Status::PortfolioMarkPending => Action::HodMark,
            Status::PortfolioMarkDeanPending => Action::DeanMark,
            _ => Action::SaveClaims,
        };

        self.transition_with(actor, department, faculty_id, select, |record, _, action| {
            match action {
                Action::HodMark => {
                    if let Some(marks) = input.department_marks {
                        score_aggregator::check_portfolio_mark("departmentMarks", marks)?;
                        record.portfolio.department_marks = Some(marks);
                    }
                }
                Action::DeanMark => {
                    if let Some(marks) = input.institute_marks {
                        score_aggregator::check_portfolio_mark("instituteMarks", marks)?;
                        record.portfolio.institute_marks = Some(marks);
                    }
                }
                _ => {
                    if input.institute_marks.is_some() || input.department_marks.is_some() {
                        return Err(WorkflowError::invalid(
                            record.status,
                            action,
                            "教师不能填写上级档案评分",
                        ));
                    }
                    if let Some(self_awarded) = input.self_awarded {
                        score_aggregator::check_claim(Category::D, record.cadre, self_awarded)?;
                        record.portfolio.self_awarded = Some(self_awarded);
                        record.section_mut(Category::D).claimed = Some(self_awarded);
                    }
                    if let Some(portfolio_type) = input.portfolio_type {
                        record.portfolio.portfolio_type = portfolio_type;
                    }
                    if let Some(administrative_role) = input.administrative_role {
                        record.portfolio.administrative_role = administrative_role;
                    }
                    return Ok(());
                }
            }
            record.section_mut(Category::D).verified =
                Some(score_aggregator::portfolio_total(&record.portfolio));
            Ok(())
        })
        .await
    }

    /// 校长上报
    pub async fn escalate(
        &self,
        actor: &ActorCtx,
        department: &str,
        faculty_id: &str,
    ) -> WorkflowResult<Outcome> {
        self.transition(actor, department, faculty_id, Action::Escalate, |_, _| Ok(()))
            .await
    }

    /// 校长确认并冻结
    pub async fn director_confirm(
        &self,
        actor: &ActorCtx,
        department: &str,
        faculty_id: &str,
    ) -> WorkflowResult<Outcome> {
        self.transition(actor, department, faculty_id, Action::DirectorConfirm, |_, _| Ok(()))
            .await
    }

    async fn transition<F>(
        &self,
        actor: &ActorCtx,
        department: &str,
        faculty_id: &str,
        action: Action,
        apply: F,
    ) -> WorkflowResult<Outcome>
    where
        F: FnOnce(&mut FacultyRecord, &AssignmentGraph) -> WorkflowResult<()>,
    {
        self.transition_with(
            actor,
            department,
            faculty_id,
            move |_| action,
            move |record, graph, _| apply(record, graph),
        )
        .await
    }

    /// 统一的转移流程：授权 → 写入 → 就绪检查 → 推进 → 持久化
    async fn transition_with<S, F>(
        &self,
        actor: &ActorCtx,
        department: &str,
        faculty_id: &str,
        select: S,
        apply: F,
    ) -> WorkflowResult<Outcome>
    where
        S: FnOnce(&FacultyRecord) -> Action,
        F: FnOnce(&mut FacultyRecord, &AssignmentGraph, Action) -> WorkflowResult<()>,
    {
        let guard = self.graph.read().await;
        let graph: &AssignmentGraph = &guard;
        let machine = self.machine;

        let result = self
            .store
            .update(faculty_id, |record| {
                if record.department != department {
                    return Err(WorkflowError::RecordNotFound {
                        faculty_id: faculty_id.to_string(),
                    });
                }
                let action = select(&*record);
                machine.authorize(record, actor, action, graph)?;

                let from = record.status;
                apply(&mut *record, graph, action)?;
                let to = machine.advance(record, action, graph)?;
                record.status = to;
                Ok((action, from, to))
            })
            .await;
        drop(guard);

        let ((action, from, to), record) = match result {
            Ok(done) => done,
            Err(e) => {
                warn!("{} ❌ 教师 {} 的操作被拒绝: {}", actor, faculty_id, e);
                return Err(e);
            }
        };

        let grand_total = score_aggregator::grand_total(&record);
        info!(
            "{} ✓ {} 教师 {}: {} → {} (总分 {})",
            actor, action, faculty_id, from, to, grand_total
        );
        self.write_audit(AuditEntry {
            actor,
            faculty_id,
            action: action.as_str(),
            from,
            to,
            grand_total,
        });

        Ok(Outcome {
            status: to,
            grand_total,
        })
    }

    fn write_audit(&self, entry: AuditEntry<'_>) {
        if let Some(audit) = &self.audit {
            if let Err(e) = audit.write(&entry) {
                warn!("⚠️ 写入审计日志失败 ({}): {}", audit.path(), e);
            }
        }
    }

    // ========== 分配关系 ==========

    /// 批量把本系教师分配给外部评审
    pub async fn assign_externals(
        &self,
        actor: &ActorCtx,
        department: &str,
        external_id: &str,
        faculty_ids: &[String],
    ) -> WorkflowResult<ExternalAssignmentView> {
        require_hod(actor, department)?;
        self.ensure_in_department(department, faculty_ids).await?;

        let mut graph = self.graph.write().await;
        graph
            .assign_faculty_to_external(external_id, faculty_ids)
            .inspect_err(|e| warn!("{} ❌ 分配外部评审 {} 失败: {}", actor, external_id, e))?;
        info!(
            "{} ✓ 外部评审 {} 新增 {} 名教师",
            actor,
            external_id,
            faculty_ids.len()
        );
        Ok(external_view(&graph, external_id))
    }

    /// 从外部评审移除单个教师（绑定院长后仍允许）
    pub async fn remove_external_faculty(
        &self,
        actor: &ActorCtx,
        department: &str,
        external_id: &str,
        faculty_id: &str,
    ) -> WorkflowResult<ExternalAssignmentView> {
        require_hod(actor, department)?;
        self.ensure_in_department(department, &[faculty_id.to_string()])
            .await?;

        let mut graph = self.graph.write().await;
        if !graph.remove_faculty_from_external(external_id, faculty_id) {
            return Err(WorkflowError::RecordNotFound {
                faculty_id: faculty_id.to_string(),
            });
        }
        info!("{} ✓ 外部评审 {} 移除教师 {}", actor, external_id, faculty_id);
        Ok(external_view(&graph, external_id))
    }

    /// 为外部评审绑定院长（覆盖之前的院长）
    pub async fn assign_dean(
        &self,
        actor: &ActorCtx,
        department: &str,
        external_id: &str,
        dean_id: &str,
    ) -> WorkflowResult<ExternalAssignmentView> {
        require_hod(actor, department)?;

        let mut graph = self.graph.write().await;
        if let Some(previous) = graph.assign_dean_to_external(external_id, dean_id) {
            if previous != dean_id {
                info!("外部评审 {} 的院长由 {} 改为 {}", external_id, previous, dean_id);
            }
        }
        info!("{} ✓ 外部评审 {} 绑定院长 {}", actor, external_id, dean_id);
        Ok(external_view(&graph, external_id))
    }

    /// 解除院长绑定
    pub async fn detach_dean(
        &self,
        actor: &ActorCtx,
        department: &str,
        external_id: &str,
    ) -> WorkflowResult<ExternalAssignmentView> {
        require_hod(actor, department)?;

        let mut graph = self.graph.write().await;
        if let Some(dean_id) = graph.detach_dean(external_id) {
            info!("{} ✓ 外部评审 {} 解除院长 {}", actor, external_id, dean_id);
        }
        Ok(external_view(&graph, external_id))
    }

    /// 把本系教师加入核查委员的队列
    pub async fn assign_committee(
        &self,
        actor: &ActorCtx,
        department: &str,
        member_id: &str,
        faculty_ids: &[String],
    ) -> WorkflowResult<CommitteeQueueView> {
        require_hod(actor, department)?;
        self.ensure_in_department(department, faculty_ids).await?;

        let mut graph = self.graph.write().await;
        graph
            .assign_committee_member(department, member_id, faculty_ids)
            .inspect_err(|e| warn!("{} ❌ 分配核查委员 {} 失败: {}", actor, member_id, e))?;
        info!(
            "{} ✓ 核查委员 {} 新增 {} 名教师",
            actor,
            member_id,
            faculty_ids.len()
        );
        Ok(CommitteeQueueView {
            department: department.to_string(),
            member_id: member_id.to_string(),
            faculty_ids: graph.committee_queue(department, member_id),
        })
    }

    /// 从核查委员的队列移除教师
    pub async fn remove_committee_faculty(
        &self,
        actor: &ActorCtx,
        department: &str,
        member_id: &str,
        faculty_id: &str,
    ) -> WorkflowResult<CommitteeQueueView> {
        require_hod(actor, department)?;

        let mut graph = self.graph.write().await;
        if !graph.remove_committee_faculty(department, member_id, faculty_id) {
            return Err(WorkflowError::RecordNotFound {
                faculty_id: faculty_id.to_string(),
            });
        }
        info!("{} ✓ 核查委员 {} 移除教师 {}", actor, member_id, faculty_id);
        Ok(CommitteeQueueView {
            department: department.to_string(),
            member_id: member_id.to_string(),
            faculty_ids: graph.committee_queue(department, member_id),
        })
    }

    /// 分配前确认教师存在且属于该系
    async fn ensure_in_department(
        &self,
        department: &str,
        faculty_ids: &[String],
    ) -> WorkflowResult<()> {
        for faculty_id in faculty_ids {
            let record = self.store.snapshot(faculty_id).await?;
            if record.department != department {
                return Err(WorkflowError::RecordNotFound {
                    faculty_id: faculty_id.clone(),
                });
            }
        }
        Ok(())
    }

    // ========== 只读投影 ==========

    pub async fn status_view(&self, department: &str, faculty_id: &str) -> WorkflowResult<StatusView> {
        let record = self.find(department, faculty_id).await?;
        Ok(StatusView {
            faculty_id: record.faculty_id,
            department: record.department,
            cadre: record.cadre,
            designation: record.designation,
            status: record.status,
        })
    }

    pub async fn total_marks(
        &self,
        department: &str,
        faculty_id: &str,
    ) -> WorkflowResult<TotalMarksView> {
        let record = self.find(department, faculty_id).await?;
        Ok(TotalMarksView {
            breakdown: score_aggregator::breakdown(&record),
            faculty_id: record.faculty_id,
            status: record.status,
        })
    }

    /// 完整记录快照
    pub async fn record(&self, department: &str, faculty_id: &str) -> WorkflowResult<FacultyRecord> {
        self.find(department, faculty_id).await
    }

    pub async fn external_assignment(&self, external_id: &str) -> ExternalAssignmentView {
        let graph = self.graph.read().await;
        external_view(&graph, external_id)
    }

    async fn find(&self, department: &str, faculty_id: &str) -> WorkflowResult<FacultyRecord> {
        let record = self.store.snapshot(faculty_id).await?;
        if record.department != department {
            return Err(WorkflowError::RecordNotFound {
                faculty_id: faculty_id.to_string(),
            });
        }
        Ok(record)
    }
}

/// 写入自评分：全部校验通过后才写
fn write_claims(record: &mut FacultyRecord, claims: &ClaimedMarks) -> WorkflowResult<()> {
    for (category, value) in claims.entries() {
        if let Some(value) = value {
            score_aggregator::check_claim(category, record.cadre, value)?;
        }
    }
    for (category, value) in claims.entries() {
        let Some(value) = value else { continue };
        record.section_mut(category).claimed = Some(value);
        if category == Category::D {
            record.portfolio.self_awarded = Some(value);
        }
    }
    Ok(())
}

/// 分配关系只能由本系系主任维护
fn require_hod(actor: &ActorCtx, department: &str) -> WorkflowResult<()> {
    if actor.role != Role::Hod || actor.department != department {
        return Err(WorkflowError::Unauthorized {
            reason: format!("{} 不是系 {} 的系主任", actor, department),
        });
    }
    Ok(())
}

fn external_view(graph: &AssignmentGraph, external_id: &str) -> ExternalAssignmentView {
    ExternalAssignmentView {
        external_id: external_id.to_string(),
        dean_id: graph.dean_of(external_id).map(str::to_string),
        faculty_ids: graph.faculty_of_external(external_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::permitted_roles;

    const DEPT: &str = "CSE";

    fn faculty() -> ActorCtx {
        ActorCtx::new("F1", Role::Faculty, DEPT)
    }
    fn committee() -> ActorCtx {
        ActorCtx::new("C1", Role::CommitteeMember, DEPT)
    }
    fn hod() -> ActorCtx {
        ActorCtx::new("H1", Role::Hod, DEPT)
    }
    fn external() -> ActorCtx {
        ActorCtx::new("X1", Role::ExternalReviewer, "EXT")
    }
    fn dean() -> ActorCtx {
        ActorCtx::new("DN1", Role::Dean, "ENGG")
    }
    fn director() -> ActorCtx {
        ActorCtx::new("DIR", Role::Director, "ADMIN")
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn claims() -> ClaimedMarks {
        ClaimedMarks {
            a: Some(400.0),
            b: Some(200.0),
            c: Some(150.0),
            d: Some(0.0),
            e: Some(0.0),
        }
    }

    fn full_interaction() -> InteractionInput {
        InteractionInput {
            knowledge: 20.0,
            skills: 20.0,
            attributes: 10.0,
            outcomes_initiatives: 20.0,
            self_branching: 10.0,
            team_performance: 20.0,
        }
    }

    async fn service() -> WorkflowService {
        let service = WorkflowService::in_memory();
        service
            .onboard(FacultyRecord::new(
                "F1",
                "Asha",
                DEPT,
                Cadre::AssistantProfessor,
                Designation::Faculty,
            ))
            .unwrap();
        service
            .assign_committee(&hod(), DEPT, "C1", &ids(&["F1"]))
            .await
            .unwrap();
        service
    }

    /// 推进到 InteractionPending
    async fn through_authority(service: &WorkflowService) {
        service.submit(&faculty(), DEPT, "F1", Some(claims())).await.unwrap();
        service.verify_section_b(&committee(), DEPT, "F1", 180.0).await.unwrap();
        service
            .verify_authority(
                &hod(),
                DEPT,
                "F1",
                AuthorityMarks {
                    a: Some(400.0),
                    b: None,
                    c: Some(150.0),
                    e: Some(0.0),
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_submit_then_verify_recomputes_total() {
        let service = service().await;

        let outcome = service.submit(&faculty(), DEPT, "F1", Some(claims())).await.unwrap();
        assert_eq!(outcome.status, Status::VerificationPending);
        assert_eq!(outcome.grand_total, 750.0);

        let outcome = service
            .verify_section_b(&committee(), DEPT, "F1", 180.0)
            .await
            .unwrap();
        assert_eq!(outcome.status, Status::AuthorityVerificationPending);
        assert_eq!(outcome.grand_total, 730.0);
    }

    #[tokio::test]
    async fn test_full_faculty_path_freezes_record() {
        let service = service().await;
        through_authority(&service).await;

        let record = service.record(DEPT, "F1").await.unwrap();
        assert_eq!(record.status, Status::InteractionPending);
        assert_eq!(record.authority_total, Some(730.0));

        service
            .assign_externals(&hod(), DEPT, "X1", &ids(&["F1"]))
            .await
            .unwrap();
        service.assign_dean(&hod(), DEPT, "X1", "DN1").await.unwrap();

        let outcome = service
            .record_interaction(&external(), DEPT, "F1", "X1", full_interaction())
            .await
            .unwrap();
        assert_eq!(outcome.status, Status::InteractionPending);
        assert_eq!(outcome.grand_total, 830.0);

        let mut weaker = full_interaction();
        weaker.knowledge = 0.0;
        let outcome = service
            .record_interaction(&dean(), DEPT, "F1", "DN1", weaker)
            .await
            .unwrap();
        assert_eq!(outcome.status, Status::Done);
        assert_eq!(outcome.grand_total, 820.0);

        let err = service.escalate(&director(), DEPT, "F1").await.unwrap_err();
        assert!(matches!(err, WorkflowError::RecordFrozen { .. }));
    }

    #[tokio::test]
    async fn test_hod_designation_portfolio_path() {
        let service = WorkflowService::in_memory();
        service
            .onboard(FacultyRecord::new("H1", "Ravi", DEPT, Cadre::Professor, Designation::Hod))
            .unwrap();
        service
            .assign_committee(&hod(), DEPT, "C1", &ids(&["H1"]))
            .await
            .unwrap();
        let me = ActorCtx::new("H1", Role::Faculty, DEPT);

        service
            .mark_portfolio(
                &me,
                DEPT,
                "H1",
                PortfolioInput {
                    self_awarded: Some(40.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        service
            .submit(
                &me,
                DEPT,
                "H1",
                Some(ClaimedMarks {
                    a: Some(300.0),
                    b: Some(300.0),
                    c: Some(100.0),
                    d: None,
                    e: Some(50.0),
                }),
            )
            .await
            .unwrap();
        service.verify_section_b(&committee(), DEPT, "H1", 300.0).await.unwrap();
        // 系主任本人的记录由院长确认
        service
            .verify_authority(
                &dean(),
                DEPT,
                "H1",
                AuthorityMarks {
                    a: Some(300.0),
                    b: None,
                    c: Some(100.0),
                    e: Some(50.0),
                },
            )
            .await
            .unwrap();

        let outcome = service
            .record_interaction(&dean(), DEPT, "H1", "DN1", full_interaction())
            .await
            .unwrap();
        assert_eq!(outcome.status, Status::PortfolioMarkPending);

        let outcome = service
            .mark_portfolio(
                &dean(),
                DEPT,
                "H1",
                PortfolioInput {
                    department_marks: Some(50.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(outcome.status, Status::PortfolioMarkDeanPending);

        let outcome = service
            .mark_portfolio(
                &dean(),
                DEPT,
                "H1",
                PortfolioInput {
                    institute_marks: Some(30.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(outcome.status, Status::Done);

        let marks = service.total_marks(DEPT, "H1").await.unwrap();
        assert_eq!(marks.breakdown.portfolio_total, 80.0);
        // 300 + 300 + 100 + 80 + 50 + 100
        assert_eq!(marks.breakdown.grand_total, 930.0);
    }

    #[tokio::test]
    async fn test_hod_cannot_review_own_record() {
        let service = WorkflowService::in_memory();
        service
            .onboard(FacultyRecord::new("H1", "Ravi", DEPT, Cadre::Professor, Designation::Hod))
            .unwrap();
        service
            .assign_committee(&hod(), DEPT, "C1", &ids(&["H1"]))
            .await
            .unwrap();
        let me = ActorCtx::new("H1", Role::Faculty, DEPT);
        service
            .submit(
                &me,
                DEPT,
                "H1",
                Some(ClaimedMarks {
                    a: Some(100.0),
                    b: Some(100.0),
                    c: Some(100.0),
                    d: None,
                    e: Some(10.0),
                }),
            )
            .await
            .unwrap();

        // 本人以委员身份核查自己
        let self_member = ActorCtx::new("H1", Role::CommitteeMember, DEPT);
        assert!(service.verify_section_b(&self_member, DEPT, "H1", 370.0).await.is_err());
        service.verify_section_b(&committee(), DEPT, "H1", 100.0).await.unwrap();
        let before = service.record(DEPT, "H1").await.unwrap();

        let inflated = AuthorityMarks {
            a: Some(300.0),
            b: Some(370.0),
            c: Some(160.0),
            e: Some(50.0),
        };
        let err = service.verify_authority(&hod(), DEPT, "H1", inflated).await.unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidTransition { .. }));

        // 同系的其他系主任也不是系主任记录的核查人
        let other_hod = ActorCtx::new("H9", Role::Hod, DEPT);
        let err = service
            .verify_authority(&other_hod, DEPT, "H1", inflated)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
        assert_eq!(service.record(DEPT, "H1").await.unwrap(), before);

        let outcome = service
            .verify_authority(
                &dean(),
                DEPT,
                "H1",
                AuthorityMarks {
                    a: Some(100.0),
                    b: None,
                    c: Some(100.0),
                    e: Some(10.0),
                },
            )
            .await
            .unwrap();
        assert_eq!(outcome.status, Status::InteractionPending);
        assert_eq!(outcome.grand_total, 310.0);

        // 系主任层级不绑定院长：任一院长都可评价
        let any_dean = ActorCtx::new("DN9", Role::Dean, "SCI");
        let outcome = service
            .record_interaction(&any_dean, DEPT, "H1", "DN9", full_interaction())
            .await
            .unwrap();
        assert_eq!(outcome.status, Status::PortfolioMarkPending);
    }

    /// 把操作映射到服务调用；档案端点按当前状态自行选择操作
    async fn drive(
        service: &WorkflowService,
        actor: &ActorCtx,
        action: Action,
    ) -> WorkflowResult<Outcome> {
        match action {
            Action::SaveClaims => service.save_claims(actor, DEPT, "F1", claims()).await,
            Action::Submit => service.submit(actor, DEPT, "F1", None).await,
            Action::VerifySectionB => service.verify_section_b(actor, DEPT, "F1", 180.0).await,
            Action::ConfirmAuthority => {
                let marks = AuthorityMarks {
                    a: Some(400.0),
                    b: Some(180.0),
                    c: Some(150.0),
                    e: Some(0.0),
                };
                service.verify_authority(actor, DEPT, "F1", marks).await
            }
            Action::Evaluate => {
                service
                    .record_interaction(actor, DEPT, "F1", &actor.actor_id, full_interaction())
                    .await
            }
            Action::HodMark | Action::DeanMark => {
                let input = PortfolioInput {
                    department_marks: Some(30.0),
                    institute_marks: Some(30.0),
                    ..Default::default()
                };
                service.mark_portfolio(actor, DEPT, "F1", input).await
            }
            Action::Escalate => service.escalate(actor, DEPT, "F1").await,
            Action::DirectorConfirm => service.director_confirm(actor, DEPT, "F1").await,
        }
    }

    fn dispatched(status: Status, action: Action) -> Action {
        match (action, status) {
            (Action::HodMark | Action::DeanMark, Status::PortfolioMarkPending) => Action::HodMark,
            (Action::HodMark | Action::DeanMark, Status::PortfolioMarkDeanPending) => {
                Action::DeanMark
            }
            (Action::HodMark | Action::DeanMark, _) => Action::SaveClaims,
            (other, _) => other,
        }
    }

    #[tokio::test]
    async fn test_unlisted_transitions_leave_record_unchanged() {
        let actors = [faculty(), committee(), hod(), external(), dean(), director()];

        for status in Status::ALL {
            for action in Action::ALL {
                for actor in &actors {
                    let effective = dispatched(status, action);
                    let listed = permitted_roles(status, effective)
                        .is_some_and(|roles| roles.contains(&actor.role));
                    if listed && !status.is_terminal() {
                        continue;
                    }

                    let mut seeded = FacultyRecord::new(
                        "F1",
                        "Asha",
                        DEPT,
                        Cadre::AssistantProfessor,
                        Designation::Faculty,
                    );
                    seeded.status = status;
                    let service = WorkflowService::in_memory();
                    service.onboard(seeded).unwrap();
                    service
                        .assign_committee(&hod(), DEPT, "C1", &ids(&["F1"]))
                        .await
                        .unwrap();
                    service
                        .assign_externals(&hod(), DEPT, "X1", &ids(&["F1"]))
                        .await
                        .unwrap();
                    service.assign_dean(&hod(), DEPT, "X1", "DN1").await.unwrap();
                    let before = service.record(DEPT, "F1").await.unwrap();

                    let err = drive(&service, actor, action).await.unwrap_err();
                    if status.is_terminal() {
                        assert!(matches!(err, WorkflowError::RecordFrozen { .. }));
                    } else {
                        assert!(
                            matches!(err, WorkflowError::InvalidTransition { .. }),
                            "{} {} {} => {:?}",
                            status,
                            action,
                            actor.role,
                            err
                        );
                    }
                    assert_eq!(service.record(DEPT, "F1").await.unwrap(), before);
                }
            }
        }
    }

    #[tokio::test]
    async fn test_escalate_and_director_confirm() {
        let service = service().await;
        through_authority(&service).await;

        let outcome = service.escalate(&director(), DEPT, "F1").await.unwrap();
        assert_eq!(outcome.status, Status::SentToDirector);

        let err = service.director_confirm(&director(), DEPT, "F1").await.unwrap_err();
        assert!(matches!(err, WorkflowError::IncompleteInput { .. }));

        let outcome = service
            .record_interaction(&director(), DEPT, "F1", "DIR", full_interaction())
            .await
            .unwrap();
        assert_eq!(outcome.status, Status::SentToDirector);

        let outcome = service.director_confirm(&director(), DEPT, "F1").await.unwrap();
        assert_eq!(outcome.status, Status::Done);
    }

    #[tokio::test]
    async fn test_concurrent_authority_verification_single_winner() {
        let service = Arc::new(service().await);
        service.submit(&faculty(), DEPT, "F1", Some(claims())).await.unwrap();
        service.verify_section_b(&committee(), DEPT, "F1", 180.0).await.unwrap();

        let marks = AuthorityMarks {
            a: Some(400.0),
            b: None,
            c: Some(150.0),
            e: Some(0.0),
        };
        let first = {
            let service = service.clone();
            tokio::spawn(async move { service.verify_authority(&hod(), DEPT, "F1", marks).await })
        };
        let second = {
            let service = service.clone();
            tokio::spawn(async move { service.verify_authority(&hod(), DEPT, "F1", marks).await })
        };
        let results = [first.await.unwrap(), second.await.unwrap()];

        let winners = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1);
        assert!(results.iter().any(|r| matches!(
            r,
            Err(WorkflowError::InvalidTransition {
                status: Status::InteractionPending,
                ..
            })
        )));
    }

    #[tokio::test]
    async fn test_rejected_actions_leave_record_untouched() {
        let service = service().await;
        service.submit(&faculty(), DEPT, "F1", Some(claims())).await.unwrap();
        let before = service.record(DEPT, "F1").await.unwrap();

        assert!(service.submit(&faculty(), DEPT, "F1", None).await.is_err());
        assert!(service.escalate(&hod(), DEPT, "F1").await.is_err());
        assert!(service
            .verify_section_b(&committee(), DEPT, "F1", 10_000.0)
            .await
            .is_err());
        assert!(service.director_confirm(&director(), DEPT, "F1").await.is_err());
        let stranger = ActorCtx::new("C2", Role::CommitteeMember, DEPT);
        assert!(service.verify_section_b(&stranger, DEPT, "F1", 100.0).await.is_err());

        assert_eq!(service.record(DEPT, "F1").await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_ceiling_and_negative_marks() {
        let service = service().await;

        let mut over = claims();
        over.a = Some(441.0);
        let err = service.save_claims(&faculty(), DEPT, "F1", over).await.unwrap_err();
        assert!(matches!(err, WorkflowError::CeilingExceeded { .. }));

        let mut negative = claims();
        negative.c = Some(-1.0);
        let err = service.save_claims(&faculty(), DEPT, "F1", negative).await.unwrap_err();
        assert!(matches!(err, WorkflowError::NegativeMarks { .. }));

        let outcome = service.save_claims(&faculty(), DEPT, "F1", claims()).await.unwrap();
        assert_eq!(outcome.status, Status::Pending);
        assert_eq!(outcome.grand_total, 750.0);
    }

    #[tokio::test]
    async fn test_evaluator_must_match_actor() {
        let service = service().await;
        through_authority(&service).await;
        service
            .assign_externals(&hod(), DEPT, "X1", &ids(&["F1"]))
            .await
            .unwrap();

        let err = service
            .record_interaction(&external(), DEPT, "F1", "X2", full_interaction())
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_assignment_rules() {
        let service = service().await;
        service
            .onboard(FacultyRecord::new(
                "F2",
                "Meena",
                DEPT,
                Cadre::Professor,
                Designation::Faculty,
            ))
            .unwrap();

        service
            .assign_externals(&hod(), DEPT, "X1", &ids(&["F1"]))
            .await
            .unwrap();
        let err = service
            .assign_externals(&hod(), DEPT, "X2", &ids(&["F2", "F1"]))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::AlreadyAssigned { .. }));
        assert!(service.external_assignment("X2").await.faculty_ids.is_empty());

        service.assign_dean(&hod(), DEPT, "X1", "DN1").await.unwrap();
        let err = service
            .assign_externals(&hod(), DEPT, "X1", &ids(&["F2"]))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::AssignmentLocked { .. }));

        let view = service
            .remove_external_faculty(&hod(), DEPT, "X1", "F1")
            .await
            .unwrap();
        assert!(view.faculty_ids.is_empty());
        assert_eq!(view.dean_id.as_deref(), Some("DN1"));

        let view = service
            .assign_externals(&hod(), DEPT, "X2", &ids(&["F1"]))
            .await
            .unwrap();
        assert_eq!(view.faculty_ids, ids(&["F1"]));

        let err = service
            .assign_externals(&faculty(), DEPT, "X3", &ids(&["F2"]))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn test_department_scoping() {
        let service = service().await;
        assert!(matches!(
            service.status_view("ECE", "F1").await,
            Err(WorkflowError::RecordNotFound { .. })
        ));
        let view = service.status_view(DEPT, "F1").await.unwrap();
        assert_eq!(view.status, Status::Pending);
        assert_eq!(view.cadre, Cadre::AssistantProfessor);
    }
}
